use crate::error::RelayError;

/// The outcome of a relay call that is not allowed to fail.
///
/// `value` is always usable: either what the relay sent, or the fallback
/// the caller should act on. `error` records why the fallback was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    value: T,
    error: Option<RelayError>,
}

impl<T> Reply<T> {
    pub fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    pub fn fallback(value: T, error: RelayError) -> Self {
        Self {
            value,
            error: Some(error),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn error(&self) -> Option<&RelayError> {
        self.error.as_ref()
    }

    /// `true` when the value is a fallback rather than relay data.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

impl<T: Default> Reply<T> {
    /// Collapse a fallible call into a reply, substituting `T::default()`.
    pub fn from_result(result: Result<T, RelayError>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(error) => Self::fallback(T::default(), error),
        }
    }
}
