use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use ts_core::types::Notice;

use super::memory::MemoryNotifier;
use super::{HostError, Notifier};
use crate::dispatch::HostEvent;

/// Prints notices to stdout and turns stdin answers into button clicks.
///
/// Only the most recent notice carrying buttons can be answered; typing
/// `0`/`y` or `1`/`n` clicks the corresponding button.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    board: MemoryNotifier,
    awaiting: Mutex<Option<String>>,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the notice that stdin answers are routed to, if any.
    pub fn awaiting_answer(&self) -> Option<String> {
        self.awaiting
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Translate one line of input into a click on the awaiting notice.
    pub fn answer(&self, line: &str) -> Option<HostEvent> {
        let button_index = parse_answer(line)?;
        let notification_id = self.awaiting_answer()?;
        Some(HostEvent::ButtonClicked {
            notification_id,
            button_index,
        })
    }

    /// Read stdin until EOF, forwarding answers to the event channel.
    pub fn spawn_input(self: std::sync::Arc<Self>, events: flume::Sender<HostEvent>) {
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("stdin closed, console answers disabled");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read stdin");
                        break;
                    }
                };
                match self.answer(&line) {
                    Some(event) => {
                        if events.send_async(event).await.is_err() {
                            break;
                        }
                    }
                    None if !line.trim().is_empty() => {
                        println!("(nothing to answer, or unrecognised input: {:?})", line.trim());
                    }
                    None => {}
                }
            }
        });
    }
}

fn parse_answer(line: &str) -> Option<usize> {
    match line.trim().to_ascii_lowercase().as_str() {
        "0" | "y" | "yes" => Some(0),
        "1" | "n" | "no" => Some(1),
        _ => None,
    }
}

fn render(id: &str, notice: &Notice) -> String {
    let mut out = format!(
        "\n[{}] {} (priority {})\n{}\n",
        id,
        notice.title,
        notice.priority.level(),
        notice.message
    );
    for (index, label) in notice.buttons.iter().enumerate() {
        out.push_str(&format!("  [{index}] {label}\n"));
    }
    out
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn create(&self, id: Option<&str>, notice: &Notice) -> Result<String, HostError> {
        let id = self.board.create(id, notice).await?;
        print!("{}", render(&id, notice));
        if !notice.buttons.is_empty() {
            *self.awaiting.lock().unwrap_or_else(|e| e.into_inner()) = Some(id.clone());
        }
        Ok(id)
    }

    async fn clear(&self, id: &str) -> Result<bool, HostError> {
        {
            let mut awaiting = self.awaiting.lock().unwrap_or_else(|e| e.into_inner());
            if awaiting.as_deref() == Some(id) {
                *awaiting = None;
            }
        }
        self.board.clear(id).await
    }
}
