use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ts_core::cooldown::{Clock, ManualClock};
use ts_core::types::{Payload, Priority, Tab, Window};
use ts_daemon::consent::{
    ConsentCoordinator, Resolution, APPLIED_TITLE, ERROR_TITLE, PROMPT_ID, TIP_TITLE,
};
use ts_daemon::dispatch::Choice;
use ts_daemon::executor::ActionExecutor;
use ts_daemon::host::memory::{MemoryBrowser, MemoryNotifier};
use ts_daemon::state::AgentState;

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-08-20T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

struct Fixture {
    browser: Arc<MemoryBrowser>,
    notifier: Arc<MemoryNotifier>,
    clock: Arc<ManualClock>,
    consent: ConsentCoordinator,
    state: AgentState,
}

fn fixture() -> Fixture {
    let browser = Arc::new(MemoryBrowser::new(vec![Window {
        id: 7,
        tabs: vec![
            Tab::new(70, 7, "active").activated(),
            Tab::new(71, 7, "background"),
        ],
    }]));
    let notifier = Arc::new(MemoryNotifier::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let consent = ConsentCoordinator::new(
        notifier.clone(),
        ActionExecutor::new(browser.clone()),
        clock.clone(),
        "icon128.png",
    );
    Fixture {
        browser,
        notifier,
        clock,
        consent,
        state: AgentState::new(Duration::from_secs(180)),
    }
}

impl Fixture {
    async fn prompt(&mut self) {
        self.consent
            .present(&Payload::new(40.0, 2.5, 18.0), &mut self.state.prompt)
            .await;
        assert!(self.notifier.showing(PROMPT_ID).is_some());
    }
}

#[tokio::test]
async fn apply_runs_executor_confirms_and_engages_cooldown() {
    let mut f = fixture();
    f.prompt().await;
    f.clock.advance(Duration::from_secs(30));

    let resolution = f.consent.resolve(Choice::Apply, &mut f.state).await;

    let Resolution::Applied(report) = resolution else {
        panic!("expected Applied, got {resolution:?}");
    };
    assert_eq!(report.muted, 2);
    assert_eq!(report.discarded, 1);
    assert!(f.browser.tab(70).unwrap().muted);
    assert!(!f.browser.tab(70).unwrap().discarded);
    assert!(f.browser.tab(71).unwrap().discarded);

    let confirmations = f.notifier.shown_titled(APPLIED_TITLE);
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0].priority, Priority::Low);

    assert_eq!(f.state.cooldown.last_action_at(), Some(f.clock.now()));
    assert!(f.notifier.showing(PROMPT_ID).is_none());
    assert!(f.state.prompt.live().is_none());
}

#[tokio::test]
async fn decline_shows_tip_and_leaves_gate_alone() {
    let mut f = fixture();
    f.prompt().await;

    let resolution = f.consent.resolve(Choice::Decline, &mut f.state).await;

    assert_eq!(resolution, Resolution::Declined);
    let tips = f.notifier.shown_titled(TIP_TITLE);
    assert_eq!(tips.len(), 1);
    assert_eq!(tips[0].priority, Priority::Zero);
    assert!(f.state.cooldown.last_action_at().is_none());
    assert!(f.browser.mute_attempts().is_empty());
    assert!(f.notifier.showing(PROMPT_ID).is_none());
}

#[tokio::test]
async fn enumeration_failure_reports_error_and_keeps_gate_open() {
    let mut f = fixture();
    f.browser.fail_tab_query(true);
    f.prompt().await;

    let resolution = f.consent.resolve(Choice::Apply, &mut f.state).await;

    let Resolution::Failed(description) = resolution else {
        panic!("expected Failed, got {resolution:?}");
    };
    let errors = f.notifier.shown_titled(ERROR_TITLE);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, description);
    assert_eq!(errors[0].priority, Priority::High);
    assert!(f.notifier.shown_titled(APPLIED_TITLE).is_empty());

    assert!(f.state.cooldown.is_open(f.clock.now()));
    assert!(f.notifier.showing(PROMPT_ID).is_none());
    assert!(f.notifier.cleared().iter().any(|id| id == PROMPT_ID));
}

#[tokio::test]
async fn failed_confirmation_does_not_undo_the_action() {
    let mut f = fixture();
    f.prompt().await;
    f.notifier.fail_create(true);

    let resolution = f.consent.resolve(Choice::Apply, &mut f.state).await;

    assert!(matches!(resolution, Resolution::Applied(_)));
    assert!(!f.state.cooldown.is_open(f.clock.now()));
    assert!(f.notifier.showing(PROMPT_ID).is_none());
}

#[tokio::test]
async fn prompt_message_carries_the_readings() {
    let mut f = fixture();
    f.prompt().await;

    let prompt = f.notifier.showing(PROMPT_ID).unwrap();
    assert_eq!(prompt.message, "Battery 40% • 2.5%/min • 18W\nReduce Chrome load?");
    assert_eq!(prompt.icon, "icon128.png");
    assert!(prompt.require_interaction);
}
