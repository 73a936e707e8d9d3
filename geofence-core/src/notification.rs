//! Transition Notifications
//!
//! Formats transition events into the notification shown to the user.
//! The title is `"<Entered|Exited>: id1, id2"`, ids in the order the
//! geofences triggered.

use serde::{Deserialize, Serialize};

use crate::transition::{TransitionEvent, TransitionKind};

/// Body text of every transition notification
pub const NOTIFICATION_TEXT: &str = "Click notification to return to app";

/// Label for transition codes other than ENTER/EXIT
pub const UNKNOWN_TRANSITION: &str = "Unknown Transition";

pub fn transition_label(kind: TransitionKind) -> &'static str {
    match kind {
        TransitionKind::Enter => "Entered",
        TransitionKind::Exit => "Exited",
    }
}

/// Label for a raw platform transition code
pub fn transition_code_label(code: i32) -> &'static str {
    TransitionKind::from_code(code)
        .map(transition_label)
        .unwrap_or(UNKNOWN_TRANSITION)
}

/// `"<label>: <ids joined with ", ">"`
pub fn transition_details(event: &TransitionEvent) -> String {
    format!(
        "{}: {}",
        transition_label(event.kind),
        event.geofence_ids.join(", ")
    )
}

/// Logged when a delivered transition is neither ENTER nor EXIT
pub fn invalid_transition_message(code: i32) -> String {
    format!("Geofence transition error: invalid transition type {}", code)
}

/// Where tapping the notification leads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationTarget {
    MainScreen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub target: NotificationTarget,
    pub kind: TransitionKind,
    pub occurred_at_ms: u64,
}

impl Notification {
    pub fn for_event(event: &TransitionEvent) -> Self {
        Notification {
            title: transition_details(event),
            body: NOTIFICATION_TEXT.to_string(),
            target: NotificationTarget::MainScreen,
            kind: event.kind,
            occurred_at_ms: event.occurred_at_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: TransitionKind, ids: &[&str]) -> TransitionEvent {
        TransitionEvent {
            geofence_ids: ids.iter().map(|s| s.to_string()).collect(),
            kind,
            occurred_at_ms: 77,
        }
    }

    #[test]
    fn test_details_format() {
        assert_eq!(
            transition_details(&event(TransitionKind::Exit, &["SFO"])),
            "Exited: SFO"
        );
        assert_eq!(
            transition_details(&event(TransitionKind::Enter, &["SFO", "GOOGLE"])),
            "Entered: SFO, GOOGLE"
        );
    }

    #[test]
    fn test_code_labels() {
        assert_eq!(transition_code_label(1), "Entered");
        assert_eq!(transition_code_label(2), "Exited");
        assert_eq!(transition_code_label(4), "Unknown Transition");
        assert_eq!(
            invalid_transition_message(4),
            "Geofence transition error: invalid transition type 4"
        );
    }

    #[test]
    fn test_notification_for_event() {
        let n = Notification::for_event(&event(TransitionKind::Enter, &["GOOGLE"]));
        assert_eq!(n.title, "Entered: GOOGLE");
        assert_eq!(n.body, "Click notification to return to app");
        assert_eq!(n.target, NotificationTarget::MainScreen);
        assert_eq!(n.occurred_at_ms, 77);
    }
}
