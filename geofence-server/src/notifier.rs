//! Notification delivery
//!
//! Transition events are rendered into a [`Notification`] and handed to a
//! [`Notifier`]. Delivery mechanics are out of scope here: the log notifier
//! writes the title at info level and the history notifier keeps the most
//! recent notifications for the REST API.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use geofence_core::notification::invalid_transition_message;
use geofence_core::status;
use geofence_core::{Notification, TransitionEvent, TransitionKind};

/// Notifications kept by [`HistoryNotifier`] by default
pub const DEFAULT_HISTORY: usize = 50;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification);
}

/// Render and deliver one transition event
pub async fn dispatch(notifier: &dyn Notifier, event: &TransitionEvent) {
    notifier.notify(&Notification::for_event(event)).await;
}

/// Deliver a transition reported with a raw platform code.
///
/// Codes other than ENTER/EXIT are logged and dropped.
pub async fn dispatch_raw(
    notifier: &dyn Notifier,
    transition: i32,
    geofence_ids: Vec<String>,
    occurred_at_ms: u64,
) -> bool {
    match TransitionKind::from_code(transition) {
        Some(kind) => {
            let event = TransitionEvent {
                geofence_ids,
                kind,
                occurred_at_ms,
            };
            dispatch(notifier, &event).await;
            true
        }
        None => {
            log::error!("{}", invalid_transition_message(transition));
            false
        }
    }
}

/// Report a geofencing event that carries an error instead of a
/// transition. Nothing is notified; returns the logged message.
pub fn report_event_error(error_code: i32) -> &'static str {
    let message = status::error_message(error_code);
    log::error!("{}", message);
    message
}

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) {
        log::info!("{}", notification.title);
    }
}

/// Keeps the last `capacity` notifications, oldest first
pub struct HistoryNotifier {
    capacity: usize,
    recent: Mutex<VecDeque<Notification>>,
}

impl HistoryNotifier {
    pub fn new(capacity: usize) -> Self {
        HistoryNotifier {
            capacity,
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn recent(&self) -> Vec<Notification> {
        let recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent.iter().cloned().collect()
    }
}

impl Default for HistoryNotifier {
    fn default() -> Self {
        HistoryNotifier::new(DEFAULT_HISTORY)
    }
}

#[async_trait]
impl Notifier for HistoryNotifier {
    async fn notify(&self, notification: &Notification) {
        let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        if recent.len() == self.capacity {
            recent.pop_front();
        }
        if self.capacity > 0 {
            recent.push_back(notification.clone());
        }
    }
}

/// Fans a notification out to several notifiers in order
pub struct CompositeNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl CompositeNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        CompositeNotifier { notifiers }
    }
}

#[async_trait]
impl Notifier for CompositeNotifier {
    async fn notify(&self, notification: &Notification) {
        for notifier in &self.notifiers {
            notifier.notify(notification).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exit(ids: &[&str], at: u64) -> TransitionEvent {
        TransitionEvent {
            geofence_ids: ids.iter().map(|s| s.to_string()).collect(),
            kind: TransitionKind::Exit,
            occurred_at_ms: at,
        }
    }

    #[tokio::test]
    async fn test_history_keeps_latest() {
        let history = HistoryNotifier::new(2);
        for at in 1..=3 {
            dispatch(&history, &exit(&["SFO"], at)).await;
        }
        let recent = history.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].occurred_at_ms, 2);
        assert_eq!(recent[1].occurred_at_ms, 3);
        assert_eq!(recent[1].title, "Exited: SFO");
    }

    #[tokio::test]
    async fn test_composite_fans_out() {
        let a = Arc::new(HistoryNotifier::default());
        let b = Arc::new(HistoryNotifier::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![a.clone(), b.clone(), Arc::new(LogNotifier)];
        let composite = CompositeNotifier::new(notifiers);

        dispatch(&composite, &exit(&["SFO", "GOOGLE"], 5)).await;
        assert_eq!(a.recent()[0].title, "Exited: SFO, GOOGLE");
        assert_eq!(b.recent().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_raw() {
        let history = HistoryNotifier::default();
        assert!(dispatch_raw(&history, 1, vec!["GOOGLE".to_string()], 9).await);
        assert!(!dispatch_raw(&history, 4, vec!["GOOGLE".to_string()], 10).await);

        let recent = history.recent();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "Entered: GOOGLE");
    }

    #[test]
    fn test_report_event_error() {
        assert_eq!(
            report_event_error(status::GEOFENCE_NOT_AVAILABLE),
            status::error_message(status::GEOFENCE_NOT_AVAILABLE)
        );
        assert_eq!(
            report_event_error(99),
            "Unknown error: the Geofence service is not available now."
        );
    }
}
