//! Transition Tracking
//!
//! Diffs successive containment observations per geofence and emits
//! ENTER/EXIT events on state flips.
//!
//! Each geofence runs a small state machine:
//!
//! | From    | Observed | Result                                       |
//! |---------|----------|----------------------------------------------|
//! | Unknown | inside   | Inside, ENTER only if initial trigger ENTER  |
//! | Unknown | outside  | Outside, EXIT only if initial trigger EXIT   |
//! | Outside | inside   | Inside, ENTER if the trigger mask has ENTER  |
//! | Inside  | outside  | Outside, EXIT if the trigger mask has EXIT   |
//! | X       | X        | no-op                                        |
//!
//! All geofences that fire the same kind in one pass are batched into a
//! single [`TransitionEvent`], ids in evaluation order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::containment::Observation;
use crate::geofence::{InitialTrigger, TriggerMask};

/// Platform code for an ENTER transition
pub const GEOFENCE_TRANSITION_ENTER: i32 = 1;
/// Platform code for an EXIT transition
pub const GEOFENCE_TRANSITION_EXIT: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Enter,
    Exit,
}

impl TransitionKind {
    pub fn code(self) -> i32 {
        match self {
            TransitionKind::Enter => GEOFENCE_TRANSITION_ENTER,
            TransitionKind::Exit => GEOFENCE_TRANSITION_EXIT,
        }
    }

    /// Map a raw platform transition code; `None` for anything but ENTER/EXIT
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            GEOFENCE_TRANSITION_ENTER => Some(TransitionKind::Enter),
            GEOFENCE_TRANSITION_EXIT => Some(TransitionKind::Exit),
            _ => None,
        }
    }

    fn trigger_bit(self) -> TriggerMask {
        match self {
            TransitionKind::Enter => TriggerMask::ENTER,
            TransitionKind::Exit => TriggerMask::EXIT,
        }
    }

    fn initial_bit(self) -> InitialTrigger {
        match self {
            TransitionKind::Enter => InitialTrigger::ENTER,
            TransitionKind::Exit => InitialTrigger::EXIT,
        }
    }
}

/// One or more geofences crossing their boundary in the same direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    pub geofence_ids: Vec<String>,
    pub kind: TransitionKind,
    pub occurred_at_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedState {
    #[default]
    Unknown,
    Outside,
    Inside,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tracked {
    state: TrackedState,
    initial_trigger: InitialTrigger,
}

#[derive(Debug, Default)]
pub struct TransitionTracker {
    tracked: HashMap<String, Tracked>,
}

impl TransitionTracker {
    pub fn new() -> Self {
        TransitionTracker::default()
    }

    /// Start tracking `id` from the Unknown state
    pub fn track(&mut self, id: &str, initial_trigger: InitialTrigger) {
        self.tracked.insert(
            id.to_string(),
            Tracked {
                state: TrackedState::Unknown,
                initial_trigger,
            },
        );
    }

    pub fn forget(&mut self, id: &str) {
        self.tracked.remove(id);
    }

    pub fn clear(&mut self) {
        self.tracked.clear();
    }

    pub fn state(&self, id: &str) -> TrackedState {
        self.tracked
            .get(id)
            .map(|t| t.state)
            .unwrap_or(TrackedState::Unknown)
    }

    /// Apply one evaluation pass.
    ///
    /// Returns at most one event per kind, ENTER before EXIT. Ids that were
    /// never passed to [`track`](Self::track) start Unknown with no initial
    /// trigger.
    pub fn observe(
        &mut self,
        observations: &[Observation],
        occurred_at_ms: u64,
    ) -> Vec<TransitionEvent> {
        let mut entered = Vec::new();
        let mut exited = Vec::new();

        for obs in observations {
            let tracked = self.tracked.entry(obs.geofence_id.clone()).or_default();
            let (next, kind) = if obs.state.is_inside {
                (TrackedState::Inside, TransitionKind::Enter)
            } else {
                (TrackedState::Outside, TransitionKind::Exit)
            };

            let fire = match tracked.state {
                s if s == next => false,
                TrackedState::Unknown => {
                    tracked.initial_trigger.contains(kind.initial_bit())
                        && obs.trigger_mask.contains(kind.trigger_bit())
                }
                _ => obs.trigger_mask.contains(kind.trigger_bit()),
            };
            tracked.state = next;

            if fire {
                match kind {
                    TransitionKind::Enter => entered.push(obs.geofence_id.clone()),
                    TransitionKind::Exit => exited.push(obs.geofence_id.clone()),
                }
            }
        }

        [(TransitionKind::Enter, entered), (TransitionKind::Exit, exited)]
            .into_iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(kind, geofence_ids)| TransitionEvent {
                geofence_ids,
                kind,
                occurred_at_ms,
            })
            .collect()
    }
}
