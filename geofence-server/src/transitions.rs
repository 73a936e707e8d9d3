//! Transition worker
//!
//! The single consumer of position samples. It alone feeds samples into the
//! shared monitor, so containment and tracker state are never mutated
//! concurrently, and hands every resulting event to the notifier.

use std::sync::Arc;

use geofence_core::{PositionSample, TransitionEvent};
use tokio::sync::mpsc;
use tokio_graceful_shutdown::SubsystemHandle;

use crate::error::ServerError;
use crate::notifier::{dispatch, Notifier};
use crate::SharedMonitor;

pub struct TransitionWorker {
    monitor: SharedMonitor,
    samples_rx: mpsc::Receiver<PositionSample>,
    notifier: Arc<dyn Notifier>,
}

impl TransitionWorker {
    pub fn new(
        monitor: SharedMonitor,
        samples_rx: mpsc::Receiver<PositionSample>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        TransitionWorker {
            monitor,
            samples_rx,
            notifier,
        }
    }

    pub async fn run(mut self, subsys: SubsystemHandle) -> Result<(), ServerError> {
        log::debug!("Transition worker started");
        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("Transition worker: shutdown");
                    return Ok(());
                },

                r = self.next_sample() => {
                    match r {
                        Some(sample) => {
                            if let Err(e) = self.process(&sample).await {
                                log::warn!("Dropping sample {:?}: {}", sample, e);
                            }
                        }
                        None => {
                            log::debug!("Sample channel closed");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    pub(crate) async fn next_sample(&mut self) -> Option<PositionSample> {
        self.samples_rx.recv().await
    }

    /// Evaluate one sample and deliver its events; returns the events
    pub async fn process(
        &self,
        sample: &PositionSample,
    ) -> Result<Vec<TransitionEvent>, ServerError> {
        let events = self.monitor.lock().await.process_sample(sample)?;
        log::trace!("{:?} produced {} events", sample, events.len());

        for event in &events {
            dispatch(&*self.notifier, event).await;
        }
        Ok(events)
    }
}
