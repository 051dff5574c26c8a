use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::store::{RoutineStore, TouchMark};
use crate::error::StoreError;
use crate::events::Event;
use crate::notify::NotificationSink;
use crate::timer::PhaseKind;

type Stamp = (TouchMark, DateTime<Utc>);

/// Sink that stamps `lastStarted` when a run begins at the first phase and
/// `lastFinished` when it completes.
///
/// `notify` only queues the stamp. The store lives on a writer thread so a
/// slow disk never holds up the session tick. Store failures are logged and
/// dropped.
pub struct SessionRecorder {
    tx: mpsc::UnboundedSender<Stamp>,
    routine_id: String,
}

/// Owns the writer thread behind a [`SessionRecorder`].
pub struct RecorderWriter<S> {
    worker: JoinHandle<S>,
}

impl SessionRecorder {
    /// Move `store` onto a new writer thread and return the sink that feeds it.
    pub fn spawn<S>(
        store: S,
        routine_id: impl Into<String>,
    ) -> Result<(Self, RecorderWriter<S>), StoreError>
    where
        S: RoutineStore + 'static,
    {
        let routine_id = routine_id.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<Stamp>();
        let id = routine_id.clone();

        let worker = thread::Builder::new()
            .name("setclock-recorder".into())
            .spawn(move || {
                while let Some((mark, at)) = rx.blocking_recv() {
                    match store.touch(&id, mark, at) {
                        Ok(true) => debug!(routine = %id, ?mark, "routine timestamp updated"),
                        Ok(false) => warn!(routine = %id, "routine vanished from store"),
                        Err(e) => {
                            warn!(routine = %id, error = %e, "failed to record session timestamp")
                        }
                    }
                }
                info!(routine = %id, "recorder writer shutting down");
                store
            })?;

        Ok((Self { tx, routine_id }, RecorderWriter { worker }))
    }

    pub fn routine_id(&self) -> &str {
        &self.routine_id
    }

    fn queue(&self, mark: TouchMark, event: &Event) {
        if self.tx.send((mark, event.at())).is_err() {
            warn!(routine = %self.routine_id, ?mark, "recorder writer is gone, stamp dropped");
        }
    }
}

impl NotificationSink for SessionRecorder {
    fn notify(&mut self, event: &Event) {
        match event {
            Event::PhaseStarted { index: 0, phase, .. } if phase.kind != PhaseKind::ManualBreak => {
                self.queue(TouchMark::Started, event)
            }
            Event::SessionFinished { .. } => self.queue(TouchMark::Finished, event),
            _ => {}
        }
    }
}

impl<S> RecorderWriter<S> {
    /// Wait for every queued stamp to be written and hand the store back.
    ///
    /// Blocks until the paired [`SessionRecorder`] has been dropped. `None`
    /// if the writer thread panicked.
    pub fn finish(self) -> Option<S> {
        self.worker.join().ok()
    }
}
