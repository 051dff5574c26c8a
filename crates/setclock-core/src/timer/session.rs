//! Real-time driver for a [`PlaybackEngine`].
//!
//! A single tokio task owns the engine. Commands arrive over a channel and
//! are applied between ticks, so every command lands atomically with respect
//! to the next tick. The one-second interval exists only while the engine is
//! running: it is dropped on pause, reset, finish and stop, and recreated
//! (with a fresh [`TickToken`]) when playback starts again. A tick that still
//! carries an old token is rejected by the engine itself.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use super::engine::{PlaybackEngine, TickToken};
use super::snapshot::PlaybackSnapshot;
use crate::error::PlaybackError;
use crate::events::Event;
use crate::notify::NotificationSink;

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Wall-clock length of one engine second.
    pub tick_period: Duration,
    /// Phases listed in each published snapshot's `upcoming`.
    pub lookahead: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            lookahead: 9,
        }
    }
}

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Start(Reply<PlaybackSnapshot>),
    Pause(Reply<PlaybackSnapshot>),
    Toggle(Reply<PlaybackSnapshot>),
    Reset(Reply<PlaybackSnapshot>),
    InsertBreak {
        after_current: bool,
        secs: i64,
        reply: Reply<Result<PlaybackSnapshot, PlaybackError>>,
    },
    Stop,
}

/// Entry point for running a workout in real time.
pub struct WorkoutSession;

impl WorkoutSession {
    /// Spawn the session task on the current tokio runtime. The engine is
    /// not started; call [`SessionHandle::start`].
    pub fn spawn(
        engine: PlaybackEngine,
        sink: Box<dyn NotificationSink>,
        options: SessionOptions,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(engine.snapshot(options.lookahead));
        let task = tokio::spawn(run(engine, sink, options, rx, status_tx));
        SessionHandle {
            tx,
            status: status_rx,
            task,
        }
    }
}

/// Control surface of a running session. Dropping it ends the session.
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<PlaybackSnapshot>,
    task: JoinHandle<PlaybackSnapshot>,
}

impl SessionHandle {
    pub async fn start(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(Command::Start).await
    }

    pub async fn pause(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(Command::Pause).await
    }

    pub async fn toggle(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(Command::Toggle).await
    }

    pub async fn reset(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(Command::Reset).await
    }

    /// See [`PlaybackEngine::insert_break`].
    pub async fn insert_break(
        &self,
        after_current: bool,
        secs: i64,
    ) -> Result<PlaybackSnapshot, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::InsertBreak {
                after_current,
                secs,
                reply,
            })
            .map_err(|_| PlaybackError::SessionClosed)?;
        rx.await.map_err(|_| PlaybackError::SessionClosed)?
    }

    /// Latest published state.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.status.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.status.clone()
    }

    /// Wait for natural completion.
    pub async fn wait_finished(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        let mut status = self.status.clone();
        let snapshot = status
            .wait_for(|s| s.finished)
            .await
            .map_err(|_| PlaybackError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    /// Dispose of the session and return its final state.
    pub async fn stop(self) -> Result<PlaybackSnapshot, PlaybackError> {
        // The task also stops when the channel closes, so a failed send is fine.
        let _ = self.tx.send(Command::Stop);
        self.task.await.map_err(|_| PlaybackError::SessionClosed)
    }

    async fn request(
        &self,
        command: fn(Reply<PlaybackSnapshot>) -> Command,
    ) -> Result<PlaybackSnapshot, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .map_err(|_| PlaybackError::SessionClosed)?;
        rx.await.map_err(|_| PlaybackError::SessionClosed)
    }
}

struct Ticker {
    interval: Interval,
    token: TickToken,
}

async fn run(
    mut engine: PlaybackEngine,
    mut sink: Box<dyn NotificationSink>,
    options: SessionOptions,
    mut rx: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<PlaybackSnapshot>,
) -> PlaybackSnapshot {
    let mut ticker: Option<Ticker> = None;
    info!(phases = engine.timeline().len(), "workout session task running");

    loop {
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Stop => break,
                    Command::Start(reply) => {
                        emit(&mut sink, engine.start());
                        sync_ticker(&engine, &mut ticker, options.tick_period, false);
                        let _ = reply.send(engine.snapshot(options.lookahead));
                    }
                    Command::Pause(reply) => {
                        emit(&mut sink, engine.pause());
                        sync_ticker(&engine, &mut ticker, options.tick_period, false);
                        let _ = reply.send(engine.snapshot(options.lookahead));
                    }
                    Command::Toggle(reply) => {
                        emit(&mut sink, engine.toggle());
                        sync_ticker(&engine, &mut ticker, options.tick_period, false);
                        let _ = reply.send(engine.snapshot(options.lookahead));
                    }
                    Command::Reset(reply) => {
                        emit(&mut sink, Some(engine.reset()));
                        sync_ticker(&engine, &mut ticker, options.tick_period, false);
                        let _ = reply.send(engine.snapshot(options.lookahead));
                    }
                    Command::InsertBreak { after_current, secs, reply } => {
                        let result = engine.insert_break(after_current, secs).map(|event| {
                            sink.notify(&event);
                            engine.snapshot(options.lookahead)
                        });
                        // The break gets whole seconds from now on.
                        sync_ticker(&engine, &mut ticker, options.tick_period, result.is_ok());
                        let _ = reply.send(result);
                    }
                }
            }
            token = next_tick(&mut ticker) => {
                match engine.tick(token) {
                    Ok(events) => emit(&mut sink, events),
                    Err(stale) => debug!(%stale, "tick dropped"),
                }
                sync_ticker(&engine, &mut ticker, options.tick_period, false);
            }
        }
        status.send_replace(engine.snapshot(options.lookahead));
    }

    engine.dispose();
    drop(ticker);
    let last = engine.snapshot(options.lookahead);
    status.send_replace(last.clone());
    info!(finished = last.finished, "workout session task stopped");
    last
}

/// Resolves at the next tick of the live interval; never while stopped.
async fn next_tick(ticker: &mut Option<Ticker>) -> TickToken {
    match ticker {
        Some(t) => {
            t.interval.tick().await;
            t.token
        }
        None => std::future::pending().await,
    }
}

/// Keep exactly one interval alive while the engine runs and none otherwise.
fn sync_ticker(
    engine: &PlaybackEngine,
    ticker: &mut Option<Ticker>,
    period: Duration,
    restart: bool,
) {
    if !engine.is_running() {
        if ticker.take().is_some() {
            debug!("tick source torn down");
        }
        return;
    }

    let token = engine.tick_token();
    let current = ticker.as_ref().is_some_and(|t| t.token == token);
    if current && !restart {
        return;
    }

    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    *ticker = Some(Ticker { interval, token });
    debug!(generation = token.generation(), "tick source armed");
}

fn emit(sink: &mut Box<dyn NotificationSink>, events: impl IntoIterator<Item = Event>) {
    for event in events {
        sink.notify(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::{Round, Routine};
    use crate::timer::PhaseKind;
    use std::sync::{Arc, Mutex};

    const TICK: Duration = Duration::from_millis(10);

    fn options() -> SessionOptions {
        SessionOptions {
            tick_period: TICK,
            lookahead: 3,
        }
    }

    fn recording_sink() -> (Box<dyn NotificationSink>, Arc<Mutex<Vec<Event>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let seen = events.clone();
        let sink = move |e: &Event| seen.lock().unwrap().push(e.clone());
        (Box::new(sink), events)
    }

    fn engine(sets: u32, work: u64, rest: u64) -> PlaybackEngine {
        let routine = Routine::new("R").with_round(Round::new("Lift", sets, work, rest));
        PlaybackEngine::from_routine(&routine).unwrap()
    }

    #[tokio::test]
    async fn runs_to_completion() {
        let (sink, events) = recording_sink();
        let handle = WorkoutSession::spawn(engine(1, 3, 2), sink, options());

        let snap = handle.start().await.unwrap();
        assert!(snap.running);

        let done = tokio::time::timeout(Duration::from_secs(5), handle.wait_finished())
            .await
            .expect("session did not finish in time")
            .unwrap();
        assert!(done.finished);
        assert!(!done.running);

        let events = events.lock().unwrap();
        let started: Vec<PhaseKind> = events
            .iter()
            .filter_map(Event::started_phase)
            .map(|(_, p)| p.kind)
            .collect();
        assert_eq!(started, vec![PhaseKind::Work, PhaseKind::Rest]);
        let beeps = events
            .iter()
            .filter(|e| matches!(e, Event::CountdownTick { .. }))
            .count();
        assert_eq!(beeps, 2);
        assert!(matches!(events.last(), Some(Event::SessionFinished { .. })));
    }

    #[tokio::test]
    async fn pause_freezes_progress() {
        let (sink, _events) = recording_sink();
        let handle = WorkoutSession::spawn(engine(1, 1000, 10), sink, options());

        handle.start().await.unwrap();
        tokio::time::sleep(TICK * 4).await;
        let paused = handle.pause().await.unwrap();
        assert!(!paused.running);

        tokio::time::sleep(TICK * 10).await;
        let later = handle.snapshot();
        assert_eq!(later.index, paused.index);
        assert_eq!(later.remaining_secs, paused.remaining_secs);
    }

    #[tokio::test]
    async fn insert_break_via_handle() {
        let (sink, _events) = recording_sink();
        let handle = WorkoutSession::spawn(engine(2, 1000, 10), sink, options());
        handle.start().await.unwrap();

        assert_eq!(
            handle.insert_break(true, 0).await.unwrap_err(),
            PlaybackError::InvalidDuration(0)
        );

        let snap = handle.insert_break(true, 500).await.unwrap();
        assert_eq!(snap.kind, Some(PhaseKind::ManualBreak));
        assert_eq!(snap.index, 1);
        assert_eq!(snap.total_phases, 5);
        assert!(snap.running);
        assert_eq!(snap.upcoming[0].kind, PhaseKind::Rest);
    }

    #[tokio::test]
    async fn reset_stops_ticking() {
        let (sink, _events) = recording_sink();
        let handle = WorkoutSession::spawn(engine(1, 1000, 10), sink, options());
        handle.start().await.unwrap();
        tokio::time::sleep(TICK * 3).await;

        let reset = handle.reset().await.unwrap();
        assert_eq!(reset.remaining_secs, 1000);
        tokio::time::sleep(TICK * 5).await;
        assert_eq!(handle.snapshot().remaining_secs, 1000);
    }

    #[tokio::test]
    async fn stop_disposes_session() {
        let (sink, _events) = recording_sink();
        let handle = WorkoutSession::spawn(engine(1, 1000, 10), sink, options());
        handle.start().await.unwrap();

        let last = handle.stop().await.unwrap();
        assert!(!last.running);
        assert!(!last.finished);
    }
}
