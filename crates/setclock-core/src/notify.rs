//! Notification sinks.
//!
//! The playback engine only produces [`Event`]s. Sinks decide what to do with
//! them: play a cue, persist a timestamp, print a line. Mute state lives here
//! and is never consulted by the engine.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::events::Event;

static MUTED: AtomicBool = AtomicBool::new(false);

/// Silence every [`AudioCues`] sink in the process.
pub fn set_muted(muted: bool) {
    MUTED.store(muted, Ordering::Relaxed);
}

pub fn is_muted() -> bool {
    MUTED.load(Ordering::Relaxed)
}

/// Receives session events on the tick path. Must not block.
pub trait NotificationSink: Send {
    fn notify(&mut self, event: &Event);
}

impl<F> NotificationSink for F
where
    F: FnMut(&Event) + Send,
{
    fn notify(&mut self, event: &Event) {
        self(event)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&mut self, _event: &Event) {}
}

/// Forwards each event to several sinks, in order.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl NotificationSink for Fanout {
    fn notify(&mut self, event: &Event) {
        for sink in &mut self.sinks {
            sink.notify(event);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    Start,
    Beep,
    Rest,
    Finish,
}

impl Cue {
    /// Work phases get the start cue, every other phase the rest cue.
    pub fn for_event(event: &Event) -> Option<Cue> {
        match event {
            Event::PhaseStarted { phase, .. } if phase.kind.is_work() => Some(Cue::Start),
            Event::PhaseStarted { .. } => Some(Cue::Rest),
            Event::CountdownTick { .. } => Some(Cue::Beep),
            Event::SessionFinished { .. } => Some(Cue::Finish),
            _ => None,
        }
    }
}

/// Whatever actually makes the noise.
pub trait CuePlayer: Send {
    fn play(&mut self, cue: Cue);
}

/// Maps events to cues and plays them unless muted.
pub struct AudioCues<P> {
    player: P,
}

impl<P: CuePlayer> AudioCues<P> {
    pub fn new(player: P) -> Self {
        Self { player }
    }

    pub fn into_inner(self) -> P {
        self.player
    }
}

impl<P: CuePlayer> NotificationSink for AudioCues<P> {
    fn notify(&mut self, event: &Event) {
        if is_muted() {
            return;
        }
        if let Some(cue) = Cue::for_event(event) {
            self.player.play(cue);
        }
    }
}
