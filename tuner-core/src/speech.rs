//! # Announcement Scheduling Module
//!
//! Serializes spoken announcements: at most one utterance is in flight
//! at any time, a new request supersedes the current one, and a cooldown
//! keeps back-to-back announcements from chaining. The synthesis
//! mechanism itself stays behind the [`SpeechSink`] trait; the scheduler
//! only tracks completion.

use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, TryRecvError};

/// Final report of a single utterance. The sink sends exactly one of
/// these per `speak` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// The utterance played to the end.
    Completed,
    /// Synthesis or playback failed.
    Errored(String),
}

/// An asynchronous speech output.
///
/// `speak` must return immediately; the utterance plays in the
/// background and its [`SpeechOutcome`] arrives on the returned channel.
/// `cancel` interrupts the current utterance, if any. A cancelled
/// utterance need not deliver an outcome.
pub trait SpeechSink: Send {
    fn speak(&mut self, text: &str) -> Receiver<SpeechOutcome>;
    fn cancel(&mut self);
}

/// Sink that discards utterances and reports immediate completion.
///
/// Useful for tests and for frontends that only want the visual channel.
pub struct NullSpeech;

impl SpeechSink for NullSpeech {
    fn speak(&mut self, _text: &str) -> Receiver<SpeechOutcome> {
        let (tx, rx) = bounded(1);
        let _ = tx.send(SpeechOutcome::Completed);
        rx
    }

    fn cancel(&mut self) {}
}

/// Owns the speech sink and enforces the single-utterance discipline.
///
/// The speaking flag is the occupancy of `in_flight`: holding the
/// completion receiver in an `Option` makes at-most-one-in-flight a
/// structural property rather than a boolean to keep in sync.
pub struct AnnouncementScheduler {
    sink: Box<dyn SpeechSink>,
    enabled: bool,
    cooldown: Duration,
    in_flight: Option<Receiver<SpeechOutcome>>,
    last_finished: Option<Instant>,
}

impl AnnouncementScheduler {
    pub fn new(sink: Box<dyn SpeechSink>, cooldown: Duration) -> Self {
        Self {
            sink,
            enabled: true,
            cooldown,
            in_flight: None,
            last_finished: None,
        }
    }

    /// Requests an announcement.
    ///
    /// Dropped without reaching the sink when speech is disabled or when
    /// the previous utterance finished less than the cooldown ago.
    /// Otherwise any in-flight utterance is cancelled first
    /// (last-request-wins) and the new one is issued.
    ///
    /// # Returns
    /// * `true` - The request was handed to the sink
    /// * `false` - The request was dropped
    pub fn announce(&mut self, text: &str, now: Instant) -> bool {
        if !self.enabled {
            log::debug!("not announcing: speech is off");
            return false;
        }
        if let Some(finished) = self.last_finished {
            if now.duration_since(finished) < self.cooldown {
                log::debug!("not announcing: cooling down");
                return false;
            }
        }
        if self.in_flight.take().is_some() {
            self.sink.cancel();
        }

        log::info!("announcing: \"{text}\"");
        self.in_flight = Some(self.sink.speak(text));
        true
    }

    /// Polls the in-flight utterance without blocking.
    ///
    /// On completion or error the speaking flag clears and the cooldown
    /// clock restarts. A sink that drops its sender without reporting is
    /// treated as an error; either way the cycle continues.
    pub fn poll(&mut self, now: Instant) {
        let outcome = match &self.in_flight {
            None => return,
            Some(receiver) => match receiver.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    SpeechOutcome::Errored("speech output vanished without reporting".into())
                }
            },
        };

        match &outcome {
            SpeechOutcome::Completed => log::debug!("speech ended"),
            SpeechOutcome::Errored(reason) => log::warn!("speech error: {reason}"),
        }
        self.in_flight = None;
        self.last_finished = Some(now);
    }

    /// Whether an utterance is currently in flight.
    pub fn is_speaking(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Interrupts the in-flight utterance, if any. Safe to call at any
    /// time, from any state.
    pub fn cancel(&mut self) {
        if self.in_flight.take().is_some() {
            self.sink.cancel();
        }
    }

    /// Turns the audible channel on or off. Turning it off interrupts
    /// the current utterance immediately.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.cancel();
        }
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}
