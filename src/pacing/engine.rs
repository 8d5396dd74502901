use std::time::{Duration, Instant};

use crate::config::{WPM_MAX, WPM_MIN};
use crate::script::tokenize::{Token, tokenize};

/// Observable pacing state, derived from cursor and running flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacingState {
    Idle,
    Running,
    Paused,
    /// `cursor == token_count`; forces `running = false`.
    Finished,
}

/// Emitted by [`PacingEngine::poll`] when the cursor moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacingEvent {
    Advanced { cursor: usize },
    /// The cursor reached the end of the script. The engine has already
    /// stopped itself; stopping an active recording is the coordinator's
    /// responsibility.
    Finished,
}

/// Clocked state machine advancing a cursor over the token sequence.
///
/// The engine holds at most one pending deadline inside its own state.
/// Every mutating operation recomputes or clears that single slot, so a
/// stale timer can never fire after `pause`, `reset`, or a seek: there is
/// no external timer queue to race against.
#[derive(Debug)]
pub struct PacingEngine {
    tokens: Vec<Token>,
    cursor: usize,
    rate_wpm: u32,
    running: bool,
    due: Option<Instant>,
}

impl PacingEngine {
    pub fn new(script: &str, rate_wpm: u32) -> Self {
        Self {
            tokens: tokenize(script),
            cursor: 0,
            rate_wpm: rate_wpm.clamp(WPM_MIN, WPM_MAX),
            running: false,
            due: None,
        }
    }

    /// Replace the script: re-tokenize, rewind, stop.
    pub fn load_script(&mut self, script: &str) {
        self.tokens = tokenize(script);
        self.cursor = 0;
        self.running = false;
        self.due = None;
        tracing::debug!(tokens = self.tokens.len(), "script loaded");
    }

    pub fn state(&self) -> PacingState {
        if self.cursor >= self.tokens.len() && !self.tokens.is_empty() {
            PacingState::Finished
        } else if self.tokens.is_empty() {
            // An empty script is treated as already finished.
            PacingState::Finished
        } else if self.running {
            PacingState::Running
        } else if self.cursor == 0 {
            PacingState::Idle
        } else {
            PacingState::Paused
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn rate_wpm(&self) -> u32 {
        self.rate_wpm
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Token currently under the cursor, `None` once finished.
    pub fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// Fraction of the script already consumed, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.tokens.is_empty() {
            return 1.0;
        }
        self.cursor as f32 / self.tokens.len() as f32
    }

    /// `Idle | Paused -> Running`; no-op when already running or finished.
    pub fn play(&mut self, now: Instant) {
        if self.running || self.state() == PacingState::Finished {
            return;
        }
        self.running = true;
        self.due = Some(now + self.delay_for_current());
        tracing::debug!(cursor = self.cursor, "pacing started");
    }

    /// `Running -> Paused`. Clears the pending deadline.
    pub fn pause(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.due = None;
        tracing::debug!(cursor = self.cursor, "pacing paused");
    }

    /// Flip running, unless finished.
    pub fn toggle(&mut self, now: Instant) {
        if self.running {
            self.pause();
        } else {
            self.play(now);
        }
    }

    /// Move the cursor by `delta`, clamped to `[0, token_count - 1]`.
    ///
    /// Legal in any state and does not change `running`; while running the
    /// deadline is re-armed from the token now under the cursor.
    pub fn seek(&mut self, delta: i64, now: Instant) {
        if self.tokens.is_empty() {
            return;
        }
        let max = (self.tokens.len() - 1) as i64;
        let target = (self.cursor as i64).saturating_add(delta).clamp(0, max);
        self.cursor = target as usize;
        if self.running {
            self.due = Some(now + self.delay_for_current());
        }
    }

    /// Set the pacing rate, clamped to `[50, 1000]` wpm.
    ///
    /// Takes effect on the next scheduled delay, not retroactively.
    pub fn set_rate(&mut self, rate_wpm: u32) {
        self.rate_wpm = rate_wpm.clamp(WPM_MIN, WPM_MAX);
    }

    /// Adjust the rate by a signed delta in wpm, clamped.
    pub fn adjust_rate(&mut self, delta: i32) {
        let next = (self.rate_wpm as i64).saturating_add(delta as i64);
        self.set_rate(next.clamp(WPM_MIN as i64, WPM_MAX as i64) as u32);
    }

    /// Rewind to the start and stop.
    pub fn reset(&mut self) {
        self.running = false;
        self.cursor = 0;
        self.due = None;
    }

    /// Delay the current token holds the display for, at the current rate.
    ///
    /// Terminal punctuation (`.`, `!`, `?`) doubles the base delay; a
    /// trailing comma holds for 1.5x.
    pub fn delay_for_current(&self) -> Duration {
        let base_ms = 60_000.0 / f64::from(self.rate_wpm);
        let multiplier = match self.current_token().and_then(Token::trailing_char) {
            Some('.' | '!' | '?') => 2.0,
            Some(',') => 1.5,
            _ => 1.0,
        };
        Duration::from_secs_f64(base_ms * multiplier / 1000.0)
    }

    /// Advance the clock. Returns an event when the pending deadline has
    /// elapsed; returns `None` while idle, paused, finished, or early.
    pub fn poll(&mut self, now: Instant) -> Option<PacingEvent> {
        if !self.running {
            return None;
        }
        let due = self.due?;
        if now < due {
            return None;
        }

        self.cursor += 1;
        if self.cursor >= self.tokens.len() {
            self.running = false;
            self.due = None;
            tracing::debug!("pacing finished");
            return Some(PacingEvent::Finished);
        }

        self.due = Some(now + self.delay_for_current());
        Some(PacingEvent::Advanced {
            cursor: self.cursor,
        })
    }
}
