use tracing::{debug, info, warn};

use crate::config::{SessionConfig, LEFT_COUNTDOWN_LABEL, RIGHT_COUNTDOWN_LABEL};
use crate::recorder::Hand;

/// Stage of a two-hand session. Phases only ever move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum SessionPhase {
    Idle,
    CountdownRight,
    ActiveRight,
    CountdownLeft,
    ActiveLeft,
    Finished,
}

impl SessionPhase {
    /// Phase that follows `self` in a session
    pub fn next(self) -> SessionPhase {
        use SessionPhase::*;
        match self {
            Idle => CountdownRight,
            CountdownRight => ActiveRight,
            ActiveRight => CountdownLeft,
            CountdownLeft => ActiveLeft,
            ActiveLeft | Finished => Finished,
        }
    }

    /// Hand whose zone spawns targets and accepts taps in this phase
    pub fn active_hand(self) -> Option<Hand> {
        match self {
            SessionPhase::ActiveRight => Some(Hand::Right),
            SessionPhase::ActiveLeft => Some(Hand::Left),
            _ => None,
        }
    }

    pub fn is_countdown(self) -> bool {
        matches!(
            self,
            SessionPhase::CountdownRight | SessionPhase::CountdownLeft
        )
    }

    pub fn is_finished(self) -> bool {
        self == SessionPhase::Finished
    }
}

/// A labelled count down shown while a countdown phase runs
#[derive(Clone, Debug, PartialEq)]
pub struct Countdown {
    label: String,
    remaining: u32,
}

impl Countdown {
    pub fn new(label: impl Into<String>, seconds: u32) -> Self {
        Self {
            label: label.into(),
            remaining: seconds,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn text(&self) -> String {
        format!("{} {}...", self.label, self.remaining)
    }

    /// Count one second down; true once zero is reached
    fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// Drives a session through its phases, one tick per time unit
#[derive(Debug, Clone)]
pub struct Sequencer {
    countdown_secs: u32,
    trial_secs: u32,
    phase: SessionPhase,
    countdown: Option<Countdown>,
    trial_elapsed: u32,
}

impl Sequencer {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            countdown_secs: config.countdown_secs,
            trial_secs: config.trial_secs,
            phase: SessionPhase::Idle,
            countdown: None,
            trial_elapsed: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref()
    }

    /// Seconds left on the running countdown, if any
    pub fn countdown_remaining(&self) -> Option<u32> {
        self.countdown.as_ref().map(Countdown::remaining)
    }

    pub fn active_hand(&self) -> Option<Hand> {
        self.phase.active_hand()
    }

    pub fn is_active(&self, hand: Hand) -> bool {
        self.active_hand() == Some(hand)
    }

    /// Ticks spent in the current trial
    pub fn trial_elapsed(&self) -> u32 {
        self.trial_elapsed
    }

    /// Leave `Idle`. Returns the phase entered, or `None` if the session already ran.
    pub fn start(&mut self) -> Option<SessionPhase> {
        if self.phase != SessionPhase::Idle {
            warn!(phase = %self.phase, "start ignored, session already started");
            return None;
        }
        Some(self.enter(SessionPhase::CountdownRight))
    }

    /// Restart the current countdown phase with a new label and length.
    ///
    /// The phase it leads to is still decided by [`SessionPhase::next`]. Outside a
    /// countdown phase this is a no-op and returns false.
    pub fn restart_countdown(&mut self, label: impl Into<String>, seconds: u32) -> bool {
        if !self.phase.is_countdown() {
            warn!(phase = %self.phase, "countdown restart ignored outside a countdown phase");
            return false;
        }
        self.run_countdown(Countdown::new(label, seconds));
        true
    }

    /// Advance one time unit. Returns the phase entered on this tick, if any.
    pub fn tick(&mut self) -> Option<SessionPhase> {
        if let Some(countdown) = self.countdown.as_mut() {
            if !countdown.tick() {
                return None;
            }
            self.countdown = None;
            return Some(self.enter(self.phase.next()));
        }

        self.active_hand()?;
        self.trial_elapsed += 1;
        if self.trial_elapsed >= self.trial_secs {
            Some(self.enter(self.phase.next()))
        } else {
            None
        }
    }

    fn run_countdown(&mut self, countdown: Countdown) {
        if let Some(prev) = self.countdown.replace(countdown) {
            debug!(label = prev.label(), remaining = prev.remaining(), "countdown replaced");
        }
    }

    fn enter(&mut self, phase: SessionPhase) -> SessionPhase {
        self.phase = phase;
        self.trial_elapsed = 0;

        match phase {
            SessionPhase::CountdownRight => {
                self.run_countdown(Countdown::new(RIGHT_COUNTDOWN_LABEL, self.countdown_secs))
            }
            SessionPhase::CountdownLeft => {
                self.run_countdown(Countdown::new(LEFT_COUNTDOWN_LABEL, self.countdown_secs))
            }
            _ => {}
        }

        info!(%phase, "entered phase");
        phase
    }
}
