use crate::config::TypingConfig;

/// Typing-pace state machine used to hint precompute (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingState {
    Idle,
    Typing,
    FastTyping,
    Paused,
}

/// Result of feeding a keystroke into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingEvent {
    pub state: TypingState,
    /// A pause long enough to warrant a suggestion request (§4.10).
    pub emit_suggestion_request: bool,
}

pub struct TypingTracker {
    state: TypingState,
    last_keystroke_ms: Option<i64>,
    fast_threshold_ms: i64,
    pause_threshold_ms: i64,
    idle_timeout_ms: i64,
}

impl TypingTracker {
    pub fn new(config: &TypingConfig) -> Self {
        Self {
            state: TypingState::Idle,
            last_keystroke_ms: None,
            fast_threshold_ms: config.fast_threshold_ms,
            pause_threshold_ms: config.pause_threshold_ms,
            idle_timeout_ms: config.idle_timeout_ms,
        }
    }

    pub fn state(&self) -> TypingState {
        self.state
    }

    /// Feed a keystroke at `now_ms`. The inter-keystroke delta determines
    /// the new state (§4.10): `< fast_threshold` is `FastTyping`,
    /// `> pause_threshold` is `Paused` (and should trigger a suggestion
    /// request), everything in between is plain `Typing`.
    pub fn on_keystroke(&mut self, now_ms: i64) -> TypingEvent {
        let new_state = match self.last_keystroke_ms {
            None => TypingState::Typing,
            Some(last) => {
                let delta = now_ms - last;
                if delta < self.fast_threshold_ms {
                    TypingState::FastTyping
                } else if delta > self.pause_threshold_ms {
                    TypingState::Paused
                } else {
                    TypingState::Typing
                }
            }
        };
        self.last_keystroke_ms = Some(now_ms);
        self.state = new_state;
        TypingEvent {
            state: new_state,
            emit_suggestion_request: new_state == TypingState::Paused,
        }
    }

    /// Called on a timer (not driven by keystrokes) to catch the
    /// "idle_timeout since last keystroke" transition (§4.10). Returns
    /// true if this call moved the tracker into `Idle`.
    pub fn poll_idle(&mut self, now_ms: i64) -> bool {
        if self.state == TypingState::Idle {
            return false;
        }
        match self.last_keystroke_ms {
            Some(last) if now_ms - last > self.idle_timeout_ms => {
                self.state = TypingState::Idle;
                true
            }
            _ => false,
        }
    }
}
