/// What a single tick did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time remains; carries the new remaining seconds.
    Running(u32),
    /// This tick reached zero. Returned exactly once per countdown.
    Expired,
    /// Already expired or frozen; nothing changed.
    Stopped,
}

/// Whole-second exam countdown.
///
/// Remaining time only ever decreases, never drops below zero, and stops
/// changing once frozen or expired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    expired: bool,
    frozen: bool,
}

impl Countdown {
    #[must_use]
    pub fn new(duration_secs: u32) -> Self {
        Self {
            remaining: duration_secs,
            expired: false,
            frozen: false,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.expired && !self.frozen
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Stopped;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining)
        }
    }

    /// Stop the countdown at its current value.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// `M:SS`, e.g. `9:05`.
    #[must_use]
    pub fn format_remaining(&self) -> String {
        format_secs(self.remaining)
    }
}

#[must_use]
pub fn format_secs(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
