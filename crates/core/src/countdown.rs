//! One-second countdown for a timed attempt.
//!
//! [`SessionClock`] only counts; whoever owns it decides when a second has
//! passed (a tokio interval in production, a loop in tests).

/// Remaining time under which the timer display switches to its urgent style.
pub const URGENCY_THRESHOLD_SECS: i64 = 300;

/// Result of [`SessionClock::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStart {
    Started,
    /// The clock was already running; nothing changed.
    AlreadyRunning,
    /// The budget was zero or negative: expired without ticking.
    Expired,
}

/// Emitted once per tick while the clock runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub remaining: i64,
    /// Set on the single tick that reached zero. No ticks follow it.
    pub expired: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionClock {
    remaining: i64,
    running: bool,
    expired: bool,
}

impl SessionClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the countdown with `total_secs`.
    ///
    /// A running clock is left untouched; restarting requires [`stop`](Self::stop).
    pub fn start(&mut self, total_secs: i64) -> ClockStart {
        if self.running {
            return ClockStart::AlreadyRunning;
        }
        if total_secs <= 0 {
            self.remaining = 0;
            self.expired = true;
            return ClockStart::Expired;
        }
        self.remaining = total_secs;
        self.expired = false;
        self.running = true;
        ClockStart::Started
    }

    /// Advances one second. Returns `None` when the clock is not running.
    pub fn tick(&mut self) -> Option<ClockTick> {
        if !self.running {
            return None;
        }
        self.remaining -= 1;
        let expired = self.remaining <= 0;
        if expired {
            self.remaining = 0;
            self.running = false;
            self.expired = true;
        }
        Some(ClockTick {
            remaining: self.remaining,
            expired,
        })
    }

    /// Cancels the countdown. Safe to call at any time.
    pub fn stop(&mut self) {
        self.running = false;
    }

    #[must_use]
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn has_expired(&self) -> bool {
        self.expired
    }
}

/// `MM:SS`, both zero-padded. Negative values render as `00:00`.
#[must_use]
pub fn format_remaining(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[must_use]
pub fn is_urgent(secs: i64) -> bool {
    secs < URGENCY_THRESHOLD_SECS
}
