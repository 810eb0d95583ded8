//! Whole-second round countdown and the round-to-round duration schedule.

/// How the starting duration evolves from one round to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSchedule {
    /// Duration of the first round, in seconds.
    pub initial_secs: u32,
    /// Floor applied when shrinking the duration.
    pub minimum_secs: u32,
    /// Seconds removed from the duration at each round advance.
    pub step_secs: u32,
}

impl Default for ClockSchedule {
    fn default() -> Self {
        Self {
            initial_secs: 30,
            minimum_secs: 5,
            step_secs: 1,
        }
    }
}

impl ClockSchedule {
    /// Duration of the round that follows one lasting `previous_secs`.
    pub fn next_duration(&self, previous_secs: u32) -> u32 {
        previous_secs
            .saturating_sub(self.step_secs)
            .max(self.minimum_secs)
    }

    /// Duration of the given 1-based round.
    pub fn duration_for_round(&self, round: u32) -> u32 {
        (1..round.max(1)).fold(self.initial_secs, |secs, _| self.next_duration(secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockState {
    Stopped,
    Running,
    Expired,
}

/// Result of advancing the clock by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// The clock is not running; nothing happened.
    Idle,
    /// One second elapsed and the countdown is still above zero.
    Running {
        /// Seconds left after this tick.
        remaining_secs: u32,
    },
    /// The countdown reached zero on this tick. Reported once per start.
    Expired,
}

/// Countdown for a single round.
///
/// Every [`RoundClock::start`] opens a new epoch. Drivers tag their ticks with
/// the epoch they were started for so a late tick from a previous epoch is
/// recognised and dropped.
#[derive(Debug, Clone)]
pub struct RoundClock {
    duration_secs: u32,
    remaining_secs: u32,
    epoch: u64,
    state: ClockState,
}

impl Default for RoundClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundClock {
    /// Create a stopped clock.
    pub fn new() -> Self {
        Self {
            duration_secs: 0,
            remaining_secs: 0,
            epoch: 0,
            state: ClockState::Stopped,
        }
    }

    /// Restart the countdown from `duration_secs`, returning the new epoch.
    pub fn start(&mut self, duration_secs: u32) -> u64 {
        self.duration_secs = duration_secs;
        self.remaining_secs = duration_secs;
        self.epoch += 1;
        self.state = ClockState::Running;
        self.epoch
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> ClockTick {
        if self.state != ClockState::Running {
            return ClockTick::Idle;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = ClockState::Expired;
            ClockTick::Expired
        } else {
            ClockTick::Running {
                remaining_secs: self.remaining_secs,
            }
        }
    }

    /// Advance by one second only if `epoch` is the one currently running.
    pub fn tick_for(&mut self, epoch: u64) -> ClockTick {
        if epoch != self.epoch {
            return ClockTick::Idle;
        }
        self.tick()
    }

    /// Halt the countdown; no expiry can be reported until the next start.
    pub fn stop(&mut self) {
        if self.state == ClockState::Running {
            self.state = ClockState::Stopped;
        }
    }

    /// Epoch of the most recent start.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the countdown is in progress.
    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Whether the last countdown ran out rather than being stopped.
    pub fn has_expired(&self) -> bool {
        self.state == ClockState::Expired
    }

    /// Starting duration of the current countdown.
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Seconds left in the current countdown.
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Whether the remaining time is at or under `threshold_secs`.
    pub fn is_fast(&self, threshold_secs: u32) -> bool {
        self.is_running() && self.remaining_secs <= threshold_secs
    }
}
