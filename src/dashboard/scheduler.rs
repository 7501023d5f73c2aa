/// What a single one-second tick asks the session to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub countdown_fired: bool,
    pub interval_fired: bool,
}

impl TickOutcome {
    /// Both triggers landing on the same tick still mean one refresh.
    pub fn should_refresh(&self) -> bool {
        self.countdown_fired || self.interval_fired
    }
}

/// Countdown timer driving the refresh cycle, with an optional second
/// fixed-interval trigger that ignores the countdown.
#[derive(Debug, Clone)]
pub struct PollScheduler {
    period: u32,
    countdown: u32,
    fixed_interval: Option<FixedInterval>,
}

#[derive(Debug, Clone)]
struct FixedInterval {
    every: u32,
    elapsed: u32,
}

impl PollScheduler {
    /// Starts at zero so the first tick refreshes straight away.
    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1),
            countdown: 0,
            fixed_interval: None,
        }
    }

    pub fn with_fixed_interval(mut self, every: u32) -> Self {
        self.fixed_interval = Some(FixedInterval {
            every: every.max(1),
            elapsed: 0,
        });
        self
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn remaining(&self) -> u32 {
        self.countdown
    }

    /// Advance one second.
    pub fn tick(&mut self) -> TickOutcome {
        self.countdown = self.countdown.saturating_sub(1);
        let countdown_fired = self.countdown == 0;
        if countdown_fired {
            self.countdown = self.period;
        }

        let interval_fired = match &mut self.fixed_interval {
            Some(interval) => {
                interval.elapsed += 1;
                if interval.elapsed >= interval.every {
                    interval.elapsed = 0;
                    true
                } else {
                    false
                }
            }
            None => false,
        };

        TickOutcome {
            countdown_fired,
            interval_fired,
        }
    }

    /// Make the next tick refresh.
    pub fn force_refresh(&mut self) {
        self.countdown = 0;
    }
}
