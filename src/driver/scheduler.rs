use std::future;
use std::time::Duration;

use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};

/// Periodic clock for driving a session.
///
/// Supports retuning the period mid-game, pausing (ticks are withheld until
/// resumed) and a one-off hold such as a start countdown. `tick` is safe to
/// use as a `tokio::select!` branch: dropping it never loses a hold.
pub struct TickScheduler {
    interval: Interval,
    period: Duration,
    paused: bool,
    hold_until: Option<Instant>,
}

impl TickScheduler {
    /// First tick fires one period from now
    pub fn new(period: Duration) -> Self {
        Self {
            interval: Self::make_interval(period),
            period,
            paused: false,
            hold_until: None,
        }
    }

    fn make_interval(period: Duration) -> Interval {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Change the tick period; the next tick fires one new period from now
    pub fn retune(&mut self, period: Duration) {
        if period != self.period {
            self.period = period;
            self.interval = Self::make_interval(period);
        }
    }

    /// Start over at `period`: unpaused, no hold, first tick one period from now
    pub fn restart(&mut self, period: Duration) {
        self.period = period;
        self.interval = Self::make_interval(period);
        self.paused = false;
        self.hold_until = None;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume ticking; the next tick fires one period from now
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.interval.reset();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Withhold ticks for `duration`, then tick one period later
    pub fn hold_for(&mut self, duration: Duration) {
        self.hold_until = Some(Instant::now() + duration);
    }

    pub fn is_holding(&self) -> bool {
        self.hold_until.is_some_and(|until| until > Instant::now())
    }

    /// Wait for the next tick
    pub async fn tick(&mut self) -> Instant {
        if let Some(until) = self.hold_until {
            sleep_until(until).await;
            self.hold_until = None;
            self.interval.reset();
        }

        if self.paused {
            future::pending::<()>().await;
        }

        self.interval.tick().await
    }
}
