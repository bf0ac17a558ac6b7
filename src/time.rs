use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

/// Clock abstracts access to the current time so the ledger stays deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current calendar date in the traveller's local time zone.
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }
}

/// Wall clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant and date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

impl FixedClock {
    pub fn on(today: NaiveDate) -> Self {
        let now = today
            .and_hms_opt(12, 0, 0)
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
            .unwrap_or_else(Utc::now);
        Self { now, today }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

/// Clock whose date stays fixed while each `now()` call advances by one second,
/// giving every created record a distinct timestamp.
#[derive(Debug)]
pub struct SteppingClock {
    start: DateTime<Utc>,
    today: NaiveDate,
    ticks: AtomicI64,
}

impl SteppingClock {
    pub fn on(today: NaiveDate) -> Self {
        let FixedClock { now, today } = FixedClock::on(today);
        Self {
            start: now,
            today,
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.start + Duration::seconds(tick)
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepping_clock_advances_per_call() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 10).unwrap();
        let clock = SteppingClock::on(date);
        let first = clock.now();
        let second = clock.now();
        assert!(second > first);
        assert_eq!(clock.today(), date);
    }
}
