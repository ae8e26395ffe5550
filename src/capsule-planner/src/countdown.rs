//! Time remaining until a capsule opens.
//!
//! [`remaining`] is a pure function of two instants. [`CountdownClock::run`] re-evaluates it
//! on a fixed interval; it never accumulates offsets, so a late tick only delays the update.

use std::time::Duration as StdDuration;

use capsule_types::Capsule;
use serde::Serialize;
use time::{Duration, OffsetDateTime, UtcOffset};
use tokio::{
    sync::watch,
    time::{interval, MissedTickBehavior},
};
use tracing::debug;

use crate::{clock::Clock, utils::calendar::{add_months, months_between}};

const UNIT_NAMES: [(&str, &str); 6] = [
    ("year", "years"),
    ("month", "months"),
    ("day", "days"),
    ("hour", "hours"),
    ("minute", "minutes"),
    ("second", "seconds"),
];

/// Calendar breakdown of the time left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Remaining {
    pub total: Duration,
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Remaining {
    pub fn units(&self) -> [u32; 6] {
        [
            self.years,
            self.months,
            self.days,
            self.hours,
            self.minutes,
            self.seconds,
        ]
    }

    /// Largest non-zero units first, at most `max_units` of them: `"2 days and 3 hours"`.
    pub fn render(&self, max_units: usize) -> String {
        let words: Vec<String> = self
            .units()
            .into_iter()
            .zip(UNIT_NAMES)
            .filter(|(n, _)| *n > 0)
            .take(max_units.max(1))
            .map(|(n, (one, many))| format!("{n} {}", if n == 1 { one } else { many }))
            .collect();

        match words.as_slice() {
            [] => "0 seconds".to_string(),
            [only] => only.clone(),
            [init @ .., last] => format!("{} and {last}", init.join(", ")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownState {
    Locked(Remaining),
    Open,
}

impl CountdownState {
    pub fn is_open(&self) -> bool {
        matches!(self, CountdownState::Open)
    }

    pub fn remaining(&self) -> Option<&Remaining> {
        match self {
            CountdownState::Locked(remaining) => Some(remaining),
            CountdownState::Open => None,
        }
    }

    pub fn render(&self, max_units: usize) -> String {
        match self {
            CountdownState::Locked(remaining) => remaining.render(max_units),
            CountdownState::Open => "Open".to_string(),
        }
    }
}

/// Time left from `now` until `target`; `Open` once `now >= target`.
///
/// Calendar units are counted in UTC whatever offsets the two instants carry.
pub fn remaining(now: OffsetDateTime, target: OffsetDateTime) -> CountdownState {
    if now >= target {
        return CountdownState::Open;
    }
    let now = now.to_offset(UtcOffset::UTC);
    let target = target.to_offset(UtcOffset::UTC);

    let months = months_between(now, target);
    // `months_between` only counts steps that land at or before `target`.
    let anchor = add_months(now, months).unwrap_or(now);
    let rest = target - anchor;

    CountdownState::Locked(Remaining {
        total: target - now,
        years: months / 12,
        months: months % 12,
        days: rest.whole_days() as u32,
        hours: (rest.whole_hours() % 24) as u32,
        minutes: (rest.whole_minutes() % 60) as u32,
        seconds: (rest.whole_seconds() % 60) as u32,
    })
}

/// Repeating countdown towards a fixed instant.
#[derive(Clone, Copy, Debug)]
pub struct CountdownClock {
    target: OffsetDateTime,
    interval: StdDuration,
}

impl CountdownClock {
    pub fn new(target: OffsetDateTime) -> Self {
        Self {
            target,
            interval: StdDuration::from_secs(1),
        }
    }

    pub fn with_interval(mut self, interval: StdDuration) -> Self {
        self.interval = interval;
        self
    }

    pub fn target(&self) -> OffsetDateTime {
        self.target
    }

    pub fn state_at(&self, now: OffsetDateTime) -> CountdownState {
        remaining(now, self.target)
    }

    /// Publish the state every interval until the capsule opens or every receiver is gone.
    pub async fn run<C>(&self, clock: &C, updates: watch::Sender<CountdownState>)
    where
        C: Clock + ?Sized,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = updates.closed() => {
                    debug!(target_at = %self.target, "countdown observers gone");
                    return;
                }
            }

            let state = self.state_at(clock.now());
            let open = state.is_open();
            if updates.send(state).is_err() {
                return;
            }
            if open {
                debug!(target_at = %self.target, "capsule open, countdown finished");
                return;
            }
        }
    }
}

/// What a capsule looks like on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapsuleVisual {
    /// Distribution date not reached.
    Locked,
    /// Open with funds left to claim.
    Ready,
    /// Open and fully claimed.
    Open,
}

pub fn capsule_visual(capsule: &Capsule, now: OffsetDateTime) -> CapsuleVisual {
    if !capsule.is_open(now) {
        CapsuleVisual::Locked
    } else if capsule.empty {
        CapsuleVisual::Open
    } else {
        CapsuleVisual::Ready
    }
}
