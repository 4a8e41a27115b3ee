//! Sliding-window price history per instrument.

use crate::error::EngineError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// One retained price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// What `record` did with a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Appended,
    /// Same timestamp and price as the newest sample; nothing changed.
    Duplicate,
    /// Same timestamp as the newest sample with a new price; latest wins.
    Replaced,
    /// Older than the newest sample; dropped.
    OutOfOrder,
    /// Non-finite or non-positive price; dropped.
    Invalid,
}

impl RecordStatus {
    pub fn changed(&self) -> bool {
        matches!(self, RecordStatus::Appended | RecordStatus::Replaced)
    }
}

/// Price samples for a single instrument, strictly increasing in time.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    window: Duration,
    samples: VecDeque<PriceSample>,
}

impl PriceHistory {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    pub fn record(&mut self, price: f64, timestamp: DateTime<Utc>) -> RecordStatus {
        if !price.is_finite() || price <= 0.0 {
            return RecordStatus::Invalid;
        }

        if let Some(last) = self.samples.back_mut() {
            if timestamp < last.timestamp {
                return RecordStatus::OutOfOrder;
            }
            if timestamp == last.timestamp {
                if last.price == price {
                    return RecordStatus::Duplicate;
                }
                last.price = price;
                return RecordStatus::Replaced;
            }
        }

        self.samples.push_back(PriceSample { price, timestamp });
        self.evict(timestamp);
        RecordStatus::Appended
    }

    /// Drops samples older than the window but keeps the newest one at or
    /// before the cutoff, so a lookback as long as the window still resolves.
    fn evict(&mut self, now: DateTime<Utc>) {
        let Some(cutoff) = now.checked_sub_signed(self.window) else {
            return;
        };
        while self.samples.get(1).is_some_and(|s| s.timestamp <= cutoff) {
            self.samples.pop_front();
        }
    }

    pub fn latest(&self) -> Option<PriceSample> {
        self.samples.back().copied()
    }

    /// Closest sample at or before `instant`.
    pub fn sample_at_or_before(&self, instant: DateTime<Utc>) -> Option<PriceSample> {
        let idx = self.samples.partition_point(|s| s.timestamp <= instant);
        if idx == 0 {
            None
        } else {
            self.samples.get(idx - 1).copied()
        }
    }

    /// Closest sample at or before `seconds` before the newest sample.
    ///
    /// Offsets that do not fit a timestamp resolve to `None`.
    pub fn sample_n_seconds_ago(&self, seconds: u64) -> Option<PriceSample> {
        let latest = self.latest()?;
        let offset = Duration::try_seconds(i64::try_from(seconds).ok()?)?;
        self.sample_at_or_before(latest.timestamp.checked_sub_signed(offset)?)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceSample> {
        self.samples.iter()
    }
}

/// Independent price histories keyed by instrument.
#[derive(Debug, Clone)]
pub struct PriceHistoryBuffer {
    window: Duration,
    instruments: HashMap<String, PriceHistory>,
}

impl PriceHistoryBuffer {
    pub fn new(window_seconds: u64) -> Self {
        Self {
            window: Duration::seconds(window_seconds as i64),
            instruments: HashMap::new(),
        }
    }

    pub fn record(&mut self, instrument: &str, price: f64, timestamp: DateTime<Utc>) -> RecordStatus {
        if let Some(history) = self.instruments.get_mut(instrument) {
            return history.record(price, timestamp);
        }
        let mut history = PriceHistory::new(self.window);
        let status = history.record(price, timestamp);
        if status.changed() {
            self.instruments.insert(instrument.to_string(), history);
        }
        status
    }

    pub fn history(&self, instrument: &str) -> Option<&PriceHistory> {
        self.instruments.get(instrument)
    }

    pub fn latest(&self, instrument: &str) -> Option<PriceSample> {
        self.history(instrument)?.latest()
    }

    pub fn sample_n_seconds_ago(&self, instrument: &str, seconds: u64) -> Result<PriceSample, EngineError> {
        self.history(instrument)
            .and_then(|h| h.sample_n_seconds_ago(seconds))
            .ok_or_else(|| EngineError::InsufficientHistory {
                instrument: instrument.to_string(),
                seconds,
            })
    }

    /// Price at or before `seconds` ago, measured from the newest tick.
    ///
    /// `InsufficientHistory` means "cannot evaluate yet", never zero.
    pub fn price_n_seconds_ago(&self, instrument: &str, seconds: u64) -> Result<f64, EngineError> {
        self.sample_n_seconds_ago(instrument, seconds).map(|s| s.price)
    }

    pub fn remove(&mut self, instrument: &str) -> Option<PriceHistory> {
        self.instruments.remove(instrument)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.instruments.keys().map(String::as_str)
    }
}
