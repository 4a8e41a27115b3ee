//! ATR (Average True Range) built from raw ticks

use crate::common::math;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct Bar {
    bucket: i64,
    high: f64,
    low: f64,
    close: f64,
}

/// Rolling ATR over fixed-length bars assembled from ticks.
///
/// A bar's true range is counted once the bar closes (the first tick of a
/// later bar arrives). The first completed bar only seeds the previous close.
/// The value is a simple average of the last `period` true ranges.
#[derive(Debug, Clone)]
pub struct RollingAtr {
    period: usize,
    bar_millis: i64,
    current: Option<Bar>,
    prev_close: Option<f64>,
    true_ranges: VecDeque<f64>,
}

impl RollingAtr {
    pub fn new(period: usize, bar_seconds: u64) -> Self {
        Self {
            period: period.max(1),
            bar_millis: Duration::seconds(bar_seconds.max(1) as i64).num_milliseconds(),
            current: None,
            prev_close: None,
            true_ranges: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn update(&mut self, price: f64, timestamp: DateTime<Utc>) {
        let bucket = timestamp.timestamp_millis().div_euclid(self.bar_millis);

        match self.current.as_mut() {
            Some(bar) if bar.bucket == bucket => {
                bar.high = bar.high.max(price);
                bar.low = bar.low.min(price);
                bar.close = price;
                return;
            }
            // Late tick for an already-closed bar.
            Some(bar) if bucket < bar.bucket => return,
            _ => {}
        }

        if let Some(closed) = self.current.take() {
            self.close_bar(closed);
        }
        self.current = Some(Bar {
            bucket,
            high: price,
            low: price,
            close: price,
        });
    }

    fn close_bar(&mut self, bar: Bar) {
        if let Some(prev_close) = self.prev_close {
            self.true_ranges.push_back(math::true_range(bar.high, bar.low, prev_close));
            if self.true_ranges.len() > self.period {
                self.true_ranges.pop_front();
            }
        }
        self.prev_close = Some(bar.close);
    }

    /// `None` until `period` true ranges have been collected.
    pub fn value(&self) -> Option<f64> {
        if self.true_ranges.len() < self.period {
            return None;
        }
        math::mean(self.true_ranges.iter().copied())
    }

    pub fn period(&self) -> usize {
        self.period
    }
}
