//! Bar series model
//!
//! Exchange kline payloads arrive as arrays of loosely typed values:
//! `[openTime, open, high, low, close, volume, ...ignored]`, with prices often
//! encoded as strings. Each numeric field is parsed on its own and any field
//! that is missing or not numeric becomes `0.0`. That leniency keeps a single
//! bad field from discarding a whole request, but a zero price is not safe for
//! downstream math (the log transform rejects it), so every coercion is logged.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::{PatternError, Result, OHLCV};

/// One raw exchange record
pub type RawRecord = Vec<Value>;

/// Sentinel for fields that could not be parsed
const COERCED: f64 = 0.0;

/// One OHLCV sample
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Build a bar from an epoch-millisecond open time
    pub fn from_millis(
        millis: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self> {
        let timestamp = DateTime::from_timestamp_millis(millis)
            .ok_or(PatternError::TimestampOutOfRange { millis })?;
        Ok(Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl OHLCV for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Chronologically ordered, immutable sequence of bars.
///
/// Never empty; timestamps strictly increase.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Wrap already-typed bars, checking finiteness and ordering
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(PatternError::EmptySeries);
        }
        if let Some(index) = bars.iter().position(|b| !b.is_finite()) {
            return Err(PatternError::MalformedRecord {
                index,
                reason: "non-finite OHLCV value".to_string(),
            });
        }
        if let Some(index) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(PatternError::NonIncreasingTimestamp { index: index + 1 });
        }
        Ok(Self { bars })
    }

    /// Normalize raw exchange records.
    pub fn from_raw<R: AsRef<[Value]>>(records: &[R]) -> Result<Self> {
        let mut coerced = 0usize;
        let mut bars = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let fields = record.as_ref();
            let mut field = |pos: usize| {
                parse_price(fields.get(pos)).unwrap_or_else(|| {
                    coerced += 1;
                    COERCED
                })
            };
            let (open, high, low, close, volume) =
                (field(1), field(2), field(3), field(4), field(5));

            let millis = parse_millis(fields.first()).unwrap_or_else(|| {
                coerced += 1;
                0
            });
            let timestamp = DateTime::from_timestamp_millis(millis)
                .ok_or(PatternError::InvalidTimestamp { index, millis })?;

            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        if coerced > 0 {
            warn!(
                coerced,
                records = records.len(),
                "coerced unparseable kline fields to 0"
            );
        }

        Self::new(bars)
    }

    /// Parse a whole kline payload (a JSON array of arrays).
    pub fn from_json(payload: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload).map_err(|e| PatternError::MalformedRecord {
            index: 0,
            reason: e.to_string(),
        })?;
        let Value::Array(rows) = value else {
            return Err(PatternError::MalformedRecord {
                index: 0,
                reason: "payload is not an array".to_string(),
            });
        };

        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            match row {
                Value::Array(fields) => records.push(fields),
                other => {
                    return Err(PatternError::MalformedRecord {
                        index,
                        reason: format!("expected an array, got {other}"),
                    })
                }
            }
        }
        Self::from_raw(&records)
    }

    #[inline]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Natural log of every close. Fails on the first non-positive close.
    pub fn log_closes(&self) -> Result<Vec<f64>> {
        self.bars
            .iter()
            .enumerate()
            .map(|(index, b)| {
                if b.close > 0.0 && b.close.is_finite() {
                    Ok(b.close.ln())
                } else {
                    Err(PatternError::NonPositivePrice { index })
                }
            })
            .collect()
    }

    /// Leading `len` bars as a new series
    pub fn truncate_to(&self, len: usize) -> Result<Self> {
        let len = len.min(self.bars.len());
        Self::new(self.bars[..len].to_vec())
    }

    /// Locate the bar opened at `timestamp`
    pub fn find_bar(&self, timestamp: DateTime<Utc>) -> Option<(usize, &Bar)> {
        self.bars
            .binary_search_by_key(&timestamp, |b| b.timestamp)
            .ok()
            .map(|index| (index, &self.bars[index]))
    }
}

fn parse_price(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn parse_millis(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
