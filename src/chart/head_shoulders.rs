//! Head-and-shoulders finder
//!
//! Works on log closes. Extrema are confirmed bar by bar with the rolling rule
//! from [`super::extrema`]; the five most recent ones are kept. Whenever the
//! last four alternate peak, trough, peak, trough (trough, peak, trough, peak
//! for the inverse form) they are checked as left shoulder, left armpit,
//! head and right armpit. The right shoulder is the highest bar between the
//! right armpit and the current bar, and the current bar must have broken the
//! neckline drawn through the two armpits.
//!
//! The inverse form is the classic form on negated data, so every rule below
//! is written once against an [`Oriented`] view.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::extrema::{rolling_bottom, rolling_top, Extremum, ExtremumKind};
use crate::{
    params::{get_period, ParamMeta, ParameterizedDetector},
    BarSeries, PatternError, Period, Result,
};

// ============================================================
// CONFIG
// ============================================================

pub const DEFAULT_ORDER: usize = 6;
pub const DEFAULT_MAX_TIME_RATIO: f64 = 2.5;
/// Log units per bar
pub const DEFAULT_MAX_NECK_SLOPE: f64 = 0.01;

/// Tuning for the finder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HsConfig {
    /// Bars on each side that an extremum must dominate
    pub order: Period,
    /// Confirm once price drops back under the right shoulder midpoint
    /// instead of waiting for the neckline break
    pub early_find: bool,
    /// Largest allowed ratio between the two shoulder-to-head durations
    pub max_time_ratio: f64,
    /// Largest allowed absolute neckline slope
    pub max_neck_slope: f64,
}

impl Default for HsConfig {
    fn default() -> Self {
        Self {
            order: Period::new_const(DEFAULT_ORDER),
            early_find: false,
            max_time_ratio: DEFAULT_MAX_TIME_RATIO,
            max_neck_slope: DEFAULT_MAX_NECK_SLOPE,
        }
    }
}

impl HsConfig {
    pub fn new(order: usize, early_find: bool) -> Result<Self> {
        let config = Self {
            order: Period::new(order)?,
            early_find,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.max_time_ratio.is_finite() || self.max_time_ratio < 1.0 {
            return Err(PatternError::InvalidConfig(format!(
                "max_time_ratio must be a finite value >= 1, got {}",
                self.max_time_ratio
            )));
        }
        if !self.max_neck_slope.is_finite() || self.max_neck_slope <= 0.0 {
            return Err(PatternError::InvalidConfig(format!(
                "max_neck_slope must be a finite value > 0, got {}",
                self.max_neck_slope
            )));
        }
        Ok(())
    }
}

static HS_PARAMS: &[ParamMeta] = &[
    ParamMeta::period(
        "order",
        DEFAULT_ORDER as f64,
        (2.0, 20.0, 1.0),
        "Bars on each side that an extremum must dominate",
    ),
    ParamMeta::ratio(
        "max_time_ratio",
        DEFAULT_MAX_TIME_RATIO,
        (1.0, 5.0, 0.5),
        "Largest ratio between shoulder-to-head durations",
    ),
    ParamMeta::ratio(
        "max_neck_slope",
        DEFAULT_MAX_NECK_SLOPE,
        (0.001, 0.05, 0.001),
        "Largest absolute neckline slope in log units per bar",
    ),
];

impl ParameterizedDetector for HsConfig {
    fn param_meta() -> &'static [ParamMeta] {
        HS_PARAMS
    }

    /// `early_find` is read as a flag: any non-zero value enables it.
    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let mut config = Self {
            order: get_period(params, "order", DEFAULT_ORDER)?,
            early_find: params.get("early_find").is_some_and(|v| *v != 0.0),
            ..Self::default()
        };
        for meta in &HS_PARAMS[1..] {
            if let Some(&value) = params.get(meta.name) {
                meta.validate(value)?;
                match meta.name {
                    "max_time_ratio" => config.max_time_ratio = value,
                    _ => config.max_neck_slope = value,
                }
            }
        }
        config.validate()?;
        Ok(config)
    }

    fn pattern_id_str() -> &'static str {
        "head_and_shoulders"
    }
}

// ============================================================
// PATTERN
// ============================================================

/// One accepted formation. Indices refer to the scanned series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HsPattern {
    pub inverted: bool,
    pub l_shoulder: usize,
    pub l_armpit: usize,
    pub head: usize,
    pub r_armpit: usize,
    pub r_shoulder: usize,
    /// First bar beyond the neckline before the left shoulder
    pub start: usize,
    /// Bar at which the pattern was confirmed
    pub end: usize,
    /// Bar where price crossed the neckline, if it has
    pub break_index: Option<usize>,
    /// Neckline slope in log units per bar
    pub neck_slope: f64,
    /// Bars between the armpits
    pub head_width: usize,
    /// Distance of the head beyond the neckline in log units, always positive
    pub head_height: f64,
    /// Fit of the piecewise-linear shape against the data
    pub r_squared: f64,
}

impl HsPattern {
    /// Every index the pattern refers to
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        [
            self.start,
            self.l_shoulder,
            self.l_armpit,
            self.head,
            self.r_armpit,
            self.r_shoulder,
            self.end,
        ]
        .into_iter()
        .chain(self.break_index)
    }
}

/// Both pattern families, each ordered by start index
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HsPatterns {
    pub head_and_shoulders: Vec<HsPattern>,
    pub inverse: Vec<HsPattern>,
}

impl HsPatterns {
    pub fn len(&self) -> usize {
        self.head_and_shoulders.len() + self.inverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================
// ORIENTED VIEW
// ============================================================

/// `data` as seen by the classic rules: as-is, or negated for the inverse form
#[derive(Clone, Copy)]
struct Oriented<'a> {
    data: &'a [f64],
    sign: f64,
}

impl Oriented<'_> {
    #[inline]
    fn at(&self, i: usize) -> f64 {
        self.sign * self.data[i]
    }

    /// First index of the maximum over `range`
    fn argmax(&self, range: std::ops::Range<usize>) -> Option<usize> {
        let mut best: Option<usize> = None;
        for i in range {
            if best.map_or(true, |b| self.at(i) > self.at(b)) {
                best = Some(i);
            }
        }
        best
    }
}

/// Candidate extrema: left shoulder, left armpit, head, right armpit
fn check(
    view: Oriented<'_>,
    [ls, la, head, ra]: [usize; 4],
    i: usize,
    config: &HsConfig,
) -> Option<HsPattern> {
    if i < ra + 2 {
        return None;
    }
    let rs = view.argmax(ra + 1..i)?;
    let d = |idx: usize| view.at(idx);

    if d(head) <= d(ls).max(d(rs)) {
        return None;
    }

    // Each shoulder must reach the midpoint of the opposite shoulder and armpit
    let r_mid = 0.5 * (d(rs) + d(ra));
    let l_mid = 0.5 * (d(ls) + d(la));
    if d(ls) < r_mid || d(rs) < l_mid {
        return None;
    }

    let r_to_h = (rs - head) as f64;
    let l_to_h = (head - ls) as f64;
    if r_to_h > config.max_time_ratio * l_to_h || l_to_h > config.max_time_ratio * r_to_h {
        return None;
    }

    let head_width = ra - la;
    let slope = (d(ra) - d(la)) / head_width as f64;
    if slope.abs() > config.max_neck_slope {
        return None;
    }
    let neck_at = |idx: usize| d(la) + (idx as f64 - la as f64) * slope;

    if config.early_find {
        if d(i) > r_mid {
            return None;
        }
    } else if d(i) > neck_at(i) {
        return None;
    }

    let mut start = None;
    for j in 1..head_width {
        if ls < j {
            return None;
        }
        if d(ls - j) < neck_at(ls - j) {
            start = Some(ls - j);
            break;
        }
    }
    let start = start?;

    let break_index = if config.early_find {
        (i..view.data.len().min(i + head_width + 1)).find(|&j| d(j) <= neck_at(j))
    } else {
        Some(i)
    };

    let nodes = [
        (start, neck_at(start)),
        (ls, d(ls)),
        (la, d(la)),
        (head, d(head)),
        (ra, d(ra)),
        (rs, d(rs)),
        (i, d(i)),
    ];

    Some(HsPattern {
        inverted: view.sign < 0.0,
        l_shoulder: ls,
        l_armpit: la,
        head,
        r_armpit: ra,
        r_shoulder: rs,
        start,
        end: i,
        break_index,
        neck_slope: view.sign * slope,
        head_width,
        head_height: d(head) - neck_at(head),
        r_squared: r_squared(view, &nodes),
    })
}

/// R² of the polyline through `nodes` against the data it spans
fn r_squared(view: Oriented<'_>, nodes: &[(usize, f64)]) -> f64 {
    let (Some(&(first, _)), Some(&(last, _))) = (nodes.first(), nodes.last()) else {
        return 0.0;
    };

    let model = |idx: usize| -> f64 {
        for pair in nodes.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            if idx <= x1 {
                if x1 == x0 {
                    return y1;
                }
                return y0 + (y1 - y0) * (idx - x0) as f64 / (x1 - x0) as f64;
            }
        }
        nodes[nodes.len() - 1].1
    };

    let n = (last - first + 1) as f64;
    let mean = (first..=last).map(|idx| view.at(idx)).sum::<f64>() / n;
    let (mut ss_res, mut ss_tot) = (0.0, 0.0);
    for idx in first..=last {
        let actual = view.at(idx);
        ss_res += (actual - model(idx)).powi(2);
        ss_tot += (actual - mean).powi(2);
    }
    if ss_tot <= f64::EPSILON {
        return 0.0;
    }
    1.0 - ss_res / ss_tot
}

// ============================================================
// SCANNER
// ============================================================

/// Lazy forward scan yielding patterns in the order they are confirmed.
///
/// Once a shape is accepted its family is locked until an extremum of the
/// opposite kind is confirmed. Candidates whose left shoulder is at or before
/// the last accepted right shoulder of the same family are skipped, so accepted
/// patterns never share extrema.
pub struct HsScanner<'a> {
    data: &'a [f64],
    config: HsConfig,
    current: usize,
    recent: VecDeque<Extremum>,
    hs_lock: bool,
    ihs_lock: bool,
    hs_consumed: Option<usize>,
    ihs_consumed: Option<usize>,
    pending: Option<HsPattern>,
}

impl<'a> HsScanner<'a> {
    pub fn new(data: &'a [f64], config: HsConfig) -> Result<Self> {
        config.validate()?;
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(PatternError::MalformedRecord {
                index,
                reason: "non-finite price".to_string(),
            });
        }
        Ok(Self {
            data,
            config,
            current: 0,
            recent: VecDeque::with_capacity(5),
            hs_lock: false,
            ihs_lock: false,
            hs_consumed: None,
            ihs_consumed: None,
            pending: None,
        })
    }

    fn push(&mut self, extremum: Extremum) {
        if self.recent.len() == 5 {
            self.recent.pop_front();
        }
        self.recent.push_back(extremum);
    }

    /// The last four extrema if they alternate starting with `first`
    fn candidate(&self, first: ExtremumKind, skip_last: bool) -> Option<[usize; 4]> {
        let n = self.recent.len();
        let end = if skip_last { n.checked_sub(1)? } else { n };
        let begin = end.checked_sub(4)?;
        let mut expected = first;
        let mut out = [0; 4];
        for (slot, ext) in out.iter_mut().zip(self.recent.range(begin..end)) {
            if ext.kind != expected {
                return None;
            }
            *slot = ext.index;
            expected = expected.opposite();
        }
        Some(out)
    }

    /// Whether a candidate starts after the last accepted right shoulder
    fn fresh(consumed: Option<usize>, [ls, ..]: [usize; 4]) -> bool {
        consumed.map_or(true, |rs| ls > rs)
    }

    fn step(&mut self, i: usize) -> (Option<HsPattern>, Option<HsPattern>) {
        let order = self.config.order.get();
        if let Some(top) = rolling_top(self.data, i, order) {
            self.push(top);
            self.ihs_lock = false;
        }
        if let Some(bottom) = rolling_bottom(self.data, i, order) {
            self.push(bottom);
            self.hs_lock = false;
        }
        if self.recent.len() < 5 {
            return (None, None);
        }

        let last_is_top = self.recent.back().is_some_and(|e| e.kind == ExtremumKind::Peak);

        // The classic window ends on a trough, the inverse on a peak
        let hs = if self.hs_lock {
            None
        } else {
            self.candidate(ExtremumKind::Peak, last_is_top)
                .filter(|&ext| Self::fresh(self.hs_consumed, ext))
                .and_then(|ext| {
                    check(Oriented { data: self.data, sign: 1.0 }, ext, i, &self.config)
                })
        };
        let ihs = if self.ihs_lock {
            None
        } else {
            self.candidate(ExtremumKind::Trough, !last_is_top)
                .filter(|&ext| Self::fresh(self.ihs_consumed, ext))
                .and_then(|ext| {
                    check(Oriented { data: self.data, sign: -1.0 }, ext, i, &self.config)
                })
        };

        if let Some(p) = &hs {
            self.hs_lock = true;
            self.hs_consumed = Some(p.r_shoulder);
        }
        if let Some(p) = &ihs {
            self.ihs_lock = true;
            self.ihs_consumed = Some(p.r_shoulder);
        }
        (hs, ihs)
    }
}

impl Iterator for HsScanner<'_> {
    type Item = HsPattern;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pattern) = self.pending.take() {
            return Some(pattern);
        }
        while self.current < self.data.len() {
            let i = self.current;
            self.current += 1;

            match self.step(i) {
                (Some(hs), ihs) => {
                    self.pending = ihs;
                    return Some(hs);
                }
                (None, Some(ihs)) => return Some(ihs),
                (None, None) => {}
            }
        }
        None
    }
}

impl std::iter::FusedIterator for HsScanner<'_> {}

/// Run the finder over log closes and split the results by family.
pub fn find_hs_patterns(data: &[f64], config: &HsConfig) -> Result<HsPatterns> {
    let mut patterns = HsPatterns::default();
    for pattern in HsScanner::new(data, *config)? {
        debug!(
            inverted = pattern.inverted,
            start = pattern.start,
            head = pattern.head,
            end = pattern.end,
            r_squared = pattern.r_squared,
            "accepted head-and-shoulders"
        );
        if pattern.inverted {
            patterns.inverse.push(pattern);
        } else {
            patterns.head_and_shoulders.push(pattern);
        }
    }
    patterns.head_and_shoulders.sort_by_key(|p| p.start);
    patterns.inverse.sort_by_key(|p| p.start);
    Ok(patterns)
}

// ============================================================
// METRIC EXTRACTION
// ============================================================

/// A pattern resolved against the bars it was found in
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternInfo {
    pub inverted: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub head_time: DateTime<Utc>,
    pub head_price: f64,
    pub left_shoulder_time: DateTime<Utc>,
    pub left_shoulder_price: f64,
    pub right_shoulder_time: DateTime<Utc>,
    pub right_shoulder_price: f64,
    /// Price change per bar along the neckline
    pub neckline_slope: f64,
    /// Neckline price at bar index 0
    pub neckline_intercept: f64,
    /// Distance from the neckline to the head, positive for both forms
    pub head_height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_price: Option<f64>,
    pub r_squared: f64,
}

impl PatternInfo {
    /// Neckline price at bar `index`
    pub fn neckline_at(&self, index: usize) -> f64 {
        self.neckline_intercept + self.neckline_slope * index as f64
    }
}

/// Resolve a pattern's indices to times and closing prices of `series`.
pub fn extract_info(pattern: &HsPattern, series: &BarSeries) -> Result<PatternInfo> {
    let bars = series.bars();
    if let Some(index) = pattern.indices().find(|&idx| idx >= bars.len()) {
        return Err(PatternError::IncompletePattern {
            index,
            len: bars.len(),
        });
    }

    let (la, ra) = (&bars[pattern.l_armpit], &bars[pattern.r_armpit]);
    let slope = (ra.close - la.close) / (pattern.r_armpit - pattern.l_armpit) as f64;
    let intercept = la.close - slope * pattern.l_armpit as f64;

    let head = &bars[pattern.head];
    let neck_at_head = intercept + slope * pattern.head as f64;
    let head_height = if pattern.inverted {
        neck_at_head - head.close
    } else {
        head.close - neck_at_head
    };

    let (ls, rs) = (&bars[pattern.l_shoulder], &bars[pattern.r_shoulder]);
    let broken = pattern.break_index.map(|idx| &bars[idx]);

    Ok(PatternInfo {
        inverted: pattern.inverted,
        start_time: bars[pattern.start].timestamp,
        end_time: bars[pattern.end].timestamp,
        head_time: head.timestamp,
        head_price: head.close,
        left_shoulder_time: ls.timestamp,
        left_shoulder_price: ls.close,
        right_shoulder_time: rs.timestamp,
        right_shoulder_price: rs.close,
        neckline_slope: slope,
        neckline_intercept: intercept,
        head_height,
        break_time: broken.map(|b| b.timestamp),
        break_price: broken.map(|b| b.close),
        r_squared: pattern.r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rise to 108, dip to 96, head at 120, dip to 96, shoulder at 108, break
    const CLOSES: [f64; 28] = [
        100.0, 96.0, 92.0, 88.0, 92.0, 95.0, 100.0, 104.0, 108.0, 104.0, 100.0, 96.0, 102.0, 108.0,
        114.0, 120.0, 114.0, 108.0, 102.0, 96.0, 100.0, 104.0, 108.0, 104.0, 100.0, 92.0, 88.0,
        84.0,
    ];

    fn logs(prices: &[f64]) -> Vec<f64> {
        prices.iter().map(|p| p.ln()).collect()
    }

    fn config(early_find: bool) -> HsConfig {
        HsConfig::new(2, early_find).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = HsConfig::default();
        assert_eq!(config.order.get(), 6);
        assert!(!config.early_find);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(HsConfig::new(0, false).is_err());
        let config = HsConfig {
            max_time_ratio: 0.5,
            ..HsConfig::default()
        };
        assert!(config.validate().is_err());
        let config = HsConfig {
            max_neck_slope: f64::NAN,
            ..HsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config: HsConfig = serde_json::from_str(r#"{"order": 4}"#).unwrap();
        assert_eq!(config.order.get(), 4);
        assert_eq!(config.max_time_ratio, DEFAULT_MAX_TIME_RATIO);
        assert!(serde_json::from_str::<HsConfig>(r#"{"order": 0}"#).is_err());
    }

    #[test]
    fn test_config_with_params() {
        let mut params = HashMap::new();
        params.insert("order", 3.0);
        params.insert("early_find", 1.0);
        params.insert("max_neck_slope", 0.02);
        let config = HsConfig::with_params(&params).unwrap();
        assert_eq!(config.order.get(), 3);
        assert!(config.early_find);
        assert_eq!(config.max_neck_slope, 0.02);
        assert_eq!(config.max_time_ratio, DEFAULT_MAX_TIME_RATIO);

        params.insert("max_time_ratio", 9.0);
        assert!(HsConfig::with_params(&params).is_err());
    }

    #[test]
    fn test_finds_single_pattern() {
        let found = find_hs_patterns(&logs(&CLOSES), &config(false)).unwrap();
        assert_eq!(found.head_and_shoulders.len(), 1);
        assert!(found.inverse.is_empty());

        let p = found.head_and_shoulders[0];
        assert!(!p.inverted);
        assert_eq!(
            (p.l_shoulder, p.l_armpit, p.head, p.r_armpit, p.r_shoulder),
            (8, 11, 15, 19, 22)
        );
        assert_eq!(p.start, 5);
        assert_eq!(p.end, 25);
        assert_eq!(p.break_index, Some(25));
        assert_eq!(p.head_width, 8);
        assert!(p.neck_slope.abs() < 1e-12);
        assert!((p.head_height - (120.0f64.ln() - 96.0f64.ln())).abs() < 1e-9);
        assert!(p.r_squared > 0.5 && p.r_squared <= 1.0);
    }

    #[test]
    fn test_early_find_confirms_before_break() {
        let found = find_hs_patterns(&logs(&CLOSES), &config(true)).unwrap();
        assert_eq!(found.head_and_shoulders.len(), 1);
        let p = found.head_and_shoulders[0];
        assert_eq!(p.head, 15);
        assert_eq!(p.end, 24);
        assert_eq!(p.break_index, Some(25));
    }

    #[test]
    fn test_mirrored_series_is_inverse() {
        let mirrored: Vec<f64> = CLOSES.iter().map(|p| 10_000.0 / p).collect();
        let found = find_hs_patterns(&logs(&mirrored), &config(false)).unwrap();
        assert!(found.head_and_shoulders.is_empty());
        assert_eq!(found.inverse.len(), 1);

        let p = found.inverse[0];
        assert!(p.inverted);
        assert_eq!(p.head, 15);
        assert_eq!(p.start, 5);
        assert!(p.head_height > 0.0);
    }

    #[test]
    fn test_steep_neckline_rejected() {
        // right armpit at 99 tilts the neckline up by ~0.004 per bar
        let mut closes = CLOSES;
        closes[19] = 99.0;
        let data = logs(&closes);

        let found = find_hs_patterns(&data, &config(false)).unwrap();
        assert_eq!(found.head_and_shoulders.len(), 1);
        assert_eq!(found.head_and_shoulders[0].start, 4);

        let strict = HsConfig {
            max_neck_slope: 0.002,
            ..config(false)
        };
        assert!(find_hs_patterns(&data, &strict).unwrap().is_empty());
    }

    #[test]
    fn test_short_and_flat_series() {
        assert!(find_hs_patterns(&[], &config(false)).unwrap().is_empty());
        assert!(find_hs_patterns(&[1.0; 50], &config(false)).unwrap().is_empty());
        assert!(find_hs_patterns(&[1.0, f64::NAN], &config(false)).is_err());
    }

    #[test]
    fn test_scanner_is_lazy_iterator() {
        let data = logs(&CLOSES);
        let mut scanner = HsScanner::new(&data, config(false)).unwrap();
        assert_eq!(scanner.next().map(|p| p.head), Some(15));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
