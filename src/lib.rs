//! # TradingMind - pattern detection over exchange candlestick data
//!
//! Normalizes raw exchange klines into an immutable [`BarSeries`] and runs two
//! kinds of analysis over it:
//!
//! - named candlestick detectors held in an open [`PatternRegistry`]
//! - the head-and-shoulders finder in [`chart`]
//!
//! ## Quick Start
//!
//! ```rust
//! use tradingmind::prelude::*;
//!
//! let payload = r#"[
//!     [1700000000000, "110", "111", "99", "100", "5"],
//!     [1700000060000, "105", "106", "94", "95", "5"],
//!     [1700000120000, "99", "100", "89", "90", "5"]
//! ]"#;
//! let series = BarSeries::from_json(payload).unwrap();
//!
//! let registry = PatternRegistry::default();
//! let matches: Vec<_> = registry.detect("ThreeBlackCrows", &series).unwrap().collect();
//! assert_eq!(matches.len(), 1);
//! ```

pub mod chart;
pub mod detectors;
pub mod params;
pub mod series;
pub mod service;

pub use series::{Bar, BarSeries};

pub mod prelude {
    pub use crate::{
        // Chart structures
        chart::{
            extract_info, find_extrema, find_hs_patterns, Extremum, ExtremumKind, HsConfig,
            HsPattern, HsPatterns, HsScanner, PatternInfo,
        },
        // Detectors
        detectors::*,
        // Parameters
        params::{get_period, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
        // Parallel
        scan_parallel,
        // Series
        series::{Bar, BarSeries, RawRecord},
        // Service boundary
        service::{
            detect_candlestick_pattern, find_head_and_shoulders, handle_request, HsReport,
            PatternRequest, PatternResponse, PatternType, ServiceConfig,
        },
        canonical_name,
        Direction,
        // Core traits
        DynPatternDetector,
        ErrorKind,
        Matches,
        OHLCVExt,
        PatternDetector,
        // Errors
        PatternError,
        PatternId,
        PatternMatch,
        PatternRegistry,
        PatternScan,
        Period,
        Ratio,
        RegistryBuilder,
        Result,
        ScanError,
        ScanResult,
        OHLCV,
    };
}

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors that can occur while building series or detecting patterns
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    #[error("Empty bar series")]
    EmptySeries,

    #[error("Timestamp at index {index} is not after the previous bar")]
    NonIncreasingTimestamp { index: usize },

    #[error("Malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Timestamp {millis}ms at index {index} is out of range")]
    InvalidTimestamp { index: usize, millis: i64 },

    #[error("Timestamp {millis}ms is out of range")]
    TimestampOutOfRange { millis: i64 },

    #[error("Non-positive close at index {index} cannot be log-transformed")]
    NonPositivePrice { index: usize },

    #[error("No candlestick pattern detector found for {requested} (looked up as {normalized})")]
    UnknownPattern {
        requested: String,
        normalized: String,
    },

    #[error("Pattern references index {index} outside a series of {len} bars")]
    IncompletePattern { index: usize, len: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),
}

/// Coarse classification used at the call boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Data,
    UnknownPattern,
    IncompletePattern,
    Config,
}

impl ErrorKind {
    /// HTTP status a web layer should answer with
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::UnknownPattern | ErrorKind::Config => 400,
            ErrorKind::Data | ErrorKind::IncompletePattern => 500,
        }
    }
}

impl PatternError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PatternError::EmptySeries
            | PatternError::NonIncreasingTimestamp { .. }
            | PatternError::MalformedRecord { .. }
            | PatternError::InvalidTimestamp { .. }
            | PatternError::TimestampOutOfRange { .. }
            | PatternError::NonPositivePrice { .. } => ErrorKind::Data,
            PatternError::UnknownPattern { .. } => ErrorKind::UnknownPattern,
            PatternError::IncompletePattern { .. } => ErrorKind::IncompletePattern,
            PatternError::InvalidValue(_)
            | PatternError::OutOfRange { .. }
            | PatternError::InvalidConfig(_)
            | PatternError::UnsupportedTarget(_) => ErrorKind::Config,
        }
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(PatternError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn body_top(&self) -> f64 {
        self.open().max(self.close())
    }

    #[inline]
    fn body_bottom(&self) -> f64 {
        self.open().min(self.close())
    }

    #[inline]
    fn body_midpoint(&self) -> f64 {
        (self.open() + self.close()) / 2.0
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as ratio of range. Returns None if range ≈ 0
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }

    /// True when the bar's high/low range lies inside `outer`'s range
    #[inline]
    fn is_inside<O: OHLCV>(&self, outer: &O) -> bool {
        self.high() <= outer.high() && self.low() >= outer.low()
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// PATTERN MATCH - result of detection
// ============================================================

/// Canonical (lower-case, underscore separated) pattern name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(pub &'static str);

impl PatternId {
    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl serde::Serialize for PatternId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.0)
    }
}

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// One bar at which a detector fired
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    pub timestamp: DateTime<Utc>,
    pub pattern_name: PatternId,
    /// Index of the last bar of the formation
    #[serde(skip)]
    pub index: usize,
}

// ============================================================
// PATTERN DETECTOR TRAITS
// ============================================================

/// Generic pattern detector trait - for concrete types
pub trait PatternDetector: Send + Sync {
    fn id(&self) -> PatternId;

    /// Number of trailing bars the rule looks at
    fn min_bars(&self) -> usize;

    fn direction(&self) -> Direction;

    /// Evaluate the rule for the formation ending at `index`.
    /// Indices without enough history (or past the end) yield `false`.
    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

/// Object-safe pattern detector trait - what the registry stores
pub trait DynPatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn min_bars(&self) -> usize;
    fn direction(&self) -> Direction;
    fn detect(&self, bars: &[Bar], index: usize) -> bool;
    fn validate_config(&self) -> Result<()>;
}

impl<D: PatternDetector> DynPatternDetector for D {
    fn id(&self) -> PatternId {
        PatternDetector::id(self)
    }

    fn min_bars(&self) -> usize {
        PatternDetector::min_bars(self)
    }

    fn direction(&self) -> Direction {
        PatternDetector::direction(self)
    }

    fn detect(&self, bars: &[Bar], index: usize) -> bool {
        PatternDetector::detect(self, bars, index)
    }

    fn validate_config(&self) -> Result<()> {
        PatternDetector::validate_config(self)
    }
}

// ============================================================
// NAME NORMALIZATION
// ============================================================

/// Convert a caller-supplied name (PascalCase, camelCase or already
/// snake_case) to the registry's canonical form.
///
/// An underscore is inserted before every uppercase letter except a leading
/// one, then everything is lower-cased. Acronyms therefore split per letter
/// (`"DOJI"` becomes `"d_o_j_i"`) and simply fail lookup.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 8);
    for (i, ch) in name.trim().chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

// ============================================================
// PATTERN REGISTRY
// ============================================================

/// Named candlestick detectors keyed by canonical id
pub struct PatternRegistry {
    detectors: HashMap<&'static str, Box<dyn DynPatternDetector>>,
}

impl Default for PatternRegistry {
    /// Registry holding every builtin detector with default thresholds
    fn default() -> Self {
        let mut detectors: HashMap<&'static str, Box<dyn DynPatternDetector>> = HashMap::new();
        for detector in default_detectors() {
            detectors.insert(detector.id().as_str(), detector);
        }
        Self { detectors }
    }
}

impl std::fmt::Debug for PatternRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRegistry")
            .field("patterns", &self.names())
            .finish()
    }
}

impl PatternRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Registered ids, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.detectors.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Look up a detector by caller-supplied name
    pub fn get(&self, name: &str) -> Result<&dyn DynPatternDetector> {
        let normalized = canonical_name(name);
        match self.detectors.get(normalized.as_str()) {
            Some(detector) => {
                debug!(requested = name, pattern = %detector.id(), "resolved pattern");
                Ok(detector.as_ref())
            }
            None => {
                debug!(requested = name, normalized = %normalized, "unknown pattern");
                Err(PatternError::UnknownPattern {
                    requested: name.to_string(),
                    normalized,
                })
            }
        }
    }

    /// Lazily evaluate the named detector over every bar of `series`.
    pub fn detect<'a>(&'a self, name: &str, series: &'a BarSeries) -> Result<Matches<'a>> {
        let detector = self.get(name)?;
        Ok(Matches::new(detector, series))
    }

    /// Run every registered detector over `series` in parallel.
    /// Results are sorted by pattern id.
    pub fn scan_all(&self, series: &BarSeries) -> Vec<PatternScan> {
        let mut scans: Vec<PatternScan> = self
            .detectors
            .par_iter()
            .map(|(_, detector)| PatternScan {
                pattern_id: detector.id(),
                direction: detector.direction(),
                matches: Matches::new(detector.as_ref(), series).collect(),
            })
            .collect();
        scans.sort_by_key(|s| s.pattern_id);
        scans
    }
}

/// All matches of one detector over one series
#[derive(Debug, Clone)]
pub struct PatternScan {
    pub pattern_id: PatternId,
    pub direction: Direction,
    pub matches: Vec<PatternMatch>,
}

// ============================================================
// MATCH ITERATOR
// ============================================================

/// Lazy, restartable sequence of matches for one detector over one series.
///
/// Visits every index in `[min_bars - 1, len - 1]` in order and yields only
/// those where the rule holds. Cloning restarts from the clone point.
#[derive(Clone)]
pub struct Matches<'a> {
    detector: &'a dyn DynPatternDetector,
    series: &'a BarSeries,
    current: usize,
}

impl<'a> Matches<'a> {
    fn new(detector: &'a dyn DynPatternDetector, series: &'a BarSeries) -> Self {
        Self {
            detector,
            series,
            current: detector.min_bars().saturating_sub(1),
        }
    }
}

impl<'a> Iterator for Matches<'a> {
    type Item = PatternMatch;

    fn next(&mut self) -> Option<Self::Item> {
        let bars = self.series.bars();
        while self.current < bars.len() {
            let index = self.current;
            self.current += 1;

            if self.detector.detect(bars, index) {
                return Some(PatternMatch {
                    timestamp: bars[index].timestamp,
                    pattern_name: self.detector.id(),
                    index,
                });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.series.len().saturating_sub(self.current);
        (0, Some(remaining))
    }
}

impl std::iter::FusedIterator for Matches<'_> {}

// ============================================================
// BUILDER
// ============================================================

use detectors::*;

/// Box the default-configured instance of each listed detector type.
macro_rules! builtin_defaults {
  ($($detector:ty),* $(,)?) => {
    vec![$(Box::new(<$detector>::default()) as Box<dyn DynPatternDetector>),*]
  };
}

fn single_bar_defaults() -> Vec<Box<dyn DynPatternDetector>> {
    builtin_defaults![
        DojiDetector,
        DragonflyDojiDetector,
        GravestoneDojiDetector,
        HammerDetector,
        InvertedHammerDetector,
    ]
}

fn two_bar_defaults() -> Vec<Box<dyn DynPatternDetector>> {
    builtin_defaults![
        BullishEngulfingDetector,
        BearishEngulfingDetector,
        BullishHaramiDetector,
        BearishHaramiDetector,
        DarkCloudCoverDetector,
        PiercingPatternDetector,
        DojiStarDetector,
        StarDetector,
        RainDropDetector,
        RainDropDojiDetector,
        ShootingStarDetector,
        TweezerTopsDetector,
        TweezerBottomsDetector,
    ]
}

fn three_bar_defaults() -> Vec<Box<dyn DynPatternDetector>> {
    builtin_defaults![
        HangingManDetector,
        MorningStarDetector,
        MorningStarDojiDetector,
        ThreeWhiteSoldiersDetector,
        ThreeBlackCrowsDetector,
    ]
}

fn multi_bar_defaults() -> Vec<Box<dyn DynPatternDetector>> {
    builtin_defaults![
        BullishThreeMethodFormationDetector,
        BearishThreeMethodFormationDetector,
    ]
}

fn default_detectors() -> Vec<Box<dyn DynPatternDetector>> {
    let mut all = single_bar_defaults();
    all.extend(two_bar_defaults());
    all.extend(three_bar_defaults());
    all.extend(multi_bar_defaults());
    all
}

/// Builder for creating PatternRegistry instances
pub struct RegistryBuilder {
    detectors: Vec<Box<dyn DynPatternDetector>>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Add all builtin patterns with default configurations
    pub fn with_all_defaults(self) -> Self {
        self.with_single_bar_defaults()
            .with_two_bar_defaults()
            .with_three_bar_defaults()
            .with_multi_bar_defaults()
    }

    /// Add single-bar patterns with defaults (5)
    pub fn with_single_bar_defaults(mut self) -> Self {
        self.detectors.extend(single_bar_defaults());
        self
    }

    /// Add two-bar patterns with defaults (13)
    pub fn with_two_bar_defaults(mut self) -> Self {
        self.detectors.extend(two_bar_defaults());
        self
    }

    /// Add three-bar patterns with defaults (5)
    pub fn with_three_bar_defaults(mut self) -> Self {
        self.detectors.extend(three_bar_defaults());
        self
    }

    /// Add five-bar patterns with defaults (2)
    pub fn with_multi_bar_defaults(mut self) -> Self {
        self.detectors.extend(multi_bar_defaults());
        self
    }

    /// Add a detector (builtin or custom)
    #[allow(clippy::should_implement_trait)]
    pub fn add<D: PatternDetector + 'static>(mut self, detector: D) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    /// Add with config validation
    pub fn add_checked<D: PatternDetector + 'static>(mut self, detector: D) -> Result<Self> {
        PatternDetector::validate_config(&detector)?;
        self.detectors.push(Box::new(detector));
        Ok(self)
    }

    /// Build the registry.
    ///
    /// Fails on duplicate ids, ids not in canonical form, a zero window, or
    /// any detector whose own configuration is invalid.
    pub fn build(self) -> Result<PatternRegistry> {
        let mut detectors: HashMap<&'static str, Box<dyn DynPatternDetector>> =
            HashMap::with_capacity(self.detectors.len());

        for detector in self.detectors {
            let id = detector.id().as_str();
            if canonical_name(id) != id {
                return Err(PatternError::InvalidConfig(format!(
                    "pattern id {id} is not in canonical snake_case form"
                )));
            }
            if detector.min_bars() == 0 {
                return Err(PatternError::InvalidConfig(format!(
                    "pattern {id} declares an empty window"
                )));
            }
            detector.validate_config()?;
            if detectors.insert(id, detector).is_some() {
                return Err(PatternError::InvalidConfig(format!(
                    "pattern {id} registered twice"
                )));
            }
        }

        debug!(patterns = detectors.len(), "built pattern registry");
        Ok(PatternRegistry { detectors })
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of scanning a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub patterns: Vec<PatternMatch>,
}

/// Error from scanning a single instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: PatternError,
}

/// Run one named pattern over many instruments in parallel
pub fn scan_parallel<'a, I>(
    registry: &PatternRegistry,
    pattern: &str,
    instruments: I,
) -> (Vec<ScanResult>, Vec<ScanError>)
where
    I: IntoParallelIterator<Item = (&'a str, &'a BarSeries)>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, series)| {
            registry
                .detect(pattern, series)
                .map(|matches| ScanResult {
                    symbol: symbol.to_string(),
                    patterns: matches.collect(),
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;
    const MINUTE: i64 = 60_000;

    fn series(ohlc: &[(f64, f64, f64, f64)]) -> BarSeries {
        let bars = ohlc
            .iter()
            .enumerate()
            .map(|(i, &(o, h, l, c))| {
                Bar::from_millis(T0 + i as i64 * MINUTE, o, h, l, c, 1000.0).unwrap()
            })
            .collect();
        BarSeries::new(bars).unwrap()
    }

    fn crows() -> BarSeries {
        series(&[
            (110.0, 111.0, 99.0, 100.0),
            (105.0, 106.0, 94.0, 95.0),
            (99.0, 100.0, 89.0, 90.0),
        ])
    }

    struct AlwaysDetector;

    impl PatternDetector for AlwaysDetector {
        fn id(&self) -> PatternId {
            PatternId("always")
        }

        fn min_bars(&self) -> usize {
            2
        }

        fn direction(&self) -> Direction {
            Direction::Neutral
        }

        fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
            index >= 1 && index < bars.len()
        }
    }

    #[test]
    fn test_ratio_validation() {
        assert!(Ratio::new(0.0).is_ok());
        assert!(Ratio::new(1.0).is_ok());
        assert!(Ratio::new(0.5).is_ok());
        assert!(Ratio::new(-0.1).is_err());
        assert!(Ratio::new(1.1).is_err());
        assert!(Ratio::new(f64::NAN).is_err());
        assert!(Ratio::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_period_validation() {
        assert!(Period::new(1).is_ok());
        assert!(Period::new(100).is_ok());
        assert!(Period::new(0).is_err());
    }

    #[test]
    fn test_ohlcv_ext() {
        let bar = Bar::from_millis(T0, 100.0, 110.0, 90.0, 105.0, 1.0).unwrap();
        assert_eq!(bar.body(), 5.0);
        assert_eq!(bar.range(), 20.0);
        assert_eq!(bar.body_midpoint(), 102.5);
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());
        assert!((bar.body_ratio().unwrap() - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("ThreeBlackCrows"), "three_black_crows");
        assert_eq!(canonical_name("tweezerBottoms"), "tweezer_bottoms");
        assert_eq!(
            canonical_name("bearish_three_method_formation"),
            "bearish_three_method_formation"
        );
        assert_eq!(canonical_name("DOJI"), "d_o_j_i");
    }

    #[test]
    fn test_default_registry() {
        let registry = PatternRegistry::default();
        assert_eq!(registry.len(), 25);
        assert!(registry.names().contains(&"three_black_crows"));
        assert!(registry.names().contains(&"tweezer_bottoms"));
        assert!(registry.names().contains(&"bearish_three_method_formation"));
    }

    #[test]
    fn test_builder_matches_default() {
        let built = RegistryBuilder::new().with_all_defaults().build().unwrap();
        assert_eq!(built.names(), PatternRegistry::default().names());
    }

    #[test]
    fn test_unknown_pattern() {
        let registry = PatternRegistry::default();
        let err = registry.get("CupAndHandle").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnknownPattern);
        assert_eq!(err.kind().http_status(), 400);
        assert!(err.to_string().contains("cup_and_handle"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = RegistryBuilder::new()
            .add(ThreeBlackCrowsDetector::default())
            .add(ThreeBlackCrowsDetector::default())
            .build();
        assert!(matches!(result, Err(PatternError::InvalidConfig(_))));
    }

    #[test]
    fn test_custom_detector() {
        let registry = RegistryBuilder::new().add(AlwaysDetector).build().unwrap();
        let s = crows();
        let matches: Vec<_> = registry.detect("Always", &s).unwrap().collect();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].index, 1);
        assert_eq!(matches[1].index, 2);
    }

    #[test]
    fn test_detect_three_black_crows() {
        let registry = PatternRegistry::default();
        let s = crows();
        let matches: Vec<_> = registry.detect("ThreeBlackCrows", &s).unwrap().collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].index, 2);
        assert_eq!(matches[0].timestamp, s.bars()[2].timestamp);
        assert_eq!(matches[0].pattern_name.as_str(), "three_black_crows");
    }

    #[test]
    fn test_matches_restartable() {
        let registry = PatternRegistry::default();
        let s = crows();
        let iter = registry.detect("three_black_crows", &s).unwrap();
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_short_series_yields_nothing() {
        let registry = PatternRegistry::default();
        let s = series(&[(110.0, 111.0, 99.0, 100.0), (105.0, 106.0, 94.0, 95.0)]);
        assert_eq!(registry.detect("three_black_crows", &s).unwrap().count(), 0);
        assert_eq!(registry.detect("bearish_three_method_formation", &s).unwrap().count(), 0);
    }

    #[test]
    fn test_scan_all() {
        let registry = PatternRegistry::default();
        let s = crows();
        let scans = registry.scan_all(&s);
        assert_eq!(scans.len(), 25);
        let crows = scans
            .iter()
            .find(|scan| scan.pattern_id == PatternId("three_black_crows"))
            .unwrap();
        assert_eq!(crows.matches.len(), 1);
        assert_eq!(crows.direction, Direction::Bearish);
    }

    #[test]
    fn test_parallel_scan() {
        let registry = PatternRegistry::default();
        let a = crows();
        let b = series(&[(100.0, 101.0, 99.0, 100.5)]);

        let instruments: Vec<(&str, &BarSeries)> = vec![("BTCUSDT", &a), ("SOLUSDT", &b)];
        let (results, errors) = scan_parallel(&registry, "ThreeBlackCrows", instruments);
        assert_eq!(results.len(), 2);
        assert!(errors.is_empty());

        let instruments: Vec<(&str, &BarSeries)> = vec![("BTCUSDT", &a)];
        let (results, errors) = scan_parallel(&registry, "NotAPattern", instruments);
        assert!(results.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].symbol, "BTCUSDT");
    }

    #[test]
    fn test_match_serializes_camel_case() {
        let registry = PatternRegistry::default();
        let s = crows();
        let m = registry.detect("three_black_crows", &s).unwrap().next().unwrap();
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(json["patternName"], "three_black_crows");
        assert!(json.get("timestamp").is_some());
        assert!(json.get("index").is_none());
    }
}
