//! Common helper functions for candlestick pattern detection
//!
//! Thresholds are plain ratios of a bar's own range or body, so no trailing
//! averages are needed and every rule is a pure function of its window.

use crate::{OHLCVExt, OHLCV};

// ============================================================
// THRESHOLDS
// ============================================================

/// Body is doji-like: body / range < DOJI_BODY_RATIO
pub const DOJI_BODY_RATIO: f64 = 0.1;
/// Body is long: body / range >= LONG_BODY_RATIO
pub const LONG_BODY_RATIO: f64 = 0.7;
/// Body is small (star): body / range < SMALL_BODY_RATIO
pub const SMALL_BODY_RATIO: f64 = 0.3;
/// Shadow is long when it exceeds the body this many times
pub const LONG_SHADOW_MULTIPLE: f64 = 3.0;
/// Range is "much larger" than body for hammer shapes
pub const HAMMER_RANGE_MULTIPLE: f64 = 3.0;
/// Range is "much larger" than body for the hanging man
pub const HANGING_MAN_RANGE_MULTIPLE: f64 = 4.0;
/// Open and close sit in the top (or bottom) 60% of the range
pub const HAMMER_POSITION_RATIO: f64 = 0.6;
/// Open and close sit in the top 25% of the range
pub const HANGING_MAN_POSITION_RATIO: f64 = 0.75;
/// Added to the range before dividing so flat bars do not divide by zero
pub const RANGE_EPSILON: f64 = 0.001;
/// Relative tolerance for matching tweezer highs/lows
pub const TWEEZER_TOLERANCE: f64 = 0.005;

// ============================================================
// WINDOW ACCESS
// ============================================================

/// The `N` bars ending at `index`, oldest first.
///
/// `None` when `index` has fewer than `N - 1` predecessors or lies past the
/// end of `bars`.
#[inline]
pub fn window<T, const N: usize>(bars: &[T], index: usize) -> Option<[&T; N]> {
    let start = (index + 1).checked_sub(N)?;
    let slice = bars.get(start..=index)?;
    Some(std::array::from_fn(|i| &slice[i]))
}

// ============================================================
// SHAPE PREDICATES
// ============================================================

/// Body is tiny relative to the range. Flat bars never qualify.
#[inline]
pub fn is_doji_body<T: OHLCV>(bar: &T) -> bool {
    bar.body_ratio().is_some_and(|r| r < DOJI_BODY_RATIO)
}

/// Body fills most of the range. Flat bars never qualify.
#[inline]
pub fn is_long_body<T: OHLCV>(bar: &T) -> bool {
    bar.body_ratio().is_some_and(|r| r >= LONG_BODY_RATIO)
}

/// Small but non-doji body
#[inline]
pub fn is_star_body<T: OHLCV>(bar: &T) -> bool {
    bar.body_ratio()
        .is_some_and(|r| (DOJI_BODY_RATIO..SMALL_BODY_RATIO).contains(&r))
}

/// Both shadows longer than three bodies
#[inline]
pub fn has_long_shadows<T: OHLCV>(bar: &T) -> bool {
    let limit = bar.body() * LONG_SHADOW_MULTIPLE;
    bar.upper_shadow() > limit && bar.lower_shadow() > limit
}

/// Doji with long shadows on both sides
#[inline]
pub fn is_doji<T: OHLCV>(bar: &T) -> bool {
    is_doji_body(bar) && has_long_shadows(bar)
}

/// Where `price` sits inside the bar's range, 0 at the high and ~1 at the low
#[inline]
pub fn depth_from_high<T: OHLCV>(bar: &T, price: f64) -> f64 {
    (bar.high() - price) / (RANGE_EPSILON + bar.range())
}

/// Where `price` sits inside the bar's range, 0 at the low and ~1 at the high
#[inline]
pub fn height_from_low<T: OHLCV>(bar: &T, price: f64) -> f64 {
    (price - bar.low()) / (RANGE_EPSILON + bar.range())
}

/// `|a - b| <= reference * tolerance`
#[inline]
pub fn near_equal(a: f64, b: f64, reference: f64, tolerance: f64) -> bool {
    (a - b).abs() <= reference * tolerance
}
