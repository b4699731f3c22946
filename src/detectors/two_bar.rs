//! Two-bar candlestick pattern detectors
//!
//! Patterns: bullish_engulfing, bearish_engulfing, bullish_harami, bearish_harami,
//! dark_cloud_cover, piercing_pattern, doji_star, star, rain_drop, rain_drop_doji,
//! shooting_star, tweezer_tops, tweezer_bottoms

use super::helpers::{self, window};
use crate::{Direction, OHLCVExt, PatternDetector, PatternId, Ratio, Result, OHLCV};

impl_with_defaults!(
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
);

// ============================================================
// ENGULFING
// ============================================================

/// Bullish Engulfing - bullish body swallows the prior bearish body
#[derive(Debug, Clone, Copy, Default)]
pub struct BullishEngulfingDetector;

impl PatternDetector for BullishEngulfingDetector {
    fn id(&self) -> PatternId {
        PatternId("bullish_engulfing")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([prev, curr]) = window::<_, 2>(bars, index) else {
            return false;
        };

        curr.close() >= prev.open()
            && prev.open() > prev.close()
            && curr.close() > curr.open()
            && prev.close() >= curr.open()
            && curr.close() - curr.open() > prev.open() - prev.close()
    }
}

/// Bearish Engulfing - bearish body swallows the prior bullish body
#[derive(Debug, Clone, Copy, Default)]
pub struct BearishEngulfingDetector;

impl PatternDetector for BearishEngulfingDetector {
    fn id(&self) -> PatternId {
        PatternId("bearish_engulfing")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([prev, curr]) = window::<_, 2>(bars, index) else {
            return false;
        };

        curr.open() >= prev.close()
            && prev.close() > prev.open()
            && curr.open() > curr.close()
            && prev.open() >= curr.close()
            && curr.open() - curr.close() > prev.close() - prev.open()
    }
}

// ============================================================
// HARAMI
// ============================================================

/// Bullish Harami - small bullish body inside the prior bearish body
#[derive(Debug, Clone, Copy, Default)]
pub struct BullishHaramiDetector;

impl PatternDetector for BullishHaramiDetector {
    fn id(&self) -> PatternId {
        PatternId("bullish_harami")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([prev, curr]) = window::<_, 2>(bars, index) else {
            return false;
        };

        prev.is_bearish()
            && prev.close() <= curr.open()
            && curr.open() < curr.close()
            && curr.close() <= prev.open()
            && curr.body() < prev.body()
    }
}

/// Bearish Harami - small bearish body inside the prior bullish body
#[derive(Debug, Clone, Copy, Default)]
pub struct BearishHaramiDetector;

impl PatternDetector for BearishHaramiDetector {
    fn id(&self) -> PatternId {
        PatternId("bearish_harami")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([prev, curr]) = window::<_, 2>(bars, index) else {
            return false;
        };

        prev.is_bullish()
            && prev.open() <= curr.close()
            && curr.close() < curr.open()
            && curr.open() <= prev.close()
            && curr.body() < prev.body()
    }
}

// ============================================================
// DARK CLOUD COVER / PIERCING
// ============================================================

/// Dark Cloud Cover - long bearish bar opens above a long bullish bar and
/// closes below its midpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct DarkCloudCoverDetector;

impl PatternDetector for DarkCloudCoverDetector {
    fn id(&self) -> PatternId {
        PatternId("dark_cloud_cover")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([prev, curr]) = window::<_, 2>(bars, index) else {
            return false;
        };

        prev.is_bullish()
            && helpers::is_long_body(prev)
            && curr.is_bearish()
            && helpers::is_long_body(curr)
            && curr.open() >= prev.close()
            && prev.open() < curr.close()
            && curr.close() < prev.body_midpoint()
    }
}

/// Piercing Pattern - bar opens below the prior bearish low and closes above
/// the prior body's midpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct PiercingPatternDetector;

impl PatternDetector for PiercingPatternDetector {
    fn id(&self) -> PatternId {
        PatternId("piercing_pattern")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([prev, curr]) = window::<_, 2>(bars, index) else {
            return false;
        };

        prev.is_bearish()
            && curr.open() < prev.low()
            && prev.open() > curr.close()
            && curr.close() > prev.body_midpoint()
    }
}

// ============================================================
// STARS
// ============================================================

/// Doji Star - long bullish bar followed by a doji above its close
#[derive(Debug, Clone, Copy, Default)]
pub struct DojiStarDetector;

impl PatternDetector for DojiStarDetector {
    fn id(&self) -> PatternId {
        PatternId("doji_star")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([prev, curr]) = window::<_, 2>(bars, index) else {
            return false;
        };

        prev.is_bullish()
            && helpers::is_long_body(prev)
            && helpers::is_doji(curr)
            && prev.close() < curr.close()
            && prev.close() < curr.open()
    }
}

/// Star - long bullish bar followed by a small body above its close
#[derive(Debug, Clone, Copy, Default)]
pub struct StarDetector;

impl PatternDetector for StarDetector {
    fn id(&self) -> PatternId {
        PatternId("star")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([prev, curr]) = window::<_, 2>(bars, index) else {
            return false;
        };

        prev.is_bullish()
            && helpers::is_long_body(prev)
            && helpers::is_star_body(curr)
            && prev.close() < curr.close()
            && prev.close() < curr.open()
    }
}

/// Rain Drop - long bearish bar followed by a small body below its close
#[derive(Debug, Clone, Copy, Default)]
pub struct RainDropDetector;

impl PatternDetector for RainDropDetector {
    fn id(&self) -> PatternId {
        PatternId("rain_drop")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([prev, curr]) = window::<_, 2>(bars, index) else {
            return false;
        };

        prev.is_bearish()
            && helpers::is_long_body(prev)
            && helpers::is_star_body(curr)
            && prev.close() > curr.close()
            && prev.close() > curr.open()
    }
}

/// Rain Drop Doji - long bearish bar followed by a doji below its close
#[derive(Debug, Clone, Copy, Default)]
pub struct RainDropDojiDetector;

impl PatternDetector for RainDropDojiDetector {
    fn id(&self) -> PatternId {
        PatternId("rain_drop_doji")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([prev, curr]) = window::<_, 2>(bars, index) else {
            return false;
        };

        prev.is_bearish()
            && helpers::is_long_body(prev)
            && helpers::is_doji(curr)
            && prev.close() > curr.close()
            && prev.close() > curr.open()
    }
}

/// Shooting Star - opens above a bullish close, long upper shadow, little
/// lower shadow
#[derive(Debug, Clone, Copy, Default)]
pub struct ShootingStarDetector;

impl PatternDetector for ShootingStarDetector {
    fn id(&self) -> PatternId {
        PatternId("shooting_star")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([prev, curr]) = window::<_, 2>(bars, index) else {
            return false;
        };
        let body = curr.body();

        prev.open() < prev.close()
            && prev.close() < curr.open()
            && curr.upper_shadow() >= body * helpers::LONG_SHADOW_MULTIPLE
            && curr.lower_shadow() <= body
    }
}

// ============================================================
// TWEEZERS
// ============================================================

/// Tweezer Tops - matching highs, bullish then bearish, second closes below
/// the first body's midpoint
#[derive(Debug, Clone, Copy)]
pub struct TweezerTopsDetector {
    /// Allowed |high1 - high2| as a fraction of the first high
    pub tolerance: Ratio,
}

impl Default for TweezerTopsDetector {
    fn default() -> Self {
        Self {
            tolerance: Ratio::new_const(helpers::TWEEZER_TOLERANCE),
        }
    }
}

impl PatternDetector for TweezerTopsDetector {
    fn id(&self) -> PatternId {
        PatternId("tweezer_tops")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([first, second]) = window::<_, 2>(bars, index) else {
            return false;
        };

        helpers::near_equal(first.high(), second.high(), first.high(), self.tolerance.get())
            && first.is_bullish()
            && second.is_bearish()
            && second.close() < first.body_midpoint()
    }

    fn validate_config(&self) -> Result<()> {
        Ratio::new(self.tolerance.get()).map(|_| ())
    }
}

/// Tweezer Bottoms - matching lows, bearish then bullish, second closes above
/// the first body's midpoint
#[derive(Debug, Clone, Copy)]
pub struct TweezerBottomsDetector {
    /// Allowed |low1 - low2| as a fraction of the first low
    pub tolerance: Ratio,
}

impl Default for TweezerBottomsDetector {
    fn default() -> Self {
        Self {
            tolerance: Ratio::new_const(helpers::TWEEZER_TOLERANCE),
        }
    }
}

impl PatternDetector for TweezerBottomsDetector {
    fn id(&self) -> PatternId {
        PatternId("tweezer_bottoms")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([first, second]) = window::<_, 2>(bars, index) else {
            return false;
        };

        helpers::near_equal(first.low(), second.low(), first.low(), self.tolerance.get())
            && first.is_bearish()
            && second.is_bullish()
            && second.close() > first.body_midpoint()
    }

    fn validate_config(&self) -> Result<()> {
        Ratio::new(self.tolerance.get()).map(|_| ())
    }
}
