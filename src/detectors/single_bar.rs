//! Single-bar candlestick pattern detectors
//!
//! Patterns: doji, dragonfly_doji, gravestone_doji, hammer, inverted_hammer
//!
//! Every rule compares a bar's body and shadows with its own range.

use super::helpers::{self, window};
use crate::{Direction, OHLCVExt, PatternDetector, PatternId, OHLCV};

impl_with_defaults!(
    DojiDetector,
    DragonflyDojiDetector,
    GravestoneDojiDetector,
    HammerDetector,
    InvertedHammerDetector,
);

// ============================================================
// DOJI FAMILY
// ============================================================

/// Doji - tiny body with long shadows on both sides
#[derive(Debug, Clone, Copy, Default)]
pub struct DojiDetector;

impl PatternDetector for DojiDetector {
    fn id(&self) -> PatternId {
        PatternId("doji")
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn direction(&self) -> Direction {
        Direction::Neutral
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([bar]) = window::<_, 1>(bars, index) else {
            return false;
        };
        helpers::is_doji(bar)
    }
}

/// Dragonfly Doji - tiny body at the top of a long lower shadow
#[derive(Debug, Clone, Copy, Default)]
pub struct DragonflyDojiDetector;

impl PatternDetector for DragonflyDojiDetector {
    fn id(&self) -> PatternId {
        PatternId("dragonfly_doji")
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([bar]) = window::<_, 1>(bars, index) else {
            return false;
        };
        let body = bar.body();

        helpers::is_doji_body(bar)
            && bar.lower_shadow() > body * helpers::LONG_SHADOW_MULTIPLE
            && bar.upper_shadow() < body
    }
}

/// Gravestone Doji - tiny body at the bottom of a long upper shadow
#[derive(Debug, Clone, Copy, Default)]
pub struct GravestoneDojiDetector;

impl PatternDetector for GravestoneDojiDetector {
    fn id(&self) -> PatternId {
        PatternId("gravestone_doji")
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([bar]) = window::<_, 1>(bars, index) else {
            return false;
        };
        let body = bar.body();

        helpers::is_doji_body(bar)
            && bar.upper_shadow() > body * helpers::LONG_SHADOW_MULTIPLE
            && bar.lower_shadow() <= body
    }
}

// ============================================================
// HAMMER FAMILY
// ============================================================

/// Hammer - open and close both in the upper part of a long range
#[derive(Debug, Clone, Copy)]
pub struct HammerDetector {
    pub position_ratio: f64,
}

impl Default for HammerDetector {
    fn default() -> Self {
        Self {
            position_ratio: helpers::HAMMER_POSITION_RATIO,
        }
    }
}

impl PatternDetector for HammerDetector {
    fn id(&self) -> PatternId {
        PatternId("hammer")
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([bar]) = window::<_, 1>(bars, index) else {
            return false;
        };

        // Signed: a bullish body always passes the range check
        bar.range() > helpers::HAMMER_RANGE_MULTIPLE * (bar.open() - bar.close())
            && helpers::height_from_low(bar, bar.close()) > self.position_ratio
            && helpers::height_from_low(bar, bar.open()) > self.position_ratio
    }

    fn validate_config(&self) -> crate::Result<()> {
        crate::Ratio::new(self.position_ratio).map(|_| ())
    }
}

/// Inverted Hammer - open and close both in the lower part of a long range
#[derive(Debug, Clone, Copy)]
pub struct InvertedHammerDetector {
    pub position_ratio: f64,
}

impl Default for InvertedHammerDetector {
    fn default() -> Self {
        Self {
            position_ratio: helpers::HAMMER_POSITION_RATIO,
        }
    }
}

impl PatternDetector for InvertedHammerDetector {
    fn id(&self) -> PatternId {
        PatternId("inverted_hammer")
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([bar]) = window::<_, 1>(bars, index) else {
            return false;
        };

        bar.range() > helpers::HAMMER_RANGE_MULTIPLE * (bar.open() - bar.close())
            && helpers::depth_from_high(bar, bar.close()) > self.position_ratio
            && helpers::depth_from_high(bar, bar.open()) > self.position_ratio
    }

    fn validate_config(&self) -> crate::Result<()> {
        crate::Ratio::new(self.position_ratio).map(|_| ())
    }
}
