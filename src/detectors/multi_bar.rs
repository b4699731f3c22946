//! Five-bar candlestick pattern detectors
//!
//! Patterns: bullish_three_method_formation, bearish_three_method_formation

use super::helpers::window;
use crate::{Direction, OHLCVExt, PatternDetector, PatternId, OHLCV};

impl_with_defaults!(
    BullishThreeMethodFormationDetector,
    BearishThreeMethodFormationDetector,
);

// ============================================================
// THREE METHOD FORMATIONS
// ============================================================

/// Bullish Three-Method Formation - bullish bar, three bars inside its range,
/// then a bullish bar closing above the first close
#[derive(Debug, Clone, Copy, Default)]
pub struct BullishThreeMethodFormationDetector;

impl PatternDetector for BullishThreeMethodFormationDetector {
    fn id(&self) -> PatternId {
        PatternId("bullish_three_method_formation")
    }

    fn min_bars(&self) -> usize {
        5
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([first, second, third, fourth, last]) = window::<_, 5>(bars, index) else {
            return false;
        };

        if !first.is_bullish() || !last.is_bullish() {
            return false;
        }
        if last.close() <= first.close() {
            return false;
        }

        [second, third, fourth].into_iter().all(|bar| bar.is_inside(first))
    }
}

/// Bearish Three-Method Formation - bearish bar, three bars inside its range,
/// then a bearish bar closing below the first close
#[derive(Debug, Clone, Copy, Default)]
pub struct BearishThreeMethodFormationDetector;

impl PatternDetector for BearishThreeMethodFormationDetector {
    fn id(&self) -> PatternId {
        PatternId("bearish_three_method_formation")
    }

    fn min_bars(&self) -> usize {
        5
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        let Some([first, second, third, fourth, last]) = window::<_, 5>(bars, index) else {
            return false;
        };

        if !first.is_bearish() || !last.is_bearish() {
            return false;
        }
        if last.close() >= first.close() {
            return false;
        }

        [second, third, fourth].into_iter().all(|bar| bar.is_inside(first))
    }
}
