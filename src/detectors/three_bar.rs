//! Three-bar candlestick pattern detectors
//!
//! Patterns: hanging_man, morning_star, morning_star_doji, three_white_soldiers,
//! three_black_crows

use super::helpers::{self, window};
use crate::{Direction, OHLCVExt, PatternDetector, PatternId, Result, OHLCV};

impl_with_defaults!(
  HangingManDetector,
  MorningStarDetector,
  MorningStarDojiDetector,
  ThreeWhiteSoldiersDetector,
  ThreeBlackCrowsDetector,
);

// ============================================================
// THREE WHITE SOLDIERS / THREE BLACK CROWS
// ============================================================

/// Three White Soldiers
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeWhiteSoldiersDetector;

impl PatternDetector for ThreeWhiteSoldiersDetector {
  fn id(&self) -> PatternId {
    PatternId("three_white_soldiers")
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn direction(&self) -> Direction {
    Direction::Bullish
  }

  fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
    let Some([first, second, third]) = window::<_, 3>(bars, index) else {
      return false;
    };

    if !first.is_bullish() || !second.is_bullish() || !third.is_bullish() {
      return false;
    }

    // Each opens inside the previous body
    if second.open() <= first.open() || second.open() >= first.close() {
      return false;
    }
    if third.open() <= second.open() || third.open() >= second.close() {
      return false;
    }

    // Ascending closes
    second.close() > first.close() && third.close() > second.close()
  }
}

/// Three Black Crows
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeBlackCrowsDetector;

impl PatternDetector for ThreeBlackCrowsDetector {
  fn id(&self) -> PatternId {
    PatternId("three_black_crows")
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn direction(&self) -> Direction {
    Direction::Bearish
  }

  fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
    let Some([first, second, third]) = window::<_, 3>(bars, index) else {
      return false;
    };

    if !first.is_bearish() || !second.is_bearish() || !third.is_bearish() {
      return false;
    }

    // Each opens inside the previous body (strict)
    if second.open() >= first.open() || second.open() <= first.close() {
      return false;
    }
    if third.open() >= second.open() || third.open() <= second.close() {
      return false;
    }

    // Declining closes
    second.close() < first.close() && third.close() < second.close()
  }
}

// ============================================================
// MORNING STAR
// ============================================================

/// Morning Star - bearish bar, a body gapping below its close, then a bullish
/// bar opening above the middle body
#[derive(Debug, Clone, Copy, Default)]
pub struct MorningStarDetector;

impl PatternDetector for MorningStarDetector {
  fn id(&self) -> PatternId {
    PatternId("morning_star")
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn direction(&self) -> Direction {
    Direction::Bullish
  }

  fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
    let Some([first, star, last]) = window::<_, 3>(bars, index) else {
      return false;
    };
    let star_top = star.body_top();

    star_top < first.close()
      && first.close() < first.open()
      && last.close() > last.open()
      && last.open() > star_top
  }
}

/// Morning Star Doji - long bearish bar, a doji below it, then a long bullish
/// bar closing above the first close
#[derive(Debug, Clone, Copy, Default)]
pub struct MorningStarDojiDetector;

impl PatternDetector for MorningStarDojiDetector {
  fn id(&self) -> PatternId {
    PatternId("morning_star_doji")
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn direction(&self) -> Direction {
    Direction::Bullish
  }

  fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
    let Some([first, star, last]) = window::<_, 3>(bars, index) else {
      return false;
    };

    if !first.is_bearish() || !helpers::is_long_body(first) {
      return false;
    }
    if !helpers::is_doji(star) {
      return false;
    }
    if !last.is_bullish() || !helpers::is_long_body(last) {
      return false;
    }

    first.close() > star.body_top()
      && star.body_top() < last.open()
      && last.close() > first.close()
  }
}

// ============================================================
// HANGING MAN
// ============================================================

/// Hanging Man - hammer shape making a new high over the two prior bars
#[derive(Debug, Clone, Copy)]
pub struct HangingManDetector {
  pub position_ratio: f64,
}

impl Default for HangingManDetector {
  fn default() -> Self {
    Self { position_ratio: helpers::HANGING_MAN_POSITION_RATIO }
  }
}

impl PatternDetector for HangingManDetector {
  fn id(&self) -> PatternId {
    PatternId("hanging_man")
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn direction(&self) -> Direction {
    Direction::Bearish
  }

  fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
    let Some([first, second, bar]) = window::<_, 3>(bars, index) else {
      return false;
    };

    bar.range() > helpers::HANGING_MAN_RANGE_MULTIPLE * (bar.open() - bar.close())
      && helpers::height_from_low(bar, bar.close()) >= self.position_ratio
      && helpers::height_from_low(bar, bar.open()) >= self.position_ratio
      && bar.high() > first.high()
      && bar.high() > second.high()
  }

  fn validate_config(&self) -> Result<()> {
    crate::Ratio::new(self.position_ratio).map(|_| ())
  }
}
