//! Candlestick pattern detectors
//!
//! Each detector is a boolean rule over a fixed trailing window of bars.
//!
//! # Pattern Categories
//!
//! - **Single-bar (5)**: Doji variants, Hammer, Inverted Hammer
//! - **Two-bar (13)**: Engulfing, Harami, Stars, Rain Drops, Tweezers, etc.
//! - **Three-bar (5)**: Morning Stars, Three Soldiers/Crows, Hanging Man
//! - **Five-bar (2)**: Bullish/Bearish Three-Method Formation

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod multi_bar;
pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

// Re-export all detectors for convenience
pub use helpers::*;
pub use multi_bar::*;
pub use single_bar::*;
pub use three_bar::*;
pub use two_bar::*;
