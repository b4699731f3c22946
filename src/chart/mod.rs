//! Chart-structure patterns over closing prices
//!
//! - [`extrema`]: order-k local peaks and troughs
//! - [`head_shoulders`]: classic and inverse head-and-shoulders

pub mod extrema;
pub mod head_shoulders;

pub use extrema::{find_extrema, Extremum, ExtremumKind};
pub use head_shoulders::{
    extract_info, find_hs_patterns, HsConfig, HsPattern, HsPatterns, HsScanner, PatternInfo,
};
