//! Parameter metadata for tunable detectors
//!
//! This module provides metadata about detector parameters, enabling:
//! - Grid search over thresholds
//! - Parameter documentation
//! - Building detectors from loosely typed request parameters
//!
//! # Example
//!
//! ```rust
//! use tradingmind::params::{ParamMeta, ParamType, ParameterizedDetector};
//! use tradingmind::prelude::*;
//!
//! for param in TweezerBottomsDetector::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//! ```

use std::collections::HashMap;

use crate::{
  detectors::{
    helpers, HammerDetector, HangingManDetector, InvertedHammerDetector, TweezerBottomsDetector,
    TweezerTopsDetector,
  },
  PatternError, Period, Ratio, Result,
};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value (0.0..=1.0 typically, but can exceed 1.0 for factors like max_time_ratio)
  Ratio,
  /// Period value (positive integer)
  Period,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "tolerance")
  pub name: &'static str,
  /// Parameter type (Ratio or Period)
  pub param_type: ParamType,
  /// Default value
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  /// Create a new ParamMeta for a Ratio parameter
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  /// Create a new ParamMeta for a Period parameter
  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    let mut values = Vec::new();
    let mut v = min;
    while v <= max + f64::EPSILON {
      values.push(v);
      v += step;
    }
    values
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value < min || value > max {
      return Err(PatternError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio => Ok(()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(PatternError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Trait for detectors that support parameterization
///
/// Implementing this trait enables:
/// - Discovery of available parameters
/// - Creation of detectors with custom parameter values
/// - Grid search optimization
pub trait ParameterizedDetector: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a detector with parameters from a HashMap
  ///
  /// Missing parameters use their default values.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  /// Returns the pattern ID string
  fn pattern_id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  if value < 1.0 || value.fract() != 0.0 {
    return Err(PatternError::InvalidValue("Period must be a positive integer"));
  }
  Period::new(value as usize)
}

/// Look up `key`, validate it against its metadata, fall back to the default
fn checked(params: &HashMap<&str, f64>, meta: &ParamMeta) -> Result<f64> {
  match params.get(meta.name) {
    Some(&value) => {
      meta.validate(value)?;
      Ok(value)
    },
    None => Ok(meta.default),
  }
}

fn checked_ratio(params: &HashMap<&str, f64>, meta: &ParamMeta) -> Result<Ratio> {
  let ratio = get_ratio(params, meta.name, meta.default)?;
  meta.validate(ratio.get())?;
  Ok(ratio)
}

// ============================================================
// PARAMETERIZED DETECTOR IMPLEMENTATIONS
// ============================================================

static TWEEZER_TOPS_PARAMS: &[ParamMeta] = &[ParamMeta::ratio(
  "tolerance",
  helpers::TWEEZER_TOLERANCE,
  (0.001, 0.02, 0.001),
  "High price tolerance relative to the first high",
)];

static TWEEZER_BOTTOMS_PARAMS: &[ParamMeta] = &[ParamMeta::ratio(
  "tolerance",
  helpers::TWEEZER_TOLERANCE,
  (0.001, 0.02, 0.001),
  "Low price tolerance relative to the first low",
)];

static HAMMER_PARAMS: &[ParamMeta] = &[ParamMeta::ratio(
  "position_ratio",
  helpers::HAMMER_POSITION_RATIO,
  (0.5, 0.9, 0.05),
  "Minimum height of open and close within the range",
)];

static INVERTED_HAMMER_PARAMS: &[ParamMeta] = &[ParamMeta::ratio(
  "position_ratio",
  helpers::HAMMER_POSITION_RATIO,
  (0.5, 0.9, 0.05),
  "Minimum depth of open and close below the high",
)];

static HANGING_MAN_PARAMS: &[ParamMeta] = &[ParamMeta::ratio(
  "position_ratio",
  helpers::HANGING_MAN_POSITION_RATIO,
  (0.6, 0.95, 0.05),
  "Minimum height of open and close within the range",
)];

impl ParameterizedDetector for TweezerTopsDetector {
  fn param_meta() -> &'static [ParamMeta] {
    TWEEZER_TOPS_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self { tolerance: checked_ratio(params, &TWEEZER_TOPS_PARAMS[0])? })
  }

  fn pattern_id_str() -> &'static str {
    "tweezer_tops"
  }
}

impl ParameterizedDetector for TweezerBottomsDetector {
  fn param_meta() -> &'static [ParamMeta] {
    TWEEZER_BOTTOMS_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self { tolerance: checked_ratio(params, &TWEEZER_BOTTOMS_PARAMS[0])? })
  }

  fn pattern_id_str() -> &'static str {
    "tweezer_bottoms"
  }
}

impl ParameterizedDetector for HammerDetector {
  fn param_meta() -> &'static [ParamMeta] {
    HAMMER_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self { position_ratio: checked(params, &HAMMER_PARAMS[0])? })
  }

  fn pattern_id_str() -> &'static str {
    "hammer"
  }
}

impl ParameterizedDetector for InvertedHammerDetector {
  fn param_meta() -> &'static [ParamMeta] {
    INVERTED_HAMMER_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self { position_ratio: checked(params, &INVERTED_HAMMER_PARAMS[0])? })
  }

  fn pattern_id_str() -> &'static str {
    "inverted_hammer"
  }
}

impl ParameterizedDetector for HangingManDetector {
  fn param_meta() -> &'static [ParamMeta] {
    HANGING_MAN_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self { position_ratio: checked(params, &HANGING_MAN_PARAMS[0])? })
  }

  fn pattern_id_str() -> &'static str {
    "hanging_man"
  }
}

// ============================================================
// TESTS
// ============================================================
