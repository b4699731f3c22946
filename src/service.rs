//! Request-level entry points for a web layer
//!
//! A request names a symbol, an interval and a bar limit (used by the caller
//! to fetch klines), a pattern family and a target pattern. The raw klines are
//! passed in alongside; nothing here performs I/O.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    chart::{extract_info, find_hs_patterns, HsConfig, PatternInfo},
    BarSeries, PatternError, PatternMatch, PatternRegistry, Result,
};

/// Default number of most recent candlestick matches returned per request
pub const DEFAULT_MAX_RESULTS: usize = 20;

pub const HEAD_AND_SHOULDERS: &str = "headAndShoulders";
pub const INVERSE_HEAD_AND_SHOULDERS: &str = "inverseHeadAndShoulders";

// ============================================================
// CONFIG
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Keep only this many of the most recent candlestick matches.
    /// `None` returns all of them.
    pub max_results: Option<usize>,
    pub head_shoulders: HsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_results: Some(DEFAULT_MAX_RESULTS),
            head_shoulders: HsConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PatternError::InvalidConfig(e.to_string()))?;
        config.head_shoulders.validate()?;
        Ok(config)
    }
}

// ============================================================
// CORE CALLS
// ============================================================

/// Every match of the named candlestick pattern, oldest first
pub fn detect_candlestick_pattern<R: AsRef<[serde_json::Value]>>(
    registry: &PatternRegistry,
    name: &str,
    raw: &[R],
) -> Result<Vec<PatternMatch>> {
    // Resolve the name before touching the data so unknown names fail fast
    let detector = registry.get(name)?;
    let series = BarSeries::from_raw(raw)?;
    let matches: Vec<_> = registry.detect(name, &series)?.collect();
    debug!(
        pattern = %detector.id(),
        bars = series.len(),
        matches = matches.len(),
        "candlestick scan"
    );
    Ok(matches)
}

/// Head-and-shoulders formations of both kinds resolved against `raw`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HsReport {
    pub head_and_shoulders: Vec<PatternInfo>,
    pub inverse_head_and_shoulders: Vec<PatternInfo>,
}

pub fn find_head_and_shoulders<R: AsRef<[serde_json::Value]>>(
    raw: &[R],
    config: &HsConfig,
) -> Result<HsReport> {
    let series = BarSeries::from_raw(raw)?;
    let patterns = find_hs_patterns(&series.log_closes()?, config)?;

    let resolve = |found: &[crate::chart::HsPattern]| -> Result<Vec<PatternInfo>> {
        found.iter().map(|p| extract_info(p, &series)).collect()
    };
    Ok(HsReport {
        head_and_shoulders: resolve(&patterns.head_and_shoulders)?,
        inverse_head_and_shoulders: resolve(&patterns.inverse)?,
    })
}

// ============================================================
// REQUEST DISPATCH
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternType {
    #[serde(rename = "candlestickPatterns")]
    Candlestick,
    #[serde(rename = "chart")]
    Chart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRequest {
    pub symbol: String,
    /// Candlestick name (any casing) or chart target
    pub target: String,
    #[serde(alias = "pattern_type")]
    pub pattern_type: PatternType,
    pub interval: String,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PatternResponse {
    Candlestick(Vec<PatternMatch>),
    Chart(Vec<PatternInfo>),
}

impl PatternResponse {
    pub fn len(&self) -> usize {
        match self {
            PatternResponse::Candlestick(m) => m.len(),
            PatternResponse::Chart(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Answer one request against the klines fetched for it
pub fn handle_request<R: AsRef<[serde_json::Value]>>(
    registry: &PatternRegistry,
    config: &ServiceConfig,
    request: &PatternRequest,
    raw: &[R],
) -> Result<PatternResponse> {
    info!(
        symbol = %request.symbol,
        target = %request.target,
        interval = %request.interval,
        limit = request.limit,
        "pattern request"
    );

    match request.pattern_type {
        PatternType::Candlestick => {
            let mut matches = detect_candlestick_pattern(registry, &request.target, raw)?;
            if let Some(max) = config.max_results {
                let skip = matches.len().saturating_sub(max);
                matches.drain(..skip);
            }
            Ok(PatternResponse::Candlestick(matches))
        }
        PatternType::Chart => {
            // Validate the target before the series work
            let inverse = match request.target.as_str() {
                HEAD_AND_SHOULDERS => false,
                INVERSE_HEAD_AND_SHOULDERS => true,
                other => return Err(PatternError::UnsupportedTarget(other.to_string())),
            };
            let report = find_head_and_shoulders(raw, &config.head_shoulders)?;
            Ok(PatternResponse::Chart(if inverse {
                report.inverse_head_and_shoulders
            } else {
                report.head_and_shoulders
            }))
        }
    }
}
