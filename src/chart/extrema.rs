//! Rolling-window local extrema
//!
//! A bar at `k` is confirmed as a peak (trough) once `order` bars on each side
//! are known and all of them are strictly below (above) it. Confirmation
//! therefore happens at `k + order`, which is the index the scan reports.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremumKind {
    Peak,
    Trough,
}

impl ExtremumKind {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            ExtremumKind::Peak => ExtremumKind::Trough,
            ExtremumKind::Trough => ExtremumKind::Peak,
        }
    }
}

/// A local maximum or minimum of a price series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extremum {
    pub index: usize,
    pub price: f64,
    pub kind: ExtremumKind,
}

/// Peak confirmed at `current`, i.e. located at `current - order`
pub(crate) fn rolling_top(data: &[f64], current: usize, order: usize) -> Option<Extremum> {
    confirmed(data, current, order, ExtremumKind::Peak)
}

/// Trough confirmed at `current`, i.e. located at `current - order`
pub(crate) fn rolling_bottom(data: &[f64], current: usize, order: usize) -> Option<Extremum> {
    confirmed(data, current, order, ExtremumKind::Trough)
}

fn confirmed(data: &[f64], current: usize, order: usize, kind: ExtremumKind) -> Option<Extremum> {
    if order == 0 || current < 2 * order + 1 || current >= data.len() {
        return None;
    }
    let k = current - order;
    let v = data[k];
    let dominates = |other: f64| match kind {
        ExtremumKind::Peak => other < v,
        ExtremumKind::Trough => other > v,
    };
    (1..=order)
        .all(|i| dominates(data[k - i]) && dominates(data[k + i]))
        .then_some(Extremum {
            index: k,
            price: v,
            kind,
        })
}

/// Every extremum of `data` under an order-`order` rule, ordered by index.
///
/// Returns nothing for `order == 0`.
pub fn find_extrema(data: &[f64], order: usize) -> Vec<Extremum> {
    let mut out = Vec::new();
    for current in 0..data.len() {
        if let Some(top) = rolling_top(data, current, order) {
            out.push(top);
        }
        if let Some(bottom) = rolling_bottom(data, current, order) {
            out.push(bottom);
        }
    }
    out
}
