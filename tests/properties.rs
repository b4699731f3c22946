//! Property tests over arbitrary bar series.

use proptest::prelude::*;
use tradingmind::prelude::*;

const T0: i64 = 1_700_000_000_000;
const MINUTE: i64 = 60_000;

/// (open, close, upper wick, lower wick), all positive
fn bar_strategy() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (50.0..150.0f64, 50.0..150.0f64, 0.0..10.0f64, 0.0..10.0f64)
}

fn to_series(raw: &[(f64, f64, f64, f64)]) -> BarSeries {
    let bars = raw
        .iter()
        .enumerate()
        .map(|(i, &(o, c, up, down))| {
            let (h, l) = (o.max(c) + up, o.min(c) - down);
            Bar::from_millis(T0 + i as i64 * MINUTE, o, h, l, c, 1.0).unwrap()
        })
        .collect();
    BarSeries::new(bars).unwrap()
}

proptest! {
    #[test]
    fn detection_is_deterministic(raw in prop::collection::vec(bar_strategy(), 1..60)) {
        let registry = PatternRegistry::default();
        let series = to_series(&raw);
        for name in registry.names() {
            let first: Vec<_> = registry.detect(name, &series).unwrap().collect();
            let second: Vec<_> = registry.detect(name, &series).unwrap().collect();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn short_series_never_match(raw in prop::collection::vec(bar_strategy(), 1..5)) {
        let registry = PatternRegistry::default();
        let series = to_series(&raw);
        for name in registry.names() {
            let detector = registry.get(name).unwrap();
            if series.len() < detector.min_bars() {
                prop_assert_eq!(registry.detect(name, &series).unwrap().count(), 0);
            }
        }
    }

    #[test]
    fn matches_round_trip_to_their_bar(raw in prop::collection::vec(bar_strategy(), 1..60)) {
        let registry = PatternRegistry::default();
        let series = to_series(&raw);
        for scan in registry.scan_all(&series) {
            let detector = registry.get(scan.pattern_id.as_str()).unwrap();
            let mut previous = None;
            for m in &scan.matches {
                let (index, bar) = series.find_bar(m.timestamp).unwrap();
                prop_assert_eq!(index, m.index);
                prop_assert_eq!(bar.timestamp, m.timestamp);
                prop_assert!(index + 1 >= detector.min_bars());
                prop_assert!(detector.detect(series.bars(), index));
                prop_assert!(previous.map_or(true, |p| p < index));
                previous = Some(index);
            }
        }
    }

    #[test]
    fn hs_finder_is_total_and_ordered(
        closes in prop::collection::vec(1.0..1000.0f64, 0..200),
        order in 1usize..8,
    ) {
        let logs: Vec<f64> = closes.iter().map(|c| c.ln()).collect();
        let config = HsConfig::new(order, false).unwrap();
        let found = find_hs_patterns(&logs, &config).unwrap();
        for family in [&found.head_and_shoulders, &found.inverse] {
            prop_assert!(family.windows(2).all(|w| w[0].start <= w[1].start));
            for p in family.iter() {
                prop_assert!(p.start < p.l_shoulder);
                prop_assert!(p.l_shoulder < p.l_armpit && p.l_armpit < p.head);
                prop_assert!(p.head < p.r_armpit && p.r_armpit < p.r_shoulder);
                prop_assert!(p.r_shoulder < p.end && p.end < logs.len());
                prop_assert_eq!(p.head_width, p.r_armpit - p.l_armpit);
                prop_assert!(p.r_squared <= 1.0);
            }
        }
    }
}
