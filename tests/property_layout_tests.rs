use std::collections::HashMap;

use chart_compose::core::{
    BucketStrategy, Datum, DatumKey, Encoding, Scale, accessor, colour_domain, prepare_points,
};
use chart_compose::layout::{
    LABEL_FONT_FLOOR_PX, LabelFit, TickLabel, facet_bands, legend_domain, partition_facets,
    remove_overlapping_ticks, shrink_to_fit,
};
use proptest::prelude::*;
use serde_json::{Value, json};

fn encoding() -> Encoding {
    Encoding {
        x: accessor::field("x").expect("x"),
        y: accessor::field("y").expect("y"),
        x2: None,
        y2: None,
        colour: Some(accessor::field("c").expect("c")),
        size: None,
    }
}

fn rows_strategy() -> impl Strategy<Value = Vec<(u8, u8, i32)>> {
    prop::collection::vec((0u8..6, 0u8..4, -50i32..500), 0..80)
}

fn to_rows(raw: &[(u8, u8, i32)]) -> Vec<Value> {
    raw.iter()
        .map(|(x, c, y)| json!({"x": format!("x{x}"), "c": format!("c{c}"), "y": y}))
        .collect()
}

proptest! {
    #[test]
    fn retained_ticks_never_overlap(
        positions in prop::collection::vec(0.0f64..2_000.0, 0..60),
        footprint in 1.0f64..120.0
    ) {
        let ticks: Vec<TickLabel> = positions
            .iter()
            .enumerate()
            .map(|(i, p)| TickLabel {
                value: Datum::Number(i as f64),
                position: *p,
                text: i.to_string(),
            })
            .collect();
        let leftmost = positions.iter().copied().fold(f64::INFINITY, f64::min);

        let kept = remove_overlapping_ticks(ticks, footprint);
        for pair in kept.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.position + footprint / 2.0 <= b.position - footprint / 2.0 + 1e-9);
        }
        if let Some(first) = kept.first() {
            prop_assert_eq!(first.position, leftmost);
        }
    }

    #[test]
    fn shrink_to_fit_never_grows_labels(
        largest in 0.0f64..500.0,
        available in 0.0f64..500.0,
        base in 8.0f64..40.0
    ) {
        match shrink_to_fit(largest, available, base) {
            LabelFit::Keep => prop_assert!(largest <= available * 1.05 || largest == 0.0),
            LabelFit::Shrink { font_size } => {
                prop_assert!(font_size < base);
                prop_assert!(font_size >= LABEL_FONT_FLOOR_PX);
            }
            LabelFit::Remove => prop_assert!(largest > available),
        }
    }

    #[test]
    fn discrete_consolidation_preserves_colour_sums(raw in rows_strategy()) {
        let rows = to_rows(&raw);
        let indexed: Vec<(usize, &Value)> = rows.iter().enumerate().collect();
        let points = prepare_points(&indexed, &encoding(), Scale::Discrete, &DatumKey::Missing)
            .expect("points");

        let mut expected: HashMap<String, f64> = HashMap::new();
        for (_, c, y) in &raw {
            *expected.entry(format!("c{c}")).or_default() += f64::from(*y);
        }

        let strategy = BucketStrategy::Discrete;
        let groups = strategy.group(points).expect("group");
        let mut actual: HashMap<String, f64> = HashMap::new();
        let mut members = 0;
        for row in strategy.consolidate_buckets(&groups) {
            *actual.entry(row.colour.label()).or_default() += row.value;
            members += row.members.len();
        }
        prop_assert_eq!(members, raw.len());
        prop_assert_eq!(actual.len(), expected.len());
        for (colour, sum) in expected {
            prop_assert!((actual[&colour] - sum).abs() < 1e-9);
        }
    }

    #[test]
    fn every_row_lands_in_exactly_one_facet(raw in rows_strategy()) {
        let rows = to_rows(&raw);
        let facet = accessor::field("c").expect("facet");
        let facets = partition_facets(&rows, Some(&facet));

        let mut seen: Vec<usize> = facets.values().flatten().copied().collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..rows.len()).collect::<Vec<_>>());

        let bands = facet_bands(facets.len(), 600.0, 16.0);
        prop_assert_eq!(bands.len(), facets.len());
        for pair in bands.windows(2) {
            prop_assert!(pair[0].0 + pair[0].1 <= pair[1].0);
        }
    }

    #[test]
    fn series_order_is_first_seen_and_reproducible(raw in rows_strategy()) {
        let rows = to_rows(&raw);
        let indexed: Vec<(usize, &Value)> = rows.iter().enumerate().collect();
        let first = prepare_points(&indexed, &encoding(), Scale::Discrete, &DatumKey::Missing)
            .expect("points");
        let second = prepare_points(&indexed, &encoding(), Scale::Discrete, &DatumKey::Missing)
            .expect("points");

        let mut manual: Vec<DatumKey> = Vec::new();
        for (_, c, _) in &raw {
            let key = DatumKey::Text(format!("c{c}"));
            if !manual.contains(&key) {
                manual.push(key);
            }
        }
        let domain = colour_domain(&first);
        prop_assert_eq!(&domain, &manual);
        prop_assert_eq!(&colour_domain(&second), &manual);

        let merged = legend_domain([domain.as_slice(), manual.as_slice()]);
        prop_assert_eq!(merged, manual);
    }
}
