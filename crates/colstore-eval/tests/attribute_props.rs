use colstore_eval::{Interval, IntervalAttribute, IntervalFlags};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Set(usize, usize, u8),
    Subtract(usize, usize),
    Insert(usize, usize),
    Remove(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..40, 0usize..8, 0u8..3).prop_map(|(s, l, v)| Op::Set(s, l, v)),
        (0usize..40, 0usize..8).prop_map(|(s, l)| Op::Subtract(s, l)),
        (0usize..40, 1usize..5).prop_map(|(s, c)| Op::Insert(s, c)),
        (0usize..40, 1usize..5).prop_map(|(s, c)| Op::Remove(s, c)),
    ]
}

/// Dense model: one slot per row.
fn apply_model(model: &mut Vec<Option<u8>>, op: &Op) {
    match *op {
        Op::Set(s, l, v) => {
            if model.len() < s + l + 1 {
                model.resize(s + l + 1, None);
            }
            for slot in &mut model[s..=s + l] {
                *slot = Some(v);
            }
        }
        Op::Subtract(s, l) => {
            for slot in model.iter_mut().skip(s).take(l + 1) {
                *slot = None;
            }
        }
        Op::Insert(s, c) => {
            if s <= model.len() {
                for _ in 0..c {
                    model.insert(s, None);
                }
            }
        }
        Op::Remove(s, c) => {
            if s < model.len() {
                let end = (s + c).min(model.len());
                model.drain(s..end);
            }
        }
    }
}

fn apply(map: &mut IntervalAttribute<u8>, op: &Op) {
    match *op {
        Op::Set(s, l, v) => map.set_value(Interval::new(s, s + l), v),
        Op::Subtract(s, l) => map.subtract(&Interval::new(s, s + l)),
        Op::Insert(s, c) => map.insert_rows(s, c),
        Op::Remove(s, c) => map.remove_rows(s, c),
    }
}

proptest! {
    #[test]
    fn attribute_map_matches_dense_model(ops in prop::collection::vec(op(), 1..30)) {
        let mut map = IntervalAttribute::new();
        let mut model: Vec<Option<u8>> = Vec::new();
        for op in &ops {
            // the map has no row count; keep inserts inside the model
            if let Op::Insert(s, _) = op {
                if *s > model.len() {
                    continue;
                }
            }
            apply(&mut map, op);
            apply_model(&mut model, op);
            prop_assert!(map.is_normalized());
        }
        for (row, expected) in model.iter().enumerate() {
            prop_assert_eq!(map.get(row).copied(), *expected);
        }
        prop_assert!(map.get(model.len() + 10).is_none());
    }

    #[test]
    fn flags_stay_coalesced(sets in prop::collection::vec((0usize..60, 0usize..6, any::<bool>()), 1..40)) {
        let mut flags = IntervalFlags::new();
        let mut dense = vec![false; 70];
        for (s, l, on) in sets {
            flags.set(Interval::new(s, s + l), on);
            for slot in &mut dense[s..=s + l] {
                *slot = on;
            }
            prop_assert!(flags.is_normalized());
        }
        for (row, on) in dense.iter().enumerate() {
            prop_assert_eq!(flags.is_set(row), *on);
        }
        let runs: Vec<Interval> = flags.intervals().collect();
        for pair in runs.windows(2) {
            prop_assert!(pair[0].end() + 1 < pair[1].start());
        }
    }
}
