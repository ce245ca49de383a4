//! Property-based tests using proptest.
//!
//! Checks the retraction invariants of the grouping operator against a
//! naive model that recomputes every aggregate from the live multiset:
//! - any interleaving of inserts and valid retractions ends in the same
//!   aggregates as computing over what is left
//! - retracting everything leaves empty aggregates
//! - retracting a value a live group never held is always rejected
//! - both Min/Max strategies agree
//! - grouping always reports bounded-fits metadata
//! - the JSON sink always produces one well-formed array

mod common;

use common::{group_by, run_plan};
use plan_stream::config::{EngineConfig, ExtremumStrategy};
use plan_stream::error::PlanStreamErrorKind;
use plan_stream::output::{JsonArrayOutput, Output};
use plan_stream::physical::{Aggregate, Cardinality, PlanNode, Scan};
use plan_stream::record::Record;
use plan_stream::value::Value;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const AGGS: [(&str, Aggregate, &str); 8] = [
    ("v", Aggregate::Sum, "sum"),
    ("v", Aggregate::Count, "count"),
    ("v", Aggregate::Min, "min"),
    ("v", Aggregate::Max, "max"),
    ("v", Aggregate::First, "first"),
    ("v", Aggregate::Last, "last"),
    ("v", Aggregate::CountDistinct, "count_distinct"),
    ("v", Aggregate::SumDistinct, "sum_distinct"),
];

fn kv(k: u8, v: i64) -> [(&'static str, Value); 2] {
    [("k", Value::Int(k as i64)), ("v", Value::Int(v))]
}

/// Inserts followed by retractions of a chosen subset of them.
fn arb_stream() -> impl Strategy<Value = (Vec<(u8, i64)>, Vec<bool>)> {
    prop::collection::vec((0u8..3, -5i64..5), 1..40).prop_flat_map(|inserts| {
        let n = inserts.len();
        (Just(inserts), prop::collection::vec(any::<bool>(), n))
    })
}

fn build(inserts: &[(u8, i64)], retract: &[bool]) -> Vec<Record> {
    let mut records: Vec<Record> = inserts.iter().map(|(k, v)| Record::insert(kv(*k, *v))).collect();
    for ((k, v), r) in inserts.iter().zip(retract) {
        if *r {
            records.push(Record::retract(kv(*k, *v)));
        }
    }
    records
}

/// Live values per key, in arrival order, after each retraction removed
/// the oldest equal value.
fn model(inserts: &[(u8, i64)], retract: &[bool]) -> BTreeMap<u8, Vec<i64>> {
    let mut live: BTreeMap<u8, Vec<i64>> = BTreeMap::new();
    for (k, v) in inserts {
        live.entry(*k).or_default().push(*v);
    }
    for ((k, v), r) in inserts.iter().zip(retract) {
        if *r {
            let values = live.get_mut(k).unwrap();
            let pos = values.iter().position(|x| x == v).unwrap();
            values.remove(pos);
        }
    }
    live
}

fn expected(values: &[i64]) -> Vec<(&'static str, Value)> {
    let or_null = |v: Option<i64>| v.map(Value::Int).unwrap_or(Value::Null);
    let distinct: BTreeSet<i64> = values.iter().copied().collect();
    vec![
        ("sum", if values.is_empty() { Value::Null } else { Value::Int(values.iter().sum()) }),
        ("count", Value::Int(values.len() as i64)),
        ("min", or_null(values.iter().min().copied())),
        ("max", or_null(values.iter().max().copied())),
        ("first", or_null(values.first().copied())),
        ("last", or_null(values.last().copied())),
        ("count_distinct", Value::Int(distinct.len() as i64)),
        ("sum_distinct", if distinct.is_empty() { Value::Null } else { Value::Int(distinct.iter().sum()) }),
    ]
}

/// Last emitted row per key.
fn last_rows(out: &[Record]) -> BTreeMap<u8, Record> {
    let mut rows = BTreeMap::new();
    for r in out {
        if let Some(Value::Int(k)) = r.value(&"k".into()) {
            rows.insert(*k as u8, r.clone());
        }
    }
    rows
}

fn config(strategy: ExtremumStrategy) -> EngineConfig {
    EngineConfig {
        extremum_strategy: strategy,
        ..EngineConfig::default()
    }
}

fn arb_cardinality() -> impl Strategy<Value = Cardinality> {
    prop_oneof![
        Just(Cardinality::BoundedFitsInLocalStorage),
        Just(Cardinality::BoundedDoesNotFitInLocalStorage),
        Just(Cardinality::Unbounded),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_retractions_match_recomputation((inserts, retract) in arb_stream()) {
        let plan = group_by(PlanNode::Scan(Scan::new("t", Cardinality::Unbounded)), &["k"], &AGGS);
        let out = run_plan(&plan, vec![("t", build(&inserts, &retract))], EngineConfig::default()).unwrap();
        prop_assert_eq!(out.len(), inserts.len() + retract.iter().filter(|r| **r).count());

        let rows = last_rows(&out);
        for (k, values) in model(&inserts, &retract) {
            let row = &rows[&k];
            for (name, want) in expected(&values) {
                prop_assert_eq!(row.value(&name.into()), Some(&want), "key {} column {}", k, name);
            }
        }
    }

    #[test]
    fn prop_retract_everything_leaves_empty_groups(inserts in prop::collection::vec((0u8..3, -5i64..5), 1..30)) {
        let retract = vec![true; inserts.len()];
        let plan = group_by(PlanNode::Scan(Scan::new("t", Cardinality::Unbounded)), &["k"], &AGGS);
        let out = run_plan(&plan, vec![("t", build(&inserts, &retract))], EngineConfig::default()).unwrap();
        for row in last_rows(&out).values() {
            prop_assert!(row.event_kind().is_retraction());
            prop_assert_eq!(row.value(&"count".into()), Some(&Value::Int(0)));
            prop_assert_eq!(row.value(&"sum".into()), Some(&Value::Null));
            prop_assert_eq!(row.value(&"first".into()), Some(&Value::Null));
        }
    }

    #[test]
    fn prop_retracting_absent_value_is_rejected(
        (inserts, retract) in arb_stream(),
        kind in prop::sample::select(Aggregate::ALL.to_vec()),
        stray in 5i64..50,
    ) {
        let plan = group_by(PlanNode::Scan(Scan::new("t", Cardinality::Unbounded)), &["k"], &[("v", kind, "x")]);
        let mut records = build(&inserts, &retract);
        // Inserted values stay below 5, so the stray value is never live.
        let (key, _) = inserts[0];
        records.push(Record::insert(kv(key, 0)));
        records.push(Record::retract(kv(key, stray)));
        let err = run_plan(&plan, vec![("t", records)], EngineConfig::default()).unwrap_err();
        prop_assert_eq!(err.kind(), PlanStreamErrorKind::Retraction);
    }

    #[test]
    fn prop_extremum_strategies_agree((inserts, retract) in arb_stream()) {
        let plan = group_by(PlanNode::Scan(Scan::new("t", Cardinality::Unbounded)), &["k"], &AGGS[2..4]);
        let records = build(&inserts, &retract);
        let ordered = run_plan(&plan, vec![("t", records.clone())], config(ExtremumStrategy::Ordered)).unwrap();
        let rescan = run_plan(&plan, vec![("t", records)], config(ExtremumStrategy::Rescan)).unwrap();
        prop_assert_eq!(ordered, rescan);
    }

    #[test]
    fn prop_group_by_metadata_is_bounded(cardinality in arb_cardinality(), union in any::<bool>()) {
        let scan = PlanNode::Scan(Scan::new("t", cardinality).with_leading_key("k"));
        let source = if union {
            PlanNode::UnionAll(plan_stream::physical::UnionAll::new(vec![scan.clone(), scan]))
        } else {
            scan
        };
        let meta = group_by(source, &["k"], &AGGS[..1]).metadata();
        prop_assert!(meta.cardinality() <= Cardinality::BoundedFitsInLocalStorage);
        prop_assert!(meta.leading_key().is_empty());
    }

    #[test]
    fn prop_json_sink_output_is_one_array(items in prop::collection::vec((any::<i64>(), ".{0,8}"), 0..20)) {
        let mut out = JsonArrayOutput::new(Vec::new());
        for (n, s) in &items {
            out.write_record(&Record::insert([("n", Value::Int(*n)), ("s", Value::from(s.as_str()))])).unwrap();
        }
        out.close().unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out.into_inner()).unwrap();
        let array = parsed.as_array().unwrap();
        prop_assert_eq!(array.len(), items.len());
        for (obj, (n, s)) in array.iter().zip(&items) {
            prop_assert_eq!(obj["n"].as_i64(), Some(*n));
            prop_assert_eq!(obj["s"].as_str(), Some(s.as_str()));
        }
    }
}
