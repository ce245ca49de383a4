//! Benchmarks for the streaming group by and its accumulators.
//!
//! Measures per-event cost of maintaining aggregates under inserts and
//! retractions. Everything runs in memory.
//!
//! Run with: `cargo bench --bench group_by_bench`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use plan_stream::config::{EngineConfig, ExtremumStrategy};
use plan_stream::exec::ExecutionContext;
use plan_stream::exec::aggregates::{Aggregate, AggregateOptions, prototype};
use plan_stream::output::{CollectOutput, JsonArrayOutput};
use plan_stream::physical::{
    Cardinality, Expression, GroupBy, MaterializationContext, PlanNode, Scan,
};
use plan_stream::pipeline;
use plan_stream::record::Record;
use plan_stream::source::InMemorySource;
use plan_stream::value::{Value, VariableName};
use std::io;
use std::sync::Arc;

// ── Helpers ────────────────────────────────────────────────────────────────

/// `n` inserts spread over `groups` keys, then a retraction of every
/// third insert.
fn changelog(n: usize, groups: usize) -> Vec<Record> {
    let row = |i: usize| {
        [
            ("k", Value::Int((i % groups) as i64)),
            ("v", Value::Int((i * 7 % 1000) as i64)),
        ]
    };
    let mut records: Vec<Record> = (0..n).map(|i| Record::insert(row(i))).collect();
    records.extend((0..n).step_by(3).map(|i| Record::retract(row(i))));
    records
}

fn plan(aggs: &[Aggregate]) -> PlanNode {
    let node = GroupBy::new(
        PlanNode::Scan(Scan::new("t", Cardinality::BoundedFitsInLocalStorage)),
        vec![Expression::Variable("k".into())],
        aggs.iter().map(|_| VariableName::from("v")).collect(),
        aggs.to_vec(),
        aggs.iter().map(|_| VariableName::empty()).collect(),
    )
    .expect("aligned group by");
    PlanNode::GroupBy(node)
}

fn context(records: Vec<Record>, config: EngineConfig) -> MaterializationContext {
    MaterializationContext::new(config).with_source("t", Arc::new(InMemorySource::new(records)))
}

// ── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_group_by_groups(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by_groups");
    let plan = plan(&[Aggregate::Sum, Aggregate::Count]);
    for groups in [1, 100, 10_000] {
        let ctx = context(changelog(20_000, groups), EngineConfig::default());
        group.bench_with_input(BenchmarkId::from_parameter(groups), &ctx, |b, ctx| {
            b.iter(|| {
                let mut root = pipeline::compile(&plan, ctx).unwrap();
                let mut out = CollectOutput::default();
                pipeline::run(root.as_mut(), &ExecutionContext::default(), &mut out).unwrap();
                black_box(out.records.len())
            });
        });
    }
    group.finish();
}

fn bench_extremum_strategy(c: &mut Criterion) {
    let mut group = c.benchmark_group("extremum_strategy");
    let plan = plan(&[Aggregate::Min, Aggregate::Max]);
    for (name, strategy) in [
        ("ordered", ExtremumStrategy::Ordered),
        ("rescan", ExtremumStrategy::Rescan),
    ] {
        let config = EngineConfig {
            extremum_strategy: strategy,
            ..EngineConfig::default()
        };
        let ctx = context(changelog(5_000, 4), config);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut root = pipeline::compile(&plan, &ctx).unwrap();
                let mut out = CollectOutput::default();
                pipeline::run(root.as_mut(), &ExecutionContext::default(), &mut out).unwrap();
                black_box(out.records.len())
            });
        });
    }
    group.finish();
}

fn bench_accumulators(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator");
    let values: Vec<Value> = (0..1_000).map(|i| Value::Int(i % 97)).collect();
    for kind in Aggregate::ALL {
        let proto = prototype(kind, AggregateOptions::default());
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                let mut acc = proto.new_accumulator();
                for v in &values {
                    acc.incorporate(v).unwrap();
                }
                for v in values.iter().step_by(2) {
                    acc.undo(v).unwrap();
                }
                black_box(acc.current().unwrap())
            });
        });
    }
    group.finish();
}

fn bench_json_sink(c: &mut Criterion) {
    let plan = plan(&[Aggregate::Avg, Aggregate::Last]);
    let ctx = context(changelog(10_000, 50), EngineConfig::default());
    c.bench_function("json_sink", |b| {
        b.iter(|| {
            let mut root = pipeline::compile(&plan, &ctx).unwrap();
            let mut out = JsonArrayOutput::new(io::sink());
            let stats =
                pipeline::run(root.as_mut(), &ExecutionContext::default(), &mut out).unwrap();
            black_box(stats.records)
        });
    });
}

criterion_group!(
    benches,
    bench_group_by_groups,
    bench_extremum_strategy,
    bench_accumulators,
    bench_json_sink,
);
criterion_main!(benches);
