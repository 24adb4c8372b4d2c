//! Benchmarks for value computation
//!
//! Run with: cargo bench --package apolo-attributes
//!
//! These benchmarks measure expression evaluation against an in-memory
//! event; profile storage is not involved. `*password` is left out since
//! its cost is dominated by Argon2.

use apolo_attributes::{ComputeRequest, ValueComputer};
use apolo_core::consts::*;
use apolo_core::models::{CgrEvent, DataPoint, ValueExpr};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

/// Event with the fields every benchmarked rule refers to
fn create_mock_event() -> DataPoint {
    CgrEvent {
        tenant: "cgrates.org".to_string(),
        id: "bench".to_string(),
        event: json!({
            "Account": "1001",
            "Destination": "+15551234567",
            "NumField": "20",
            "RandomField": "1",
            "RandomField2": "5",
            "AnswerTime": "2013-12-30T15:00:01Z",
            "EndTime": "2013-12-30T15:01:31Z",
            "CallID": "call-id-12345",
            "FromTag": "from-tag",
            "ToTag": "to-tag",
        })
        .as_object()
        .cloned()
        .unwrap_or_default(),
        ..Default::default()
    }
    .as_data_point()
}

fn computer() -> ValueComputer {
    ValueComputer::new(5, chrono_tz::UTC)
}

/// Benchmark rule compilation
fn bench_rule_parsing(c: &mut Criterion) {
    c.bench_function("value_expr_parse", |b| {
        b.iter(|| ValueExpr::parse(black_box("55;~*req.RandomField;`a;b`;~*req.NumField")));
    });
}

/// Benchmark each directive type on a representative rule
fn bench_compute_by_type(c: &mut Criterion) {
    let dp = create_mock_event();
    let vc = computer();

    let cases = [
        (META_CONSTANT, "constant"),
        (META_VARIABLE, "~*req.Account"),
        (META_COMPOSED, "sip:;~*req.Account;@cgrates.org"),
        (META_SUM, "10;~*req.NumField;20"),
        (META_MULTIPLY, "55;~*req.RandomField;~*req.RandomField2;10"),
        (META_DIVIDE, "55.0;~*req.RandomField;~*req.RandomField2;4"),
        (META_VALUE_EXPONENT, "~*req.NumField;3"),
        (META_USAGE_DIFFERENCE, "~*req.EndTime;~*req.AnswerTime"),
        (META_UNIX_TIMESTAMP, "~*req.AnswerTime"),
        (META_CC_USAGE, "3;10s;5s"),
        (META_SIP_CID, "~*req.CallID;~*req.ToTag;~*req.FromTag"),
    ];

    let mut group = c.benchmark_group("compute_by_type");
    for (attr_type, rule) in cases {
        let value = ValueExpr::parse(rule).unwrap_or_default();
        group.bench_with_input(BenchmarkId::from_parameter(attr_type), &value, |b, value| {
            b.iter(|| {
                vc.compute(black_box(&ComputeRequest {
                    dp: &dp,
                    attr_type,
                    path: "*req.Out",
                    value,
                    pass_index: 1,
                }))
            });
        });
    }
    group.finish();
}

/// Benchmark *sum over a growing number of operands
fn bench_sum_operands(c: &mut Criterion) {
    let dp = create_mock_event();
    let vc = computer();

    let mut group = c.benchmark_group("sum_operands");
    for size in [2usize, 10, 100].iter() {
        let rule = vec!["~*req.NumField"; *size].join(";");
        let value = ValueExpr::parse(&rule).unwrap_or_default();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                vc.compute(black_box(&ComputeRequest {
                    dp: &dp,
                    attr_type: META_SUM,
                    path: "*req.Out",
                    value: &value,
                    pass_index: 1,
                }))
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_rule_parsing,
    bench_compute_by_type,
    bench_sum_operands,
);
criterion_main!(benches);
