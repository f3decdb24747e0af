// Criterion benchmarks for ytrpc-common
//
// Run benchmarks with:
//   cargo bench -p ytrpc-common

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use ytrpc_common::transport::JsonCodec;
use ytrpc_common::{
    KeyBound, LockMode, ProtoEnum, Relation, RequestHeader, RichYPath, StringValueEnum,
    TableRange, WireMessage, YPath,
};

fn bench_enum_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("enum_decoding");

    group.bench_function("lock_mode_from_value", |b| {
        b.iter(|| LockMode::from_value(black_box("exclusive")));
    });

    group.bench_function("lock_mode_from_proto_value", |b| {
        b.iter(|| LockMode::from_proto_value(black_box(3)));
    });

    group.finish();
}

fn bench_key_bounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_bounds");

    group.bench_function("key_bound_to_wire", |b| {
        let bound = KeyBound::with_relation(Relation::GreaterOrEqual, &[json!(1), json!("a")]);
        b.iter(|| black_box(&bound).to_wire());
    });

    group.bench_function("rich_path_to_wire", |b| {
        let path = RichYPath::new(YPath::new("//tmp/t").unwrap()).with_range(TableRange::new(
            Some(KeyBound::of(&[json!(1)])),
            Some(KeyBound::of(&[json!(100)])),
        ));
        b.iter(|| black_box(&path).to_wire());
    });

    group.finish();
}

fn bench_frame_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encoding");

    let message = WireMessage {
        header: RequestHeader {
            method: "remount_table".to_string(),
            timeout_ms: Some(5000),
            ..Default::default()
        },
        body: json!({"path": "//tmp/t", "tablet_range_options": {"first_tablet_index": 0}}),
    };

    group.bench_function("encode_request", |b| {
        b.iter(|| JsonCodec::encode_request(black_box(&message)));
    });

    let encoded = JsonCodec::encode_request(&message).unwrap();
    group.bench_function("decode_request", |b| {
        b.iter(|| JsonCodec::decode_request(black_box(&encoded)));
    });

    group.finish();
}

criterion_group!(benches, bench_enum_decoding, bench_key_bounds, bench_frame_encoding);
criterion_main!(benches);
