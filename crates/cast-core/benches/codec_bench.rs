//! Criterion benchmarks for the control-command codec.
//!
//! Every touch move a viewer sends is decoded on the host, so decoding sits on
//! the input hot path.
//!
//! Run with:
//! ```bash
//! cargo bench --package cast-core --bench codec_bench
//! ```

use cast_core::{
    decode_payload, deserialize_command, serialize_command, ControlPayload, RemoteControlCommand,
    RemoteKey, TouchAction,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const TOUCH_MOVE: &str = r#"{"type":"touch","action":"move","x":0.4213,"y":0.77,"pointerId":0}"#;
const GARBAGE: &str = r#"{"type":"touch","action":"sideways","x":"a","y":0.5,"pointerId":1}"#;

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    group.bench_function("touch_move_text", |b| {
        b.iter(|| deserialize_command(black_box(TOUCH_MOVE)))
    });

    group.bench_function("invalid_text", |b| {
        b.iter(|| deserialize_command(black_box(GARBAGE)))
    });

    let binary = ControlPayload::Binary(TOUCH_MOVE.as_bytes().to_vec());
    group.bench_function("touch_move_binary", |b| {
        b.iter(|| decode_payload(black_box(&binary)))
    });

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let touch = RemoteControlCommand::touch(TouchAction::Move, 0.4213, 0.77, 0);
    let key = RemoteControlCommand::key(RemoteKey::Home);

    c.bench_function("encode_touch", |b| b.iter(|| serialize_command(black_box(&touch))));
    c.bench_function("encode_key", |b| b.iter(|| serialize_command(black_box(&key))));
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
