use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gifpix::Decoder;

// 10x10 single-frame GIF with a 4-entry global color table
const GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x0A, 0x00,
    0x0A, 0x00, 0x91, 0x00, 0x00, 0xFF, 0xFF, 0xFF,
    0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00,
    0x00, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x2C, 0x00, 0x00, 0x00, 0x00, 0x0A, 0x00,
    0x0A, 0x00, 0x00, 0x02, 0x16, 0x8C, 0x2D, 0x99,
    0x87, 0x2A, 0x1C, 0xDC, 0x33, 0xA0, 0x02, 0x75,
    0xEC, 0x95, 0xFA, 0xA8, 0xDE, 0x60, 0x8C, 0x04,
    0x91, 0x4C, 0x01, 0x00, 0x3B,
];

fn decode_steps(crit: &mut Criterion) {
    crit.bench_function("decode_steps", |b| {
        b.iter(|| {
            let decoder = Decoder::new(black_box(GIF)).into_steps();
            for step in decoder {
                black_box(step.unwrap());
            }
        })
    });
}

fn decode_full(crit: &mut Criterion) {
    crit.bench_function("decode_full", |b| {
        b.iter(|| {
            black_box(Decoder::new(black_box(GIF)).decode().unwrap());
        })
    });
}

criterion_group!(benches, decode_steps, decode_full);
criterion_main!(benches);
