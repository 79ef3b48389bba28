use burstgif::{DitherKind, Encoder, QuantizerKind, Step};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

/// Width / height of benchmark frames
const SIZE: u16 = 128;

/// Make a frame with more than 256 colors
fn make_step(seed: u32) -> Step {
    let pixels: Vec<u32> = (0..u32::from(SIZE) * u32::from(SIZE))
        .map(|i| {
            let (x, y) = (i % u32::from(SIZE), i / u32::from(SIZE));
            (x * 2) | ((y * 2) << 8) | (((x + y + seed) & 0xFF) << 16)
        })
        .collect();
    Step::with_packed(SIZE, SIZE, &pixels).unwrap()
}

fn encode_quantizers(crit: &mut Criterion) {
    let mut group = crit.benchmark_group("quantize");
    group.sample_size(10);
    for kind in [
        QuantizerKind::Uniform,
        QuantizerKind::MedianCut,
        QuantizerKind::KMeans,
        QuantizerKind::Random,
        QuantizerKind::Octree,
        QuantizerKind::NeuQuant,
    ] {
        let step = make_step(0).with_quantizer(kind);
        group.bench_function(format!("{kind:?}"), |b| {
            let enc = Encoder::new(Vec::new(), SIZE, SIZE).open().unwrap();
            b.iter(|| enc.add_frame(black_box(&step)).unwrap())
        });
    }
    group.finish();
}

fn encode_ditherers(crit: &mut Criterion) {
    let mut group = crit.benchmark_group("dither");
    group.sample_size(10);
    for kind in [
        DitherKind::None,
        DitherKind::Bayer,
        DitherKind::FloydSteinberg,
        DitherKind::M2,
    ] {
        let step = make_step(0).with_dither(kind);
        group.bench_function(format!("{kind:?}"), |b| {
            let enc = Encoder::new(Vec::new(), SIZE, SIZE).open().unwrap();
            b.iter(|| enc.add_frame(black_box(&step)).unwrap())
        });
    }
    group.finish();
}

fn encode_pooled(crit: &mut Criterion) {
    let steps: Vec<Step> = (0..16).map(make_step).collect();
    let mut group = crit.benchmark_group("frames");
    group.sample_size(10);
    for workers in [1, 4, 8] {
        group.bench_function(format!("workers_{workers}"), |b| {
            b.iter(|| {
                let mut enc = Encoder::new(Vec::with_capacity(1 << 20), SIZE, SIZE)
                    .with_workers(workers)
                    .open()
                    .unwrap();
                for frame in enc.add_frames(black_box(&steps)) {
                    enc.flush(frame.unwrap()).unwrap();
                }
                enc.finish().unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, encode_quantizers, encode_ditherers, encode_pooled);
criterion_main!(benches);
