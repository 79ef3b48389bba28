// cargo fuzz run encode corpus/encode -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;

use burstgif::{DitherKind, Encoder, QuantizerKind, Step};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let width = u16::from(data[0] % 32) + 1;
    let quantizer = QuantizerKind::from(data[1]);
    let dither = DitherKind::from(data[2]);
    let packed: Vec<u32> = data[3..]
        .chunks(3)
        .map(|c| c.iter().rev().fold(0, |v, b| (v << 8) | u32::from(*b)))
        .collect();
    let height = (packed.len() / usize::from(width)) as u16;
    let pixels = &packed[..usize::from(width) * usize::from(height)];
    let mut out = Vec::new();
    let enc = Encoder::new(&mut out, width, height).open().unwrap();
    let step = Step::with_packed(width, height, pixels)
        .unwrap()
        .with_quantizer(quantizer)
        .with_dither(dither);
    let frame = enc.add_frame(&step).unwrap();
    assert!(!frame.is_empty());
});
