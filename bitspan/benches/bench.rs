use bitspan::{pack, unpack, Bits};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_pack(c: &mut Criterion) {
    c.bench_function("pack uint:12,bin:3", |b| {
        b.iter(|| {
            pack(
                black_box("uint:12, bin:3"),
                &[352u64.into(), bitspan::Value::bin("111")],
            )
            .unwrap()
        })
    });
}

fn bench_unpack(c: &mut Criterion) {
    let bits = pack("uint:12=352, bin:3=111", &[]).unwrap();
    c.bench_function("unpack uint:12,bin:3", |b| {
        b.iter(|| unpack(black_box("uint:12, bin:3"), &bits).unwrap())
    });
}

fn bench_find(c: &mut Criterion) {
    let mut haystack = Bits::zeros(256 * 1024).to_mut().unwrap();
    let pattern = Bits::from_hex("deadbeef").unwrap();
    haystack.overwrite(&pattern, 200_000).unwrap();
    let haystack = haystack.freeze();
    c.bench_function("find aligned 32 bit pattern", |b| {
        b.iter(|| haystack.find(black_box(&pattern), true).unwrap())
    });
}

fn bench_ue(c: &mut Criterion) {
    let bits = pack("ue=1023, ue=0, ue=511", &[]).unwrap();
    c.bench_function("read three ue codes", |b| {
        b.iter(|| {
            let mut r = bits.reader();
            (
                r.read_ue().unwrap(),
                r.read_ue().unwrap(),
                r.read_ue().unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_pack, bench_unpack, bench_find, bench_ue);
criterion_main!(benches);
