//! Benchmarks building an SPS/PPS pair and iterating over the resulting Annex B stream.

use criterion::{criterion_group, criterion_main, Criterion};
use h264::{Decode, PictureParameterSet, SequenceParameterSet, U1};

const SPS_RBSP: [u8; 26] = [
    0x4d, 0x40, 0x1f, 0xec, 0xa0, 0x28, 0x02, 0xdd, 0x80, 0xb5, 0x01, 0x01, 0x01, 0x40, 0x00, 0x00, 0x00, 0x40, 0x00, 0x05, 0xdc, 0x03, 0xc6, 0x0c, 0x65,
    0x80,
];

fn criterion_benchmark(c: &mut Criterion) {
    let sps = SequenceParameterSet::decode(&mut h264::Bitstream::new(SPS_RBSP)).unwrap();
    let pps = PictureParameterSet {
        entropy_coding_mode_flag: U1(1),
        deblocking_filter_control_present_flag: U1(1),
        ..Default::default()
    };

    let mut g = c.benchmark_group("build_parameter_sets");
    g.bench_function("build_sps_pps", |b| {
        let mut dest = Vec::with_capacity(64);
        b.iter(|| {
            let n = h264::build_sps(&sps, &mut dest, 0).unwrap();
            h264::build_pps(&pps, &mut dest, n).unwrap();
        });
    });

    let mut stream = Vec::new();
    let mut position = 0;
    for _ in 0..1000 {
        position += h264::build_sps(&sps, &mut stream, position).unwrap();
        position += h264::build_pps(&pps, &mut stream, position).unwrap();
    }
    g.throughput(criterion::Throughput::Bytes(stream.len() as u64));
    g.bench_function("iterate_annex_b", |b| {
        b.iter(|| {
            assert_eq!(h264::iterate_annex_b(&stream).count(), 2000);
        });
    });
    g.warm_up_time(std::time::Duration::from_secs(1));
    g.sampling_mode(criterion::SamplingMode::Flat);
    g.sample_size(10);
    g.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
