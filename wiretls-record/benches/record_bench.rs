use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use wiretls_record::buffer::OutputBuffer;
use wiretls_record::record::{self, ContentType, ProtocolVersion, DEFAULT_FRAGMENT_LENGTH};
use wiretls_record::seal::{AeadSealer, NullSealer};

fn bench_frame_record_null(c: &mut Criterion) {
    let payload = vec![0u8; DEFAULT_FRAGMENT_LENGTH as usize];
    let mut out = OutputBuffer::with_capacity(record::max_record_size(DEFAULT_FRAGMENT_LENGTH));
    let mut sealer = NullSealer::new();

    let mut group = c.benchmark_group("frame_record");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("null_sealer", |b| {
        b.iter(|| {
            out.mark_reusable();
            record::write_record(
                &mut out,
                &mut sealer,
                ContentType::ApplicationData,
                ProtocolVersion::Tls12,
                black_box(&payload),
            )
            .unwrap();
            black_box(out.data_available());
        });
    });
    group.finish();
}

fn bench_frame_record_aead(c: &mut Criterion) {
    let payload = vec![0u8; DEFAULT_FRAGMENT_LENGTH as usize];
    let mut out = OutputBuffer::with_capacity(record::max_record_size(DEFAULT_FRAGMENT_LENGTH));
    let mut sealer = AeadSealer::new(&[0u8; 16], [0u8; 4]).unwrap();

    let mut group = c.benchmark_group("frame_record");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("aes_128_gcm", |b| {
        b.iter(|| {
            out.mark_reusable();
            record::write_record(
                &mut out,
                &mut sealer,
                ContentType::ApplicationData,
                ProtocolVersion::Tls12,
                black_box(&payload),
            )
            .unwrap();
            black_box(out.data_available());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_frame_record_null, bench_frame_record_aead);
criterion_main!(benches);
