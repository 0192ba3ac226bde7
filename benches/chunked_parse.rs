//! Benchmarks for chunked stream validation
//!
//! Measures how append granularity affects validator and index throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use msetools::detect::Container;
use msetools::segment_index::build_index;
use msetools_validator::{ByteStreamValidator, IsoBmffValidator, WebmValidator};

const CHUNK_SIZES: [usize; 4] = [16, 188, 4096, 65536];

fn ebml(id: &[u8], body: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend_from_slice(&(0x0100_0000_0000_0000u64 | body.len() as u64).to_be_bytes());
    out.extend_from_slice(body);
    out
}

fn mp4_box(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(tag);
    out.extend_from_slice(body);
    out
}

/// WebM stream with `clusters` clusters of 30 SimpleBlocks each.
fn webm_stream(clusters: u16) -> Vec<u8> {
    let header = ebml(
        &[0x1A, 0x45, 0xDF, 0xA3],
        &[ebml(&[0x42, 0x86], &[1]), ebml(&[0x42, 0x82], b"webm")].concat(),
    );
    let info = ebml(
        &[0x15, 0x49, 0xA9, 0x66],
        &ebml(&[0x2A, 0xD7, 0xB1], &[0x0F, 0x42, 0x40]),
    );
    let track = ebml(&[0xAE], &[ebml(&[0xD7], &[1]), ebml(&[0x86], b"V_VP9")].concat());
    let tracks = ebml(&[0x16, 0x54, 0xAE, 0x6B], &track);

    let mut body = [info, tracks].concat();
    let block = ebml(&[0xA3], &[[0x81, 0, 0, 0x80].as_slice(), &[0x55; 1200]].concat());
    for timecode in 0..clusters {
        let mut cluster = ebml(&[0xE7], &timecode.to_be_bytes());
        for _ in 0..30 {
            cluster.extend_from_slice(&block);
        }
        body.extend(ebml(&[0x1F, 0x43, 0xB6, 0x75], &cluster));
    }
    [header, ebml(&[0x18, 0x53, 0x80, 0x67], &body)].concat()
}

/// Fragmented MP4 with `fragments` moof/mdat pairs of 30 samples each.
fn fmp4_stream(fragments: u32) -> Vec<u8> {
    let ftyp = mp4_box(b"ftyp", b"iso5\0\0\0\x01iso5");
    let moov = mp4_box(b"moov", &mp4_box(b"mvhd", &[0; 100]));
    let mut out = [ftyp, moov].concat();

    for sequence in 0..fragments {
        let mut mfhd = vec![0; 4];
        mfhd.extend_from_slice(&sequence.to_be_bytes());
        let mut tfhd = 0x18u32.to_be_bytes().to_vec();
        for field in [1u32, 1000, 1200] {
            tfhd.extend_from_slice(&field.to_be_bytes());
        }
        let mut trun = 0x0000_0200u32.to_be_bytes().to_vec();
        trun.extend_from_slice(&30u32.to_be_bytes());
        for _ in 0..30 {
            trun.extend_from_slice(&1200u32.to_be_bytes());
        }
        let traf = mp4_box(b"traf", &[mp4_box(b"tfhd", &tfhd), mp4_box(b"trun", &trun)].concat());
        out.extend(mp4_box(b"moof", &[mp4_box(b"mfhd", &mfhd), traf].concat()));
        out.extend(mp4_box(b"mdat", &vec![0x55; 30 * 1200]));
    }
    out
}

fn validate(validator: &mut dyn ByteStreamValidator, data: &[u8], chunk_size: usize) -> usize {
    validator.reset();
    let mut errors = 0;
    for chunk in data.chunks(chunk_size) {
        errors += validator.parse(chunk).len();
    }
    errors + validator.end_of_stream().len()
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    let webm = webm_stream(20);
    let fmp4 = fmp4_stream(20);

    for chunk_size in CHUNK_SIZES {
        group.throughput(Throughput::Bytes(webm.len() as u64));
        group.bench_with_input(BenchmarkId::new("webm", chunk_size), &chunk_size, |b, &size| {
            let mut validator = WebmValidator::new();
            b.iter(|| validate(&mut validator, black_box(&webm), size));
        });

        group.throughput(Throughput::Bytes(fmp4.len() as u64));
        group.bench_with_input(BenchmarkId::new("fmp4", chunk_size), &chunk_size, |b, &size| {
            let mut validator = IsoBmffValidator::new();
            b.iter(|| validate(&mut validator, black_box(&fmp4), size));
        });
    }

    group.finish();
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_index");
    let webm = webm_stream(20);
    let fmp4 = fmp4_stream(20);

    group.throughput(Throughput::Bytes(webm.len() as u64));
    group.bench_function("webm", |b| {
        b.iter(|| build_index(Container::Webm, black_box(&webm[..]), 4096).unwrap())
    });

    group.throughput(Throughput::Bytes(fmp4.len() as u64));
    group.bench_function("fmp4", |b| {
        b.iter(|| build_index(Container::IsoBmff, black_box(&fmp4[..]), 4096).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_validation, bench_index);
criterion_main!(benches);
