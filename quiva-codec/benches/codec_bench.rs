//! Throughput benchmarks for whole-file quiva compression/decompression.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::io::{BufReader, Cursor};

fn synthetic_quiva_text(n_records: usize, rlen: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for well in 0..n_records {
        out.extend_from_slice(
            format!("@bench_movie/{well}/0_{rlen} RQ=0.80\n").as_bytes(),
        );
        let del_qv = vec![b'\x05'; rlen];
        let mut del_tag = vec![b'a'; rlen];
        if rlen > 3 {
            del_tag[2] = b'N';
        }
        let ins_qv = vec![b'\x10'; rlen];
        let mrg_qv = vec![b'\x20'; rlen];
        let sub_qv = vec![b'\x30'; rlen];
        out.extend_from_slice(&del_qv);
        out.push(b'\n');
        out.extend_from_slice(&del_tag);
        out.push(b'\n');
        out.extend_from_slice(&ins_qv);
        out.push(b'\n');
        out.extend_from_slice(&mrg_qv);
        out.push(b'\n');
        out.extend_from_slice(&sub_qv);
        out.push(b'\n');
    }
    out
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_file");

    for &n in &[10usize, 100, 1_000] {
        let text = synthetic_quiva_text(n, 200);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("records", n), &text, |b, text| {
            b.iter(|| {
                let mut out = Vec::new();
                quiva_codec::encode_file(Cursor::new(text), &mut out, false).unwrap();
                black_box(out);
            });
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_file");

    for &n in &[10usize, 100, 1_000] {
        let text = synthetic_quiva_text(n, 200);
        let mut compressed = Vec::new();
        quiva_codec::encode_file(Cursor::new(&text), &mut compressed, false).unwrap();

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("records", n), &compressed, |b, compressed| {
            b.iter(|| {
                let mut out = Vec::new();
                quiva_codec::decode_file(BufReader::new(Cursor::new(compressed)), &mut out)
                    .unwrap();
                black_box(out);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
