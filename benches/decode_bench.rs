use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tapejson::{build_structural_index, build_tape, ParserConfig};

fn ascii_string(len: usize) -> Vec<u8> {
    let mut s = Vec::with_capacity(len + 2);
    s.push(b'"');
    for i in 0..len {
        s.push(b'a' + (i % 26) as u8);
    }
    s.push(b'"');
    s
}

fn utf8_string(len: usize) -> Vec<u8> {
    let mut s = Vec::with_capacity(len * 3 + 2);
    s.push(b'"');
    let chars = ['a', 'b', '\u{4e16}', '\u{754c}', 'c', '\u{3053}', '\u{3093}'];
    let mut total = 0;
    let mut idx = 0;
    while total < len {
        let mut buf = [0u8; 4];
        let encoded = chars[idx % chars.len()].encode_utf8(&mut buf);
        if total + encoded.len() > len {
            break;
        }
        s.extend_from_slice(encoded.as_bytes());
        total += encoded.len();
        idx += 1;
    }
    s.push(b'"');
    s
}

fn escaped_string(len: usize) -> Vec<u8> {
    let mut s = Vec::with_capacity(len * 2 + 2);
    s.push(b'"');
    let escapes: &[&[u8]] = &[b"\\n", b"\\t", b"\\\"", b"\\\\", b"\\/", b"\\r"];
    let mut total = 0;
    let mut idx = 0;
    while total < len {
        let esc = escapes[idx % escapes.len()];
        s.extend_from_slice(esc);
        total += esc.len();
        if total < len {
            s.push(b'x');
            total += 1;
        }
        idx += 1;
    }
    s.push(b'"');
    s
}

fn flat_object(fields: usize) -> Vec<u8> {
    let mut s = Vec::from(&b"{"[..]);
    for i in 0..fields {
        if i > 0 {
            s.push(b',');
        }
        s.extend_from_slice(format!("\"field_{i}\":{i}").as_bytes());
    }
    s.push(b'}');
    s
}

fn nested_array(depth: usize) -> Vec<u8> {
    let mut s = Vec::new();
    for _ in 0..depth {
        s.push(b'[');
    }
    s.extend_from_slice(b"1");
    for _ in 0..depth {
        s.push(b']');
    }
    s
}

fn bench_structural_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("structural_index");
    for len in [16usize, 64, 256, 1024, 4096] {
        let input = ascii_string(len);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("ascii", len), &input, |b, input| {
            b.iter(|| build_structural_index(black_box(input)).unwrap());
        });

        let input = utf8_string(len);
        group.bench_with_input(BenchmarkId::new("utf8", len), &input, |b, input| {
            b.iter(|| build_structural_index(black_box(input)).unwrap());
        });

        let input = escaped_string(len);
        group.bench_with_input(BenchmarkId::new("escaped", len), &input, |b, input| {
            b.iter(|| build_structural_index(black_box(input)).unwrap());
        });
    }
    group.finish();
}

fn bench_tape_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tape_build");
    for fields in [4usize, 16, 64, 256] {
        let input = flat_object(fields);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("flat_object", fields), &input, |b, input| {
            b.iter(|| build_tape(black_box(input), ParserConfig::default()).unwrap());
        });
    }
    for depth in [4usize, 16, 64] {
        let input = nested_array(depth);
        group.bench_with_input(BenchmarkId::new("nested_array", depth), &input, |b, input| {
            b.iter(|| build_tape(black_box(input), ParserConfig::default()).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_structural_index, bench_tape_build);
criterion_main!(benches);
