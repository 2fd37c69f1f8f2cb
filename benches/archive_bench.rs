use bale::digest::{Digest, Md4};
use bale::reader::{BaleReader, Input};
use bale::record::MemberHeader;
use bale::writer::BaleWriter;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Cursor;

fn header(name: &str, size: u64) -> MemberHeader {
    MemberHeader { name: name.into(), mtime: 0, uid: 0, gid: 0, mode: 0o100644, size }
}

fn archive_with(count: usize, data: &[u8]) -> Vec<u8> {
    let mut writer = BaleWriter::new(Vec::new()).unwrap();
    for i in 0..count {
        let h = header(&format!("file_{}.bin", i), data.len() as u64);
        writer.append(&h, &mut Cursor::new(data)).unwrap();
    }
    writer.finish().unwrap()
}

fn bench_digest(c: &mut Criterion) {
    let data = vec![7u8; 1024 * 1024];

    c.bench_function("md4_1mb", |b| {
        b.iter(|| {
            let mut md = Md4::new();
            md.update(black_box(&data));
            md.finalize()
        })
    });
}

fn bench_build(c: &mut Criterion) {
    let data = vec![42u8; 1024 * 1024];

    c.bench_function("build_1mb_member", |b| {
        b.iter(|| {
            let mut writer = BaleWriter::new(Vec::new()).unwrap();
            writer
                .append(&header("bench.bin", data.len() as u64), &mut Cursor::new(black_box(&data)))
                .unwrap();
            writer.finish().unwrap()
        })
    });
}

fn bench_verify(c: &mut Criterion) {
    let bytes = archive_with(1, &vec![99u8; 1024 * 1024]);

    c.bench_function("verify_1mb_member", |b| {
        b.iter(|| {
            let input = Input::Stream(Box::new(Cursor::new(black_box(bytes.clone()))));
            BaleReader::new(input).unwrap().verify::<fn(&MemberHeader)>(None).unwrap()
        })
    });
}

fn bench_list(c: &mut Criterion) {
    let bytes = archive_with(64, &vec![9u8; 16 * 1024]);

    c.bench_function("list_64_members", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            let input = Input::Stream(Box::new(Cursor::new(black_box(bytes.clone()))));
            BaleReader::new(input).unwrap().list(false, &mut out).unwrap();
            out
        })
    });
}

criterion_group!(benches, bench_digest, bench_build, bench_verify, bench_list);
criterion_main!(benches);
