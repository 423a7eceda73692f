use bacnet_core::encoding::{
    decode_unsigned, encode_unsigned, ApplicationValue, BacnetDate, BacnetTime, ObjectIdentifier,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn encode_benchmark(c: &mut Criterion) {
    c.bench_function("encode_unsigned_small", |b| {
        b.iter(|| {
            let mut buf = Vec::new();
            encode_unsigned(&mut buf, black_box(42)).unwrap();
            black_box(buf);
        })
    });

    c.bench_function("encode_application_value_object_identifier", |b| {
        let value = ApplicationValue::ObjectIdentifier(ObjectIdentifier::new(0, 123));
        b.iter(|| {
            let mut buf = Vec::new();
            value.encode(Some(&mut buf)).unwrap();
            black_box(buf);
        })
    });

    c.bench_function("encode_application_value_date_time", |b| {
        let date = ApplicationValue::Date(BacnetDate { year: 126, month: 7, day: 28, weekday: 2 });
        let time = ApplicationValue::Time(BacnetTime { hour: 12, minute: 0, second: 0, hundredths: 0 });
        b.iter(|| {
            let mut buf = Vec::new();
            date.encode(Some(&mut buf)).unwrap();
            time.encode(Some(&mut buf)).unwrap();
            black_box(buf);
        })
    });
}

fn decode_benchmark(c: &mut Criterion) {
    c.bench_function("decode_unsigned_small", |b| {
        let mut encoded = Vec::new();
        encode_unsigned(&mut encoded, 42).unwrap();
        b.iter(|| black_box(decode_unsigned(black_box(&encoded)).unwrap()))
    });

    c.bench_function("decode_application_value_object_identifier", |b| {
        let mut encoded = Vec::new();
        ApplicationValue::ObjectIdentifier(ObjectIdentifier::new(0, 123))
            .encode(Some(&mut encoded))
            .unwrap();
        b.iter(|| black_box(ApplicationValue::decode(black_box(&encoded)).unwrap()))
    });
}

criterion_group!(benches, encode_benchmark, decode_benchmark);
criterion_main!(benches);
