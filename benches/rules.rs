use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use concise_encoding::{
    from_events, to_events, validate_events, ArrayType, Event, Identifier, Key, NullReceiver,
    RuleOptions, Rules, Value, ValueMap,
};

fn records(size: usize) -> Value {
    Value::from(
        (0..size)
            .map(|i| {
                Value::from(ValueMap::from([
                    (Key::from("id"), Value::from(i as u64)),
                    (Key::from("name"), Value::from(format!("Item {}", i))),
                    (Key::from("price"), Value::from(9.99 + i as f64)),
                    (Key::from("tags"), Value::from(vec![Value::from("a"), Value::from("b")])),
                ]))
            })
            .collect::<Vec<_>>(),
    )
}

fn benchmark_validate_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_records");

    for size in [10, 100, 1000].iter() {
        let events = to_events(&records(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &events, |b, events| {
            b.iter(|| validate_events(black_box(events)))
        });
    }
    group.finish();
}

fn benchmark_build_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_records");

    for size in [10, 100, 1000].iter() {
        let events = to_events(&records(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &events, |b, events| {
            b.iter(|| from_events(black_box(events)))
        });
    }
    group.finish();
}

fn benchmark_chunked_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunked_string");
    let text = "Grüße, 世界! ".repeat(4096);

    for chunk in [64, 1024, 16384].iter() {
        let mut events = vec![Event::Version(1), Event::ArrayBegin(ArrayType::String)];
        let pieces: Vec<&[u8]> = text.as_bytes().chunks(*chunk).collect();
        for (i, piece) in pieces.iter().enumerate() {
            events.push(Event::ArrayChunk {
                length: piece.len(),
                is_final: i + 1 == pieces.len(),
            });
            events.push(Event::ArrayData(piece.to_vec()));
        }
        events.push(Event::EndDocument);

        group.bench_with_input(BenchmarkId::from_parameter(chunk), &events, |b, events| {
            b.iter(|| validate_events(black_box(events)))
        });
    }
    group.finish();
}

fn benchmark_references(c: &mut Criterion) {
    let shared = Identifier::String("shared".to_string());
    let mut items = vec![Value::Marker {
        id: shared.clone(),
        value: Box::new(Value::from("payload")),
    }];
    items.extend((0..1000).map(|_| Value::Reference(shared.clone())));
    let events = to_events(&Value::from(items)).unwrap();

    c.bench_function("resolve_1000_references", |b| {
        b.iter(|| validate_events(black_box(&events)))
    });
}

fn benchmark_reused_rules(c: &mut Criterion) {
    let events = to_events(&records(100)).unwrap();
    let mut rules = Rules::new(NullReceiver, RuleOptions::default());

    c.bench_function("reset_and_validate", |b| {
        b.iter(|| {
            rules.reset();
            for event in black_box(&events) {
                event.dispatch(&mut rules).unwrap();
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_validate_records,
    benchmark_build_records,
    benchmark_chunked_string,
    benchmark_references,
    benchmark_reused_rules
);
criterion_main!(benches);
