use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use shapes_core::{Circle, Drawing, EntityCodec, Position, Rectangle};
use shapes_infra::{EntityService, MemoryDatabase, MemoryDrawingGateway, MemoryShapeGateway};
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build tokio runtime")
}

fn circle_service() -> EntityService<Circle, MemoryShapeGateway<Circle>> {
    let db = Arc::new(MemoryDatabase::new());
    EntityService::new(Arc::new(MemoryShapeGateway::new(db)))
}

fn drawing_with(shapes: usize) -> Drawing {
    let mut d = Drawing::new("bench");
    for i in 0..shapes {
        let pos = Position::new(i as i32, i as i32);
        if i % 2 == 0 {
            d.add_shape(Circle::new("red", pos, 5));
        } else {
            d.add_shape(Rectangle::new("blue", pos, 3, 4));
        }
    }
    d
}

fn bench_shape_service(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("shape_service");

    group.bench_function("save_circle", |b| {
        let service = circle_service();
        b.iter(|| {
            rt.block_on(service.save(Circle::with_defaults("red", Position::default())))
                .unwrap()
        });
    });

    for size in [10usize, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("find_all", size), size, |b, &size| {
            let service = circle_service();
            for _ in 0..size {
                rt.block_on(service.save(Circle::with_defaults("red", Position::default())))
                    .unwrap();
            }
            b.iter(|| black_box(rt.block_on(service.find_all()).unwrap()));
        });
    }

    group.finish();
}

fn bench_drawing_cascade(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("drawing_cascade");

    for shapes in [1usize, 16, 128].iter() {
        group.throughput(Throughput::Elements(*shapes as u64));
        group.bench_with_input(BenchmarkId::new("save", shapes), shapes, |b, &shapes| {
            let db = Arc::new(MemoryDatabase::new());
            let service = EntityService::new(Arc::new(MemoryDrawingGateway::new(db)));
            b.iter(|| rt.block_on(service.save(drawing_with(shapes))).unwrap());
        });
    }

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let drawing = drawing_with(64);
    let bytes = serde_json::to_vec(&drawing).unwrap();

    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("encode_drawing", |b| {
        b.iter(|| black_box(drawing.to_json().unwrap()))
    });
    group.bench_function("decode_drawing", |b| {
        b.iter(|| black_box(Drawing::from_slice(&bytes).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_shape_service, bench_drawing_cascade, bench_codec);
criterion_main!(benches);
