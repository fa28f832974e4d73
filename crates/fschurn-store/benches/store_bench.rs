use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fschurn_store::testing::TestStore;
use fschurn_store::RandomReader;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_store_write(c: &mut Criterion) {
    let env = TestStore::new().unwrap();
    let mut rng = StdRng::seed_from_u64(1);

    c.bench_function("store_write_1mb", |b| {
        b.iter(|| {
            // Every iteration produces a new entry; the fixture is dropped afterwards
            env.store
                .write(0, RandomReader::new(&mut rng), black_box(1024 * 1024))
                .unwrap()
        })
    });
}

fn bench_store_verify(c: &mut Criterion) {
    let env = TestStore::new().unwrap();
    let entry = env.populate(1, 1024 * 1024).unwrap().remove(0);

    c.bench_function("store_verify_1mb", |b| {
        b.iter(|| env.store.verify(black_box(&entry.path)).unwrap())
    });
}

criterion_group!(benches, bench_store_write, bench_store_verify);
criterion_main!(benches);
