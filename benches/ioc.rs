use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ioc_container::*;
use std::sync::Arc;

// ===== Micro Benchmarks =====

fn bench_singleton_hit(c: &mut Criterion) {
    let container = Container::new();
    container.register_instance(Arc::new(42u64), ServiceKey::NONE);

    // Prime the singleton
    let _ = container.resolve::<u64>().unwrap();

    c.bench_function("singleton_hit_u64", |b| {
        b.iter(|| {
            let v = container.resolve::<u64>().unwrap();
            black_box(v);
        })
    });
}

fn bench_singleton_cold(c: &mut Criterion) {
    struct ExpensiveToCreate {
        data: Vec<u64>,
    }

    c.bench_function("singleton_cold_expensive", |b| {
        b.iter_batched(
            || {
                let container = Container::new();
                container.register_delegate::<ExpensiveToCreate, _>(
                    |_| {
                        Ok(Arc::new(ExpensiveToCreate {
                            data: (0..1000).collect(),
                        }))
                    },
                    ReuseType::Singleton,
                    ServiceKey::NONE,
                );
                container
            },
            |container| {
                let v = container.resolve::<ExpensiveToCreate>().unwrap();
                black_box(v.data.len());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_transient_injection(c: &mut Criterion) {
    struct Leaf;
    struct Root {
        leaf: Arc<Leaf>,
    }

    impl Inject for Leaf {
        type Dependencies = ();
        fn inject(_: ()) -> Self {
            Leaf
        }
    }
    impl Inject for Root {
        type Dependencies = (Arc<Leaf>,);
        fn inject((leaf,): Self::Dependencies) -> Self {
            Root { leaf }
        }
    }

    let container = Container::new();
    container.register::<Leaf, Leaf>(ReuseType::Singleton, ServiceKey::NONE);
    container.register::<Root, Root>(ReuseType::Transient, ServiceKey::NONE);

    c.bench_function("transient_with_singleton_dependency", |b| {
        b.iter(|| {
            let root = container.resolve::<Root>().unwrap();
            black_box(&root.leaf);
        })
    });
}

fn bench_keyed_lookup(c: &mut Criterion) {
    let container = Container::new();
    for i in 0..100u32 {
        container.register_instance(Arc::new(i), format!("key-{}", i));
    }

    c.bench_function("keyed_lookup_100_buckets", |b| {
        b.iter(|| {
            let v = container.resolve_keyed::<u32>("key-50").unwrap();
            black_box(v);
        })
    });
}

fn bench_resolve_many_scaling(c: &mut Criterion) {
    trait Plugin: Send + Sync {
        fn id(&self) -> usize;
    }
    struct PluginImpl(usize);
    impl Plugin for PluginImpl {
        fn id(&self) -> usize {
            self.0
        }
    }

    let mut group = c.benchmark_group("resolve_many_scaling");
    for count in [1usize, 8, 64] {
        let container = Container::new();
        for i in 0..count {
            container.register_instance::<dyn Plugin>(Arc::new(PluginImpl(i)), ServiceKey::NONE);
        }

        group.bench_with_input(BenchmarkId::from_parameter(count), &container, |b, container| {
            b.iter(|| {
                let total: usize = container
                    .resolve_many::<dyn Plugin>()
                    .map(|p| p.unwrap().id())
                    .sum();
                black_box(total);
            })
        });
    }
    group.finish();
}

// ===== Macro Benchmarks =====

fn bench_clone_large_registry(c: &mut Criterion) {
    let container = Container::new();
    for i in 0..1000u32 {
        container.register_delegate::<u32, _>(move |_| Ok(Arc::new(i)), ReuseType::Singleton, i);
    }

    c.bench_function("clone_1000_registrations", |b| {
        b.iter(|| black_box(container.clone()))
    });
}

fn bench_override_push_pop(c: &mut Criterion) {
    let base = ambient::base();
    for i in 0..100u32 {
        base.register_instance(Arc::new(i), i);
    }

    c.bench_function("override_push_resolve_pop", |b| {
        b.iter(|| {
            let guard = ambient::override_ioc();
            guard.container().register_instance(Arc::new(7u8), ServiceKey::NONE);
            let v = ambient::current().resolve::<u8>().unwrap();
            black_box(v);
        })
    });
}

criterion_group!(
    micro_benches,
    bench_singleton_hit,
    bench_singleton_cold,
    bench_transient_injection,
    bench_keyed_lookup,
    bench_resolve_many_scaling
);

criterion_group!(macro_benches, bench_clone_large_registry, bench_override_push_pop);

criterion_main!(micro_benches, macro_benches);
