use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use throne_ai::{autoplay, Policy};
use throne_core::{GameConfig, Profile};
use throne_engine::GameSession;

fn bench_autoplay(c: &mut Criterion) {
    let catalog = Arc::new(
        contentkit::load_catalog(contentkit::demo_pack_dir()).expect("demo pack loads"),
    );
    for policy in [Policy::Balanced, Policy::AlwaysLeft] {
        c.bench_function(&format!("autoplay {policy:?} x 200 turns"), |b| {
            b.iter(|| {
                let cfg = GameConfig {
                    rng_seed: 42,
                    ..GameConfig::default()
                };
                let mut s = GameSession::new(Arc::clone(&catalog), cfg, Profile::default())
                    .expect("session");
                black_box(autoplay(&mut s, policy, 200).expect("autoplay"))
            })
        });
    }
}

fn bench_selection(c: &mut Criterion) {
    let catalog = contentkit::load_catalog(contentkit::demo_pack_dir()).expect("demo pack loads");
    let state = throne_core::GameState::default();
    c.bench_function("eligible cards", |b| {
        b.iter(|| black_box(throne_engine::eligible_cards(&catalog, &state).len()))
    });
}

criterion_group!(benches, bench_autoplay, bench_selection);
criterion_main!(benches);
