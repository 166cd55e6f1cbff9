use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::{AssetId, Catalog, CountryId, PlayerState, RulesConfig, TerritoryId, TerritoryMap};

fn commander(catalog: &Catalog, rules: &RulesConfig) -> PlayerState {
    let mut state = PlayerState::new("Bench", rules).unwrap();
    state
        .select_country(catalog, &CountryId::from("usa"))
        .unwrap();
    state.military.insert(AssetId::from("infantry"), 200);
    state.military.insert(AssetId::from("m1_abrams"), 20);
    state
}

fn bench_battles(c: &mut Criterion) {
    let catalog = Catalog::builtin().unwrap();
    let rules = RulesConfig::default();
    let map = TerritoryMap::builtin().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    c.bench_function("ai_battle", |b| {
        let base = commander(&catalog, &rules);
        b.iter(|| {
            let mut state = base.clone();
            let _ = sim_combat::resolve_ai_battle(&mut state, &catalog, &rules, &mut rng);
        })
    });

    c.bench_function("territorial_battle", |b| {
        let mut base = commander(&catalog, &rules);
        sim_combat::place_command_post(&mut base, &map, &TerritoryId::from("fra")).unwrap();
        let target = TerritoryId::from("esp");
        b.iter(|| {
            let mut state = base.clone();
            let _ = sim_combat::resolve_territory_attack(
                &mut state, &catalog, &rules, &map, &target, &mut rng,
            );
        })
    });
}

criterion_group!(benches, bench_battles);
criterion_main!(benches);
