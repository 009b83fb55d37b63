use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use manachain::board::{ElementKind, Grid, SpawnTable, MAX_SIDE};

fn bench_longest_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("longest_chain");
    let table = SpawnTable::uniform();

    for side in [3, 5, MAX_SIDE] {
        let mut rng = StdRng::seed_from_u64(side as u64);
        let grid = Grid::new(side, side, &table, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(side), &grid, |b, grid| {
            b.iter(|| {
                for element in ElementKind::ALL {
                    black_box(grid.longest_chain(black_box(element)));
                }
            })
        });
    }
    group.finish();
}

fn bench_resolve_step(c: &mut Criterion) {
    let table = SpawnTable::uniform();
    c.bench_function("remove_and_refill_7x7", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        let mut grid = Grid::new(MAX_SIDE, MAX_SIDE, &table, &mut rng);
        b.iter(|| {
            let chain = grid.longest_chain(ElementKind::Fire);
            grid.remove_tiles(&chain);
            grid.apply_additional_random_remove(&mut rng);
            grid.fill_empty_tiles(&table, &mut rng);
        })
    });
}

criterion_group!(benches, bench_longest_chain, bench_resolve_step);
criterion_main!(benches);
