//! Semi-join reduction benchmarks.
//!
//! Compares reduced vs unreduced execution of a three-pattern chain over
//! generated data where most first-hop rows have no partner downstream.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gym_core::proto::Node;
use gym_core::query::{
    BgpQuery, ExecutorConfig, HypergraphPlanner, JoinExecutionEngine, JoinTree, LocalProvider,
    MemoryTables, PlannerConfig,
};
use gym_core::StatisticsCatalog;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate chain data: `:p1` is dense with many objects per subject, `:p2`
/// and `:p3` only cover a tenth of the joining values.
fn generate_tables(scale: usize) -> MemoryTables {
    let mut rng = StdRng::seed_from_u64(42);
    let mut tables = MemoryTables::new();

    for i in 0..scale {
        for _ in 0..8 {
            let o = rng.gen_range(0..scale);
            tables.add_triple(format!("s{}", i), ":p1", format!("m{}", o));
        }
    }
    for i in 0..scale / 10 {
        let m = rng.gen_range(0..scale);
        tables.add_triple(format!("m{}", m), ":p2", format!("n{}", i));
        tables.add_triple(format!("n{}", i), ":p3", format!("v{}", rng.gen_range(0..50)));
    }
    tables
}

fn chain_plan(catalog: &StatisticsCatalog) -> Node {
    let query = BgpQuery::new()
        .select("?s")
        .select("?v")
        .triple("?s", ":p1", "?m")
        .triple("?m", ":p2", "?n")
        .triple("?n", ":p3", "?v");
    HypergraphPlanner::new(catalog, PlannerConfig::new())
        .plan_query(&query)
        .unwrap()
}

fn bench_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("yannakakis/chain");

    for scale in [100, 1000, 5000] {
        let provider = LocalProvider::new(generate_tables(scale));
        // Mark :p1 reducible so the semi-join phases have work to do.
        let catalog = StatisticsCatalog::from_graph(&gym_core::proto::Graph::new().with_table(
            gym_core::proto::Table::new(":p1", (scale * 8) as i64, scale as i64),
        ));
        let plan = chain_plan(&catalog);

        for (label, skip) in [("reduced", false), ("unreduced", true)] {
            let engine =
                JoinExecutionEngine::new(&provider, ExecutorConfig::new().with_skip_semi_joins(skip));
            group.bench_with_input(BenchmarkId::new(label, scale), &scale, |b, _| {
                b.iter(|| {
                    let mut tree = JoinTree::from_plan(&plan).unwrap();
                    black_box(engine.execute(&mut tree, "bench").unwrap());
                });
            });
        }
    }

    group.finish();
}

fn bench_planning(c: &mut Criterion) {
    let catalog = StatisticsCatalog::empty();
    let mut group = c.benchmark_group("yannakakis/plan");

    for patterns in [4, 16, 64] {
        let mut query = BgpQuery::new().select("?x0");
        for i in 0..patterns {
            query = query.triple(format!("?x{}", i), format!(":p{}", i), format!("?x{}", i + 1));
        }
        let planner = HypergraphPlanner::new(&catalog, PlannerConfig::new());

        group.bench_with_input(BenchmarkId::new("chain", patterns), &query, |b, query| {
            b.iter(|| black_box(planner.plan_query(query).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reduction, bench_planning);
criterion_main!(benches);
