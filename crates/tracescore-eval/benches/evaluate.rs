use std::collections::HashMap;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tracescore_core::{
    ExecutionConfig, LengthSource, NodeId, PositionAxes, SegmentId, SkeletonGraph, SkeletonId,
};
use tracescore_eval::{Executor, erl_report, evaluate_with};

#[derive(Clone, Copy, Debug)]
struct ForestTier {
    name: &'static str,
    skeletons: u64,
    nodes_per_skeleton: u64,
}

const TIERS: [ForestTier; 3] = [
    ForestTier {
        name: "S",
        skeletons: 10,
        nodes_per_skeleton: 100,
    },
    ForestTier {
        name: "M",
        skeletons: 100,
        nodes_per_skeleton: 1_000,
    },
    ForestTier {
        name: "L",
        skeletons: 500,
        nodes_per_skeleton: 4_000,
    },
];

#[derive(Clone, Copy, Debug)]
struct Prng(u64);

impl Prng {
    fn next_u64(&mut self) -> u64 {
        // 64-bit LCG constants from Numerical Recipes.
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0
    }

    fn next_below(&mut self, upper_exclusive: u64) -> u64 {
        if upper_exclusive == 0 {
            return 0;
        }
        self.next_u64() % upper_exclusive
    }

    fn next_step(&mut self) -> f64 {
        (self.next_below(2_001) as f64 - 1_000.0) / 100.0
    }
}

/// Random walk skeletons with occasional branches, a segmentation that
/// splits every ~50 nodes, drops ~2% of nodes and merges every 20th
/// skeleton into its neighbour.
fn synthetic_forest(tier: ForestTier, seed: u64) -> (SkeletonGraph, HashMap<NodeId, SegmentId>) {
    let axes = PositionAxes::new(["z", "y", "x"]).expect("static axes");
    let mut graph = SkeletonGraph::new(axes);
    let mut lut = HashMap::new();
    let mut rng = Prng(seed);
    let mut next_id = 0_u64;

    for s in 0..tier.skeletons {
        let skeleton = SkeletonId(s);
        let first = next_id;
        let mut segment = if s % 20 == 19 { (s - 1) * 1_000 } else { s * 1_000 };
        let mut pos = [0.0_f64; 3];

        for i in 0..tier.nodes_per_skeleton {
            for c in &mut pos {
                *c += rng.next_step();
            }
            let id = NodeId(next_id);
            graph.add_node(id, skeleton, pos).expect("fresh node");
            if i > 0 {
                let parent = if rng.next_below(10) == 0 {
                    first + rng.next_below(i)
                } else {
                    next_id - 1
                };
                graph.add_edge(NodeId(parent), id).expect("same skeleton");
            }
            if rng.next_below(50) == 0 {
                segment += 1;
            }
            if rng.next_below(50) != 0 {
                lut.insert(id, SegmentId(segment));
            }
            next_id += 1;
        }
    }

    (graph, lut)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate.tiered");
    let serial = Executor::Serial;
    let parallel = Executor::from_config(&ExecutionConfig {
        parallel: true,
        threads: 0,
    })
    .expect("rayon pool");

    for tier in TIERS {
        let (graph, lut) = synthetic_forest(tier, 0x5EED_u64 + tier.skeletons);
        group.throughput(Throughput::Elements(graph.edge_count() as u64));

        for (label, exec) in [("scores_serial", &serial), ("scores_parallel", &parallel)] {
            group.bench_with_input(BenchmarkId::new(label, tier.name), &graph, |b, graph| {
                b.iter(|| black_box(evaluate_with(graph, &lut, exec)))
            });
        }

        let source = LengthSource::Geometric(graph.axes().clone());
        for (label, exec) in [("erl_serial", &serial), ("erl_parallel", &parallel)] {
            group.bench_with_input(BenchmarkId::new(label, tier.name), &graph, |b, graph| {
                b.iter_batched(
                    || graph.clone(),
                    |mut g| black_box(erl_report(&mut g, &lut, &source, exec)),
                    criterion::BatchSize::LargeInput,
                )
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
