use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use superstep::mapreduce::execute;
use superstep::prelude::*;

// Random directed graph with `n` vertices and `n * degree` edges.
fn random_graph(n: u64, degree: u64, seed: u64) -> InMemoryGraph {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut graph = InMemoryGraph::with_vertices(n);
    for u in 0..n {
        for _ in 0..degree {
            let v = rng.gen_range(0..n);
            graph
                .add_edge(VertexId::new(u), VertexId::new(v))
                .expect("both endpoints exist");
        }
    }
    graph
}

fn bench_pagerank(c: &mut Criterion) {
    let mut group = c.benchmark_group("pagerank");
    group.sample_size(10);
    for &n in &[1_000u64, 10_000] {
        let graph = random_graph(n, 8, 42);
        for &workers in &[1usize, 4] {
            group.bench_with_input(
                BenchmarkId::new(format!("n{n}"), workers),
                &workers,
                |b, &workers| {
                    b.iter(|| {
                        let program = PageRankVertexProgram::builder()
                            .iterations(10)
                            .build()
                            .unwrap();
                        GraphComputer::new(graph.clone())
                            .program(program)
                            .map_reduce(PageRankMapReduce::new())
                            .workers(workers)
                            .submit()
                            .unwrap()
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("count");
    let vertices: Vec<Vertex> = random_graph(100_000, 1, 7).vertices().to_vec();
    let job = CountMapReduce::new();
    for &parts in &[1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(parts), &parts, |b, &parts| {
            b.iter(|| execute(&job, &vertices, parts).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pagerank, bench_count);
criterion_main!(benches);
