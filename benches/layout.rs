use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fsm_layout::config::LayoutConfig;
use fsm_layout::ir::Graph;
use fsm_layout::layout::{
    Ellipse, LayoutStrategy, Point, RoutingBox, compute_layout, compute_layout_with,
    fit_spline_through_boxes, route_around_obstacles,
};
use std::hint::black_box;

/// A chain of `nodes` states plus `extra_edges` forward skips and one
/// return edge, so every layering phase has work to do.
fn dense_machine(nodes: usize, extra_edges: usize) -> Graph {
    let name = |i: usize| format!("S{i}");
    let mut graph = Graph::new();
    if nodes == 0 {
        return graph;
    }
    graph.set_root(&name(0));
    for i in 0..nodes.saturating_sub(1) {
        graph.add_edge(&name(i), &name(i + 1));
    }
    let mut count = 0usize;
    'outer: for i in 0..nodes {
        for j in (i + 2)..nodes {
            if count >= extra_edges {
                break 'outer;
            }
            graph.add_edge(&name(i), &name(j));
            count += 1;
        }
    }
    graph.add_edge(&name(nodes - 1), &name(0));
    graph
}

fn fixture(name: &str) -> Graph {
    let source = match name {
        "parser" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/parser.json5"
        )),
        "traffic_light" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/traffic_light.json5"
        )),
        "turnstile" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/turnstile.json5"
        )),
        "vending" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/vending.json5"
        )),
        _ => panic!("unknown fixture {name}"),
    };
    Graph::from_json5(source).expect("fixture parse failed")
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    for name in ["turnstile", "traffic_light", "vending", "parser"] {
        let graph = fixture(name);
        group.bench_with_input(BenchmarkId::from_parameter(name), &graph, |b, graph| {
            b.iter(|| {
                let layout = compute_layout(black_box(graph), 80.0, 40.0, &config);
                black_box(layout.nodes.len());
            });
        });
    }
    group.finish();
}

fn bench_dense_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_dense");
    let config = LayoutConfig::default();
    for (nodes, extra_edges) in [(20usize, 40usize), (40, 80), (60, 180)] {
        let name = format!("dense_{nodes}_{extra_edges}");
        let graph = dense_machine(nodes, extra_edges);
        group.bench_with_input(BenchmarkId::from_parameter(name), &graph, |b, graph| {
            b.iter(|| {
                let layout = compute_layout(black_box(graph), 120.0, 60.0, &config);
                black_box(layout.edges.len());
            });
        });
    }
    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_strategies");
    let config = LayoutConfig::default();
    let graph = dense_machine(24, 40);
    for strategy in [
        LayoutStrategy::Grid,
        LayoutStrategy::Circular,
        LayoutStrategy::ForceDirected,
    ] {
        group.bench_with_input(
            BenchmarkId::new("strategy", format!("{strategy:?}")),
            &strategy,
            |b, &strategy| {
                b.iter(|| {
                    let graph = black_box(&graph);
                    let layout = compute_layout_with(graph, strategy, 120.0, 60.0, &config);
                    black_box(layout.nodes.len());
                });
            },
        );
    }
    group.finish();
}

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");
    for count in [4usize, 16, 48] {
        let obstacles: Vec<Ellipse> = (0..count)
            .map(|i| {
                let col = (i % 8) as f32;
                let row = (i / 8) as f32;
                let x = 15.0 + col * 12.0;
                let y = 5.0 + row * 8.0 + (col % 2.0) * 3.0;
                Ellipse::new(x, y, 4.0, 1.5)
            })
            .collect();
        let id = BenchmarkId::new("obstacles", count);
        group.bench_with_input(id, &obstacles, |b, obstacles| {
            b.iter(|| {
                let path = route_around_obstacles(
                    black_box(Point::new(0.0, 0.0)),
                    black_box(Point::new(110.0, 50.0)),
                    obstacles,
                );
                black_box(path.len());
            });
        });
    }

    let boxes: Vec<RoutingBox> = (0..8)
        .map(|i| {
            let x = 40.0 + if i % 2 == 0 { 6.0 } else { -6.0 };
            let y = 10.0 + i as f32 * 9.0;
            RoutingBox {
                left: x - 5.0,
                right: x + 5.0,
                top: y - 4.5,
                bottom: y + 4.5,
            }
        })
        .collect();
    let (start, end) = (Point::new(40.0, 2.0), Point::new(40.0, 88.0));
    group.bench_function("spline_fit", |b| {
        b.iter(|| {
            let spline = fit_spline_through_boxes(start, end, black_box(&boxes));
            black_box(spline.len());
        });
    });
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_layout, bench_dense_layout, bench_strategies, bench_routing
);
criterion_main!(benches);
