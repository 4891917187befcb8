use std::path::{Path, PathBuf};

use fsm_layout::config::{LayoutConfig, NodeMetricsConfig, parse_config};
use fsm_layout::ir::{Graph, load_graph};
use fsm_layout::layout::graph::LayoutGraph;
use fsm_layout::layout::ranking::{assign_layers, count_crossings, group_layers, order_layers};
use fsm_layout::layout::visibility::VisibilityGraph;
use fsm_layout::layout::{
    Ellipse, LayoutResult, LayoutStrategy, Point, RoutingBox, compute_layout, compute_layout_with,
    edge_path, evaluate_spline, fit_spline_through_boxes, rect_overlap, route_around_obstacles,
};

const FIXTURES: [&str; 4] = [
    "parser.json5",
    "traffic_light.json5",
    "turnstile.json5",
    "vending.json5",
];

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture(name: &str) -> Graph {
    load_graph(&fixture_path(name)).expect("fixture load failed")
}

fn assert_no_overlap(result: &LayoutResult, context: &str) {
    let nodes: Vec<_> = result.nodes.iter().collect();
    for (i, (name_a, a)) in nodes.iter().enumerate() {
        for (name_b, b) in &nodes[i + 1..] {
            assert_eq!(
                rect_overlap(&a.footprint(), &b.footprint()),
                0.0,
                "{context}: {name_a} overlaps {name_b}"
            );
        }
    }
}

fn assert_layered_invariants(graph: &Graph, result: &LayoutResult, fixture: &str) {
    assert_eq!(result.nodes.len(), graph.nodes.len(), "{fixture}");
    for name in &graph.nodes {
        assert!(result.nodes.contains_key(name), "{fixture}: missing {name}");
    }
    assert!(
        result.nodes.keys().all(|name| !name.starts_with("_v_")),
        "{fixture}: virtual node leaked"
    );
    assert_no_overlap(result, fixture);

    let metrics = NodeMetricsConfig::default();
    for (id, edge) in &result.edges {
        let from = &result.nodes[&edge.from];
        let to = &result.nodes[&edge.to];
        if edge.from == edge.to {
            assert!(edge.is_self_loop, "{fixture}: {id} is a self-loop");
            continue;
        }
        assert_eq!(edge.is_back_edge, to.rank < from.rank, "{fixture}: {id}");
        assert_eq!(edge.is_flat_edge, to.rank == from.rank, "{fixture}: {id}");
        if to.rank > from.rank {
            let span = to.rank - from.rank;
            assert_eq!(edge.waypoints.len(), span - 1, "{fixture}: {id} waypoints");
            assert_eq!(edge.boxes.len(), span - 1, "{fixture}: {id} boxes");
            for (point, corridor) in edge.waypoints.iter().zip(&edge.boxes) {
                assert!(corridor.contains(*point), "{fixture}: {id} corridor");
            }
        }

        let path = edge_path(result, id, &metrics).expect("edge path");
        assert_eq!(path[0], from.center(), "{fixture}: {id} start");
        assert_eq!(*path.last().unwrap(), to.center(), "{fixture}: {id} end");
    }
}

#[test]
fn layered_layout_of_all_fixtures() {
    for fixture in FIXTURES {
        let graph = load_fixture(fixture);
        let result = compute_layout(&graph, 80.0, 40.0, &LayoutConfig::default());
        assert_layered_invariants(&graph, &result, fixture);
    }
}

#[test]
fn every_strategy_places_every_node() {
    let strategies = [
        LayoutStrategy::Auto,
        LayoutStrategy::Layered,
        LayoutStrategy::Grid,
        LayoutStrategy::Circular,
        LayoutStrategy::ForceDirected,
    ];
    let config = LayoutConfig::default();
    for fixture in FIXTURES {
        let graph = load_fixture(fixture);
        for strategy in strategies {
            let context = format!("{fixture} ({strategy:?})");
            let result = compute_layout_with(&graph, strategy, 80.0, 40.0, &config);
            assert_eq!(result.nodes.len(), graph.nodes.len(), "{context}");
            assert_no_overlap(&result, &context);
            for node in result.nodes.values() {
                let right = node.x + node.width / 2.0;
                let bottom = node.y + node.height / 2.0;
                assert!(right <= result.width, "{context}: right edge");
                assert!(bottom <= result.height, "{context}: bottom edge");
            }
        }
    }
}

#[test]
fn layout_is_deterministic() {
    let graph = load_fixture("vending.json5");
    let config = LayoutConfig::default();
    let first = compute_layout(&graph, 80.0, 40.0, &config);
    let second = compute_layout(&graph, 80.0, 40.0, &config);
    assert_eq!(first, second);
}

#[test]
fn unreachable_state_gets_its_own_rank() {
    let graph = load_fixture("parser.json5");
    let result = compute_layout(&graph, 80.0, 40.0, &LayoutConfig::default());
    let max_reachable = result
        .nodes
        .iter()
        .filter(|(name, _)| name.as_str() != "error")
        .map(|(_, node)| node.rank)
        .max()
        .unwrap();
    assert_eq!(result.nodes["error"].rank, max_reachable + 1);
    assert_eq!(result.ranks.last().unwrap().nodes, ["error"]);
}

#[test]
fn crossing_minimization_never_adds_crossings() {
    for fixture in FIXTURES {
        let graph = LayoutGraph::build(&load_fixture(fixture), &NodeMetricsConfig::default());
        let ranks = assign_layers(&graph, None);
        let mut layers = group_layers(&graph, &ranks);
        let before = count_crossings(&layers, &graph);
        order_layers(&mut layers, &graph, 4);
        assert!(count_crossings(&layers, &graph) <= before, "{fixture}");
    }
}

#[test]
fn obstacle_forces_detour() {
    let start = Point::new(0.0, 0.0);
    let end = Point::new(100.0, 0.0);
    let obstacle = Ellipse::new(50.0, 0.0, 10.0, 10.0);
    let path = route_around_obstacles(start, end, &[obstacle]);
    assert!(path.len() > 2);
    assert_eq!(path[0], start);
    assert_eq!(*path.last().unwrap(), end);
    for p in &path[1..path.len() - 1] {
        assert!(p.distance(obstacle.center()) > 10.0);
    }

    let clear = route_around_obstacles(start, end, &[Ellipse::new(50.0, 40.0, 10.0, 10.0)]);
    assert_eq!(clear, vec![start, end]);
}

#[test]
fn dijkstra_prefers_cheaper_two_hop_path() {
    let mut graph = VisibilityGraph::new(vec![
        Point::new(0.0, 0.0),
        Point::new(50.0, 0.0),
        Point::new(100.0, 0.0),
    ]);
    graph.add_edge(0, 1, 50.0);
    graph.add_edge(1, 2, 50.0);
    graph.add_edge(0, 2, 150.0);
    let (path, cost) = graph.shortest_path(0, 2).expect("reachable");
    assert_eq!(path, vec![0, 1, 2]);
    assert_eq!(cost, 100.0);
}

#[test]
fn fitted_spline_keeps_exact_endpoints() {
    let start = Point::new(12.3, 1.7);
    let end = Point::new(47.9, 38.1);
    let boxes = [
        RoutingBox {
            left: 10.0,
            right: 30.0,
            top: 6.0,
            bottom: 15.0,
        },
        RoutingBox {
            left: 20.0,
            right: 45.0,
            top: 15.0,
            bottom: 24.0,
        },
        RoutingBox {
            left: 35.0,
            right: 60.0,
            top: 24.0,
            bottom: 33.0,
        },
    ];
    let spline = fit_spline_through_boxes(start, end, &boxes);
    assert_eq!(evaluate_spline(&spline, 0.0), start);
    assert_eq!(evaluate_spline(&spline, 1.0), end);
    assert!(spline.len() == 5 || spline.len() == 13);
}

#[test]
fn config_file_overrides_defaults() {
    let config = parse_config("{ layered: { max_rank_spacing: 6 }, metrics: { node_height: 3 } }")
        .expect("config parse failed");
    let graph = Graph::from_edges("A", &[("A", "B"), ("B", "C")]);
    let result = compute_layout(&graph, 80.0, 40.0, &config);
    assert_eq!(result.nodes["B"].y - result.nodes["A"].y, 6.0);
    assert_eq!(result.nodes["A"].height, 3.0);
}
