use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

use super::graph::LayoutGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Result of an explicit-stack depth-first traversal.
#[derive(Debug, Default)]
pub(crate) struct DepthFirst {
    pub(crate) postorder: Vec<usize>,
    /// Edges into a node that was still on the current path.
    pub(crate) back_edges: HashSet<(usize, usize)>,
}

/// Depth-first traversal from each start in turn, children visited by name.
pub(crate) fn depth_first(graph: &LayoutGraph, starts: &[usize]) -> DepthFirst {
    let children: Vec<Vec<usize>> = (0..graph.len())
        .map(|idx| graph.sorted_by_name(graph.successors(idx).iter().copied()))
        .collect();
    let mut state = vec![Visit::New; graph.len()];
    let mut out = DepthFirst::default();

    for &start in starts {
        if state[start] != Visit::New {
            continue;
        }
        state[start] = Visit::Active;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            if let Some(&next) = children[node].get(cursor) {
                frame.1 += 1;
                match state[next] {
                    Visit::New => {
                        state[next] = Visit::Active;
                        stack.push((next, 0));
                    }
                    Visit::Active => {
                        out.back_edges.insert((node, next));
                    }
                    Visit::Done => {}
                }
            } else {
                state[node] = Visit::Done;
                out.postorder.push(node);
                stack.pop();
            }
        }
    }
    out
}

/// Picks the layering root: the named node if it exists, otherwise the first
/// source node by name, otherwise the first node by name.
pub(crate) fn resolve_root(graph: &LayoutGraph, root: Option<&str>) -> Option<usize> {
    if let Some(idx) = root.and_then(|name| graph.index_of(name)) {
        return Some(idx);
    }
    let by_name = graph.sorted_by_name(graph.real_nodes());
    by_name
        .iter()
        .copied()
        .find(|&idx| graph.predecessors(idx).is_empty())
        .or_else(|| by_name.first().copied())
}

/// Assigns a rank to every node.
///
/// BFS from the root gives the reachable set and hop distances; ranks are then
/// relaxed along forward (non-back) edges so every such edge points strictly
/// downward. Unreachable nodes follow in name order, one rank each.
pub fn assign_layers(graph: &LayoutGraph, root: Option<&str>) -> Vec<usize> {
    let n = graph.len();
    let Some(root) = resolve_root(graph, root) else {
        return Vec::new();
    };

    let mut ranks: Vec<Option<usize>> = vec![None; n];
    ranks[root] = Some(0);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        let depth = ranks[current].unwrap_or(0);
        for next in graph.sorted_by_name(graph.successors(current).iter().copied()) {
            if ranks[next].is_none() {
                ranks[next] = Some(depth + 1);
                queue.push_back(next);
            }
        }
    }

    let dfs = depth_first(graph, &[root]);
    for &node in dfs.postorder.iter().rev() {
        let Some(rank) = ranks[node] else {
            continue;
        };
        for &next in graph.successors(node) {
            if dfs.back_edges.contains(&(node, next)) {
                continue;
            }
            if let Some(next_rank) = ranks[next].as_mut() {
                *next_rank = (*next_rank).max(rank + 1);
            }
        }
    }

    let mut max_rank = ranks.iter().flatten().copied().max().unwrap_or(0);
    let unreachable = graph.sorted_by_name((0..n).filter(|&idx| ranks[idx].is_none()));
    for idx in unreachable {
        max_rank += 1;
        ranks[idx] = Some(max_rank);
    }

    ranks.into_iter().map(|rank| rank.unwrap_or(0)).collect()
}

/// Groups nodes by rank, each layer sorted by name.
pub fn group_layers(graph: &LayoutGraph, ranks: &[usize]) -> Vec<Vec<usize>> {
    let layer_count = ranks.iter().copied().max().map_or(0, |max| max + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
    for (idx, &rank) in ranks.iter().enumerate() {
        layers[rank].push(idx);
    }
    for layer in &mut layers {
        *layer = graph.sorted_by_name(layer.iter().copied());
    }
    layers
}

fn layer_index(layers: &[Vec<usize>], node_count: usize) -> Vec<Option<usize>> {
    let mut layer_of = vec![None; node_count];
    for (rank, layer) in layers.iter().enumerate() {
        for &idx in layer {
            layer_of[idx] = Some(rank);
        }
    }
    layer_of
}

fn positions_of(layers: &[Vec<usize>], node_count: usize) -> Vec<usize> {
    let mut positions = vec![0; node_count];
    for layer in layers {
        for (order, &idx) in layer.iter().enumerate() {
            positions[idx] = order;
        }
    }
    positions
}

/// Counts pairwise crossings of edges joining adjacent layers.
pub fn count_crossings(layers: &[Vec<usize>], graph: &LayoutGraph) -> usize {
    let layer_of = layer_index(layers, graph.len());
    let positions = positions_of(layers, graph.len());
    let mut crossings = 0;
    for (rank, layer) in layers.iter().enumerate() {
        let mut segments: Vec<(usize, usize)> = Vec::new();
        for &from in layer {
            for &to in graph.successors(from) {
                if layer_of[to] == Some(rank + 1) {
                    segments.push((positions[from], positions[to]));
                }
            }
        }
        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    crossings += 1;
                }
            }
        }
    }
    crossings
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    Down,
    Up,
}

fn barycenter(
    idx: usize,
    neighbors: &[usize],
    adjacent_rank: Option<usize>,
    layer_of: &[Option<usize>],
    positions: &[usize],
) -> f32 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &neighbor in neighbors {
        if adjacent_rank.is_some() && layer_of[neighbor] == adjacent_rank {
            sum += positions[neighbor] as f32;
            count += 1;
        }
    }
    if count == 0 {
        positions[idx] as f32
    } else {
        sum / count as f32
    }
}

fn sort_layer(
    graph: &LayoutGraph,
    layers: &mut [Vec<usize>],
    rank: usize,
    sweep: Sweep,
    layer_of: &[Option<usize>],
    positions: &mut [usize],
) {
    let adjacent_rank = match sweep {
        Sweep::Down => rank.checked_sub(1),
        Sweep::Up => Some(rank + 1),
    };
    let mut scored: Vec<(f32, usize)> = layers[rank]
        .iter()
        .map(|&idx| {
            let neighbors = match sweep {
                Sweep::Down => graph.predecessors(idx),
                Sweep::Up => graph.successors(idx),
            };
            (
                barycenter(idx, neighbors, adjacent_rank, layer_of, positions),
                idx,
            )
        })
        .collect();
    scored.sort_by(|a, b| match a.0.partial_cmp(&b.0) {
        Some(Ordering::Equal) | None => graph.name(a.1).cmp(graph.name(b.1)),
        Some(ordering) => ordering,
    });
    layers[rank] = scored.into_iter().map(|(_, idx)| idx).collect();
    for (order, &idx) in layers[rank].iter().enumerate() {
        positions[idx] = order;
    }
}

/// Barycenter crossing reduction: `passes` rounds of a downward sweep
/// (ordering by predecessors) followed by an upward sweep (by successors).
///
/// The ordering with the fewest crossings seen after any sweep is kept, later
/// sweeps winning ties, so the result never has more crossings than the input.
pub fn order_layers(layers: &mut Vec<Vec<usize>>, graph: &LayoutGraph, passes: usize) {
    if layers.len() <= 1 {
        return;
    }
    let layer_of = layer_index(layers, graph.len());
    let mut positions = positions_of(layers, graph.len());
    let mut best = layers.clone();
    let mut best_crossings = count_crossings(layers, graph);

    for _ in 0..passes {
        for sweep in [Sweep::Down, Sweep::Up] {
            let ranks: Vec<usize> = match sweep {
                Sweep::Down => (1..layers.len()).collect(),
                Sweep::Up => (0..layers.len() - 1).rev().collect(),
            };
            for rank in ranks {
                sort_layer(graph, layers, rank, sweep, &layer_of, &mut positions);
            }
            let crossings = count_crossings(layers, graph);
            if crossings <= best_crossings {
                best_crossings = crossings;
                best.clone_from(layers);
            }
        }
    }
    log::trace!("crossing reduction settled at {best_crossings} crossings");
    *layers = best;
}
