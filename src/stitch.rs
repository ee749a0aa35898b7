// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Connected components and component-canvas stitching.
//!
//! Components are found with a union-find over node indices; stitching stacks
//! per-component canvases perpendicular to the flow direction.

use crate::config::Flow;
use crate::model::{Edge, Graph, Node, Subgraph};
use crate::render::Canvas;

/// One weakly-connected component of a graph, in deterministic order:
/// components sorted by smallest member index, members and edges ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedComponent {
    pub node_indices: Vec<usize>,
    pub edge_indices: Vec<usize>,
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self { parent: (0..len).collect() }
    }

    fn find(&mut self, index: usize) -> usize {
        let mut root = index;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression.
        let mut current = index;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            // Attach the larger root to the smaller so roots stay minimal.
            let (low, high) = if root_a < root_b { (root_a, root_b) } else { (root_b, root_a) };
            self.parent[high] = low;
        }
    }
}

/// Partitions all node indices; an edge belongs to a component iff both of
/// its endpoints do.
pub fn find_connected_components(graph: &Graph) -> Vec<ConnectedComponent> {
    let node_count = graph.nodes().len();
    let mut union_find = UnionFind::new(node_count);
    for edge in graph.edges() {
        union_find.union(edge.source(), edge.target());
    }

    let mut components = Vec::<ConnectedComponent>::new();
    let mut component_of_root = std::collections::BTreeMap::<usize, usize>::new();
    for index in 0..node_count {
        let root = union_find.find(index);
        let component = *component_of_root.entry(root).or_insert_with(|| {
            components.push(ConnectedComponent {
                node_indices: Vec::new(),
                edge_indices: Vec::new(),
            });
            components.len() - 1
        });
        components[component].node_indices.push(index);
    }

    for (edge_index, edge) in graph.edges().iter().enumerate() {
        let root = union_find.find(edge.source());
        let component = component_of_root[&root];
        components[component].edge_indices.push(edge_index);
    }

    components
}

fn remap_subgraph(subgraph: &Subgraph, index_map: &[Option<usize>]) -> Option<Subgraph> {
    let mut remapped = Subgraph::new(subgraph.id(), subgraph.title());
    for &member in subgraph.node_indices() {
        if let Some(new_index) = index_map[member] {
            remapped.push_node(new_index);
        }
    }
    let mut kept_any = !remapped.node_indices().is_empty();
    for child in subgraph.children() {
        if let Some(child) = remap_subgraph(child, index_map) {
            remapped.push_child(child);
            kept_any = true;
        }
    }
    kept_any.then_some(remapped)
}

/// Splits a graph into one standalone graph per connected component, with
/// node indices remapped and subgraphs filtered to surviving members.
pub fn component_graphs(graph: &Graph) -> Vec<Graph> {
    let components = find_connected_components(graph);
    if components.len() <= 1 {
        return vec![graph.clone()];
    }

    let mut graphs = Vec::with_capacity(components.len());
    for component in &components {
        let mut index_map = vec![None::<usize>; graph.nodes().len()];
        let mut sub = Graph::new(graph.direction());
        for &node_index in &component.node_indices {
            let node = graph.node(node_index);
            let new_index =
                sub.ensure_node(Node::new(node.id(), node.label(), node.shape()));
            index_map[node_index] = Some(new_index);
        }
        for &edge_index in &component.edge_indices {
            let edge = &graph.edges()[edge_index];
            let source = index_map[edge.source()].expect("endpoint in component");
            let target = index_map[edge.target()].expect("endpoint in component");
            sub.push_edge(Edge::new_with(
                source,
                target,
                edge.label().map(Into::into),
                edge.style(),
                edge.has_arrow_start(),
                edge.has_arrow_end(),
            ));
        }
        for subgraph in graph.subgraphs() {
            if let Some(remapped) = remap_subgraph(subgraph, &index_map) {
                sub.push_subgraph(remapped);
            }
        }
        graphs.push(sub);
    }
    graphs
}

/// Stacks component canvases perpendicular to the flow direction with `gap`
/// blank cells between them: LR stacks vertically, TD horizontally.
pub fn stitch_component_canvases(canvases: &[Canvas], flow: Flow, gap: usize) -> Canvas {
    let non_empty: Vec<&Canvas> = canvases.iter().filter(|c| !c.is_empty()).collect();
    if non_empty.is_empty() {
        return Canvas::new(0, 0);
    }

    let total_gap = gap * (non_empty.len() - 1);
    let (width, height) = match flow {
        Flow::LR => (
            non_empty.iter().map(|c| c.width()).max().unwrap_or(0),
            non_empty.iter().map(|c| c.height()).sum::<usize>() + total_gap,
        ),
        Flow::TD => (
            non_empty.iter().map(|c| c.width()).sum::<usize>() + total_gap,
            non_empty.iter().map(|c| c.height()).max().unwrap_or(0),
        ),
    };

    let mut stitched = Canvas::new(width, height);
    let mut offset = 0usize;
    for canvas in non_empty {
        match flow {
            Flow::LR => {
                stitched.merge_overlay((0, offset), true, canvas);
                offset += canvas.height() + gap;
            }
            Flow::TD => {
                stitched.merge_overlay((offset, 0), true, canvas);
                offset += canvas.width() + gap;
            }
        }
    }
    stitched
}
