// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::config::GraphDirection;

/// A flowchart node. Reserves a 3×3 block on the routing grid once placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: SmolStr,
    label: SmolStr,
    shape: NodeShape,
}

impl Node {
    pub fn new(id: impl Into<SmolStr>, label: impl Into<SmolStr>, shape: NodeShape) -> Self {
        Self { id: id.into(), label: label.into(), shape }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<SmolStr>) {
        self.label = label.into();
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: NodeShape) {
        self.shape = shape;
    }

    /// Label split on `<br/>` into the rows drawn inside the box.
    pub fn label_lines(&self) -> Vec<&str> {
        if self.label.is_empty() {
            return vec![""];
        }
        self.label.split("<br/>").collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeShape {
    #[default]
    Rect,
    Round,
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeStyle {
    #[default]
    Solid,
    Dotted,
    Thick,
}

/// A flowchart edge as a plain index pair into the graph's node vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    source: usize,
    target: usize,
    label: Option<SmolStr>,
    style: EdgeStyle,
    has_arrow_start: bool,
    has_arrow_end: bool,
}

impl Edge {
    pub fn new(source: usize, target: usize) -> Self {
        Self {
            source,
            target,
            label: None,
            style: EdgeStyle::Solid,
            has_arrow_start: false,
            has_arrow_end: true,
        }
    }

    pub fn new_with(
        source: usize,
        target: usize,
        label: Option<SmolStr>,
        style: EdgeStyle,
        has_arrow_start: bool,
        has_arrow_end: bool,
    ) -> Self {
        Self { source, target, label, style, has_arrow_start, has_arrow_end }
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn style(&self) -> EdgeStyle {
        self.style
    }

    pub fn has_arrow_start(&self) -> bool {
        self.has_arrow_start
    }

    pub fn has_arrow_end(&self) -> bool {
        self.has_arrow_end
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// A subgraph block; children nest and membership is by node index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgraph {
    id: SmolStr,
    title: SmolStr,
    node_indices: Vec<usize>,
    children: Vec<Subgraph>,
}

impl Subgraph {
    pub fn new(id: impl Into<SmolStr>, title: impl Into<SmolStr>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            node_indices: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn node_indices(&self) -> &[usize] {
        &self.node_indices
    }

    pub fn push_node(&mut self, node_index: usize) {
        if !self.node_indices.contains(&node_index) {
            self.node_indices.push(node_index);
        }
    }

    pub fn children(&self) -> &[Subgraph] {
        &self.children
    }

    pub fn push_child(&mut self, child: Subgraph) {
        self.children.push(child);
    }

    /// All member indices including nested children, left-to-right.
    pub fn member_indices(&self) -> Vec<usize> {
        let mut members = self.node_indices.clone();
        for child in &self.children {
            members.extend(child.member_indices());
        }
        members
    }
}

/// A parsed flowchart: nodes, edges in input order, and a subgraph tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    subgraphs: Vec<Subgraph>,
    direction: GraphDirection,
    index_by_id: BTreeMap<SmolStr, usize>,
}

impl Graph {
    pub fn new(direction: GraphDirection) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            subgraphs: Vec::new(),
            direction,
            index_by_id: BTreeMap::new(),
        }
    }

    pub fn direction(&self) -> GraphDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: GraphDirection) {
        self.direction = direction;
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn subgraphs(&self) -> &[Subgraph] {
        &self.subgraphs
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    /// Inserts a node, or returns the index of the existing node with this id.
    pub fn ensure_node(&mut self, node: Node) -> usize {
        if let Some(&index) = self.index_by_id.get(node.id()) {
            return index;
        }
        let index = self.nodes.len();
        self.index_by_id.insert(SmolStr::new(node.id()), index);
        self.nodes.push(node);
        index
    }

    pub fn node_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn push_subgraph(&mut self, subgraph: Subgraph) {
        self.subgraphs.push(subgraph);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node indices that are not the target of any edge.
    pub fn root_indices(&self) -> Vec<usize> {
        let mut targeted = vec![false; self.nodes.len()];
        for edge in &self.edges {
            if !edge.is_self_loop() {
                targeted[edge.target()] = true;
            }
        }
        (0..self.nodes.len()).filter(|&i| !targeted[i]).collect()
    }

    /// The innermost subgraph containing `node_index`, if any.
    pub fn subgraph_of(&self, node_index: usize) -> Option<&Subgraph> {
        fn find<'a>(subgraphs: &'a [Subgraph], node_index: usize) -> Option<&'a Subgraph> {
            for subgraph in subgraphs {
                if let Some(inner) = find(subgraph.children(), node_index) {
                    return Some(inner);
                }
                if subgraph.node_indices().contains(&node_index) {
                    return Some(subgraph);
                }
            }
            None
        }
        find(&self.subgraphs, node_index)
    }
}
