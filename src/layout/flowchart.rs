// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Level-based grid layout for flowcharts.
//!
//! Nodes reserve 3×3 blocks spaced four grid cells apart; the cell between
//! blocks is the routing corridor. Grid columns and rows carry drawing widths
//! and heights, so the character canvas is a projection of the grid.

use std::collections::BTreeMap;

use crate::config::{Flow, RenderConfig};
use crate::model::{Graph, GridCoord};
use crate::render::text::str_display_width;

use super::astar::AStarContext;
use super::route::{RoutedEdge, Router};

/// Search-array headroom past the outermost node block, covering the widest
/// bounds expansion step.
const GRID_HEADROOM: usize = 384;

/// Uniform shifts tried when an edge proves unroutable.
const LAYOUT_MARGINS: &[i32] = &[0, 1, 2, 3, 4];

/// Extra vertical padding above the topmost subgraph node that receives
/// edges from outside its subgraph.
const SUBGRAPH_INFLOW_OVERHEAD: usize = 4;

/// Per-column drawing widths and per-row drawing heights of the grid.
#[derive(Debug, Clone, Default)]
pub struct GridSizing {
    columns: BTreeMap<i32, usize>,
    rows: BTreeMap<i32, usize>,
    default_column: usize,
    default_row: usize,
}

impl GridSizing {
    fn new(default_column: usize, default_row: usize) -> Self {
        Self {
            columns: BTreeMap::new(),
            rows: BTreeMap::new(),
            default_column: default_column.max(1),
            default_row: default_row.max(1),
        }
    }

    pub fn widen_column(&mut self, x: i32, min_width: usize) {
        let width = self.columns.entry(x).or_insert(0);
        *width = (*width).max(min_width);
    }

    pub fn widen_row(&mut self, y: i32, min_height: usize) {
        let height = self.rows.entry(y).or_insert(0);
        *height = (*height).max(min_height);
    }

    /// Guarantees an entry so the column projects with non-zero width.
    pub fn ensure_column(&mut self, x: i32) {
        let default = self.default_column;
        self.columns.entry(x).or_insert(default);
    }

    pub fn ensure_row(&mut self, y: i32) {
        let default = self.default_row;
        self.rows.entry(y).or_insert(default);
    }

    pub fn column_width(&self, x: i32) -> usize {
        self.columns.get(&x).copied().unwrap_or(0)
    }

    pub fn row_height(&self, y: i32) -> usize {
        self.rows.get(&y).copied().unwrap_or(0)
    }

    /// Drawing x of grid column `x`: the widths of all columns before it.
    pub fn drawing_x(&self, x: i32) -> usize {
        self.columns.range(..x).map(|(_, w)| w).sum()
    }

    pub fn drawing_y(&self, y: i32) -> usize {
        self.rows.range(..y).map(|(_, h)| h).sum()
    }

    /// Sum of column widths spanned by `[x0, x1)`.
    pub fn span_width(&self, x0: i32, x1: i32) -> usize {
        let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        self.columns.range(lo..hi).map(|(_, w)| w).sum()
    }

    /// Total drawing size `(width, height)` of the projected grid.
    pub fn canvas_extent(&self) -> (usize, usize) {
        (self.columns.values().sum(), self.rows.values().sum())
    }
}

/// A finished layout: placements, routed edges, and grid sizing.
#[derive(Debug, Clone)]
pub struct FlowchartLayout {
    placements: Vec<GridCoord>,
    routed: Vec<RoutedEdge>,
    sizing: GridSizing,
    flow: Flow,
}

impl FlowchartLayout {
    pub fn placements(&self) -> &[GridCoord] {
        &self.placements
    }

    pub fn routed(&self) -> &[RoutedEdge] {
        &self.routed
    }

    pub fn sizing(&self) -> &GridSizing {
        &self.sizing
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    /// Drawing-cell position of a grid point.
    pub fn project(&self, coord: GridCoord) -> (usize, usize) {
        (self.sizing.drawing_x(coord.x()), self.sizing.drawing_y(coord.y()))
    }
}

fn cross_shift(flow: Flow) -> GridCoord {
    match flow {
        Flow::LR => GridCoord::new(0, 4),
        Flow::TD => GridCoord::new(4, 0),
    }
}

fn flow_shift(flow: Flow) -> GridCoord {
    match flow {
        Flow::LR => GridCoord::new(4, 0),
        Flow::TD => GridCoord::new(0, 4),
    }
}

/// Places every node on the unshifted grid.
///
/// Roots sit at level 0 (flow axis) stacked four cells apart on the cross
/// axis; children land one level (four cells) past their parent. A taken cell
/// shifts perpendicular by four until free.
fn place_nodes(graph: &Graph, flow: Flow) -> Vec<GridCoord> {
    let node_count = graph.nodes().len();
    let mut placed = vec![None::<GridCoord>; node_count];
    let mut occupied = BTreeMap::<(i32, i32), usize>::new();

    let cross = cross_shift(flow);
    let ahead = flow_shift(flow);

    let mut reserve = |placed: &mut Vec<Option<GridCoord>>,
                       occupied: &mut BTreeMap<(i32, i32), usize>,
                       index: usize,
                       mut coord: GridCoord| {
        while occupied.contains_key(&(coord.x(), coord.y())) {
            coord = coord.offset(cross.x(), cross.y());
        }
        occupied.insert((coord.x(), coord.y()), index);
        placed[index] = Some(coord);
        coord
    };

    let mut roots = graph.root_indices();
    if roots.is_empty() && node_count > 0 {
        // Pure cycles have no root; break the tie on the first node.
        roots.push(0);
    }

    let mut queue = std::collections::VecDeque::<usize>::new();
    let mut root_cursor = GridCoord::new(0, 0);
    for &root in &roots {
        let mut base = root_cursor;
        if graph.subgraph_of(root).is_some() {
            // Subgraph-member roots start one level in and one cross step
            // down so the subgraph border has room on all sides.
            base = base.offset(ahead.x() + cross.x(), ahead.y() + cross.y());
        }
        reserve(&mut placed, &mut occupied, root, base);
        root_cursor = root_cursor.offset(cross.x(), cross.y());
        queue.push_back(root);
    }

    let mut cursor = 0usize;
    loop {
        while let Some(current) = queue.pop_front() {
            let origin = placed[current].expect("queued nodes are placed");
            for edge in graph.edges() {
                if edge.source() != current {
                    continue;
                }
                let child = edge.target();
                if placed[child].is_some() {
                    continue;
                }
                let requested = origin.offset(ahead.x(), ahead.y());
                reserve(&mut placed, &mut occupied, child, requested);
                queue.push_back(child);
            }
        }

        // Unreached nodes (cycle members, orphan components) become roots.
        match (cursor..node_count).find(|&i| placed[i].is_none()) {
            Some(next) => {
                cursor = next;
                reserve(&mut placed, &mut occupied, next, root_cursor);
                root_cursor = root_cursor.offset(cross.x(), cross.y());
                queue.push_back(next);
            }
            None => break,
        }
    }

    placed.into_iter().map(|p| p.expect("all nodes placed")).collect()
}

/// Node-driven column and row sizes, plus the padding cells before nodes.
fn compute_sizing(
    graph: &Graph,
    placements: &[GridCoord],
    config: &RenderConfig,
) -> GridSizing {
    let mut sizing = GridSizing::new(config.padding_x / 2, config.padding_y / 2);
    let border_padding = config.box_border_padding;

    for (index, node) in graph.nodes().iter().enumerate() {
        let block = placements[index];
        let lines = node.label_lines();
        let label_width = lines.iter().map(|line| str_display_width(line)).max().unwrap_or(0);

        sizing.widen_column(block.x(), 1);
        sizing.widen_column(block.x() + 1, 2 * border_padding + label_width);
        sizing.widen_column(block.x() + 2, 1);

        sizing.widen_row(block.y(), 1);
        sizing.widen_row(block.y() + 1, lines.len() + 2 * border_padding);
        sizing.widen_row(block.y() + 2, 1);

        if block.x() > 0 {
            sizing.widen_column(block.x() - 1, config.padding_x);
        }
        if block.y() > 0 {
            sizing.widen_row(block.y() - 1, config.padding_y);
        }
    }

    apply_subgraph_inflow_overhead(graph, placements, config, &mut sizing);
    sizing
}

/// The topmost subgraph node targeted from outside its subgraph needs extra
/// headroom for the border and the incoming stroke.
fn apply_subgraph_inflow_overhead(
    graph: &Graph,
    placements: &[GridCoord],
    config: &RenderConfig,
    sizing: &mut GridSizing,
) {
    fn visit(
        graph: &Graph,
        placements: &[GridCoord],
        config: &RenderConfig,
        sizing: &mut GridSizing,
        subgraph: &crate::model::Subgraph,
    ) {
        let members = subgraph.member_indices();
        let mut topmost: Option<GridCoord> = None;
        for &member in &members {
            let has_external_inflow = graph.edges().iter().any(|edge| {
                edge.target() == member && !members.contains(&edge.source())
            });
            if !has_external_inflow {
                continue;
            }
            let block = placements[member];
            if topmost.map(|t| block.y() < t.y()).unwrap_or(true) {
                topmost = Some(block);
            }
        }
        if let Some(block) = topmost {
            if block.y() > 0 {
                sizing.widen_row(block.y() - 1, config.padding_y + SUBGRAPH_INFLOW_OVERHEAD);
            }
        }
        for child in subgraph.children() {
            visit(graph, placements, config, sizing, child);
        }
    }

    for subgraph in graph.subgraphs() {
        visit(graph, placements, config, sizing, subgraph);
    }
}

/// Guarantees sizing entries for every column and row an edge stroke passes
/// through; unvisited columns would otherwise project with zero width.
fn inflate_for_paths(routed: &[RoutedEdge], sizing: &mut GridSizing) {
    for edge in routed {
        for window in edge.path.windows(2) {
            let (a, b) = (window[0], window[1]);
            for x in a.x().min(b.x())..=a.x().max(b.x()) {
                sizing.ensure_column(x);
            }
            for y in a.y().min(b.y())..=a.y().max(b.y()) {
                sizing.ensure_row(y);
            }
        }
    }
}

/// Chooses the segment each edge label rides on and widens its midpoint
/// column, preferring the first segment wide enough for the label that
/// collides with nothing already placed.
fn plan_label_lines(
    graph: &Graph,
    placements: &[GridCoord],
    routed: &mut [RoutedEdge],
    sizing: &mut GridSizing,
) {
    // Placed label boxes in drawing estimates: (grid row, x0, x1).
    let mut placed: Vec<(i32, i64, i64)> = Vec::new();

    for (index, edge) in graph.edges().iter().enumerate() {
        let Some(label) = edge.label() else {
            continue;
        };
        let route = &mut routed[index];
        if !route.is_routed() {
            continue;
        }
        let label_width = str_display_width(label);
        if label_width == 0 {
            continue;
        }

        let mut horizontal: Vec<(GridCoord, GridCoord)> = Vec::new();
        let mut widest_any: Option<(GridCoord, GridCoord, usize)> = None;
        for window in route.path.windows(2) {
            let (a, b) = (window[0], window[1]);
            let length = (a.x() - b.x()).unsigned_abs().max((a.y() - b.y()).unsigned_abs());
            if widest_any.map(|(_, _, len)| length as usize > len).unwrap_or(true) {
                widest_any = Some((a, b, length as usize));
            }
            if a.y() == b.y() && a.x() != b.x() {
                horizontal.push(if a.x() <= b.x() { (a, b) } else { (b, a) });
            }
        }

        let mut chosen: Option<(GridCoord, GridCoord)> = None;
        for &(a, b) in &horizontal {
            let fits = sizing.span_width(a.x(), b.x()) >= label_width;
            let (x0, x1) = label_box_estimate(sizing, a, b, label_width);
            if fits && !label_collides(graph, placements, sizing, &placed, a.y(), x0, x1) {
                chosen = Some((a, b));
                break;
            }
        }
        if chosen.is_none() {
            let mut widest: Option<(GridCoord, GridCoord, usize)> = None;
            for &(a, b) in &horizontal {
                let width = sizing.span_width(a.x(), b.x());
                let (x0, x1) = label_box_estimate(sizing, a, b, label_width);
                if label_collides(graph, placements, sizing, &placed, a.y(), x0, x1) {
                    continue;
                }
                if widest.map(|(_, _, w)| width > w).unwrap_or(true) {
                    widest = Some((a, b, width));
                }
            }
            chosen = widest.map(|(a, b, _)| (a, b));
        }
        if chosen.is_none() {
            let mut widest: Option<(GridCoord, GridCoord, usize)> = None;
            for &(a, b) in &horizontal {
                let width = sizing.span_width(a.x(), b.x());
                if widest.map(|(_, _, w)| width > w).unwrap_or(true) {
                    widest = Some((a, b, width));
                }
            }
            chosen = widest
                .map(|(a, b, _)| (a, b))
                .or_else(|| widest_any.map(|(a, b, _)| (a, b)));
        }

        let Some((a, b)) = chosen else {
            continue;
        };

        if a.y() == b.y() {
            let mid = (a.x() + b.x()) / 2;
            sizing.widen_column(mid, label_width + 2);
            let (x0, x1) = label_box_estimate(sizing, a, b, label_width);
            placed.push((a.y(), x0, x1));
        }
        route.label_line = Some((a, b));
    }
}

/// Drawing-estimate of a label box centred on the segment `a → b`.
fn label_box_estimate(
    sizing: &GridSizing,
    a: GridCoord,
    b: GridCoord,
    label_width: usize,
) -> (i64, i64) {
    let seg_width = sizing.span_width(a.x(), b.x()) as i64;
    let center = sizing.drawing_x(a.x().min(b.x())) as i64 + seg_width / 2;
    let x0 = center - (label_width as i64) / 2;
    (x0, x0 + label_width as i64 - 1)
}

fn label_collides(
    graph: &Graph,
    placements: &[GridCoord],
    sizing: &GridSizing,
    placed: &[(i32, i64, i64)],
    row: i32,
    x0: i64,
    x1: i64,
) -> bool {
    for &(prow, px0, px1) in placed {
        if prow == row && x0 <= px1 && px0 <= x1 {
            return true;
        }
    }
    for (node_index, _) in graph.nodes().iter().enumerate() {
        let block = placements[node_index];
        if row < block.y() || row > block.y() + 2 {
            continue;
        }
        let bx0 = sizing.drawing_x(block.x()) as i64;
        let bx1 = sizing.drawing_x(block.x() + 2) as i64
            + sizing.column_width(block.x() + 2) as i64
            - 1;
        if x0 <= bx1 && bx0 <= x1 {
            return true;
        }
    }
    false
}

/// Lays out `graph`: places nodes, routes all edges (retrying the whole
/// attempt with a growing margin when an edge proves unroutable), plans
/// label lines, and finalizes grid sizing.
pub fn layout_flowchart(graph: &Graph, config: &RenderConfig) -> FlowchartLayout {
    let flow = config.direction.unwrap_or(graph.direction()).flow();

    if graph.is_empty() {
        return FlowchartLayout {
            placements: Vec::new(),
            routed: Vec::new(),
            sizing: GridSizing::new(config.padding_x / 2, config.padding_y / 2),
            flow,
        };
    }

    let base = place_nodes(graph, flow);
    let max_x = base.iter().map(|c| c.x()).max().unwrap_or(0) as usize + 3;
    let max_y = base.iter().map(|c| c.y()).max().unwrap_or(0) as usize + 3;

    let mut last_attempt: Option<(Vec<GridCoord>, Vec<RoutedEdge>)> = None;

    for &margin in LAYOUT_MARGINS {
        let placements: Vec<GridCoord> =
            base.iter().map(|c| c.offset(margin, margin)).collect();
        let stride = max_x + margin as usize + GRID_HEADROOM;
        let height = max_y + margin as usize + GRID_HEADROOM;

        let mut ctx = AStarContext::new(stride, height);
        for block in &placements {
            for dx in 0..3 {
                for dy in 0..3 {
                    let idx = ctx.idx(block.x() + dx, block.y() + dy);
                    ctx.block(idx);
                }
            }
        }

        let mut router = Router::new(&mut ctx, flow);
        let routed: Vec<RoutedEdge> = (0..graph.edges().len())
            .map(|edge_index| router.route_edge(graph, edge_index, &placements))
            .collect();

        let all_routed = routed.iter().all(RoutedEdge::is_routed);
        last_attempt = Some((placements, routed));
        if all_routed {
            break;
        }
    }

    let (placements, mut routed) =
        last_attempt.expect("at least one layout attempt runs");

    let mut sizing = compute_sizing(graph, &placements, config);
    plan_label_lines(graph, &placements, &mut routed, &mut sizing);
    inflate_for_paths(&routed, &mut sizing);

    FlowchartLayout { placements, routed, sizing, flow }
}

#[cfg(test)]
mod tests {
    use super::{layout_flowchart, place_nodes, GridSizing};
    use crate::config::{Flow, GraphDirection, RenderConfig};
    use crate::format::mermaid::parse_flowchart;
    use crate::model::{Edge, Graph, Node, NodeShape};

    fn node(id: &str) -> Node {
        Node::new(id, id, NodeShape::Rect)
    }

    #[test]
    fn sizing_projects_prefix_sums() {
        let mut sizing = GridSizing::new(2, 2);
        sizing.widen_column(0, 1);
        sizing.widen_column(1, 7);
        sizing.widen_column(2, 1);
        assert_eq!(sizing.drawing_x(0), 0);
        assert_eq!(sizing.drawing_x(1), 1);
        assert_eq!(sizing.drawing_x(2), 8);
        assert_eq!(sizing.span_width(0, 2), 8);
        assert_eq!(sizing.canvas_extent().0, 9);
        // Columns without entries project with zero width until ensured.
        assert_eq!(sizing.drawing_x(10), 9);
        sizing.ensure_column(3);
        assert_eq!(sizing.column_width(3), 2);
    }

    #[test]
    fn roots_stack_on_the_cross_axis() {
        let mut graph = Graph::new(GraphDirection::LR);
        let a = graph.ensure_node(node("A"));
        let b = graph.ensure_node(node("B"));
        let c = graph.ensure_node(node("C"));
        graph.push_edge(Edge::new(a, c));
        // a and b are roots; c is a child of a.
        let placements = place_nodes(&graph, Flow::LR);
        assert_eq!(placements[a].x(), 0);
        assert_eq!(placements[a].y(), 0);
        assert_eq!(placements[b].x(), 0);
        assert_eq!(placements[b].y(), 4);
        assert_eq!(placements[c].x(), 4);
        assert_eq!(placements[c].y(), 0);
    }

    #[test]
    fn sibling_collision_shifts_perpendicular() {
        let mut graph = Graph::new(GraphDirection::LR);
        let a = graph.ensure_node(node("A"));
        let b = graph.ensure_node(node("B"));
        let c = graph.ensure_node(node("C"));
        graph.push_edge(Edge::new(a, b));
        graph.push_edge(Edge::new(a, c));
        let placements = place_nodes(&graph, Flow::LR);
        assert_eq!(placements[b], crate::model::GridCoord::new(4, 0));
        assert_eq!(placements[c], crate::model::GridCoord::new(4, 4));
    }

    #[test]
    fn cycles_still_place_every_node() {
        let mut graph = Graph::new(GraphDirection::LR);
        let a = graph.ensure_node(node("A"));
        let b = graph.ensure_node(node("B"));
        let c = graph.ensure_node(node("C"));
        graph.push_edge(Edge::new(a, b));
        graph.push_edge(Edge::new(b, c));
        graph.push_edge(Edge::new(c, a));
        let placements = place_nodes(&graph, Flow::TD);
        assert_eq!(placements.len(), 3);
        let mut coords: Vec<_> = placements.iter().map(|c| (c.x(), c.y())).collect();
        coords.sort();
        coords.dedup();
        assert_eq!(coords.len(), 3);
    }

    #[test]
    fn layout_routes_a_small_graph() {
        let graph = parse_flowchart("flowchart LR\nA --> B\nA --> C\n").expect("parse");
        let layout = layout_flowchart(&graph, &RenderConfig::default());
        assert_eq!(layout.placements().len(), 3);
        assert!(layout.routed().iter().all(|r| r.is_routed()));
        let (width, height) = layout.sizing().canvas_extent();
        assert!(width > 0);
        assert!(height > 0);
    }

    #[test]
    fn empty_graph_has_empty_layout() {
        let graph = Graph::new(GraphDirection::LR);
        let layout = layout_flowchart(&graph, &RenderConfig::default());
        assert!(layout.placements().is_empty());
        assert_eq!(layout.sizing().canvas_extent(), (0, 0));
    }

    #[test]
    fn label_line_sits_on_a_horizontal_segment_and_widens_it() {
        let graph =
            parse_flowchart("flowchart LR\nA -->|spec.start| B\n").expect("parse");
        let layout = layout_flowchart(&graph, &RenderConfig::default());
        let route = &layout.routed()[0];
        let (a, b) = route.label_line.expect("label line");
        assert_eq!(a.y(), b.y());
        // The corridor column carries at least the label plus margin.
        let mid = (a.x() + b.x()) / 2;
        assert!(layout.sizing().column_width(mid) >= "spec.start".len() + 2);
    }

    #[test]
    fn node_rows_grow_with_label_lines() {
        let graph =
            parse_flowchart("flowchart LR\nA[first<br/>second]\n").expect("parse");
        let layout = layout_flowchart(&graph, &RenderConfig::default());
        let block = layout.placements()[0];
        // Two label rows plus border padding on each side.
        assert_eq!(layout.sizing().row_height(block.y() + 1), 4);
    }
}
