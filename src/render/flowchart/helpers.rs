// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

// Flowchart drawing internals: grid projection, overlay builders, and label
// placement. Spliced into `render::flowchart` via include!.

use std::collections::BTreeSet;

/// Drawing cell of a grid point: every grid line projects to the start of
/// its column/row, so box borders and path endpoints land on the same cells
/// and a widened corridor column keeps its free run in one contiguous piece.
fn project_point(sizing: &GridSizing, coord: GridCoord) -> (usize, usize) {
    (sizing.drawing_x(coord.x()), sizing.drawing_y(coord.y()))
}

fn step_direction(a: (usize, usize), b: (usize, usize)) -> Direction {
    Direction::from_delta(b.0 as i32 - a.0 as i32, b.1 as i32 - a.1 as i32)
}

/// Composites all overlays for one laid-out graph.
fn draw_layout(graph: &Graph, layout: &FlowchartLayout, config: &RenderConfig) -> Canvas {
    if graph.is_empty() {
        return Canvas::new(0, 0);
    }

    let charset = glyphs::charset(config.use_ascii);
    let sizing = layout.sizing();
    let (width, height) = sizing.canvas_extent();
    let mut base = Canvas::new(width, height);

    let borders = subgraph_border_canvas(graph, layout, charset);
    let boxes = node_boxes_canvas(graph, layout, charset);
    let art = edge_art(graph, layout, config.use_ascii, charset);

    base.merge_overlay((0, 0), config.use_ascii, &borders);
    base.merge_overlay((0, 0), config.use_ascii, &boxes);
    base.merge_overlay((0, 0), config.use_ascii, &art.paths);
    base.merge_overlay((0, 0), config.use_ascii, &art.corners);
    base.merge_overlay((0, 0), config.use_ascii, &art.arrows);
    base.merge_overlay((0, 0), config.use_ascii, &art.markers);

    paint_edge_labels(graph, layout, config.use_ascii, &mut base, &art.protected);
    paint_subgraph_titles(graph, layout, &mut base);

    base
}

/// A node's owned box canvas: border, padding, centred label rows.
fn node_box_canvas(node: &crate::model::Node, inner_w: usize, inner_h: usize, charset: &Charset) -> Canvas {
    let width = inner_w + 2;
    let height = inner_h + 2;
    let mut canvas = Canvas::new(width, height);

    for x in 1..width - 1 {
        canvas.set(x, 0, charset.horizontal);
        canvas.set(x, height - 1, charset.horizontal);
    }
    for y in 1..height - 1 {
        canvas.set(0, y, charset.vertical);
        canvas.set(width - 1, y, charset.vertical);
    }
    canvas.set(0, 0, charset.corner_top_left);
    canvas.set(width - 1, 0, charset.corner_top_right);
    canvas.set(0, height - 1, charset.corner_bottom_left);
    canvas.set(width - 1, height - 1, charset.corner_bottom_right);

    let lines = node.label_lines();
    let first_row = 1 + inner_h.saturating_sub(lines.len()) / 2;
    for (offset, line) in lines.iter().enumerate() {
        let line_width = str_display_width(line);
        let x = 1 + inner_w.saturating_sub(line_width) / 2;
        canvas.draw_text(x, first_row + offset, line);
    }

    canvas
}

fn node_boxes_canvas(graph: &Graph, layout: &FlowchartLayout, charset: &Charset) -> Canvas {
    let sizing = layout.sizing();
    let mut canvas = Canvas::new(0, 0);
    for (index, node) in graph.nodes().iter().enumerate() {
        let block = layout.placements()[index];
        let inner_w = sizing.column_width(block.x() + 1);
        let inner_h = sizing.row_height(block.y() + 1);
        let node_canvas = node_box_canvas(node, inner_w, inner_h, charset);
        let origin = (sizing.drawing_x(block.x()), sizing.drawing_y(block.y()));
        canvas.merge_overlay(origin, true, &node_canvas);
    }
    canvas
}

/// Drawing rectangles of subgraph borders, pre-order (shallowest first).
fn subgraph_rects(graph: &Graph, layout: &FlowchartLayout) -> Vec<(String, usize, usize, usize, usize)> {
    fn visit(
        layout: &FlowchartLayout,
        subgraph: &Subgraph,
        out: &mut Vec<(String, usize, usize, usize, usize)>,
    ) {
        let sizing = layout.sizing();
        let members = subgraph.member_indices();
        if !members.is_empty() {
            let mut x0 = usize::MAX;
            let mut y0 = usize::MAX;
            let mut x1 = 0usize;
            let mut y1 = 0usize;
            for &member in &members {
                let block = layout.placements()[member];
                x0 = x0.min(sizing.drawing_x(block.x()));
                y0 = y0.min(sizing.drawing_y(block.y()));
                x1 = x1.max(sizing.drawing_x(block.x() + 2));
                y1 = y1.max(sizing.drawing_y(block.y() + 2));
            }
            out.push((
                subgraph.title().to_owned(),
                x0.saturating_sub(2),
                y0.saturating_sub(2),
                x1 + 2,
                y1 + 2,
            ));
        }
        for child in subgraph.children() {
            visit(layout, child, out);
        }
    }

    let mut rects = Vec::new();
    for subgraph in graph.subgraphs() {
        visit(layout, subgraph, &mut rects);
    }
    rects
}

fn subgraph_border_canvas(graph: &Graph, layout: &FlowchartLayout, charset: &Charset) -> Canvas {
    let mut canvas = Canvas::new(0, 0);
    for (_, x0, y0, x1, y1) in subgraph_rects(graph, layout) {
        for x in x0 + 1..x1 {
            canvas.set(x, y0, charset.horizontal);
            canvas.set(x, y1, charset.horizontal);
        }
        for y in y0 + 1..y1 {
            canvas.set(x0, y, charset.vertical);
            canvas.set(x1, y, charset.vertical);
        }
        canvas.set(x0, y0, charset.corner_top_left);
        canvas.set(x1, y0, charset.corner_top_right);
        canvas.set(x0, y1, charset.corner_bottom_left);
        canvas.set(x1, y1, charset.corner_bottom_right);
    }
    canvas
}

fn paint_subgraph_titles(graph: &Graph, layout: &FlowchartLayout, canvas: &mut Canvas) {
    for (title, x0, y0, _, _) in subgraph_rects(graph, layout) {
        if !title.is_empty() {
            canvas.draw_text(x0 + 2, y0, &title);
        }
    }
}

/// The corner glyph for a turn arriving from `back` and leaving toward `out`.
fn corner_char(charset: &Charset, back: Direction, out: Direction) -> char {
    use Direction::{Down, Left, Right, Up};
    match (back, out) {
        (Left, Down) | (Down, Left) => charset.corner_top_right,
        (Right, Down) | (Down, Right) => charset.corner_top_left,
        (Left, Up) | (Up, Left) => charset.corner_bottom_right,
        (Right, Up) | (Up, Right) => charset.corner_bottom_left,
        _ => charset.corner_top_left,
    }
}

/// Per-edge stroke art, one overlay per compositing step, plus the cells
/// (arrowheads, port markers) that labels must never cover.
struct EdgeArt {
    paths: Canvas,
    corners: Canvas,
    arrows: Canvas,
    markers: Canvas,
    protected: Vec<(usize, usize)>,
}

fn edge_art(graph: &Graph, layout: &FlowchartLayout, use_ascii: bool, charset: &Charset) -> EdgeArt {
    let sizing = layout.sizing();
    let mut art = EdgeArt {
        paths: Canvas::new(0, 0),
        corners: Canvas::new(0, 0),
        arrows: Canvas::new(0, 0),
        markers: Canvas::new(0, 0),
        protected: Vec::new(),
    };

    for (index, edge) in graph.edges().iter().enumerate() {
        let route = &layout.routed()[index];
        if !route.is_routed() {
            continue;
        }
        let pts: Vec<(usize, usize)> =
            route.path.iter().map(|&coord| project_point(sizing, coord)).collect();

        // Strokes cover the cells strictly between merged points; the merged
        // points themselves belong to ports (markers), turns (corners), and
        // the target border (left untouched).
        for window in pts.windows(2) {
            let (x0, y0) = window[0];
            let (x1, y1) = window[1];
            if y0 == y1 {
                for x in x0.min(x1) + 1..x0.max(x1) {
                    art.paths.set_merged(x, y0, charset.horizontal, use_ascii);
                }
            } else {
                for y in y0.min(y1) + 1..y0.max(y1) {
                    art.paths.set_merged(x0, y, charset.vertical, use_ascii);
                }
            }
        }

        for i in 1..pts.len().saturating_sub(1) {
            let back = step_direction(pts[i], pts[i - 1]);
            let out = step_direction(pts[i], pts[i + 1]);
            art.corners.set_merged(pts[i].0, pts[i].1, corner_char(charset, back, out), use_ascii);
        }

        if edge.has_arrow_end() && pts.len() >= 2 {
            let last = pts[pts.len() - 1];
            let before = pts[pts.len() - 2];
            let dir = step_direction(before, last);
            let (dx, dy) = dir.delta();
            let cell = ((last.0 as i32 - dx) as usize, (last.1 as i32 - dy) as usize);
            art.arrows.set(cell.0, cell.1, charset.arrow_for(dir));
            art.protected.push(cell);
        }

        if edge.has_arrow_start() && pts.len() >= 2 {
            let first = pts[0];
            let next = pts[1];
            let dir = step_direction(first, next);
            let (dx, dy) = dir.delta();
            let cell = ((first.0 as i32 + dx) as usize, (first.1 as i32 + dy) as usize);
            art.arrows.set(cell.0, cell.1, charset.arrow_for(dir.opposite()));
            art.protected.push(cell);
        }

        if !use_ascii {
            if let Some(marker) = charset.port_marker_for(route.start_dir) {
                art.markers.set(pts[0].0, pts[0].1, marker);
                art.protected.push(pts[0]);
            }
        }
    }

    art
}

/// Stroke bits of a canvas cell under either charset (left=1, right=2,
/// up=4, down=8); `None` for non-structural characters.
fn cell_bits(ch: char, use_ascii: bool) -> Option<u8> {
    if use_ascii {
        match ch {
            '-' => Some(0b0011),
            '|' => Some(0b1100),
            '+' => Some(0b1111),
            _ => None,
        }
    } else {
        stroke_bits(ch)
    }
}

/// A cell labels may not cover. Only blanks and plain straight strokes are
/// coverable; arrowheads, junctions, corners, bridge crossings (a stroke with
/// perpendicular strokes on both flanks), and any already-written text stay.
fn forbidden_label_cell(canvas: &Canvas, x: usize, y: usize, use_ascii: bool) -> bool {
    let ch = canvas.get(x, y);
    if ch == ' ' {
        return false;
    }
    let Some(bits) = cell_bits(ch, use_ascii) else {
        // Arrowheads and text already on the canvas.
        return true;
    };
    let horizontal = bits & 0b0011 != 0;
    let vertical = bits & 0b1100 != 0;
    if bits.count_ones() >= 3 || (horizontal && vertical) {
        return true;
    }
    if bits == 0b0011 && y > 0 {
        let above = cell_bits(canvas.get(x, y - 1), use_ascii).unwrap_or(0);
        let below = cell_bits(canvas.get(x, y + 1), use_ascii).unwrap_or(0);
        if above & 0b1000 != 0 && below & 0b0100 != 0 {
            return true;
        }
    }
    if bits == 0b1100 && x > 0 {
        let left = cell_bits(canvas.get(x - 1, y), use_ascii).unwrap_or(0);
        let right = cell_bits(canvas.get(x + 1, y), use_ascii).unwrap_or(0);
        if left & 0b0010 != 0 && right & 0b0001 != 0 {
            return true;
        }
    }
    false
}

/// Writes each edge label near the midpoint of its chosen segment, searching
/// nearest-first for a start cell that covers no protected or forbidden cell.
fn paint_edge_labels(
    graph: &Graph,
    layout: &FlowchartLayout,
    use_ascii: bool,
    canvas: &mut Canvas,
    protected: &[(usize, usize)],
) {
    let sizing = layout.sizing();
    let protected: BTreeSet<(usize, usize)> = protected.iter().copied().collect();
    let canvas_width = canvas.width();

    // Node box drawing rectangles; labels never intrude into them.
    let boxes: Vec<(usize, usize, usize, usize)> = layout
        .placements()
        .iter()
        .map(|block| {
            (
                sizing.drawing_x(block.x()),
                sizing.drawing_y(block.y()),
                sizing.drawing_x(block.x() + 2),
                sizing.drawing_y(block.y() + 2),
            )
        })
        .collect();

    for (index, edge) in graph.edges().iter().enumerate() {
        let Some(label) = edge.label() else {
            continue;
        };
        let route = &layout.routed()[index];
        let Some((a, b)) = route.label_line else {
            continue;
        };
        let label_width = str_display_width(label);
        if label_width == 0 || canvas_width < label_width {
            continue;
        }

        let (row, seg_lo, seg_hi) = if a.y() == b.y() {
            let row = sizing.drawing_y(a.y());
            let lo = sizing.drawing_x(a.x().min(b.x())) + 1;
            let hi = sizing.drawing_x(a.x().max(b.x())).saturating_sub(1);
            (row, lo, hi)
        } else {
            // Vertical fallback: centre beside the stroke column.
            let row = (sizing.drawing_y(a.y()) + sizing.drawing_y(b.y())) / 2;
            let cx = sizing.drawing_x(a.x());
            (row, cx, cx)
        };

        let clear = |canvas: &Canvas, start: usize| -> bool {
            (start..start + label_width).all(|x| {
                if protected.contains(&(x, row)) || forbidden_label_cell(canvas, x, row, use_ascii)
                {
                    return false;
                }
                !boxes
                    .iter()
                    .any(|&(bx0, by0, bx1, by1)| row >= by0 && row <= by1 && x >= bx0 && x <= bx1)
            })
        };

        // First search inside the chosen segment when the label fits there,
        // then anywhere on the row, nearest to the centred position first.
        let fits = seg_hi >= seg_lo && (seg_hi - seg_lo + 1) >= label_width;
        let mut ranges: smallvec::SmallVec<[(usize, usize); 2]> = smallvec::SmallVec::new();
        if fits {
            ranges.push((seg_lo, seg_hi + 1 - label_width));
        }
        ranges.push((0, canvas_width - label_width));

        let mut placed_at: Option<usize> = None;
        'ranges: for (range_lo, range_hi) in ranges {
            let centred = ((seg_lo + seg_hi + 1).saturating_sub(label_width) / 2)
                .clamp(range_lo, range_hi);
            let reach = (range_hi - range_lo).max(1);
            for delta in 0..=reach {
                for candidate in [centred.checked_sub(delta), centred.checked_add(delta)] {
                    let Some(x) = candidate else {
                        continue;
                    };
                    if x < range_lo || x > range_hi {
                        continue;
                    }
                    if clear(canvas, x) {
                        placed_at = Some(x);
                        break 'ranges;
                    }
                }
            }
        }

        if let Some(x) = placed_at {
            canvas.draw_text(x, row, label);
        }
    }
}
