// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Geometric decoder for rendered flowcharts.
//!
//! The decoder only understands output produced by this crate's renderer: it
//! rebuilds a character grid, detects node boxes with three complementary
//! strategies, traces every arrowhead back to a source-port marker through a
//! non-whitespace connectivity BFS, and emits canonical Mermaid text.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::OnceLock;

use memchr::memchr_iter;
use regex::Regex;

use crate::config::GraphDirection;
use crate::format::mermaid::export_flowchart;
use crate::model::{Direction, Edge, Graph, Node, NodeShape};
use crate::render::glyphs::{arrow_direction, is_source_marker};

/// Placeholder cell inserted after each wide code point so printed columns
/// and grid columns map 1:1.
const WIDE_PLACEHOLDER: char = '\0';

fn label_char_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[\p{L}\p{N}\p{So}]").expect("valid label character pattern")
    })
}

/// Row-major character grid with explicit placeholder columns.
struct CharGrid {
    rows: Vec<Vec<char>>,
    width: usize,
}

impl CharGrid {
    fn parse(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut rows = Vec::<Vec<char>>::new();
        let mut start = 0usize;
        let mut push_line = |line: &str, rows: &mut Vec<Vec<char>>| {
            let mut row = Vec::with_capacity(line.len());
            for ch in line.chars() {
                match crate::render::text::char_display_width(ch) {
                    0 => {}
                    2 => {
                        row.push(ch);
                        row.push(WIDE_PLACEHOLDER);
                    }
                    _ => row.push(ch),
                }
            }
            rows.push(row);
        };
        for end in memchr_iter(b'\n', bytes) {
            push_line(&text[start..end], &mut rows);
            start = end + 1;
        }
        if start < text.len() {
            push_line(&text[start..], &mut rows);
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, ' ');
        }
        Self { rows, width }
    }

    fn height(&self) -> usize {
        self.rows.len()
    }

    fn get(&self, x: i64, y: i64) -> char {
        if x < 0 || y < 0 {
            return ' ';
        }
        self.rows
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(' ')
    }

    /// True when the grid uses Unicode box drawing (vs the ASCII charset).
    fn is_unicode(&self) -> bool {
        self.rows
            .iter()
            .flatten()
            .any(|&ch| matches!(ch, '─' | '│' | '┌' | '┐' | '└' | '┘'))
    }
}

fn is_top_border_char(ch: char) -> bool {
    matches!(ch, '─' | '┬' | '┴' | '┼' | '-' | '+')
}

fn is_side_border_char(ch: char) -> bool {
    matches!(ch, '│' | '├' | '┤' | '┼' | '|' | '+')
}

fn is_top_left(ch: char) -> bool {
    matches!(ch, '┌' | '+')
}

fn is_top_right(ch: char) -> bool {
    matches!(ch, '┐' | '+')
}

fn is_bottom_left(ch: char) -> bool {
    matches!(ch, '└' | '+')
}

fn is_bottom_right(ch: char) -> bool {
    matches!(ch, '┘' | '+')
}

fn is_structural(ch: char, unicode: bool) -> bool {
    if matches!(
        ch,
        '─' | '│'
            | '┌'
            | '┐'
            | '└'
            | '┘'
            | '├'
            | '┤'
            | '┬'
            | '┴'
            | '┼'
            | '╴'
            | '╵'
            | '╶'
            | '╷'
            | '▲'
            | '▼'
            | '◄'
            | '►'
            | '◤'
            | '◥'
            | '◣'
            | '◢'
    ) {
        return true;
    }
    if !unicode && matches!(ch, '+' | '-' | '|' | '<' | '>' | '^' | 'v' | '*') {
        return true;
    }
    false
}

fn arrow_at(ch: char, unicode: bool) -> Option<Direction> {
    let dir = arrow_direction(ch)?;
    if unicode && matches!(ch, '<' | '>' | '^' | 'v') {
        return None;
    }
    Some(dir)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DetectedBox {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
    label: String,
}

impl DetectedBox {
    fn rect(&self) -> (usize, usize, usize, usize) {
        (self.x0, self.y0, self.x1, self.y1)
    }

    fn strictly_contains(&self, other: &DetectedBox) -> bool {
        self.x0 < other.x0 && self.y0 < other.y0 && self.x1 > other.x1 && self.y1 > other.y1
    }

    fn on_border(&self, x: usize, y: usize) -> bool {
        let inside_x = x >= self.x0 && x <= self.x1;
        let inside_y = y >= self.y0 && y <= self.y1;
        let edge_x = x == self.x0 || x == self.x1;
        let edge_y = y == self.y0 || y == self.y1;
        inside_x && inside_y && (edge_x || edge_y)
    }

    fn interior(&self, x: usize, y: usize) -> bool {
        x > self.x0 && x < self.x1 && y > self.y0 && y < self.y1
    }
}

/// Reads the interior label rows of a candidate box. `None` when the interior
/// holds only structural characters (no letter/digit/CJK/emoji).
fn interior_label(grid: &CharGrid, unicode: bool, x0: usize, y0: usize, x1: usize, y1: usize) -> Option<String> {
    if x1 <= x0 + 1 || y1 <= y0 + 1 {
        return None;
    }
    let mut lines = Vec::<String>::new();
    for y in y0 + 1..y1 {
        let mut line = String::new();
        for x in x0 + 1..x1 {
            let ch = grid.get(x as i64, y as i64);
            if ch == WIDE_PLACEHOLDER || is_structural(ch, unicode) {
                continue;
            }
            line.push(ch);
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_owned());
        }
    }
    let label = lines.join("<br/>");
    label_char_pattern().is_match(&label).then_some(label)
}

/// Strategy 1: anchor on `┌`, match `┐` on the same row, then close the box
/// on a lower row with valid side and bottom borders throughout.
fn detect_top_anchored(grid: &CharGrid, unicode: bool, out: &mut Vec<DetectedBox>) {
    for y0 in 0..grid.height() {
        'anchor: for x0 in 0..grid.width {
            if !is_top_left(grid.get(x0 as i64, y0 as i64)) {
                continue;
            }
            let mut x1 = None;
            for x in x0 + 1..grid.width {
                let ch = grid.get(x as i64, y0 as i64);
                if is_top_right(ch) {
                    x1 = Some(x);
                    break;
                }
                if !is_top_border_char(ch) {
                    continue 'anchor;
                }
            }
            let Some(x1) = x1 else {
                continue;
            };

            for y1 in y0 + 2..grid.height() {
                let left = grid.get(x0 as i64, y1 as i64);
                let right = grid.get(x1 as i64, y1 as i64);
                if is_bottom_left(left) && is_bottom_right(right) {
                    let bottom_ok = (x0 + 1..x1)
                        .all(|x| is_top_border_char(grid.get(x as i64, y1 as i64)));
                    if bottom_ok {
                        if let Some(label) = interior_label(grid, unicode, x0, y0, x1, y1) {
                            out.push(DetectedBox { x0, y0, x1, y1, label });
                        }
                        break;
                    }
                }
                if !is_side_border_char(left) || !is_side_border_char(right) {
                    break;
                }
            }
        }
    }
}

/// Strategy 2: anchor on the bottom corners and walk upward through side
/// borders. Recovers boxes whose top border was overwritten by a label.
fn detect_bottom_up(grid: &CharGrid, unicode: bool, out: &mut Vec<DetectedBox>) {
    for y1 in 0..grid.height() {
        'anchor: for x0 in 0..grid.width {
            if !is_bottom_left(grid.get(x0 as i64, y1 as i64)) {
                continue;
            }
            let mut x1 = None;
            for x in x0 + 1..grid.width {
                let ch = grid.get(x as i64, y1 as i64);
                if is_bottom_right(ch) {
                    x1 = Some(x);
                    break;
                }
                if !is_top_border_char(ch) {
                    continue 'anchor;
                }
            }
            let Some(x1) = x1 else {
                continue;
            };

            let mut top = y1;
            while top > 0 {
                let left = grid.get(x0 as i64, top as i64 - 1);
                let right = grid.get(x1 as i64, top as i64 - 1);
                if is_side_border_char(left) && is_side_border_char(right) {
                    top -= 1;
                } else {
                    break;
                }
            }
            if top == 0 || y1 - top < 1 {
                continue;
            }
            let y0 = top - 1;
            if let Some(label) = interior_label(grid, unicode, x0, y0, x1, y1) {
                out.push(DetectedBox { x0, y0, x1, y1, label });
            }
        }
    }
}

/// Strategy 3: fixed-height boxes (five rows): a label row flanked by side
/// borders, padding rows above and below, and full borders two rows out.
fn detect_fixed_height(grid: &CharGrid, unicode: bool, out: &mut Vec<DetectedBox>) {
    let height = grid.height();
    for y in 2..height.saturating_sub(2) {
        'anchor: for x0 in 0..grid.width {
            if !is_side_border_char(grid.get(x0 as i64, y as i64)) {
                continue;
            }
            for x1 in x0 + 2..grid.width {
                if !is_side_border_char(grid.get(x1 as i64, y as i64)) {
                    continue;
                }
                let sides_ok = [y - 1, y + 1].iter().all(|&row| {
                    is_side_border_char(grid.get(x0 as i64, row as i64))
                        && is_side_border_char(grid.get(x1 as i64, row as i64))
                });
                if !sides_ok {
                    continue;
                }
                let y0 = y - 2;
                let y1 = y + 2;
                let top_ok = is_top_left(grid.get(x0 as i64, y0 as i64))
                    && is_top_right(grid.get(x1 as i64, y0 as i64))
                    && (x0 + 1..x1).all(|x| is_top_border_char(grid.get(x as i64, y0 as i64)));
                let bottom_ok = is_bottom_left(grid.get(x0 as i64, y1 as i64))
                    && is_bottom_right(grid.get(x1 as i64, y1 as i64))
                    && (x0 + 1..x1).all(|x| is_top_border_char(grid.get(x as i64, y1 as i64)));
                if !top_ok || !bottom_ok {
                    continue;
                }
                let padding_ok = [y - 1, y + 1].iter().all(|&row| {
                    (x0 + 1..x1).all(|x| {
                        let ch = grid.get(x as i64, row as i64);
                        ch == ' ' || ch == WIDE_PLACEHOLDER
                    })
                });
                if !padding_ok {
                    continue;
                }
                if let Some(label) = interior_label(grid, unicode, x0, y0, x1, y1) {
                    out.push(DetectedBox { x0, y0, x1, y1, label });
                }
                continue 'anchor;
            }
        }
    }
}

/// Runs all three strategies, dedupes, and drops enclosing rectangles
/// (subgraph borders) that strictly contain another detected box.
fn detect_boxes(grid: &CharGrid, unicode: bool) -> Vec<DetectedBox> {
    let mut boxes = Vec::<DetectedBox>::new();
    detect_top_anchored(grid, unicode, &mut boxes);
    detect_bottom_up(grid, unicode, &mut boxes);
    detect_fixed_height(grid, unicode, &mut boxes);

    let mut seen = BTreeSet::<(usize, usize, usize, usize)>::new();
    boxes.retain(|b| seen.insert(b.rect()));

    let enclosing: Vec<bool> = boxes
        .iter()
        .map(|outer| boxes.iter().any(|inner| outer.strictly_contains(inner)))
        .collect();
    let mut keep = enclosing.iter().map(|&e| !e);
    boxes.retain(|_| keep.next().unwrap_or(true));

    boxes.sort_by_key(|b| (b.y0, b.x0));
    boxes
}

#[derive(Debug, Clone)]
struct TracedArrow {
    target: usize,
    sources: Vec<TracedSource>,
    longest_run: Option<String>,
    orientation_horizontal: bool,
}

#[derive(Debug, Clone)]
struct TracedSource {
    source: usize,
    distance: usize,
    label: Option<String>,
    via_arrowhead: bool,
}

/// The label run on row `y` around column `x`, bounded by structural
/// characters or a double space; `None` when no label character is present.
fn label_run_at(grid: &CharGrid, unicode: bool, x: usize, y: usize) -> Option<String> {
    let probe = grid.get(x as i64, y as i64);
    if probe == ' ' || probe == WIDE_PLACEHOLDER || is_structural(probe, unicode) {
        return None;
    }

    let boundary = |x: i64| -> bool {
        let ch = grid.get(x, y as i64);
        is_structural(ch, unicode) || (ch == ' ' && grid.get(x + 1, y as i64) == ' ')
    };
    // A placeholder extends the wide code point to its left.
    let label_cell = |x: i64| -> bool {
        let mut ch = grid.get(x, y as i64);
        if ch == WIDE_PLACEHOLDER {
            ch = grid.get(x - 1, y as i64);
        }
        ch != ' ' && !is_structural(ch, unicode)
    };

    let mut lo = x as i64;
    while lo > 0 && !boundary(lo - 1) && grid.get(lo - 1, y as i64) != ' ' {
        lo -= 1;
    }
    // Allow single interior spaces by extending through them.
    while lo >= 2 && grid.get(lo - 1, y as i64) == ' ' && label_cell(lo - 2) {
        lo -= 2;
        while lo > 0 && !boundary(lo - 1) && grid.get(lo - 1, y as i64) != ' ' {
            lo -= 1;
        }
    }

    let mut hi = x as i64;
    loop {
        let next = grid.get(hi + 1, y as i64);
        if next != ' ' && next != WIDE_PLACEHOLDER && !is_structural(next, unicode) {
            hi += 1;
            continue;
        }
        if next == WIDE_PLACEHOLDER {
            hi += 1;
            continue;
        }
        let after = grid.get(hi + 2, y as i64);
        if next == ' ' && after != ' ' && !is_structural(after, unicode) && after != WIDE_PLACEHOLDER
        {
            hi += 2;
            continue;
        }
        break;
    }

    let mut run = String::new();
    for cx in lo..=hi {
        let ch = grid.get(cx, y as i64);
        if ch != WIDE_PLACEHOLDER {
            run.push(ch);
        }
    }
    let run = run.trim().to_owned();
    label_char_pattern().is_match(&run).then_some(run)
}

/// BFS backward from an arrowhead's tail to every reachable source-port
/// marker on a node border.
fn trace_arrow(
    grid: &CharGrid,
    unicode: bool,
    boxes: &[DetectedBox],
    arrow: (usize, usize),
    dir: Direction,
) -> Option<TracedArrow> {
    let (ax, ay) = (arrow.0 as i64, arrow.1 as i64);
    let (dx, dy) = dir.delta();
    let head = (ax + dx as i64, ay + dy as i64);
    let target = boxes
        .iter()
        .position(|b| head.0 >= 0 && head.1 >= 0 && b.on_border(head.0 as usize, head.1 as usize))?;

    let mut queue = VecDeque::<(i64, i64)>::new();
    let mut dist = BTreeMap::<(i64, i64), usize>::new();
    let mut prev = BTreeMap::<(i64, i64), (i64, i64)>::new();
    let mut sources = Vec::<TracedSource>::new();
    let mut longest_run: Option<String> = None;

    // Seed at the arrow's tail; when the arrowhead sits on what was a turn
    // cell the tail is blank, so fall back to the head's other neighbours.
    let tail = (ax - dx as i64, ay - dy as i64);
    if tail.0 >= 0 && tail.1 >= 0 && grid.get(tail.0, tail.1) != ' ' {
        dist.insert(tail, 0);
        queue.push_back(tail);
    } else {
        for seed in [(ax + 1, ay), (ax - 1, ay), (ax, ay + 1), (ax, ay - 1)] {
            if seed == head || seed.0 < 0 || seed.1 < 0 {
                continue;
            }
            if grid.get(seed.0, seed.1) == ' ' {
                continue;
            }
            if boxes.iter().any(|b| b.interior(seed.0 as usize, seed.1 as usize)) {
                continue;
            }
            dist.insert(seed, 0);
            queue.push_back(seed);
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        let distance = dist[&(x, y)];
        let ch = grid.get(x, y);

        if let Some(run) = label_run_at(grid, unicode, x as usize, y as usize) {
            if longest_run.as_ref().map(|r| run.len() > r.len()).unwrap_or(true) {
                longest_run = Some(run);
            }
        }

        // Border cells terminate the walk; only source markers count.
        if let Some(owner) = boxes
            .iter()
            .position(|b| x >= 0 && y >= 0 && b.on_border(x as usize, y as usize))
        {
            if unicode && is_source_marker(ch) {
                let label = path_label(grid, unicode, &prev, (x, y));
                sources.push(TracedSource {
                    source: owner,
                    distance,
                    label,
                    via_arrowhead: false,
                });
            }
            continue;
        }

        // A foreign arrowhead hugging a box border is the far end of a
        // bidirectional edge; anything else stops the walk.
        if let Some(other_dir) = arrow_at(ch, unicode) {
            if (x, y) != tail {
                let (odx, ody) = other_dir.delta();
                let pointed = (x + odx as i64, y + ody as i64);
                if let Some(owner) = boxes.iter().position(|b| {
                    pointed.0 >= 0
                        && pointed.1 >= 0
                        && b.on_border(pointed.0 as usize, pointed.1 as usize)
                }) {
                    let label = path_label(grid, unicode, &prev, (x, y));
                    sources.push(TracedSource {
                        source: owner,
                        distance,
                        label,
                        via_arrowhead: true,
                    });
                }
                continue;
            }
        }

        for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
            if nx < 0 || ny < 0 || nx as usize >= grid.width || ny as usize >= grid.height() {
                continue;
            }
            if dist.contains_key(&(nx, ny)) {
                continue;
            }
            let nch = grid.get(nx, ny);
            if nch == ' ' {
                continue;
            }
            if boxes.iter().any(|b| b.interior(nx as usize, ny as usize)) {
                continue;
            }
            if (nx, ny) == (ax, ay) {
                continue;
            }
            dist.insert((nx, ny), distance + 1);
            prev.insert((nx, ny), (x, y));
            queue.push_back((nx, ny));
        }
    }

    // Keep the closest port per source box.
    sources.sort_by_key(|s| (s.source, s.distance));
    sources.dedup_by_key(|s| s.source);

    if sources.is_empty() {
        return None;
    }

    Some(TracedArrow {
        target,
        sources,
        longest_run,
        orientation_horizontal: dir.is_horizontal(),
    })
}

/// Walks the BFS parent chain from the source side toward the arrow and
/// returns the first label run along it.
fn path_label(
    grid: &CharGrid,
    unicode: bool,
    prev: &BTreeMap<(i64, i64), (i64, i64)>,
    from: (i64, i64),
) -> Option<String> {
    let mut current = Some(from);
    while let Some(cell) = current {
        if let Some(run) = label_run_at(grid, unicode, cell.0 as usize, cell.1 as usize) {
            return Some(run);
        }
        current = prev.get(&cell).copied();
    }
    None
}

/// Applies the multi-source policy: suppress pseudo-self-loops, keep full
/// fan-in when all candidates agree on the label, otherwise the shortest.
fn disambiguate(arrow: &TracedArrow) -> Vec<TracedSource> {
    let mut candidates = arrow.sources.clone();

    // A far-end arrowhead only identifies the source of a bidirectional
    // edge; when a real port marker was reached, the marker wins.
    if candidates.iter().any(|c| !c.via_arrowhead) {
        candidates.retain(|c| !c.via_arrowhead);
    }

    let min_other = candidates
        .iter()
        .filter(|c| c.source != arrow.target)
        .map(|c| c.distance)
        .min();
    if let Some(min_other) = min_other {
        candidates.retain(|c| c.source != arrow.target || c.distance + 2 <= min_other);
    }

    if candidates.len() <= 1 {
        return candidates;
    }

    let first_label = candidates[0].label.clone();
    if candidates.iter().all(|c| c.label == first_label) {
        return candidates;
    }

    candidates
        .iter()
        .min_by_key(|c| (c.distance, c.source == arrow.target))
        .into_iter()
        .cloned()
        .collect()
}

/// Parses rendered character art back to canonical Mermaid flowchart text.
pub fn reverse_flowchart(text: &str) -> String {
    let grid = CharGrid::parse(text);
    let unicode = grid.is_unicode();
    let boxes = detect_boxes(&grid, unicode);

    let mut arrows = Vec::<TracedArrow>::new();
    for y in 0..grid.height() {
        for x in 0..grid.width {
            let Some(dir) = arrow_at(grid.get(x as i64, y as i64), unicode) else {
                continue;
            };
            if let Some(traced) = trace_arrow(&grid, unicode, &boxes, (x, y), dir) {
                arrows.push(traced);
            }
        }
    }

    let horizontal = arrows.iter().filter(|a| a.orientation_horizontal).count();
    let vertical = arrows.len() - horizontal;
    let direction = if vertical > horizontal {
        GraphDirection::TD
    } else {
        GraphDirection::LR
    };

    let mut graph = Graph::new(direction);
    let mut node_indices = Vec::with_capacity(boxes.len());
    for (index, detected) in boxes.iter().enumerate() {
        let id = format!("b{index}");
        node_indices.push(graph.ensure_node(Node::new(
            id.as_str(),
            detected.label.as_str(),
            NodeShape::Rect,
        )));
    }

    // (source, target, label) triples already emitted, to fold the two
    // arrowheads of one bidirectional edge into a single edge.
    let mut seen_bidi = BTreeSet::<(usize, usize, Option<String>)>::new();

    for arrow in &arrows {
        for chosen in disambiguate(arrow) {
            let label = chosen.label.clone().or_else(|| arrow.longest_run.clone());
            if chosen.via_arrowhead {
                let key_here = (arrow.target.min(chosen.source), arrow.target.max(chosen.source), label.clone());
                if !seen_bidi.insert(key_here) {
                    continue;
                }
                graph.push_edge(Edge::new_with(
                    node_indices[chosen.source],
                    node_indices[arrow.target],
                    label.map(Into::into),
                    crate::model::EdgeStyle::Solid,
                    true,
                    true,
                ));
            } else {
                graph.push_edge(Edge::new_with(
                    node_indices[chosen.source],
                    node_indices[arrow.target],
                    label.map(Into::into),
                    crate::model::EdgeStyle::Solid,
                    false,
                    true,
                ));
            }
        }
    }

    export_flowchart(&graph)
}

#[cfg(test)]
mod tests {
    use super::{detect_boxes, label_run_at, CharGrid};

    fn grid(text: &str) -> CharGrid {
        CharGrid::parse(text)
    }

    #[test]
    fn grid_pads_to_a_rectangle_and_inserts_placeholders() {
        let grid = grid("ab\n📋x\n");
        assert_eq!(grid.width, 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.get(0, 1), '📋');
        assert_eq!(grid.get(1, 1), super::WIDE_PLACEHOLDER);
        assert_eq!(grid.get(2, 1), 'x');
        assert_eq!(grid.get(2, 0), ' ');
    }

    #[test]
    fn detects_a_plain_box_with_label() {
        let art = "\
┌────────┐
│        │
│ writer │
│        │
└────────┘";
        let grid = grid(art);
        let boxes = detect_boxes(&grid, true);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].label, "writer");
        assert_eq!(boxes[0].rect(), (0, 0, 9, 4));
    }

    #[test]
    fn detects_box_with_port_markers_on_borders() {
        let art = "\
┌────────┐
│        │
│ writer ├
│        │
└───┬────┘";
        let boxes = detect_boxes(&grid(art), true);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].label, "writer");
    }

    #[test]
    fn drops_enclosing_subgraph_rectangle() {
        let art = "\
┌──────────────┐
│ ┌──────────┐ │
│ │          │ │
│ │  writer  │ │
│ │          │ │
│ └──────────┘ │
└──────────────┘";
        let boxes = detect_boxes(&grid(art), true);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].label, "writer");
    }

    #[test]
    fn rejects_boxes_without_label_characters() {
        let art = "\
┌───┐
│ ─ │
└───┘";
        let boxes = detect_boxes(&grid(art), true);
        assert!(boxes.is_empty());
    }

    #[test]
    fn recovers_wide_character_labels() {
        let art = "\
┌───────────┐
│           │
│ 📋 writer │
│           │
└───────────┘";
        let boxes = detect_boxes(&grid(art), true);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].label, "📋 writer");
    }

    #[test]
    fn label_runs_allow_single_interior_spaces() {
        let grid = grid("──spec start──");
        assert_eq!(label_run_at(&grid, true, 4, 0), Some("spec start".to_owned()));
        assert_eq!(label_run_at(&grid, true, 0, 0), None);
    }

    #[test]
    fn multi_line_labels_join_with_br() {
        let art = "\
┌─────────┐
│  first  │
│ second  │
└─────────┘";
        let boxes = detect_boxes(&grid(art), true);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].label, "first<br/>second");
    }
}
