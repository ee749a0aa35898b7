// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::{
    draw_layout, edge_art, forbidden_label_cell, paint_edge_labels, render_flowchart,
    render_flowchart_components, render_graph_canvas, RenderError,
};
use crate::config::{GraphDirection, RenderConfig};
use crate::format::mermaid::parse_flowchart;
use crate::layout::flowchart::layout_flowchart;
use crate::render::glyphs;
use crate::render::text::str_display_width;

fn render(src: &str) -> String {
    render_flowchart(src, &RenderConfig::default()).expect("render")
}

fn render_ascii(src: &str) -> String {
    let config = RenderConfig { use_ascii: true, ..RenderConfig::default() };
    render_flowchart(src, &config).expect("render")
}

fn assert_rectangular(output: &str) {
    let widths: Vec<usize> = output.lines().map(str_display_width).collect();
    let max = widths.iter().copied().max().unwrap_or(0);
    for (line_no, width) in widths.iter().enumerate() {
        assert_eq!(
            *width, max,
            "line {line_no} has display width {width}, expected {max}:\n{output}"
        );
    }
}

const PROPERTY_SOURCES: &[&str] = &[
    "flowchart LR\nA --> B\n",
    "flowchart LR\nA[task.start]\nA-->|spec.start|B[writer]\n",
    "flowchart LR\nA --> B\nA --> C\nB --> D\nC --> D\n",
    "flowchart TD\nA --> B\nB --> C\nA --> C\n",
    "flowchart LR\nA --> A\n",
    "flowchart LR\nA --> B\nB --> A\n",
    "flowchart TD\nstart --> left\nstart --> right\nleft --> done\nright --> done\n",
];

#[test]
fn unicode_output_never_contains_a_cross() {
    for src in PROPERTY_SOURCES {
        let output = render(src);
        assert!(
            !output.contains('┼'),
            "found ┼ in render of {src:?}:\n{output}"
        );
    }
}

#[test]
fn output_is_padded_to_a_rectangle() {
    for src in PROPERTY_SOURCES {
        assert_rectangular(&render(src));
    }
}

#[test]
fn ascii_output_uses_only_the_ascii_charset() {
    for src in PROPERTY_SOURCES {
        let output = render_ascii(src);
        for ch in output.chars() {
            assert!(
                ch.is_ascii(),
                "non-ASCII char {ch:?} in ASCII render of {src:?}:\n{output}"
            );
        }
    }
}

#[test]
fn simple_labelled_edge_renders_boxes_arrow_and_label() {
    let output = render("flowchart LR\nA[task.start]\nA-->|spec.start|B[writer]\n");
    assert!(output.contains("task.start"), "{output}");
    assert!(output.contains("writer"), "{output}");
    assert!(output.contains("spec.start"), "{output}");
    assert_eq!(output.matches('►').count(), 1, "{output}");
    assert_eq!(output.matches('├').count(), 1, "{output}");
    assert!(!output.contains('┼'), "{output}");
}

#[test]
fn label_never_collides_into_the_node_label() {
    let output = render("flowchart LR\nA[task.start]\nA-->|spec.start|B[writer]\n");
    assert!(!output.contains("task.startspec"), "{output}");
    assert!(!output.contains("spec.startwriter"), "{output}");
}

#[test]
fn fan_renders_each_label_once_per_edge() {
    let src = "flowchart LR\nstart -->|spec.ready| w1\nstart -->|spec.ready| w2\nw1 --> merge\nw2 --> merge\n";
    let output = render(src);
    assert_eq!(output.matches("spec.ready").count(), 2, "{output}");
    assert!(!output.contains("specspec"), "{output}");
    assert!(!output.contains('┼'), "{output}");

    // Each occurrence sits on a horizontal run with no junction underneath:
    // the cells a label covers were plain strokes, so its line keeps reading
    // as one row of text.
    for line in output.lines() {
        if line.contains("spec.ready") {
            assert!(!line.contains("spec.ready┼"), "{output}");
        }
    }
}

#[test]
fn self_loop_leaves_and_reenters_the_box() {
    let output = render("flowchart LR\nA --> A\n");
    // One arrowhead, outside the box, and the border is intact on all sides.
    let arrows = output.matches('▲').count() + output.matches('▼').count()
        + output.matches('◄').count()
        + output.matches('►').count();
    assert_eq!(arrows, 1, "{output}");
    assert_eq!(output.matches('┌').count(), 1, "{output}");
    assert!(output.matches('┘').count() >= 1, "{output}");
    assert!(!output.contains('┼'), "{output}");

    let layout = layout_flowchart(
        &parse_flowchart("flowchart LR\nA --> A\n").expect("parse"),
        &RenderConfig::default(),
    );
    // Four merged segments: the loop genuinely leaves the box.
    assert_eq!(layout.routed()[0].path.len(), 5);
}

#[test]
fn arrowheads_point_along_the_flow_axis() {
    let lr = render("flowchart LR\nA --> B\n");
    assert!(lr.contains('►'), "{lr}");
    let td = render("flowchart TD\nA --> B\n");
    assert!(td.contains('▼'), "{td}");
    assert!(td.contains('┬'), "{td}");
}

#[test]
fn bottom_to_top_direction_flips_the_canvas() {
    let output = render("flowchart BT\nA --> B\n");
    assert!(output.contains('▲'), "{output}");
    assert!(!output.contains('▼'), "{output}");
    assert_rectangular(&output);
}

#[test]
fn empty_graph_renders_empty_string() {
    assert_eq!(render("flowchart LR\n"), "");
}

#[test]
fn unparsable_input_reports_a_parse_error() {
    let err = render_flowchart("sequenceDiagram\n", &RenderConfig::default()).unwrap_err();
    assert!(matches!(err, RenderError::Parse(_)));
}

#[test]
fn wide_character_labels_keep_borders_aligned() {
    let output = render("flowchart LR\nA[📋 writer]\nA --> B[done]\n");
    assert_rectangular(&output);
    assert!(output.contains("📋 writer"), "{output}");

    // The top border spans exactly 2·border_padding + label width columns
    // between its corners.
    let top_line = output.lines().find(|line| line.contains('┌')).expect("top border");
    let open = top_line.find('┌').expect("top-left corner");
    let close = top_line.find('┐').expect("top-right corner");
    let between = &top_line[open + "┌".len()..close];
    assert!(between.chars().all(|ch| ch == '─'), "{output}");
    assert_eq!(str_display_width(between), 2 + str_display_width("📋 writer"));
}

#[test]
fn subgraph_border_encloses_members_and_carries_title() {
    let src = "flowchart LR\nsubgraph grp [Cluster]\nA --> B\nend\nA --> C\n";
    let output = render(src);
    assert!(output.contains("Cluster"), "{output}");
    assert_rectangular(&output);
}

#[test]
fn crossing_edges_render_as_bridges() {
    // Two crossing edges: the crossing cell must be a bridge, not ┼.
    let src = "flowchart LR\nA --> D\nB --> C\nA --> C\nB --> D\n";
    let output = render(src);
    assert!(!output.contains('┼'), "{output}");
}

#[test]
fn multi_line_labels_render_as_stacked_rows() {
    let output = render("flowchart LR\nA[first<br/>second]\n");
    assert!(output.contains("first"), "{output}");
    assert!(output.contains("second"), "{output}");
    let first_row = output.lines().position(|l| l.contains("first")).expect("first");
    let second_row = output.lines().position(|l| l.contains("second")).expect("second");
    assert_eq!(second_row, first_row + 1, "{output}");
}

#[test]
fn component_rendering_stacks_perpendicular_to_flow() {
    let src = "flowchart LR\nA --> B\nC --> D\n";
    let config = RenderConfig::default();
    let stacked = render_flowchart_components(src, &config, 2).expect("render");
    let single = render_flowchart("flowchart LR\nA --> B\n", &config).expect("render");
    // LR components stack vertically: the stitched output is taller than one
    // component and no wider than the widest.
    assert!(stacked.lines().count() > single.lines().count());
    assert_rectangular(&stacked);
}

#[test]
fn protected_cells_survive_label_placement() {
    let src = "flowchart LR\nA[task.start]\nA-->|spec.start|B[writer]\nA-->|alt| C\n";
    let graph = parse_flowchart(src).expect("parse");
    let config = RenderConfig::default();
    let layout = layout_flowchart(&graph, &config);
    let charset = glyphs::charset(false);

    let mut base = {
        let sizing = layout.sizing();
        let (width, height) = sizing.canvas_extent();
        super::Canvas::new(width, height)
    };
    let borders = super::subgraph_border_canvas(&graph, &layout, charset);
    let boxes = super::node_boxes_canvas(&graph, &layout, charset);
    let art = edge_art(&graph, &layout, false, charset);
    base.merge_overlay((0, 0), false, &borders);
    base.merge_overlay((0, 0), false, &boxes);
    base.merge_overlay((0, 0), false, &art.paths);
    base.merge_overlay((0, 0), false, &art.corners);
    base.merge_overlay((0, 0), false, &art.arrows);
    base.merge_overlay((0, 0), false, &art.markers);

    // Snapshot every protected and forbidden cell before labels go on.
    let mut snapshot = Vec::<(usize, usize, char)>::new();
    for &(x, y) in &art.protected {
        snapshot.push((x, y, base.get(x, y)));
    }
    for y in 0..base.height() {
        for x in 0..base.width() {
            if forbidden_label_cell(&base, x, y, false) {
                snapshot.push((x, y, base.get(x, y)));
            }
        }
    }

    paint_edge_labels(&graph, &layout, false, &mut base, &art.protected);

    for (x, y, ch) in snapshot {
        assert_eq!(
            base.get(x, y),
            ch,
            "label placement overwrote protected cell ({x},{y})"
        );
    }
}

#[test]
fn repeated_renders_are_deterministic() {
    let src = "flowchart LR\nA --> B\nA --> C\nB --> D\nC --> D\n";
    let config = RenderConfig::default();
    let first = render_flowchart(src, &config).expect("render");
    for _ in 0..10 {
        assert_eq!(render_flowchart(src, &config).expect("render"), first);
    }
}

#[test]
fn deambiguation_already_ran_so_rerunning_changes_nothing() {
    let src = "flowchart LR\nA --> D\nB --> C\nA --> C\nB --> D\n";
    let graph = parse_flowchart(src).expect("parse");
    let config = RenderConfig::default();
    let mut canvas = render_graph_canvas(&graph, &config);
    let once = canvas.to_string();
    canvas.deambiguate_crossings();
    assert_eq!(canvas.to_string(), once);
}

#[test]
fn draw_layout_of_empty_graph_is_empty() {
    let graph = parse_flowchart("flowchart LR\n").expect("parse");
    let config = RenderConfig::default();
    let layout = layout_flowchart(&graph, &config);
    let canvas = draw_layout(&graph, &layout, &config);
    assert!(canvas.is_empty());
}
