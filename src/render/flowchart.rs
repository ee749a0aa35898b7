// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Flowchart compositor.
//!
//! Drawing is a fixed sequence of overlays merged under the junction algebra:
//! subgraph borders, node boxes, edge paths, corners, arrowheads, source port
//! markers, then edge labels (placed against the merged base so they avoid
//! protected cells), then subgraph titles. De-ambiguation runs last, so the
//! finished Unicode canvas never contains `┼`.

use std::fmt;

use crate::config::RenderConfig;
use crate::format::mermaid::{parse_flowchart, FlowchartParseError};
use crate::layout::flowchart::{layout_flowchart, FlowchartLayout, GridSizing};
use crate::model::{Direction, Graph, GridCoord, Subgraph};
use crate::stitch::{component_graphs, stitch_component_canvases};

use super::glyphs::{self, Charset};
use super::text::str_display_width;
use super::{stroke_bits, Canvas};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    Parse(FlowchartParseError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "mermaid parse error: {err}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<FlowchartParseError> for RenderError {
    fn from(value: FlowchartParseError) -> Self {
        Self::Parse(value)
    }
}

/// Renders Mermaid flowchart text to a character-art string.
pub fn render_flowchart(text: &str, config: &RenderConfig) -> Result<String, RenderError> {
    let graph = parse_flowchart(text)?;
    Ok(render_graph(&graph, config))
}

/// Renders an already-parsed graph.
pub fn render_graph(graph: &Graph, config: &RenderConfig) -> String {
    render_graph_canvas(graph, config).to_string()
}

/// Renders each connected component on its own, then stacks the component
/// canvases perpendicular to the flow direction with `gap` blank cells.
pub fn render_flowchart_components(
    text: &str,
    config: &RenderConfig,
    gap: usize,
) -> Result<String, RenderError> {
    let graph = parse_flowchart(text)?;
    let flow = config.direction.unwrap_or(graph.direction()).flow();
    let canvases: Vec<Canvas> = component_graphs(&graph)
        .iter()
        .map(|component| render_graph_canvas(component, config))
        .collect();
    Ok(stitch_component_canvases(&canvases, flow, gap).to_string())
}

/// Full pipeline to a canvas: layout, overlay compositing, direction flip,
/// crossing de-ambiguation.
pub(crate) fn render_graph_canvas(graph: &Graph, config: &RenderConfig) -> Canvas {
    let direction = config.direction.unwrap_or(graph.direction());
    let layout = layout_flowchart(graph, config);
    let mut canvas = draw_layout(graph, &layout, config);
    if direction.flipped() {
        canvas.flip_vertically();
    }
    if !config.use_ascii {
        canvas.deambiguate_crossings();
    }
    canvas
}

// Drawing internals: overlay builders, projection, and label placement.
include!("flowchart/helpers.rs");

#[cfg(test)]
mod tests;
