// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use super::ident::validate_mermaid_ident;
pub use super::ident::MermaidIdentError;

use crate::config::GraphDirection;
use crate::model::{Edge, EdgeStyle, Graph, Node, NodeShape, Subgraph};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowchartParseError {
    MissingHeader,
    InvalidDirection {
        line_no: usize,
        direction: String,
    },
    UnsupportedSyntax {
        line_no: usize,
        line: String,
    },
    InvalidNodeId {
        line_no: usize,
        name: String,
        reason: MermaidIdentError,
    },
    InvalidNodeLabelSyntax {
        line_no: usize,
        token: String,
    },
    EmptyNodeLabel {
        line_no: usize,
        token: String,
    },
    EmptyEdgeLabel {
        line_no: usize,
        line: String,
    },
    ConflictingNodeLabel {
        line_no: usize,
        mermaid_id: String,
        existing_label: String,
        new_label: String,
    },
    UnbalancedSubgraph {
        line_no: usize,
    },
}

impl fmt::Display for FlowchartParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => {
                f.write_str("expected 'flowchart' or 'graph' as the first non-empty line")
            }
            Self::InvalidDirection { line_no, direction } => write!(
                f,
                "invalid flowchart direction on line {line_no}: {direction} (expected TD/TB/LR/RL/BT)"
            ),
            Self::UnsupportedSyntax { line_no, line } => {
                write!(f, "unsupported Mermaid syntax on line {line_no}: {line}")
            }
            Self::InvalidNodeId { line_no, name, reason } => {
                write!(f, "invalid node id on line {line_no}: {name} ({reason})")
            }
            Self::InvalidNodeLabelSyntax { line_no, token } => write!(
                f,
                "invalid node label syntax on line {line_no}: {token} (expected '<id>[<label>]', '<id>(<label>)', or '<id>{{<label>}}')"
            ),
            Self::EmptyNodeLabel { line_no, token } => {
                write!(f, "empty node label on line {line_no}: {token}")
            }
            Self::EmptyEdgeLabel { line_no, line } => {
                write!(f, "empty edge label on line {line_no}: {line}")
            }
            Self::ConflictingNodeLabel { line_no, mermaid_id, existing_label, new_label } => write!(
                f,
                "conflicting label for node '{mermaid_id}' on line {line_no}: '{existing_label}' vs '{new_label}'"
            ),
            Self::UnbalancedSubgraph { line_no } => {
                write!(f, "unbalanced subgraph/end on line {line_no}")
            }
        }
    }
}

impl std::error::Error for FlowchartParseError {}

fn is_edge_op_start_char(ch: char) -> bool {
    matches!(ch, '<' | '-' | '=' | '.')
}

fn is_edge_op_char(ch: char) -> bool {
    matches!(ch, '<' | '>' | '-' | '=' | '.')
}

fn is_probable_edge_operator(op: &str) -> bool {
    op.chars().filter(|ch| matches!(ch, '-' | '=' | '.')).count() >= 2
}

/// Splits `line` at the first edge operator outside a bracketed label.
///
/// Lone stroke characters inside identifiers (`task.start`) are not operators;
/// scanning continues past any run that is too short to be one.
fn split_once_edge_operator(line: &str) -> Option<(&str, &str, &str)> {
    let mut in_label: Option<char> = None;
    let mut skip_until = 0usize;

    for (idx, ch) in line.char_indices() {
        if idx < skip_until {
            continue;
        }
        if let Some(close) = in_label {
            if ch == close {
                in_label = None;
            }
            continue;
        }

        match ch {
            '[' => {
                in_label = Some(']');
                continue;
            }
            '(' => {
                in_label = Some(')');
                continue;
            }
            '{' => {
                in_label = Some('}');
                continue;
            }
            _ => {}
        }

        if !is_edge_op_start_char(ch) {
            continue;
        }

        let mut end = line.len();
        for (run_idx, run_ch) in line[idx..].char_indices() {
            if !is_edge_op_char(run_ch) {
                end = idx + run_idx;
                break;
            }
        }

        let lhs = &line[..idx];
        let op = &line[idx..end];
        if !lhs.trim().is_empty() && is_probable_edge_operator(op) {
            return Some((lhs, op, &line[end..]));
        }
        skip_until = end.max(idx + ch.len_utf8());
    }

    None
}

/// What a Mermaid edge operator means for the model edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EdgeOp {
    style: EdgeStyle,
    reversed: bool,
    has_arrow_start: bool,
    has_arrow_end: bool,
}

fn classify_edge_operator(op: &str) -> EdgeOp {
    let style = if op.contains('=') {
        EdgeStyle::Thick
    } else if op.contains('.') {
        EdgeStyle::Dotted
    } else {
        EdgeStyle::Solid
    };

    let has_left = op.contains('<');
    let has_right = op.contains('>');

    match (has_left, has_right) {
        (true, true) => EdgeOp { style, reversed: false, has_arrow_start: true, has_arrow_end: true },
        (true, false) => {
            EdgeOp { style, reversed: true, has_arrow_start: false, has_arrow_end: true }
        }
        (false, true) => {
            EdgeOp { style, reversed: false, has_arrow_start: false, has_arrow_end: true }
        }
        (false, false) => {
            EdgeOp { style, reversed: false, has_arrow_start: false, has_arrow_end: false }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeSpec {
    mermaid_id: String,
    label: Option<String>,
    shape: Option<NodeShape>,
}

fn parse_node_spec(token: &str, line_no: usize) -> Result<NodeSpec, FlowchartParseError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(FlowchartParseError::UnsupportedSyntax { line_no, line: token.to_owned() });
    }

    let mut open_delim: Option<(usize, char)> = None;
    for (idx, ch) in trimmed.char_indices() {
        if matches!(ch, '[' | '(' | '{') {
            open_delim = Some((idx, ch));
            break;
        }
    }

    let Some((open_idx, open_ch)) = open_delim else {
        validate_mermaid_ident(trimmed).map_err(|reason| FlowchartParseError::InvalidNodeId {
            line_no,
            name: trimmed.to_owned(),
            reason,
        })?;
        return Ok(NodeSpec { mermaid_id: trimmed.to_owned(), label: None, shape: None });
    };

    let (close_ch, shape) = match open_ch {
        '[' => (']', NodeShape::Rect),
        '(' => (')', NodeShape::Round),
        '{' => ('}', NodeShape::Diamond),
        _ => {
            return Err(FlowchartParseError::UnsupportedSyntax {
                line_no,
                line: trimmed.to_owned(),
            })
        }
    };

    let id_raw = trimmed[..open_idx].trim();
    validate_mermaid_ident(id_raw).map_err(|reason| FlowchartParseError::InvalidNodeId {
        line_no,
        name: id_raw.to_owned(),
        reason,
    })?;

    let label_raw_with_close = &trimmed[open_idx + open_ch.len_utf8()..];
    if !label_raw_with_close.ends_with(close_ch) {
        return Err(FlowchartParseError::InvalidNodeLabelSyntax {
            line_no,
            token: trimmed.to_owned(),
        });
    }

    let label_raw = &label_raw_with_close[..label_raw_with_close.len() - close_ch.len_utf8()];
    let mut label = label_raw.trim();
    if label.len() >= 2 && label.starts_with('"') && label.ends_with('"') {
        label = label[1..label.len() - 1].trim();
    }
    if label.is_empty() {
        return Err(FlowchartParseError::EmptyNodeLabel { line_no, token: trimmed.to_owned() });
    }

    Ok(NodeSpec {
        mermaid_id: id_raw.to_owned(),
        label: Some(label.to_owned()),
        shape: Some(shape),
    })
}

/// Inserts or merges a node; returns its index and whether it was new.
fn ensure_node(
    graph: &mut Graph,
    spec: NodeSpec,
    line_no: usize,
) -> Result<(usize, bool), FlowchartParseError> {
    let NodeSpec { mermaid_id, label, shape } = spec;

    if let Some(index) = graph.node_index(&mermaid_id) {
        let existing_label = graph.node(index).label().to_owned();
        if let Some(explicit_label) = label {
            if existing_label == explicit_label {
                // ok
            } else if existing_label == mermaid_id {
                // implicit (default) label, upgrade to explicit label.
                graph.node_mut(index).set_label(explicit_label);
            } else {
                return Err(FlowchartParseError::ConflictingNodeLabel {
                    line_no,
                    mermaid_id,
                    existing_label,
                    new_label: explicit_label,
                });
            }
        }
        if let Some(explicit_shape) = shape {
            if graph.node(index).shape() == NodeShape::Rect {
                graph.node_mut(index).set_shape(explicit_shape);
            }
        }
        return Ok((index, false));
    }

    let label = label.unwrap_or_else(|| mermaid_id.clone());
    let shape = shape.unwrap_or_default();
    let index = graph.ensure_node(Node::new(mermaid_id.as_str(), label.as_str(), shape));
    Ok((index, true))
}

/// Ensures a node and, when first declared inside an open subgraph block,
/// records its membership there.
fn claim_node(
    graph: &mut Graph,
    open_subgraphs: &mut [Subgraph],
    spec: NodeSpec,
    line_no: usize,
) -> Result<usize, FlowchartParseError> {
    let (index, is_new) = ensure_node(graph, spec, line_no)?;
    if is_new {
        if let Some(current) = open_subgraphs.last_mut() {
            current.push_node(index);
        }
    }
    Ok(index)
}

fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with("%%")
}

fn is_ignorable_line(trimmed: &str) -> bool {
    trimmed.starts_with("style ")
        || trimmed.starts_with("class ")
        || trimmed.starts_with("classDef ")
        || trimmed.starts_with("linkStyle ")
        || trimmed.starts_with("click ")
}

fn parse_subgraph_header(
    trimmed: &str,
    line_no: usize,
    counter: usize,
) -> Result<Subgraph, FlowchartParseError> {
    let rest = trimmed
        .strip_prefix("subgraph")
        .ok_or_else(|| FlowchartParseError::UnsupportedSyntax {
            line_no,
            line: trimmed.to_owned(),
        })?
        .trim();

    if rest.is_empty() {
        let id = format!("sg{counter}");
        return Ok(Subgraph::new(id.as_str(), ""));
    }

    // `subgraph id [Title]` or `subgraph id` or `subgraph Title words`.
    if let Some(open_idx) = rest.find('[') {
        let id = rest[..open_idx].trim();
        let title_raw = rest[open_idx + 1..].trim_end();
        let Some(title) = title_raw.strip_suffix(']') else {
            return Err(FlowchartParseError::UnsupportedSyntax {
                line_no,
                line: trimmed.to_owned(),
            });
        };
        return Ok(Subgraph::new(id, title.trim()));
    }

    if validate_mermaid_ident(rest).is_ok() {
        return Ok(Subgraph::new(rest, rest));
    }
    let id = format!("sg{counter}");
    Ok(Subgraph::new(id.as_str(), rest))
}

/// Parses a Mermaid `flowchart`/`graph` document into a [`Graph`].
///
/// Supported:
/// - header with optional direction (`TD`, `TB`, `LR`, `RL`, `BT`)
/// - comment lines starting with `%%`
/// - node declarations: `<id>`, `<id>[<label>]`, `<id>(<label>)`, `<id>{<label>}`
///   (labels may be double-quoted)
/// - edges with solid/dotted/thick operators, optional arrowheads on either
///   end, `|label|` and `-- label -->` label forms, and chains `a --> b --> c`
/// - nestable `subgraph … end` blocks; a node belongs to the block it is first
///   declared in
/// - `style`/`class`/`classDef`/`linkStyle`/`click` statements are skipped
///
/// Anything else is rejected with an actionable error.
pub fn parse_flowchart(input: &str) -> Result<Graph, FlowchartParseError> {
    let mut graph = Graph::new(GraphDirection::TD);
    let mut saw_header = false;
    // Stack of open subgraph blocks; closed blocks attach to parent or graph.
    let mut open_subgraphs: Vec<Subgraph> = Vec::new();
    let mut subgraph_counter = 0usize;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || is_comment_line(trimmed) {
            continue;
        }

        if !saw_header {
            let mut parts = trimmed.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };

            if keyword != "flowchart" && keyword != "graph" {
                return Err(FlowchartParseError::MissingHeader);
            }

            if let Some(direction) = parts.next() {
                let direction = direction.parse::<GraphDirection>().map_err(|err| {
                    FlowchartParseError::InvalidDirection { line_no, direction: err.direction }
                })?;
                graph.set_direction(direction);
                if parts.next().is_some() {
                    return Err(FlowchartParseError::UnsupportedSyntax {
                        line_no,
                        line: trimmed.to_owned(),
                    });
                }
            }

            saw_header = true;
            continue;
        }

        if trimmed.starts_with("subgraph") {
            subgraph_counter += 1;
            open_subgraphs.push(parse_subgraph_header(trimmed, line_no, subgraph_counter)?);
            continue;
        }

        if trimmed == "end" {
            let Some(closed) = open_subgraphs.pop() else {
                return Err(FlowchartParseError::UnbalancedSubgraph { line_no });
            };
            match open_subgraphs.last_mut() {
                Some(parent) => parent.push_child(closed),
                None => graph.push_subgraph(closed),
            }
            continue;
        }

        if is_ignorable_line(trimmed) {
            continue;
        }

        // Inline label syntax: `<lhs> -- <label> <op> <rhs>`.
        if let Some((lhs_raw, op1, rest1)) = split_once_edge_operator(trimmed) {
            if op1 == "--" || op1 == "==" || op1 == "-." {
                let rest1 = rest1.trim_start();
                if let Some((label_raw, op2, rhs_raw)) = split_once_edge_operator(rest1) {
                    let label = label_raw.trim();
                    if !label.is_empty() {
                        let lhs_spec = parse_node_spec(lhs_raw, line_no)?;
                        let rhs_spec = parse_node_spec(rhs_raw, line_no)?;
                        let op = classify_edge_operator(op2);
                        let (from_spec, to_spec) = if op.reversed {
                            (rhs_spec, lhs_spec)
                        } else {
                            (lhs_spec, rhs_spec)
                        };
                        let source = claim_node(&mut graph, &mut open_subgraphs, from_spec, line_no)?;
                        let target = claim_node(&mut graph, &mut open_subgraphs, to_spec, line_no)?;
                        graph.push_edge(Edge::new_with(
                            source,
                            target,
                            Some(label.into()),
                            op.style,
                            op.has_arrow_start,
                            op.has_arrow_end,
                        ));
                        continue;
                    }
                }
            }
        }

        // Simple edge, edge chain, or bare node declaration.
        let Some((first_raw, first_op, tail)) = split_once_edge_operator(trimmed) else {
            let spec = parse_node_spec(trimmed, line_no)?;
            claim_node(&mut graph, &mut open_subgraphs, spec, line_no)?;
            continue;
        };

        let mut current_spec = parse_node_spec(first_raw, line_no)?;
        let mut op_raw = first_op;
        let mut rest = tail;

        loop {
            let mut edge_label: Option<String> = None;
            let rhs_and_more = rest.trim_start();
            let rhs_and_more = if let Some(after) = rhs_and_more.strip_prefix('|') {
                let Some(end_idx) = after.find('|') else {
                    return Err(FlowchartParseError::UnsupportedSyntax {
                        line_no,
                        line: trimmed.to_owned(),
                    });
                };
                let label = after[..end_idx].trim();
                if label.is_empty() {
                    return Err(FlowchartParseError::EmptyEdgeLabel {
                        line_no,
                        line: trimmed.to_owned(),
                    });
                }
                edge_label = Some(label.to_owned());
                after[end_idx + 1..].trim_start()
            } else {
                rhs_and_more
            };

            let (rhs_raw, next_op, next_rest) = match split_once_edge_operator(rhs_and_more) {
                Some((rhs_raw, next_op, next_rest)) => (rhs_raw, Some(next_op), Some(next_rest)),
                None => (rhs_and_more, None, None),
            };
            let rhs_spec = parse_node_spec(rhs_raw, line_no)?;

            let op = classify_edge_operator(op_raw);
            let (from_spec, to_spec) = if op.reversed {
                (rhs_spec.clone(), current_spec.clone())
            } else {
                (current_spec.clone(), rhs_spec.clone())
            };
            let source = claim_node(&mut graph, &mut open_subgraphs, from_spec, line_no)?;
            let target = claim_node(&mut graph, &mut open_subgraphs, to_spec, line_no)?;
            graph.push_edge(Edge::new_with(
                source,
                target,
                edge_label.map(Into::into),
                op.style,
                op.has_arrow_start,
                op.has_arrow_end,
            ));

            let Some(next_op) = next_op else {
                break;
            };
            current_spec = rhs_spec;
            op_raw = next_op;
            rest = next_rest.expect("next_rest present with next_op");
        }
    }

    if !saw_header {
        return Err(FlowchartParseError::MissingHeader);
    }
    if let Some(_open) = open_subgraphs.last() {
        return Err(FlowchartParseError::UnbalancedSubgraph {
            line_no: input.lines().count(),
        });
    }

    Ok(graph)
}

fn edge_operator(edge: &Edge) -> String {
    let stroke = match edge.style() {
        EdgeStyle::Solid => "--",
        EdgeStyle::Dotted => "-.-",
        EdgeStyle::Thick => "==",
    };

    let mut op = String::new();
    if edge.has_arrow_start() {
        op.push('<');
    }
    op.push_str(stroke);
    if edge.has_arrow_end() {
        op.push('>');
    } else {
        // Keep the operator at stroke length >= 3 so it parses back.
        match edge.style() {
            EdgeStyle::Solid => op.push('-'),
            EdgeStyle::Thick => op.push('='),
            EdgeStyle::Dotted => {}
        }
    }
    op
}

/// Exports a graph to canonical Mermaid text.
///
/// Nodes are renumbered `N1…Nk` in sorted-label order (original index breaks
/// ties), so logically equal graphs export identically. The output parses back
/// through [`parse_flowchart`] unchanged in meaning.
pub fn export_flowchart(graph: &Graph) -> String {
    let mut out = String::new();
    out.push_str("flowchart ");
    out.push_str(graph.direction().as_str());
    out.push('\n');

    let mut order: Vec<usize> = (0..graph.nodes().len()).collect();
    order.sort_by(|&a, &b| {
        graph
            .node(a)
            .label()
            .cmp(graph.node(b).label())
            .then_with(|| a.cmp(&b))
    });

    let mut ids = vec![String::new(); graph.nodes().len()];
    let mut id_buf = itoa::Buffer::new();
    for (position, &index) in order.iter().enumerate() {
        let mut id = String::with_capacity(8);
        id.push('N');
        id.push_str(id_buf.format(position + 1));
        ids[index] = id;
    }

    for &index in &order {
        let node = graph.node(index);
        out.push_str(&ids[index]);
        let (open, close) = match node.shape() {
            NodeShape::Rect => ('[', ']'),
            NodeShape::Round => ('(', ')'),
            NodeShape::Diamond => ('{', '}'),
        };
        out.push(open);
        out.push('"');
        out.push_str(node.label());
        out.push('"');
        out.push(close);
        out.push('\n');
    }

    for edge in graph.edges() {
        out.push_str(&ids[edge.source()]);
        out.push(' ');
        out.push_str(&edge_operator(edge));
        if let Some(label) = edge.label() {
            out.push('|');
            out.push_str(label);
            out.push('|');
        }
        out.push(' ');
        out.push_str(&ids[edge.target()]);
        out.push('\n');
    }

    out
}
