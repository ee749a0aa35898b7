// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Flowchart data model shared by the parser, layout, renderer, and reverse
//! parser.

mod geometry;
mod graph;

pub use geometry::{Direction, GridCoord};
pub use graph::{Edge, EdgeStyle, Graph, Node, NodeShape, Subgraph};
