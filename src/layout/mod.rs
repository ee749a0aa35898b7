// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Node placement, grid sizing, and edge routing.
//!
//! The layout owns one search context and one pair of usage tables per
//! attempt; a failed attempt resets everything and retries with a larger
//! uniform margin.

pub mod astar;
pub mod flowchart;
pub mod route;
pub mod usage;

pub use astar::{
    merge_path_idx, register_path_search, AStarContext, GridBounds, PathSearch, SearchGrid,
    StrictConstraints,
};
pub use flowchart::{layout_flowchart, FlowchartLayout, GridSizing};
pub use route::RoutedEdge;
pub use usage::{SegmentUsage, UsedPointSet};
