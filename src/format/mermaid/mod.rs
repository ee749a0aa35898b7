// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mermaid flowchart text ⇄ [`crate::model::Graph`].

mod flowchart;
mod ident;

pub use flowchart::{export_flowchart, parse_flowchart, FlowchartParseError};
pub use ident::MermaidIdentError;
