// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Render configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Flowchart direction as written in a Mermaid header.
///
/// Layout and routing only know `LR` and `TD`; the other directions resolve
/// before layout (`flow`) plus an optional vertical canvas flip (`flipped`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GraphDirection {
    LR,
    RL,
    #[default]
    TD,
    TB,
    BT,
}

impl GraphDirection {
    /// The LR/TD axis this direction lays out on.
    pub fn flow(self) -> Flow {
        match self {
            Self::LR | Self::RL => Flow::LR,
            Self::TD | Self::TB | Self::BT => Flow::TD,
        }
    }

    /// Whether the finished canvas is flipped vertically (bottom-to-top).
    pub fn flipped(self) -> bool {
        matches!(self, Self::BT)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LR => "LR",
            Self::RL => "RL",
            Self::TD => "TD",
            Self::TB => "TB",
            Self::BT => "BT",
        }
    }
}

impl FromStr for GraphDirection {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LR" => Ok(Self::LR),
            "RL" => Ok(Self::RL),
            "TD" => Ok(Self::TD),
            "TB" => Ok(Self::TB),
            "BT" => Ok(Self::BT),
            _ => Err(InvalidDirection { direction: s.to_owned() }),
        }
    }
}

impl fmt::Display for GraphDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDirection {
    pub direction: String,
}

impl fmt::Display for InvalidDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid flowchart direction: {} (expected TD/TB/LR/RL/BT)",
            self.direction
        )
    }
}

impl std::error::Error for InvalidDirection {}

/// The layout axis after direction resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    LR,
    TD,
}

/// Knobs for one render. A fresh copy accompanies every render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Emit plain ASCII (`+ - | < > ^ v *`) instead of box drawing.
    pub use_ascii: bool,
    /// Minimum drawn width of the column before each node.
    pub padding_x: usize,
    /// Minimum drawn height of the row before each node.
    pub padding_y: usize,
    /// Blank cells between a node's label and its border.
    pub box_border_padding: usize,
    /// Overrides the direction from the Mermaid header when set.
    pub direction: Option<GraphDirection>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            use_ascii: false,
            padding_x: 4,
            padding_y: 4,
            box_border_padding: 1,
            direction: None,
        }
    }
}
