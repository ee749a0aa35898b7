// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Output character sets.
//!
//! Two charsets exist: Unicode box drawing with directional triangles, and a
//! plain ASCII fallback. Everything the renderer paints for strokes, corners,
//! arrowheads, and port markers comes from here, so the emitted alphabet stays
//! closed and the reverse parser can enumerate it.

use crate::model::Direction;

pub const UNICODE_HORIZONTAL: char = '─';
pub const UNICODE_VERTICAL: char = '│';
pub const UNICODE_TOP_LEFT: char = '┌';
pub const UNICODE_TOP_RIGHT: char = '┐';
pub const UNICODE_BOTTOM_LEFT: char = '└';
pub const UNICODE_BOTTOM_RIGHT: char = '┘';
pub const UNICODE_TEE_RIGHT: char = '├';
pub const UNICODE_TEE_LEFT: char = '┤';
pub const UNICODE_TEE_DOWN: char = '┬';
pub const UNICODE_TEE_UP: char = '┴';
pub const UNICODE_CROSS: char = '┼';
pub const UNICODE_HALF_LEFT: char = '╴';
pub const UNICODE_HALF_UP: char = '╵';
pub const UNICODE_HALF_RIGHT: char = '╶';
pub const UNICODE_HALF_DOWN: char = '╷';

/// Glyph choices for one output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    pub horizontal: char,
    pub vertical: char,
    pub corner_top_left: char,
    pub corner_top_right: char,
    pub corner_bottom_left: char,
    pub corner_bottom_right: char,
    pub arrow_up: char,
    pub arrow_down: char,
    pub arrow_left: char,
    pub arrow_right: char,
    pub arrow_upper_left: char,
    pub arrow_upper_right: char,
    pub arrow_lower_left: char,
    pub arrow_lower_right: char,
    pub tee_left: char,
    pub tee_right: char,
    pub tee_down: char,
    pub tee_up: char,
}

pub const UNICODE: Charset = Charset {
    horizontal: UNICODE_HORIZONTAL,
    vertical: UNICODE_VERTICAL,
    corner_top_left: UNICODE_TOP_LEFT,
    corner_top_right: UNICODE_TOP_RIGHT,
    corner_bottom_left: UNICODE_BOTTOM_LEFT,
    corner_bottom_right: UNICODE_BOTTOM_RIGHT,
    arrow_up: '▲',
    arrow_down: '▼',
    arrow_left: '◄',
    arrow_right: '►',
    arrow_upper_left: '◤',
    arrow_upper_right: '◥',
    arrow_lower_left: '◣',
    arrow_lower_right: '◢',
    tee_left: UNICODE_TEE_LEFT,
    tee_right: UNICODE_TEE_RIGHT,
    tee_down: UNICODE_TEE_DOWN,
    tee_up: UNICODE_TEE_UP,
};

pub const ASCII: Charset = Charset {
    horizontal: '-',
    vertical: '|',
    corner_top_left: '+',
    corner_top_right: '+',
    corner_bottom_left: '+',
    corner_bottom_right: '+',
    arrow_up: '^',
    arrow_down: 'v',
    arrow_left: '<',
    arrow_right: '>',
    arrow_upper_left: '*',
    arrow_upper_right: '*',
    arrow_lower_left: '*',
    arrow_lower_right: '*',
    tee_left: '+',
    tee_right: '+',
    tee_down: '+',
    tee_up: '+',
};

pub fn charset(use_ascii: bool) -> &'static Charset {
    if use_ascii {
        &ASCII
    } else {
        &UNICODE
    }
}

impl Charset {
    /// Arrowhead glyph for a path ending with a step in `dir`.
    pub fn arrow_for(&self, dir: Direction) -> char {
        match dir {
            Direction::Up => self.arrow_up,
            Direction::Down => self.arrow_down,
            Direction::Left => self.arrow_left,
            Direction::Right => self.arrow_right,
            Direction::UpperLeft => self.arrow_upper_left,
            Direction::UpperRight => self.arrow_upper_right,
            Direction::LowerLeft => self.arrow_lower_left,
            Direction::LowerRight => self.arrow_lower_right,
            Direction::Middle => '*',
        }
    }

    /// Port marker drawn on a source node border for an edge leaving in `dir`.
    ///
    /// Only orthogonal exits carry a marker; diagonal ports sit on box corners
    /// where the corner glyph already is the marker.
    pub fn port_marker_for(&self, dir: Direction) -> Option<char> {
        match dir {
            Direction::Right => Some(self.tee_right),
            Direction::Left => Some(self.tee_left),
            Direction::Down => Some(self.tee_down),
            Direction::Up => Some(self.tee_up),
            _ => None,
        }
    }
}

/// The direction a Unicode or ASCII arrowhead points toward, if `ch` is one.
pub fn arrow_direction(ch: char) -> Option<Direction> {
    match ch {
        '▲' | '^' => Some(Direction::Up),
        '▼' | 'v' => Some(Direction::Down),
        '◄' | '<' => Some(Direction::Left),
        '►' | '>' => Some(Direction::Right),
        '◤' => Some(Direction::UpperLeft),
        '◥' => Some(Direction::UpperRight),
        '◣' => Some(Direction::LowerLeft),
        '◢' => Some(Direction::LowerRight),
        _ => None,
    }
}

/// Source-marker junctions the reverse parser accepts as edge origins.
pub fn is_source_marker(ch: char) -> bool {
    matches!(ch, '├' | '┤' | '┬' | '┴' | '┼')
}
