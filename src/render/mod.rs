// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Canvas primitive and the flowchart compositor.
//!
//! The canvas is a column-major character grid (`cells[x][y]`) that grows
//! monotonically and never fails a paint. Overlapping Unicode box-drawing
//! characters merge through a 4-bit stroke algebra instead of overwriting, so
//! independently drawn overlays composite into connected line art.

use std::fmt;

pub mod flowchart;
pub mod glyphs;
pub mod text;

pub use flowchart::{render_flowchart, render_flowchart_components, RenderError};

use text::is_wide_char;

/// 4-bit stroke connectivity of a box-drawing glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Strokes(u8);

impl Strokes {
    const LEFT: u8 = 1 << 0;
    const RIGHT: u8 = 1 << 1;
    const UP: u8 = 1 << 2;
    const DOWN: u8 = 1 << 3;

    fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    fn has(self, bit: u8) -> bool {
        (self.0 & bit) != 0
    }
}

fn strokes_of(ch: char) -> Option<Strokes> {
    let bits = match ch {
        '╴' => Strokes::LEFT,
        '╶' => Strokes::RIGHT,
        '╵' => Strokes::UP,
        '╷' => Strokes::DOWN,
        '─' => Strokes::LEFT | Strokes::RIGHT,
        '│' => Strokes::UP | Strokes::DOWN,
        '┌' => Strokes::RIGHT | Strokes::DOWN,
        '┐' => Strokes::LEFT | Strokes::DOWN,
        '└' => Strokes::RIGHT | Strokes::UP,
        '┘' => Strokes::LEFT | Strokes::UP,
        '├' => Strokes::UP | Strokes::DOWN | Strokes::RIGHT,
        '┤' => Strokes::UP | Strokes::DOWN | Strokes::LEFT,
        '┬' => Strokes::LEFT | Strokes::RIGHT | Strokes::DOWN,
        '┴' => Strokes::LEFT | Strokes::RIGHT | Strokes::UP,
        '┼' => Strokes::LEFT | Strokes::RIGHT | Strokes::UP | Strokes::DOWN,
        _ => return None,
    };
    Some(Strokes(bits))
}

/// Stroke connectivity bits of a box-drawing glyph, in the shared
/// left=1 / right=2 / up=4 / down=8 encoding.
pub(crate) fn stroke_bits(ch: char) -> Option<u8> {
    strokes_of(ch).map(|strokes| strokes.0)
}

fn char_for_strokes(strokes: Strokes) -> char {
    match strokes.0 {
        0 => ' ',
        1 => '╴',
        2 => '╶',
        3 => '─',
        4 => '╵',
        5 => '┘',
        6 => '└',
        7 => '┴',
        8 => '╷',
        9 => '┐',
        10 => '┌',
        11 => '┬',
        12 => '│',
        13 => '┤',
        14 => '├',
        15 => '┼',
        // Unreachable with 4 bits; keep a deterministic fallback.
        _ => '┼',
    }
}

/// A grow-only, column-major character grid.
///
/// Collision behavior on merge is deterministic:
/// - non-box characters overwrite (last writer wins, spaces never win)
/// - Unicode box-drawing characters merge into the glyph whose stroke set is
///   the union of both operands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    cells: Vec<Vec<char>>,
    height: usize,
}

impl Canvas {
    /// Creates a canvas of `width` columns and `height` rows, filled with spaces.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![vec![' '; height]; width],
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Inclusive maximum coordinates `(max_x, max_y)`; `(0, 0)` when empty.
    pub fn size(&self) -> (usize, usize) {
        (
            self.width().saturating_sub(1),
            self.height.saturating_sub(1),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() || self.height == 0
    }

    /// Grows the canvas so `(width, height)` fits. Never shrinks.
    pub fn grow_to(&mut self, width: usize, height: usize) {
        if height > self.height {
            for column in &mut self.cells {
                column.resize(height, ' ');
            }
            self.height = height;
        }
        while self.cells.len() < width {
            self.cells.push(vec![' '; self.height]);
        }
    }

    /// Returns the character at `(x, y)`, or a space when out of bounds.
    pub fn get(&self, x: usize, y: usize) -> char {
        self.cells
            .get(x)
            .and_then(|column| column.get(y))
            .copied()
            .unwrap_or(' ')
    }

    /// Writes `ch` at `(x, y)`, growing the canvas as needed.
    pub fn set(&mut self, x: usize, y: usize, ch: char) {
        self.grow_to(x + 1, y + 1);
        self.cells[x][y] = ch;
    }

    /// Writes `ch` at `(x, y)` under the junction algebra.
    ///
    /// In ASCII mode there is no merging; the overlay always wins.
    pub fn set_merged(&mut self, x: usize, y: usize, ch: char, use_ascii: bool) {
        if ch == ' ' {
            return;
        }
        if !use_ascii {
            if let (Some(new), Some(old)) = (strokes_of(ch), strokes_of(self.get(x, y))) {
                self.set(x, y, char_for_strokes(old.union(new)));
                return;
            }
        }
        self.set(x, y, ch);
    }

    /// Writes `line` starting at `(x, y)`, advancing by display width per code
    /// point. Wide characters leave the following cell untouched as a
    /// placeholder; zero-width code points are dropped.
    pub fn draw_text(&mut self, x: usize, y: usize, line: &str) {
        let mut x = x;
        for ch in line.chars() {
            let width = text::char_display_width(ch);
            if width == 0 {
                continue;
            }
            self.set(x, y, ch);
            x += width;
        }
        // Placeholder cells after wide chars must exist so the row stays rectangular.
        self.grow_to(x, y + 1);
    }

    /// Merges `overlay` onto `self` at `offset`, growing as needed.
    pub fn merge_overlay(&mut self, offset: (usize, usize), use_ascii: bool, overlay: &Canvas) {
        let (dx, dy) = offset;
        for (x, column) in overlay.cells.iter().enumerate() {
            for (y, &ch) in column.iter().enumerate() {
                if ch != ' ' {
                    self.set_merged(x + dx, y + dy, ch, use_ascii);
                }
            }
        }
    }

    /// Replaces every `┼` with `─` or `│`.
    ///
    /// `┼` means four-way connection in box-drawing; crossing flowchart edges
    /// do not connect, so each cross becomes a bridge favouring the stroke its
    /// neighbours point at. Ties go to `─`. Idempotent.
    pub fn deambiguate_crossings(&mut self) {
        let mut replacements = Vec::<(usize, usize, char)>::new();
        for x in 0..self.width() {
            for y in 0..self.height {
                if self.cells[x][y] != '┼' {
                    continue;
                }
                let mut horizontal = 0;
                let mut vertical = 0;
                if x > 0 {
                    if let Some(left) = strokes_of(self.get(x - 1, y)) {
                        if left.has(Strokes::RIGHT) {
                            horizontal += 1;
                        }
                    }
                }
                if let Some(right) = strokes_of(self.get(x + 1, y)) {
                    if right.has(Strokes::LEFT) {
                        horizontal += 1;
                    }
                }
                if y > 0 {
                    if let Some(up) = strokes_of(self.get(x, y - 1)) {
                        if up.has(Strokes::DOWN) {
                            vertical += 1;
                        }
                    }
                }
                if let Some(down) = strokes_of(self.get(x, y + 1)) {
                    if down.has(Strokes::UP) {
                        vertical += 1;
                    }
                }
                let bridge = if horizontal >= vertical { '─' } else { '│' };
                replacements.push((x, y, bridge));
            }
        }
        for (x, y, ch) in replacements {
            self.cells[x][y] = ch;
        }
    }

    /// Mirrors the canvas top-to-bottom, remapping direction-carrying glyphs
    /// so the art stays coherent. Used to realize bottom-to-top direction.
    pub fn flip_vertically(&mut self) {
        for column in &mut self.cells {
            column.reverse();
        }
        for column in &mut self.cells {
            for cell in column.iter_mut() {
                *cell = flip_glyph_vertically(*cell);
            }
        }
    }
}

fn flip_glyph_vertically(ch: char) -> char {
    if let Some(strokes) = strokes_of(ch) {
        let mut flipped = strokes.0 & (Strokes::LEFT | Strokes::RIGHT);
        if strokes.has(Strokes::UP) {
            flipped |= Strokes::DOWN;
        }
        if strokes.has(Strokes::DOWN) {
            flipped |= Strokes::UP;
        }
        return char_for_strokes(Strokes(flipped));
    }
    match ch {
        '▲' => '▼',
        '▼' => '▲',
        '◤' => '◣',
        '◣' => '◤',
        '◥' => '◢',
        '◢' => '◥',
        '^' => 'v',
        'v' => '^',
        _ => ch,
    }
}

/// Merges `overlays` onto a copy of `base` at `offset`, in order.
pub fn merge_canvases(
    base: &Canvas,
    offset: (usize, usize),
    use_ascii: bool,
    overlays: &[&Canvas],
) -> Canvas {
    let mut merged = base.clone();
    for overlay in overlays {
        merged.merge_overlay(offset, use_ascii, overlay);
    }
    merged
}

impl fmt::Display for Canvas {
    /// Emits the canvas as newline-joined rows padded to a rectangle.
    ///
    /// The cell after each wide character is skipped so the printed column
    /// count matches the canvas column count.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::fmt::Write as _;

        if self.is_empty() {
            return Ok(());
        }

        for y in 0..self.height {
            let mut x = 0;
            while x < self.width() {
                let ch = self.cells[x][y];
                f.write_char(ch)?;
                x += if is_wide_char(ch) { 2 } else { 1 };
            }
            if y + 1 < self.height {
                f.write_char('\n')?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{merge_canvases, Canvas};

    #[test]
    fn new_canvas_is_space_filled() {
        let canvas = Canvas::new(3, 2);
        assert_eq!(canvas.to_string(), "   \n   ");
        assert_eq!(canvas.size(), (2, 1));
    }

    #[test]
    fn empty_canvas_renders_empty_string() {
        assert_eq!(Canvas::new(0, 0).to_string(), "");
    }

    #[test]
    fn set_grows_canvas() {
        let mut canvas = Canvas::new(1, 1);
        canvas.set(3, 2, 'X');
        assert_eq!(canvas.width(), 4);
        assert_eq!(canvas.height(), 3);
        assert_eq!(canvas.get(3, 2), 'X');
        assert_eq!(canvas.get(0, 0), ' ');
    }

    #[test]
    fn grow_to_preserves_content_and_never_shrinks() {
        let mut canvas = Canvas::new(2, 2);
        canvas.set(1, 1, 'A');
        canvas.grow_to(4, 3);
        assert_eq!(canvas.get(1, 1), 'A');
        canvas.grow_to(1, 1);
        assert_eq!(canvas.width(), 4);
        assert_eq!(canvas.height(), 3);
    }

    #[test]
    fn draw_text_advances_by_display_width() {
        let mut canvas = Canvas::new(1, 1);
        canvas.draw_text(0, 0, "a📋b");
        assert_eq!(canvas.get(0, 0), 'a');
        assert_eq!(canvas.get(1, 0), '📋');
        assert_eq!(canvas.get(2, 0), ' ');
        assert_eq!(canvas.get(3, 0), 'b');
    }

    #[test]
    fn display_skips_placeholder_after_wide_char() {
        let mut canvas = Canvas::new(1, 1);
        canvas.draw_text(0, 0, "📋x");
        assert_eq!(canvas.to_string(), "📋x");
    }

    #[test]
    fn junction_merge_unions_strokes() {
        let mut canvas = Canvas::new(1, 1);
        canvas.set_merged(0, 0, '─', false);
        canvas.set_merged(0, 0, '│', false);
        assert_eq!(canvas.get(0, 0), '┼');

        let mut canvas = Canvas::new(1, 1);
        canvas.set_merged(0, 0, '│', false);
        canvas.set_merged(0, 0, '╶', false);
        assert_eq!(canvas.get(0, 0), '├');
    }

    #[test]
    fn non_box_overlay_wins_unless_space() {
        let mut canvas = Canvas::new(1, 1);
        canvas.set_merged(0, 0, '─', false);
        canvas.set_merged(0, 0, 'x', false);
        assert_eq!(canvas.get(0, 0), 'x');
        canvas.set_merged(0, 0, ' ', false);
        assert_eq!(canvas.get(0, 0), 'x');
    }

    #[test]
    fn ascii_mode_never_merges() {
        let mut canvas = Canvas::new(1, 1);
        canvas.set_merged(0, 0, '-', true);
        canvas.set_merged(0, 0, '|', true);
        assert_eq!(canvas.get(0, 0), '|');
    }

    #[test]
    fn merge_canvases_applies_offset() {
        let base = Canvas::new(4, 3);
        let mut overlay = Canvas::new(2, 1);
        overlay.set(0, 0, 'A');
        overlay.set(1, 0, 'B');
        let merged = merge_canvases(&base, (1, 1), false, &[&overlay]);
        assert_eq!(merged.get(1, 1), 'A');
        assert_eq!(merged.get(2, 1), 'B');
    }

    #[test]
    fn deambiguate_prefers_horizontal_on_balance() {
        // ─┼─ with │ above and below: balanced, horizontal wins.
        let mut canvas = Canvas::new(3, 3);
        canvas.set(1, 0, '│');
        canvas.set(0, 1, '─');
        canvas.set(1, 1, '┼');
        canvas.set(2, 1, '─');
        canvas.set(1, 2, '│');
        canvas.deambiguate_crossings();
        assert_eq!(canvas.get(1, 1), '─');
    }

    #[test]
    fn deambiguate_picks_vertical_majority() {
        let mut canvas = Canvas::new(3, 3);
        canvas.set(1, 0, '│');
        canvas.set(1, 1, '┼');
        canvas.set(1, 2, '│');
        canvas.set(2, 1, '─');
        canvas.deambiguate_crossings();
        assert_eq!(canvas.get(1, 1), '│');
    }

    #[test]
    fn deambiguate_is_idempotent_and_total() {
        let mut canvas = Canvas::new(3, 3);
        for x in 0..3 {
            canvas.set(x, 1, '─');
        }
        for y in 0..3 {
            canvas.set_merged(1, y, '│', false);
        }
        assert_eq!(canvas.get(1, 1), '┼');
        canvas.deambiguate_crossings();
        let once = canvas.to_string();
        assert!(!once.contains('┼'));
        canvas.deambiguate_crossings();
        assert_eq!(canvas.to_string(), once);
    }

    #[test]
    fn flip_vertically_remaps_corners_and_arrows() {
        let mut canvas = Canvas::new(2, 2);
        canvas.set(0, 0, '┌');
        canvas.set(1, 0, '▼');
        canvas.set(0, 1, '└');
        let mut flipped = canvas.clone();
        flipped.flip_vertically();
        assert_eq!(flipped.get(0, 0), '┌');
        assert_eq!(flipped.get(0, 1), '└');
        assert_eq!(flipped.get(1, 1), '▲');
    }
}
