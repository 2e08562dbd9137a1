// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

pub const BOX_HORIZONTAL: char = '─';
pub const BOX_VERTICAL: char = '│';
pub const BOX_TOP_LEFT: char = '┌';
pub const BOX_TOP_RIGHT: char = '┐';
pub const BOX_BOTTOM_LEFT: char = '└';
pub const BOX_BOTTOM_RIGHT: char = '┘';

/// Which neighbors a box-drawing cell connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Arms(u8);

impl Arms {
    const LEFT: u8 = 1;
    const RIGHT: u8 = 2;
    const UP: u8 = 4;
    const DOWN: u8 = 8;

    fn has(self, arm: u8) -> bool {
        self.0 & arm != 0
    }

    fn of(ch: char) -> Option<Self> {
        let bits = match ch {
            '─' => Self::LEFT | Self::RIGHT,
            '│' => Self::UP | Self::DOWN,
            '┌' => Self::RIGHT | Self::DOWN,
            '┐' => Self::LEFT | Self::DOWN,
            '└' => Self::RIGHT | Self::UP,
            '┘' => Self::LEFT | Self::UP,
            '├' => Self::UP | Self::DOWN | Self::RIGHT,
            '┤' => Self::UP | Self::DOWN | Self::LEFT,
            '┬' => Self::LEFT | Self::RIGHT | Self::DOWN,
            '┴' => Self::LEFT | Self::RIGHT | Self::UP,
            '┼' => Self::LEFT | Self::RIGHT | Self::UP | Self::DOWN,
            _ => return None,
        };
        Some(Self(bits))
    }

    fn glyph(self) -> char {
        // Index: DOWN UP RIGHT LEFT.
        const GLYPHS: [char; 16] = [
            ' ', '─', '─', '─', '│', '┘', '└', '┴', '│', '┐', '┌', '┬', '│', '┤', '├', '┼',
        ];
        GLYPHS[usize::from(self.0 & 0x0f)]
    }
}

/// Bounds-checked character grid.
///
/// Plain characters overwrite; box-drawing characters accumulate their arms so crossing lines
/// render as junctions. Where at least two arms meet a neighbor that reaches back, only those
/// arms are drawn, so line ends do not sprout stubs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    chars: Vec<char>,
    arms: Vec<Arms>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Result<Self, CanvasError> {
        let len = width.checked_mul(height).ok_or(CanvasError::AreaOverflow { width, height })?;
        Ok(Self { width, height, chars: vec![' '; len], arms: vec![Arms::default(); len] })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Result<char, CanvasError> {
        let idx = self.index_of(x, y)?;
        Ok(self.glyph_at(x, y, idx))
    }

    pub fn set(&mut self, x: usize, y: usize, ch: char) -> Result<(), CanvasError> {
        let idx = self.index_of(x, y)?;
        match Arms::of(ch) {
            Some(arms) => self.arms[idx] = Arms(self.arms[idx].0 | arms.0),
            None => {
                self.chars[idx] = ch;
                self.arms[idx] = Arms::default();
            }
        }
        Ok(())
    }

    /// Like [`Canvas::set`], but silently drops writes outside the canvas.
    pub fn put(&mut self, x: i64, y: i64, ch: char) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if self.in_bounds(x, y) {
            let _ = self.set(x, y, ch);
        }
    }

    /// Writes `text` left to right from `(x, y)`, clipped to the canvas.
    pub fn put_str(&mut self, x: i64, y: i64, text: &str) {
        for (offset, ch) in text.chars().enumerate() {
            self.put(x + offset as i64, y, ch);
        }
    }

    /// Horizontal line over `x0..=x1`, clipped to the canvas.
    pub fn hline(&mut self, x0: i64, x1: i64, y: i64) {
        for x in x0.min(x1)..=x0.max(x1) {
            self.put(x, y, BOX_HORIZONTAL);
        }
    }

    /// Vertical line over `y0..=y1`, clipped to the canvas.
    pub fn vline(&mut self, x: i64, y0: i64, y1: i64) {
        for y in y0.min(y1)..=y0.max(y1) {
            self.put(x, y, BOX_VERTICAL);
        }
    }

    /// Rectangle outline with corners at `(x0, y0)` and `(x1, y1)`, clipped to the canvas.
    pub fn outline(&mut self, x0: i64, y0: i64, x1: i64, y1: i64) {
        let (left, right) = (x0.min(x1), x0.max(x1));
        let (top, bottom) = (y0.min(y1), y0.max(y1));
        if left == right || top == bottom {
            self.hline(left, right, top);
            self.vline(left, top, bottom);
            return;
        }
        if right - left >= 2 {
            self.hline(left + 1, right - 1, top);
            self.hline(left + 1, right - 1, bottom);
        }
        if bottom - top >= 2 {
            self.vline(left, top + 1, bottom - 1);
            self.vline(right, top + 1, bottom - 1);
        }
        self.put(left, top, BOX_TOP_LEFT);
        self.put(right, top, BOX_TOP_RIGHT);
        self.put(left, bottom, BOX_BOTTOM_LEFT);
        self.put(right, bottom, BOX_BOTTOM_RIGHT);
    }

    /// Rendered rows with trailing spaces and trailing blank rows removed.
    pub fn to_string_trimmed(&self) -> String {
        let mut lines = (0..self.height)
            .map(|y| {
                let line = (0..self.width)
                    .map(|x| self.glyph_at(x, y, y * self.width + x))
                    .collect::<String>();
                line.trim_end_matches(' ').to_owned()
            })
            .collect::<Vec<_>>();
        while matches!(lines.last(), Some(line) if line.is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }

    fn index_of(&self, x: usize, y: usize) -> Result<usize, CanvasError> {
        if !self.in_bounds(x, y) {
            return Err(CanvasError::OutOfBounds { x, y, width: self.width, height: self.height });
        }
        Ok(y * self.width + x)
    }

    fn glyph_at(&self, x: usize, y: usize, idx: usize) -> char {
        let arms = self.arms[idx];
        if arms.0 == 0 {
            return self.chars[idx];
        }

        let reaches = |nx: usize, ny: usize, back: u8| self.arms[ny * self.width + nx].has(back);
        let mut linked = 0u8;
        if arms.has(Arms::LEFT) && x > 0 && reaches(x - 1, y, Arms::RIGHT) {
            linked |= Arms::LEFT;
        }
        if arms.has(Arms::RIGHT) && x + 1 < self.width && reaches(x + 1, y, Arms::LEFT) {
            linked |= Arms::RIGHT;
        }
        if arms.has(Arms::UP) && y > 0 && reaches(x, y - 1, Arms::DOWN) {
            linked |= Arms::UP;
        }
        if arms.has(Arms::DOWN) && y + 1 < self.height && reaches(x, y + 1, Arms::UP) {
            linked |= Arms::DOWN;
        }

        if linked.count_ones() < 2 {
            arms.glyph()
        } else {
            Arms(linked).glyph()
        }
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::fmt::Write as _;

        for y in 0..self.height {
            if y > 0 {
                f.write_char('\n')?;
            }
            for x in 0..self.width {
                f.write_char(self.glyph_at(x, y, y * self.width + x))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    AreaOverflow { width: usize, height: usize },
    OutOfBounds { x: usize, y: usize, width: usize, height: usize },
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AreaOverflow { width, height } => {
                write!(f, "canvas area overflow: {width}*{height}")
            }
            Self::OutOfBounds { x, y, width, height } => {
                write!(f, "out of bounds: ({x},{y}) for {width}x{height} canvas")
            }
        }
    }
}

impl std::error::Error for CanvasError {}

#[cfg(test)]
mod tests {
    use super::{Canvas, CanvasError};

    #[test]
    fn set_out_of_bounds_errors() {
        let mut c = Canvas::new(2, 2).unwrap();
        assert_eq!(
            c.set(2, 0, 'X'),
            Err(CanvasError::OutOfBounds { x: 2, y: 0, width: 2, height: 2 })
        );
    }

    #[test]
    fn put_clips_silently() {
        let mut c = Canvas::new(3, 1).unwrap();
        c.put(-1, 0, 'X');
        c.put(5, 0, 'X');
        c.put_str(1, 0, "abc");
        assert_eq!(c.to_string(), " ab");
    }

    #[test]
    fn rejects_area_overflow() {
        assert_eq!(
            Canvas::new(usize::MAX, 2),
            Err(CanvasError::AreaOverflow { width: usize::MAX, height: 2 })
        );
    }

    #[test]
    fn crossing_lines_merge_into_junctions() {
        let mut c = Canvas::new(5, 5).unwrap();
        c.hline(0, 4, 2);
        c.vline(2, 0, 4);
        assert_eq!(c.to_string(), "  │  \n  │  \n──┼──\n  │  \n  │  ");

        let mut c = Canvas::new(5, 3).unwrap();
        c.hline(0, 4, 1);
        c.vline(2, 1, 2);
        assert_eq!(c.to_string(), "     \n──┬──\n  │  ");
    }

    #[test]
    fn joined_segments_form_a_corner() {
        let mut c = Canvas::new(4, 3).unwrap();
        c.hline(0, 2, 0);
        c.vline(2, 0, 2);
        assert_eq!(c.to_string_trimmed(), "──┐\n  │\n  │");
    }

    #[test]
    fn outline_draws_box() {
        let mut c = Canvas::new(6, 4).unwrap();
        c.outline(1, 0, 4, 2);
        assert_eq!(c.to_string_trimmed(), " ┌──┐\n │  │\n └──┘");
    }

    #[test]
    fn flat_outline_keeps_its_corners() {
        let mut c = Canvas::new(4, 2).unwrap();
        c.outline(0, 0, 3, 1);
        c.put_str(1, 0, "ab");
        assert_eq!(c.to_string(), "┌ab┐\n└──┘");
    }

    #[test]
    fn text_overwrites_lines() {
        let mut c = Canvas::new(5, 1).unwrap();
        c.hline(0, 4, 0);
        c.put_str(1, 0, "ab");
        assert_eq!(c.to_string(), "─ab──");
    }
}
