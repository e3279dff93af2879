//! The cell grid: a fixed-size 2-D array of `(rune, fg, bg)` cells plus the
//! double-buffered back/front pair the core API diffs on `Flush`.

use core_attr::Attribute;
use core_width::{width, WidthContext};

/// One grid cell. For a double-width rune the right-hand neighbour is a
/// reserved continuation cell: `rune == 0`, inheriting the leader's `fg`/`bg`
/// (spec invariant I4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub rune: u32,
    pub fg: Attribute,
    pub bg: Attribute,
}

impl Default for Cell {
    /// Space, default fg, default bg — indistinguishable from an
    /// uninitialized cell (spec invariant I5).
    fn default() -> Self {
        Cell {
            rune: ' ' as u32,
            fg: Attribute::DEFAULT,
            bg: Attribute::DEFAULT,
        }
    }
}

impl Cell {
    pub const fn new(rune: u32, fg: Attribute, bg: Attribute) -> Self {
        Cell { rune, fg, bg }
    }

    /// True for the reserved right-hand half of a double-width rune.
    pub fn is_continuation(&self) -> bool {
        self.rune == 0
    }
}

/// A `width x height` row-major grid of cells.
#[derive(Debug, Clone)]
pub struct CellBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl CellBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let len = (width as usize) * (height as usize);
        CellBuffer {
            width,
            height,
            cells: vec![Cell::default(); len],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Out-of-bounds returns `None` rather than panicking (spec invariant
    /// I3 — every mutator is a no-op outside bounds; readers mirror that).
    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Direct single-cell write. Does not apply double-width reservation;
    /// prefer [`CellBuffer::set_rune`] for application-facing writes.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Write a rune at `(x, y)` honoring double-width placement:
    /// - width-2 runes placed at the last column only write the leading
    ///   cell; the (absent) trailing cell is elided (I4).
    /// - width-2 runes placed elsewhere also reserve the right neighbour as
    ///   a continuation cell sharing `fg`/`bg`.
    /// Out-of-bounds coordinates are a no-op (I3).
    pub fn set_rune(
        &mut self,
        x: u16,
        y: u16,
        rune: char,
        fg: Attribute,
        bg: Attribute,
        ctx: WidthContext,
    ) {
        if x >= self.width || y >= self.height {
            return;
        }
        let w = width(rune, ctx);
        let cell = Cell::new(rune as u32, fg, bg);
        self.set(x, y, cell);
        if w == 2 && x + 1 < self.width {
            self.set(x + 1, y, Cell::new(0, fg, bg));
        }
        // w == 2 at the last column: trailing cell elided per I4, nothing
        // further to write.
    }

    /// Fill every cell with `(space, fg, bg)`.
    pub fn clear(&mut self, fg: Attribute, bg: Attribute) {
        for c in &mut self.cells {
            *c = Cell::new(' ' as u32, fg, bg);
        }
    }

    /// Resize in place: allocate a fresh buffer, copy the intersection of
    /// old and new dimensions, fill the newly-exposed region with the
    /// default cell (spec P3: resize conservation).
    pub fn resize(&mut self, width: u16, height: u16) {
        let mut next = CellBuffer::new(width, height);
        let copy_w = self.width.min(width);
        let copy_h = self.height.min(height);
        for y in 0..copy_h {
            for x in 0..copy_w {
                if let Some(c) = self.get(x, y) {
                    next.set(x, y, c);
                }
            }
        }
        *self = next;
    }

    /// Copy every cell from `src` into `self`. Both buffers must share
    /// dimensions (the core API only ever blits back -> front, which are
    /// kept in lockstep by `resize`).
    pub fn blit(&mut self, src: &CellBuffer) {
        debug_assert_eq!(self.size(), src.size(), "blit requires matching dimensions");
        self.cells.copy_from_slice(&src.cells);
    }

    /// Coordinates of every cell where `self` and `other` differ, in
    /// row-major order. Both buffers must share dimensions.
    pub fn diff(&self, other: &CellBuffer) -> impl Iterator<Item = (u16, u16)> + '_ {
        debug_assert_eq!(self.size(), other.size(), "diff requires matching dimensions");
        let width = self.width;
        self.cells
            .iter()
            .zip(other.cells.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(move |(i, _)| {
                let i = i as u16;
                (i % width, i / width)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cell_is_space_default_colors() {
        let buf = CellBuffer::new(2, 2);
        let c = buf.get(0, 0).unwrap();
        assert_eq!(c.rune, ' ' as u32);
        assert_eq!(c.fg, Attribute::DEFAULT);
        assert_eq!(c.bg, Attribute::DEFAULT);
    }

    #[test]
    fn out_of_bounds_set_is_noop() {
        let mut buf = CellBuffer::new(4, 4);
        let before = buf.clone();
        buf.set_rune(10, 0, 'x', Attribute::DEFAULT, Attribute::DEFAULT, WidthContext::default());
        buf.set_rune(0, 10, 'x', Attribute::DEFAULT, Attribute::DEFAULT, WidthContext::default());
        assert_eq!(buf.cells, before.cells);
    }

    #[test]
    fn wide_rune_reserves_right_neighbour() {
        let mut buf = CellBuffer::new(4, 1);
        buf.set_rune(1, 0, '\u{4e2d}', Attribute::DEFAULT, Attribute::DEFAULT, WidthContext::default());
        assert_eq!(buf.get(1, 0).unwrap().rune, '\u{4e2d}' as u32);
        assert!(buf.get(2, 0).unwrap().is_continuation());
    }

    #[test]
    fn wide_rune_at_last_column_elides_trailing_cell() {
        let mut buf = CellBuffer::new(4, 1);
        let before = buf.get(3, 0).unwrap();
        buf.set_rune(3, 0, '\u{4e2d}', Attribute::DEFAULT, Attribute::DEFAULT, WidthContext::default());
        assert_eq!(buf.get(3, 0).unwrap().rune, '\u{4e2d}' as u32);
        // There is no column 4; nothing beyond the grid is touched, and
        // since a new buffer starts blank this also checks idempotence of
        // neighbours outside the grid (nothing to compare against but the
        // call must not panic).
        let _ = before;
    }

    #[test]
    fn resize_preserves_in_bounds_cells() {
        let mut buf = CellBuffer::new(4, 4);
        buf.set_rune(1, 1, 'a', Attribute::DEFAULT, Attribute::DEFAULT, WidthContext::default());
        buf.resize(2, 2);
        assert_eq!(buf.get(1, 1).unwrap().rune, 'a' as u32);
        assert_eq!(buf.size(), (2, 2));

        let mut buf2 = CellBuffer::new(2, 2);
        buf2.set_rune(1, 1, 'b', Attribute::DEFAULT, Attribute::DEFAULT, WidthContext::default());
        buf2.resize(4, 4);
        assert_eq!(buf2.get(1, 1).unwrap().rune, 'b' as u32);
        assert_eq!(buf2.get(3, 3).unwrap(), Cell::default());
    }

    #[test]
    fn diff_reports_only_changed_cells() {
        let a = CellBuffer::new(3, 1);
        let mut b = CellBuffer::new(3, 1);
        b.set_rune(2, 0, 'z', Attribute::DEFAULT, Attribute::DEFAULT, WidthContext::default());
        let changed: Vec<_> = a.diff(&b).collect();
        assert_eq!(changed, vec![(2, 0)]);
    }

    #[test]
    fn blit_makes_buffers_equal_and_diff_empty() {
        let mut a = CellBuffer::new(3, 3);
        let mut b = CellBuffer::new(3, 3);
        a.set_rune(0, 0, 'A', Attribute::DEFAULT, Attribute::DEFAULT, WidthContext::default());
        b.blit(&a);
        assert_eq!(a.diff(&b).count(), 0);
    }
}
