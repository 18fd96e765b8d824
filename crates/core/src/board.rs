//! Board module - owns the grid of tiles
//!
//! The board is a `width x height` grid where every slot always holds exactly one
//! [`Tile`]; "empty" is a value, never an absence.
//! Storage is a flat row-major vector (`y * width + x`), row `0` at the top.
//! Tiles never change position: falling is modeled as values migrating between slots.
//!
//! Only the engine mutates values (`pub(crate)` setters); everyone else reads.

use arrayvec::ArrayVec;

use crate::types::{Tile, TilePos, TileValue};

/// One value migration produced by column compaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub from: TilePos,
    pub to: TilePos,
    pub value: TileValue,
}

/// The game grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: u8,
    height: u8,
    /// Flat array of tiles, row-major order (y * width + x)
    tiles: Vec<Tile>,
}

impl Board {
    /// Create a board with every slot empty
    pub fn new(width: u8, height: u8) -> Self {
        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(TilePos::new(x, y), TileValue::Empty));
            }
        }
        Self {
            width,
            height,
            tiles,
        }
    }

    /// Create a board from row-major values
    ///
    /// Panics if `values.len() != width * height`.
    pub fn from_values(width: u8, height: u8, values: &[TileValue]) -> Self {
        assert_eq!(
            values.len(),
            width as usize * height as usize,
            "board needs exactly width*height values"
        );
        let mut board = Self::new(width, height);
        for (tile, &value) in board.tiles.iter_mut().zip(values) {
            tile.value = value;
        }
        board
    }

    /// Create a board from rows of integer codes (`-1` empty, `0..` ordinary, `9` golden)
    ///
    /// Returns `None` for ragged rows or unknown codes.
    pub fn from_codes(rows: &[&[i8]]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first()?.len();
        if width == 0 || width > u8::MAX as usize || height > u8::MAX as usize {
            return None;
        }
        let mut values = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return None;
            }
            for &code in row.iter() {
                values.push(TileValue::from_code(code)?);
            }
        }
        Some(Self::from_values(width as u8, height as u8, &values))
    }

    /// Calculate flat index from a position
    #[inline(always)]
    fn index(&self, pos: TilePos) -> Option<usize> {
        if pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        Some(pos.y as usize * self.width as usize + pos.x as usize)
    }

    #[inline(always)]
    fn index_or_panic(&self, pos: TilePos) -> usize {
        match self.index(pos) {
            Some(idx) => idx,
            None => panic!(
                "tile position ({}, {}) outside {}x{} board",
                pos.x, pos.y, self.width, self.height
            ),
        }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        self.index(pos).is_some()
    }

    /// Tile at `pos`, or `None` when out of bounds
    pub fn get(&self, pos: TilePos) -> Option<&Tile> {
        self.index(pos).map(|idx| &self.tiles[idx])
    }

    /// Tile at `pos`
    ///
    /// Out-of-bounds access is a caller contract violation and panics.
    pub fn tile(&self, pos: TilePos) -> &Tile {
        &self.tiles[self.index_or_panic(pos)]
    }

    /// Value at `pos` (panics when out of bounds)
    pub fn value(&self, pos: TilePos) -> TileValue {
        self.tile(pos).value
    }

    /// Overwrite the value at `pos`, returning the previous one
    pub(crate) fn set(&mut self, pos: TilePos, value: TileValue) -> TileValue {
        let idx = self.index_or_panic(pos);
        std::mem::replace(&mut self.tiles[idx].value, value)
    }

    /// Exchange the values of two slots; positions stay put
    pub(crate) fn swap_values(&mut self, a: TilePos, b: TilePos) {
        let ia = self.index_or_panic(a);
        let ib = self.index_or_panic(b);
        let va = self.tiles[ia].value;
        self.tiles[ia].value = self.tiles[ib].value;
        self.tiles[ib].value = va;
    }

    /// All tiles in row-major order
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// All values in row-major order
    pub fn values(&self) -> Vec<TileValue> {
        self.tiles.iter().map(|t| t.value).collect()
    }

    /// Every position in row-major order
    pub fn positions(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.tiles.iter().map(|t| t.pos)
    }

    /// In-bounds edge and corner neighbours
    pub fn neighbors8(&self, pos: TilePos) -> ArrayVec<TilePos, 8> {
        const OFFSETS: [(i8, i8); 8] = [
            (0, 1),
            (1, 0),
            (0, -1),
            (-1, 0),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ];
        OFFSETS
            .iter()
            .filter_map(|&(dx, dy)| pos.offset(dx, dy, self.width, self.height))
            .collect()
    }

    pub fn golden_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.value.is_golden()).count()
    }

    pub fn empty_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.value.is_empty()).count()
    }

    /// Count of each ordinary type `0..type_count`; goldens and empties are skipped
    pub fn normal_counts(&self, type_count: u8) -> Vec<usize> {
        let mut counts = vec![0usize; type_count as usize];
        for tile in &self.tiles {
            if let TileValue::Normal(k) = tile.value {
                if let Some(c) = counts.get_mut(k as usize) {
                    *c += 1;
                }
            }
        }
        counts
    }

    /// Empty slots in column `x`
    pub fn empty_in_column(&self, x: u8) -> u8 {
        (0..self.height)
            .filter(|&y| self.value(TilePos::new(x, y)).is_empty())
            .count() as u8
    }

    /// Compact column `x` so every non-empty value rests at the bottom
    ///
    /// Two-pointer scan from the bottom: `write_y` trails `read_y` and every
    /// non-empty value found above a gap is moved down to it. Relative order
    /// is preserved and all empties end up at the top.
    /// Returns the migrations, bottom-most first.
    pub(crate) fn compact_column(&mut self, x: u8) -> Vec<Fall> {
        let mut falls = Vec::new();
        let mut write_y = self.height;

        for read_y in (0..self.height).rev() {
            let from = TilePos::new(x, read_y);
            let value = self.value(from);
            if value.is_empty() {
                continue;
            }
            write_y -= 1;
            if write_y != read_y {
                let to = TilePos::new(x, write_y);
                self.set(to, value);
                self.set(from, TileValue::Empty);
                falls.push(Fall { from, to, value });
            }
        }

        falls
    }

    /// Write integer codes row-major into `out`
    pub fn write_codes(&self, out: &mut Vec<i8>) {
        out.clear();
        out.extend(self.tiles.iter().map(|t| t.value.code()));
    }
}
