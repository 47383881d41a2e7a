//! Quarto game logic with a bit-based board representation.
//!
//! # Board Encoding (128-bit)
//!
//! ```text
//! Bits 0-79:   Board state (16 cells × 5 bits per cell)
//! Bits 80-127: Unused (zero for canonical form)
//!
//! Each cell (5 bits): 0 = empty, otherwise piece id + 1 (ids 0-15)
//!
//! Cell indices (row-major order):
//!   (0,0)=0   (0,1)=1   (0,2)=2   (0,3)=3
//!   (1,0)=4   (1,1)=5   (1,2)=6   (1,3)=7
//!   (2,0)=8   (2,1)=9   (2,2)=10  (2,3)=11
//!   (3,0)=12  (3,1)=13  (3,2)=14  (3,3)=15
//! ```
//!
//! # Piece Encoding (4-bit)
//!
//! A piece id is a 4-bit number; each bit is one boolean attribute, most
//! significant bit first:
//!
//! ```text
//! Bit 3: large   Bit 2: round   Bit 1: hollow   Bit 0: white
//! ```
//!
//! Every piece is on the board at most once, and the 16 pieces are shared
//! between the players; there is no per-piece ownership.

use serde::{Deserialize, Serialize};

/// Number of boolean attributes per piece.
pub const NUM_ATTRIBUTES: usize = 4;

/// Number of distinct pieces (2^NUM_ATTRIBUTES).
pub const PIECE_COUNT: usize = 16;

/// Number of cells on the board.
pub const CELL_COUNT: usize = 16;

/// Saturating score returned for a completed winning line.
pub const MAX_SCORE: i32 = 100_000;

/// Penalty added per contested threat line: every remaining hand-off now
/// satisfies some live threat, which is bad for whoever must hand over next.
const CONTESTED_PENALTY: i32 = -(MAX_SCORE / 2);

/// A Quarto piece, identified by a number in 0-15.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Piece(u8);

impl Piece {
    /// Create a piece from its identifier (0-15).
    #[inline]
    pub fn new(id: u8) -> Piece {
        debug_assert!((id as usize) < PIECE_COUNT);
        Piece(id)
    }

    /// Get the piece identifier (0-15).
    #[inline]
    pub const fn id(self) -> u8 {
        self.0
    }

    /// Get one boolean attribute by index (0-3, most significant bit first).
    #[inline]
    pub fn attribute(self, idx: usize) -> bool {
        debug_assert!(idx < NUM_ATTRIBUTES);
        (self.0 >> (NUM_ATTRIBUTES - 1 - idx)) & 1 == 1
    }

    /// Attribute 0: large (vs. small).
    #[inline]
    pub fn is_large(self) -> bool {
        self.attribute(0)
    }

    /// Attribute 1: round (vs. square).
    #[inline]
    pub fn is_round(self) -> bool {
        self.attribute(1)
    }

    /// Attribute 2: hollow (vs. solid).
    #[inline]
    pub fn is_hollow(self) -> bool {
        self.attribute(2)
    }

    /// Attribute 3: white (vs. black).
    #[inline]
    pub fn is_white(self) -> bool {
        self.attribute(3)
    }

    /// Iterate over all 16 pieces.
    pub fn all() -> impl Iterator<Item = Piece> {
        (0..PIECE_COUNT as u8).map(Piece)
    }
}

/// Position on the 4x4 board (0-15).
///
/// Layout:
/// ```text
///   0  1  2  3
///   4  5  6  7
///   8  9  10 11
///   12 13 14 15
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Cell(pub u8);

impl Cell {
    /// Create a cell from row and column (0-3 each).
    #[inline]
    pub fn from_row_col(row: u8, col: u8) -> Cell {
        debug_assert!(row < 4 && col < 4);
        Cell(row * 4 + col)
    }

    /// Get the row (0-3).
    #[inline]
    pub fn row(self) -> u8 {
        self.0 / 4
    }

    /// Get the column (0-3).
    #[inline]
    pub fn col(self) -> u8 {
        self.0 % 4
    }

    /// Check if this is a valid cell index (0-15).
    #[inline]
    pub fn is_valid(self) -> bool {
        (self.0 as usize) < CELL_COUNT
    }

    /// Iterate over all 16 cells.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..CELL_COUNT as u8).map(Cell)
    }
}

/// Set of piece identifiers, packed into a u16 bitmask.
///
/// Used for the pool of pieces not yet placed and not reserved in hand. The
/// set is `Copy`; the search passes shrunken copies down the tree instead of
/// mutating and restoring one shared set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PieceSet(u16);

impl PieceSet {
    /// The empty set.
    pub const EMPTY: PieceSet = PieceSet(0);

    /// All 16 pieces (start of a game).
    pub const FULL: PieceSet = PieceSet(u16::MAX);

    /// Check whether the set contains a piece.
    #[inline]
    pub fn contains(self, piece: Piece) -> bool {
        self.0 & (1 << piece.id()) != 0
    }

    /// Add a piece to the set.
    #[inline]
    pub fn insert(&mut self, piece: Piece) {
        self.0 |= 1 << piece.id();
    }

    /// Remove a piece from the set.
    #[inline]
    pub fn remove(&mut self, piece: Piece) {
        self.0 &= !(1 << piece.id());
    }

    /// Get a copy of the set with one piece removed.
    #[inline]
    pub fn without(self, piece: Piece) -> PieceSet {
        PieceSet(self.0 & !(1 << piece.id()))
    }

    /// Get the number of pieces in the set.
    #[inline]
    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Check if the set is empty.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the pieces in the set, lowest id first.
    pub fn iter(self) -> impl Iterator<Item = Piece> {
        Piece::all().filter(move |&p| self.contains(p))
    }
}

/// The 10 winning lines: 4 rows, 4 columns, 2 diagonals.
pub const LINES: [[Cell; 4]; 10] = [
    [Cell(0), Cell(1), Cell(2), Cell(3)],     // Row 0
    [Cell(4), Cell(5), Cell(6), Cell(7)],     // Row 1
    [Cell(8), Cell(9), Cell(10), Cell(11)],   // Row 2
    [Cell(12), Cell(13), Cell(14), Cell(15)], // Row 3
    [Cell(0), Cell(4), Cell(8), Cell(12)],    // Col 0
    [Cell(1), Cell(5), Cell(9), Cell(13)],    // Col 1
    [Cell(2), Cell(6), Cell(10), Cell(14)],   // Col 2
    [Cell(3), Cell(7), Cell(11), Cell(15)],   // Col 3
    [Cell(0), Cell(5), Cell(10), Cell(15)],   // Main diagonal
    [Cell(3), Cell(6), Cell(9), Cell(12)],    // Anti-diagonal
];

/// Compact board state - fits in a single u128.
///
/// See module documentation for encoding details.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Board(pub u128);

impl Board {
    /// Bits per cell (0 = empty, 1-16 = piece id + 1).
    const CELL_BITS: u32 = 5;
    /// Mask for a single cell (0b11111).
    const CELL_MASK: u128 = 0b11111;

    /// Create a new empty board.
    #[inline]
    pub fn new() -> Board {
        Board(0)
    }

    /// Create a board from a raw u128 encoding.
    #[inline]
    pub fn from_u128(bits: u128) -> Board {
        Board(bits)
    }

    /// Get the raw u128 encoding.
    #[inline]
    pub fn to_u128(self) -> u128 {
        self.0
    }

    /// Get the 5 bits for a cell at the given position.
    #[inline]
    fn raw_cell(&self, cell: Cell) -> u128 {
        (self.0 >> (cell.0 as u32 * Self::CELL_BITS)) & Self::CELL_MASK
    }

    /// Set the 5 bits for a cell at the given position.
    #[inline]
    fn set_raw_cell(&mut self, cell: Cell, value: u128) {
        let shift = cell.0 as u32 * Self::CELL_BITS;
        self.0 = (self.0 & !(Self::CELL_MASK << shift)) | ((value & Self::CELL_MASK) << shift);
    }

    /// Get the piece at a cell, or None if the cell is empty.
    #[inline]
    pub fn piece_at(&self, cell: Cell) -> Option<Piece> {
        match self.raw_cell(cell) {
            0 => None,
            v => Some(Piece::new((v - 1) as u8)),
        }
    }

    /// Check if a cell is empty.
    #[inline]
    pub fn is_empty_cell(&self, cell: Cell) -> bool {
        self.raw_cell(cell) == 0
    }

    /// Place a piece on an empty cell.
    /// Does NOT validate piece uniqueness - caller tracks the available set.
    #[inline]
    pub fn place(&mut self, cell: Cell, piece: Piece) {
        debug_assert!(self.is_empty_cell(cell));
        self.set_raw_cell(cell, piece.id() as u128 + 1);
    }

    /// Get a copy of the board with a piece placed on an empty cell.
    /// Search nodes build child positions this way; the parent is untouched.
    #[inline]
    pub fn with_piece(&self, cell: Cell, piece: Piece) -> Board {
        let mut child = *self;
        child.place(cell, piece);
        child
    }

    /// Iterate over all empty cells, in index order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        Cell::all().filter(move |&c| self.is_empty_cell(c))
    }

    /// Get the number of pieces on the board.
    pub fn placed_count(&self) -> u32 {
        Cell::all().filter(|&c| !self.is_empty_cell(c)).count() as u32
    }

    /// Get the number of empty cells.
    #[inline]
    pub fn empty_count(&self) -> u32 {
        CELL_COUNT as u32 - self.placed_count()
    }

    // ========== Symmetry & Canonicalization ==========

    /// Position mapping for each of 8 D4 transformations.
    /// Each array maps new_cell -> old_cell for that transformation.
    const TRANSFORMS: [[u8; 16]; 8] = [
        [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15], // Identity
        [12, 8, 4, 0, 13, 9, 5, 1, 14, 10, 6, 2, 15, 11, 7, 3], // Rotate 90° clockwise
        [15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0], // Rotate 180°
        [3, 7, 11, 15, 2, 6, 10, 14, 1, 5, 9, 13, 0, 4, 8, 12], // Rotate 270° clockwise
        [3, 2, 1, 0, 7, 6, 5, 4, 11, 10, 9, 8, 15, 14, 13, 12], // Reflect horizontal (flip left-right)
        [12, 13, 14, 15, 8, 9, 10, 11, 4, 5, 6, 7, 0, 1, 2, 3], // Reflect vertical (flip top-bottom)
        [0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15], // Reflect main diagonal
        [15, 11, 7, 3, 14, 10, 6, 2, 13, 9, 5, 1, 12, 8, 4, 0], // Reflect anti-diagonal
    ];

    /// Apply a transformation to the board, returning the new encoding.
    ///
    /// The transformation index corresponds to `TRANSFORMS`.
    pub fn transform(&self, t: usize) -> u128 {
        let mapping = &Self::TRANSFORMS[t];
        let mut result = 0u128;

        for new_cell in 0..CELL_COUNT {
            let old_cell = mapping[new_cell] as u32;
            let bits = (self.0 >> (old_cell * Self::CELL_BITS)) & Self::CELL_MASK;
            result |= bits << (new_cell as u32 * Self::CELL_BITS);
        }

        result
    }

    /// Get the canonical form of this board state.
    ///
    /// The canonical form is the minimum encoding across all 8 D4
    /// transformations, so symmetric positions map to the same value.
    pub fn canonical(&self) -> u128 {
        let mut min = self.0;
        for t in 1..8 {
            let transformed = self.transform(t);
            if transformed < min {
                min = transformed;
            }
        }
        min
    }

    /// Get all 8 symmetry transformations of this board.
    pub fn all_symmetries(&self) -> [u128; 8] {
        let mut result = [0u128; 8];
        for (t, slot) in result.iter_mut().enumerate() {
            *slot = self.transform(t);
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

// ========== Static Evaluation ==========

/// Requirement on one attribute slot for the piece that would complete a
/// threatened line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Threat {
    /// No 3-piece line constrains this attribute.
    Open,
    /// A 3-piece line wins with any piece whose attribute equals the value.
    Needs(bool),
    /// Two 3-piece lines demand opposite values; every hand-off feeds one of
    /// them.
    Contested,
}

/// Winning-attribute vector accumulated over all 3-piece lines.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Threats([Threat; NUM_ATTRIBUTES]);

impl Threats {
    /// No threats recorded.
    pub const NONE: Threats = Threats([Threat::Open; NUM_ATTRIBUTES]);

    /// Get one attribute slot.
    #[inline]
    pub fn slot(&self, idx: usize) -> Threat {
        self.0[idx]
    }

    /// Check whether any slot is contested.
    pub fn is_contested(&self) -> bool {
        self.0.iter().any(|t| *t == Threat::Contested)
    }

    /// Merge the shared attributes of one 3-piece line into the vector.
    /// Returns true if this line contradicts an earlier one, i.e. the vacant
    /// cell's requirement just became unsatisfiable-to-avoid.
    fn record(&mut self, shared: &[Option<bool>; NUM_ATTRIBUTES]) -> bool {
        let mut contested = false;
        for (slot, &attr) in self.0.iter_mut().zip(shared.iter()) {
            match (*slot, attr) {
                (Threat::Open, Some(v)) => *slot = Threat::Needs(v),
                (Threat::Needs(have), Some(v)) if have != v => {
                    *slot = Threat::Contested;
                    contested = true;
                }
                (Threat::Contested, Some(_)) => contested = true,
                _ => {}
            }
        }
        contested
    }

    /// Check whether handing over `piece` would let the opponent complete a
    /// threatened line.
    pub fn forbids(&self, piece: Piece) -> bool {
        self.0
            .iter()
            .enumerate()
            .any(|(i, t)| matches!(t, Threat::Needs(v) if piece.attribute(i) == *v))
    }
}

impl Default for Threats {
    fn default() -> Self {
        Self::NONE
    }
}

/// Result of statically evaluating a position.
#[derive(Clone, Copy, Debug)]
pub struct Evaluation {
    /// Positional score; `MAX_SCORE` means a completed winning line. The
    /// magnitude is only meaningful relative to `MAX_SCORE` and to sibling
    /// candidates in the same ply.
    pub score: i32,
    /// Winning-attribute vector for the next hand-off.
    pub threats: Threats,
}

/// Compute the attributes shared by all pieces in a line, and the piece count.
///
/// With a single piece the returned profile is that piece's own attributes;
/// the caller only scores profiles of lines holding at least two pieces.
fn line_profile(board: &Board, line: &[Cell; 4]) -> ([Option<bool>; NUM_ATTRIBUTES], u32) {
    let mut shared = [None; NUM_ATTRIBUTES];
    let mut count = 0u32;
    for &cell in line {
        let piece = match board.piece_at(cell) {
            Some(p) => p,
            None => continue,
        };
        if count == 0 {
            for (i, slot) in shared.iter_mut().enumerate() {
                *slot = Some(piece.attribute(i));
            }
        } else {
            for (i, slot) in shared.iter_mut().enumerate() {
                if *slot != Some(piece.attribute(i)) {
                    *slot = None;
                }
            }
        }
        count += 1;
    }
    (shared, count)
}

/// Statically evaluate a position.
///
/// Scans the 10 lines. A full line with a shared attribute saturates to
/// `MAX_SCORE` immediately. A 3-piece line with shared attributes records
/// them as threats; two contradictory 3-piece lines mark the slot contested
/// and add a large penalty instead of the positional term. Otherwise each
/// line holding 2 or more pieces adds `2^pieces × shared_attribute_count`.
pub fn evaluate(board: &Board) -> Evaluation {
    let mut score = 0i32;
    let mut threats = Threats::NONE;

    for line in &LINES {
        let (shared, count) = line_profile(board, line);
        if count < 2 {
            continue;
        }
        let shared_count = shared.iter().filter(|s| s.is_some()).count() as i32;
        if shared_count == 0 {
            continue;
        }
        if count == 4 {
            return Evaluation {
                score: MAX_SCORE,
                threats,
            };
        }
        if count == 3 && threats.record(&shared) {
            score += CONTESTED_PENALTY;
            continue;
        }
        score += (1i32 << count) * shared_count;
    }

    Evaluation { score, threats }
}

/// Check if the position contains a completed winning line.
pub fn has_won(board: &Board) -> bool {
    evaluate(board).score == MAX_SCORE
}
