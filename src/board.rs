// src/board.rs
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::model::{AnimalType, Player, Position, TerrainType, COLS, ROWS, SQUARE_COUNT};

// --- Fixed Squares ---
/// Sanctuary on player 1's home row. Player 2 wins by entering it.
pub const PLAYER1_SANCTUARY: Position = Position::new(0, 3);
/// Sanctuary on player 2's home row. Player 1 wins by entering it.
pub const PLAYER2_SANCTUARY: Position = Position::new(8, 3);

const RIVER_ROWS: [i8; 3] = [3, 4, 5];
const RIVER_COLS: [i8; 4] = [1, 2, 4, 5];
const TRAPS: [Position; 6] = [
    Position::new(0, 2), Position::new(1, 3), Position::new(0, 4), // around player 1's sanctuary
    Position::new(8, 2), Position::new(7, 3), Position::new(8, 4), // around player 2's sanctuary
];

const STARTING_PIECES: [(AnimalType, Player, Position); 16] = [
    (AnimalType::Lion, Player::Player1, Position::new(0, 0)),
    (AnimalType::Tiger, Player::Player1, Position::new(0, 6)),
    (AnimalType::Dog, Player::Player1, Position::new(1, 1)),
    (AnimalType::Cat, Player::Player1, Position::new(1, 5)),
    (AnimalType::Elephant, Player::Player1, Position::new(2, 0)),
    (AnimalType::Wolf, Player::Player1, Position::new(2, 2)),
    (AnimalType::Panther, Player::Player1, Position::new(2, 4)),
    (AnimalType::Rat, Player::Player1, Position::new(2, 6)),
    (AnimalType::Tiger, Player::Player2, Position::new(8, 0)),
    (AnimalType::Lion, Player::Player2, Position::new(8, 6)),
    (AnimalType::Cat, Player::Player2, Position::new(7, 1)),
    (AnimalType::Dog, Player::Player2, Position::new(7, 5)),
    (AnimalType::Rat, Player::Player2, Position::new(6, 0)),
    (AnimalType::Panther, Player::Player2, Position::new(6, 2)),
    (AnimalType::Wolf, Player::Player2, Position::new(6, 4)),
    (AnimalType::Elephant, Player::Player2, Position::new(6, 6)),
];

lazy_static! {
    static ref TERRAIN_LAYOUT: [TerrainType; SQUARE_COUNT] = compute_terrain_layout();
}

fn compute_terrain_layout() -> [TerrainType; SQUARE_COUNT] {
    let mut layout = [TerrainType::Normal; SQUARE_COUNT];
    let mut set = |pos: Position, terrain: TerrainType| {
        if let Some(idx) = pos.index() { layout[idx] = terrain; }
    };
    for row in RIVER_ROWS {
        for col in RIVER_COLS {
            set(Position::new(row, col), TerrainType::Water);
        }
    }
    for trap in TRAPS {
        set(trap, TerrainType::Trap);
    }
    set(PLAYER1_SANCTUARY, TerrainType::Sanctuary);
    set(PLAYER2_SANCTUARY, TerrainType::Sanctuary);
    layout
}

// --- Pieces ---

/// A piece on the board. Its position is only ever changed by [`Board::move_piece`], so it always
/// matches the key the board stores it under.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    kind: AnimalType,
    owner: Player,
    position: Position,
}

impl Piece {
    pub fn kind(&self) -> AnimalType { self.kind }
    pub fn owner(&self) -> Player { self.owner }
    pub fn position(&self) -> Position { self.position }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.owner.digit())
    }
}

/// Why a setup placement was refused.
#[cfg(test)]
#[derive(Debug, PartialEq, Eq)]
pub enum PlacementError {
    OutOfBounds(Position),
    Occupied(Position),
}

// --- Board State ---

/// Terrain plus occupancy. Terrain is fixed when the board is built; occupancy changes only
/// through [`Board::move_piece`] once setup is done.
#[derive(Debug, Clone)]
pub struct Board {
    terrain: [TerrainType; SQUARE_COUNT],
    pieces: HashMap<Position, Piece>,
}

impl Default for Board {
    fn default() -> Self { Board::new() }
}

impl Board {
    /// The standard starting arrangement, 8 pieces per side.
    pub fn new() -> Self {
        let mut board = Board::empty();
        for (kind, owner, pos) in STARTING_PIECES {
            board.pieces.insert(pos, Piece { kind, owner, position: pos });
        }
        board
    }

    /// The standard terrain with no pieces, for building custom positions.
    pub fn empty() -> Self {
        Board { terrain: *TERRAIN_LAYOUT, pieces: HashMap::new() }
    }

    /// Setup only: puts a new piece on an empty square.
    #[cfg(test)]
    pub fn place(&mut self, kind: AnimalType, owner: Player, pos: Position) -> Result<(), PlacementError> {
        if !pos.is_valid() { return Err(PlacementError::OutOfBounds(pos)); }
        if self.pieces.contains_key(&pos) { return Err(PlacementError::Occupied(pos)); }
        self.pieces.insert(pos, Piece { kind, owner, position: pos });
        Ok(())
    }

    /// Setup only: takes a piece off the board.
    #[cfg(test)]
    pub fn remove(&mut self, pos: Position) -> Option<Piece> {
        self.pieces.remove(&pos)
    }

    /// Terrain at `pos`, or `None` when off the board.
    pub fn terrain_at(&self, pos: Position) -> Option<TerrainType> {
        pos.index().map(|idx| self.terrain[idx])
    }

    pub fn piece_at(&self, pos: Position) -> Option<&Piece> {
        self.pieces.get(&pos)
    }

    pub fn pieces_of(&self, player: Player) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces.values().filter(move |p| p.owner == player)
    }

    pub fn count_pieces(&self, player: Player) -> usize {
        self.pieces_of(player).count()
    }

    pub fn total_pieces(&self) -> usize {
        self.pieces.len()
    }

    /// Moves whatever stands on `from` to `to`, capturing any piece already on `to`.
    ///
    /// Performs no rule checks; callers validate with the rule engine first.
    ///
    /// # Panics
    /// If `from` is empty, which means the caller skipped validation.
    pub fn move_piece(&mut self, from: Position, to: Position) -> Option<Piece> {
        let Some(mut piece) = self.pieces.remove(&from) else {
            panic!("move_piece called with no piece on {}", from);
        };
        let captured = self.pieces.remove(&to);
        piece.position = to;
        self.pieces.insert(to, piece);
        debug!(piece = %piece, %from, %to, captured = ?captured.map(|c| c.kind), "piece moved");
        captured
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "    ")?;
        for col in 0..COLS {
            write!(f, " {}  ", (b'a' + col as u8) as char)?;
        }
        writeln!(f)?;
        for row in 0..ROWS as i8 {
            write!(f, " {}  ", row + 1)?;
            for col in 0..COLS as i8 {
                let pos = Position::new(row, col);
                match (self.piece_at(pos), self.terrain_at(pos)) {
                    (Some(piece), _) => write!(f, "[{}]", piece)?,
                    (None, Some(terrain)) => write!(f, " {}  ", terrain.symbol())?,
                    (None, None) => write!(f, " ??  ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
