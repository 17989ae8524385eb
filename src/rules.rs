// src/rules.rs
//! Move legality, capture arbitration and win detection over a [`Board`].
//!
//! Everything here is a pure function of the board and its inputs; the only mutation is
//! [`Board::move_piece`], which callers apply after a successful check.
use thiserror::Error;

use crate::board::{Board, Piece, PLAYER1_SANCTUARY, PLAYER2_SANCTUARY};
use crate::model::{Player, Position, TerrainType, WinReason};

/// Why a proposed move was refused.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum IllegalMove {
    #[error("{0} is off the board")]
    OutOfBounds(Position),
    #[error("a piece must move to a different square")]
    SameSquare,
    #[error("there is no piece on {0}")]
    NoPiece(Position),
    #[error("the piece on {0} belongs to the other player")]
    NotYourPiece(Position),
    #[error("pieces move one square orthogonally; only lions and tigers jump straight across water")]
    BadShape,
    #[error("only the rat can enter water")]
    CannotSwim,
    #[error("you cannot capture your own piece")]
    OwnPiece,
    #[error("a piece in its sanctuary cannot be captured")]
    SanctuaryImmune,
    #[error("a {attacker} cannot capture a {defender}")]
    Outranked { attacker: &'static str, defender: &'static str },
}

/// The shape of a legal move.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MoveKind {
    /// One square up, down, left or right.
    Step,
    /// A lion or tiger crossing an unbroken run of empty water.
    Jump,
}

impl Board {
    /// Total legality predicate: never fails, off-board input is simply illegal.
    pub fn is_valid_move(&self, from: Position, to: Position, player: Player) -> bool {
        self.check_move(from, to, player).is_ok()
    }

    /// Classifies `from -> to` for `player`, reporting the first rule it breaks.
    pub fn check_move(&self, from: Position, to: Position, player: Player) -> Result<MoveKind, IllegalMove> {
        for pos in [from, to] {
            if !pos.is_valid() { return Err(IllegalMove::OutOfBounds(pos)); }
        }
        if from == to { return Err(IllegalMove::SameSquare); }

        let piece = self.piece_at(from).ok_or(IllegalMove::NoPiece(from))?;
        if piece.owner() != player { return Err(IllegalMove::NotYourPiece(from)); }

        let kind = if from.manhattan_distance(to) == 1 {
            MoveKind::Step
        } else if piece.kind().can_cross_water() && self.is_clear_water_path(from, to) {
            MoveKind::Jump
        } else {
            return Err(IllegalMove::BadShape);
        };

        let to_terrain = self.terrain_at(to).ok_or(IllegalMove::OutOfBounds(to))?;
        if to_terrain == TerrainType::Water && !piece.kind().can_swim_in_water() {
            return Err(IllegalMove::CannotSwim);
        }

        if let Some(target) = self.piece_at(to) {
            if target.owner() == player { return Err(IllegalMove::OwnPiece); }
            if to_terrain == TerrainType::Sanctuary { return Err(IllegalMove::SanctuaryImmune); }
            if !self.can_capture_piece(piece, target) {
                return Err(IllegalMove::Outranked { attacker: piece.kind().name(), defender: target.kind().name() });
            }
        }
        Ok(kind)
    }

    /// True when `from` and `to` share a row or column and every square strictly between them is
    /// empty water.
    fn is_clear_water_path(&self, from: Position, to: Position) -> bool {
        let between: Vec<Position> = if from.row() == to.row() {
            let (lo, hi) = (from.col().min(to.col()), from.col().max(to.col()));
            (lo + 1..hi).map(|col| Position::new(from.row(), col)).collect()
        } else if from.col() == to.col() {
            let (lo, hi) = (from.row().min(to.row()), from.row().max(to.row()));
            (lo + 1..hi).map(|row| Position::new(row, from.col())).collect()
        } else {
            return false;
        };
        between.iter().all(|&pos| {
            self.terrain_at(pos) == Some(TerrainType::Water) && self.piece_at(pos).is_none()
        })
    }

    /// A defender standing on a trap can be taken by any opponent; otherwise the rank rule decides.
    fn can_capture_piece(&self, attacker: &Piece, defender: &Piece) -> bool {
        if self.terrain_at(defender.position()) == Some(TerrainType::Trap) && defender.owner() != attacker.owner() {
            return true;
        }
        attacker.kind().can_capture(defender.kind())
    }

    // --- Win Detection ---

    /// The winner and how they won, if the game is over.
    ///
    /// Each player wins by entering the sanctuary on the *opponent's* home row. Sanctuary wins
    /// are checked before elimination.
    pub fn win_condition(&self) -> Option<(Player, WinReason)> {
        let occupant = |pos: Position| self.piece_at(pos).map(|p| p.owner());
        if occupant(PLAYER2_SANCTUARY) == Some(Player::Player1) {
            return Some((Player::Player1, WinReason::Sanctuary));
        }
        if occupant(PLAYER1_SANCTUARY) == Some(Player::Player2) {
            return Some((Player::Player2, WinReason::Sanctuary));
        }
        if self.count_pieces(Player::Player1) == 0 {
            return Some((Player::Player2, WinReason::Elimination));
        }
        if self.count_pieces(Player::Player2) == 0 {
            return Some((Player::Player1, WinReason::Elimination));
        }
        None
    }

    pub fn has_winner(&self) -> bool {
        self.win_condition().is_some()
    }

    pub fn winner(&self) -> Option<Player> {
        self.win_condition().map(|(player, _)| player)
    }

    // --- Move Enumeration ---

    /// Every legal destination for the piece on `from`, by trying all squares.
    pub fn legal_destinations(&self, from: Position, player: Player) -> Vec<Position> {
        Position::all().filter(|&to| self.is_valid_move(from, to, player)).collect()
    }

    /// Every legal `(from, to)` pair for `player`, sorted by source then destination square.
    pub fn legal_moves(&self, player: Player) -> Vec<(Position, Position)> {
        let mut sources: Vec<Position> = self.pieces_of(player).map(|p| p.position()).collect();
        sources.sort_by_key(|p| p.index());
        sources.into_iter()
            .flat_map(|from| self.legal_destinations(from, player).into_iter().map(move |to| (from, to)))
            .collect()
    }
}
