// src/game.rs
use chrono::{DateTime, Local};
use std::fmt;
use tracing::{debug, info};

use crate::board::{Board, Piece};
use crate::error::MoveError;
use crate::model::{parse_move_pair, AnimalType, Player, Position, WinReason};

// --- Move History ---

/// One applied move. Records are appended after the engine accepts a move and never change.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRecord {
    pub from: Position,
    pub to: Position,
    pub player: Player,
    pub piece: AnimalType,
    pub captured: Option<AnimalType>,
    pub timestamp: DateTime<Local>,
}

impl MoveRecord {
    pub fn is_capture(&self) -> bool { self.captured.is_some() }
}

impl fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}->{}", self.piece, self.from, self.to)?;
        if let Some(captured) = self.captured {
            write!(f, " (captures {})", captured)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub winner: Player,
    pub reason: WinReason,
}

impl GameResult {
    pub fn loser(&self) -> Player { self.winner.opponent() }
}

/// Account names bound to the two seats, plus the store's history entry for this game.
#[derive(Debug, Clone)]
struct Seats {
    player1: String,
    player2: String,
    history_id: u32,
}

/// What the turn layer hands to the statistics store when a seated game ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReport {
    pub history_id: u32,
    pub winner: String,
    pub loser: String,
    pub reason: WinReason,
    pub total_moves: usize,
}

// --- Game State ---

/// Turn sequencing on top of the board: whose move it is, the move history and the result.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    current_player: Player,
    history: Vec<MoveRecord>,
    result: Option<GameResult>,
    seats: Option<Seats>,
}

impl Default for Game {
    fn default() -> Self { Game::new() }
}

impl Game {
    /// A new game from the standard layout, player 1 to move.
    pub fn new() -> Self {
        Game::from_board(Board::new(), Player::Player1)
    }

    /// A game continuing from an arbitrary board.
    pub fn from_board(board: Board, to_move: Player) -> Self {
        Game { board, current_player: to_move, history: Vec::new(), result: None, seats: None }
    }

    pub fn set_players(&mut self, player1: &str, player2: &str, history_id: u32) {
        self.seats = Some(Seats { player1: player1.to_string(), player2: player2.to_string(), history_id });
    }

    pub fn board(&self) -> &Board { &self.board }
    pub fn current_player(&self) -> Player { self.current_player }
    pub fn history(&self) -> &[MoveRecord] { &self.history }
    pub fn result(&self) -> Option<GameResult> { self.result }
    pub fn is_over(&self) -> bool { self.result.is_some() }
    pub fn has_accounts(&self) -> bool { self.seats.is_some() }

    /// The account name in `player`'s seat, or the generic player name in quick play.
    pub fn player_name(&self, player: Player) -> String {
        match (&self.seats, player) {
            (Some(seats), Player::Player1) => seats.player1.clone(),
            (Some(seats), Player::Player2) => seats.player2.clone(),
            (None, _) => player.name().to_string(),
        }
    }

    pub fn current_player_name(&self) -> String {
        self.player_name(self.current_player)
    }

    pub fn winner_name(&self) -> Option<String> {
        self.result.map(|r| self.player_name(r.winner))
    }

    /// Validates and applies a move for the player whose turn it is, then either ends the game
    /// or passes the turn.
    pub fn make_move(&mut self, from: Position, to: Position) -> Result<&MoveRecord, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        self.board.check_move(from, to, self.current_player)?;

        let piece = self.board.piece_at(from).map(|p| p.kind())
            .ok_or(MoveError::Internal("validated move has no piece on its source square"))?;
        let captured = self.board.move_piece(from, to).map(|p| p.kind());
        let record = MoveRecord {
            from, to,
            player: self.current_player,
            piece,
            captured,
            timestamp: Local::now(),
        };
        debug!(player = ?record.player, mv = %record, "move applied");

        let idx = self.history.len();
        self.history.push(record);

        if let Some((winner, reason)) = self.board.win_condition() {
            info!(?winner, ?reason, moves = self.history.len(), "game over");
            self.result = Some(GameResult { winner, reason });
        } else {
            self.current_player = self.current_player.opponent();
        }
        Ok(&self.history[idx])
    }

    /// Applies a move written as two positions, e.g. "a3 a4".
    pub fn make_move_str(&mut self, input: &str) -> Result<&MoveRecord, MoveError> {
        let (from, to) = parse_move_pair(input)?;
        self.make_move(from, to)
    }

    /// The current player concedes. Does nothing once the game is over.
    pub fn forfeit(&mut self) -> Option<GameResult> {
        if self.is_over() {
            return None;
        }
        let result = GameResult { winner: self.current_player.opponent(), reason: WinReason::Forfeit };
        info!(loser = ?self.current_player, "player forfeited");
        self.result = Some(result);
        Some(result)
    }

    /// All legal moves for the player to move, empty once the game is over.
    pub fn valid_moves(&self) -> Vec<(Position, Position)> {
        if self.is_over() {
            return Vec::new();
        }
        self.board.legal_moves(self.current_player)
    }

    /// The current player's pieces that have at least one legal move.
    pub fn movable_pieces(&self) -> Vec<Piece> {
        if self.is_over() {
            return Vec::new();
        }
        let mut pieces: Vec<Piece> = self.board.pieces_of(self.current_player)
            .filter(|p| !self.board.legal_destinations(p.position(), self.current_player).is_empty())
            .copied()
            .collect();
        pieces.sort_by_key(|p| p.position().index());
        pieces
    }

    /// The terminal event for the store, once a game between two accounts has ended.
    pub fn report(&self) -> Option<GameReport> {
        let (seats, result) = (self.seats.as_ref()?, self.result?);
        Some(GameReport {
            history_id: seats.history_id,
            winner: self.player_name(result.winner),
            loser: self.player_name(result.loser()),
            reason: result.reason,
            total_moves: self.history.len(),
        })
    }

    pub fn summary(&self) -> String {
        let mut out = String::from("=== Game Summary ===\n");
        if self.has_accounts() {
            out.push_str(&format!("Player 1: {}\n", self.player_name(Player::Player1)));
            out.push_str(&format!("Player 2: {}\n", self.player_name(Player::Player2)));
        }
        out.push_str(&format!("Current Turn: {}\n", self.current_player_name()));
        out.push_str(&format!("Total Moves: {}\n", self.history.len()));
        match (self.result, self.winner_name()) {
            (Some(result), Some(name)) => {
                out.push_str("Game Status: ENDED\n");
                out.push_str(&format!("Winner: {} ({:?})\n", name, result.reason));
            }
            _ => out.push_str("Game Status: IN PROGRESS\n"),
        }
        out
    }
}
