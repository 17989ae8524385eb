// src/console.rs
//! Text rendering for the terminal front end.
use crate::game::Game;
use crate::model::{AnimalType, Player, TerrainType};
use crate::store::{GameHistory, PlayerAccount};

pub const RECENT_MOVES_SHOWN: usize = 10;

fn rule(c: char, width: usize) -> String {
    std::iter::repeat(c).take(width).collect()
}

pub fn board(game: &Game) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n                XOU DOU QI BOARD\n{}\n", rule('=', 50), rule('=', 50)));
    out.push_str(&game.board().to_string());
    out.push_str(&rule('=', 50));
    out.push('\n');
    out.push_str(&legend());
    out
}

pub fn legend() -> String {
    let terrain: Vec<String> = [TerrainType::Normal, TerrainType::Water, TerrainType::Trap, TerrainType::Sanctuary]
        .iter()
        .map(|t| format!("{} = {}", t.symbol(), t.description()))
        .collect();
    let pieces: Vec<String> = AnimalType::ALL.iter().rev()
        .map(|a| format!("{}={}({})", a.letter(), a.name(), a.strength()))
        .collect();
    format!(
        "LEGEND:\nPieces: {}\n        {}\n        1=Player1, 2=Player2\nTerrain:\n  {}\n",
        pieces[..4].join(", "),
        pieces[4..].join(", "),
        terrain.join("\n  ")
    )
}

pub fn game_info(game: &Game) -> String {
    let board = game.board();
    format!(
        "{line}\nGAME INFORMATION\n{line}\nCurrent Player: {}\nMove Count: {}\n{}: {} pieces\n{}: {} pieces\nPieces on board: {}\n{line}\n",
        game.current_player_name(),
        game.history().len(),
        game.player_name(Player::Player1), board.count_pieces(Player::Player1),
        game.player_name(Player::Player2), board.count_pieces(Player::Player2),
        board.total_pieces(),
        line = rule('-', 30),
    )
}

/// The last `count` moves, numbered from the start of the game.
pub fn recent_moves(game: &Game, count: usize) -> String {
    let moves = game.history();
    if moves.is_empty() {
        return "No moves yet.\n".to_string();
    }
    let start = moves.len().saturating_sub(count);
    let mut out = format!("RECENT MOVES:\n{}\n", rule('-', 40));
    for (i, mv) in moves.iter().enumerate().skip(start) {
        out.push_str(&format!("{:>3}. {} [{}] {}\n", i + 1, game.player_name(mv.player), mv.timestamp.format("%H:%M:%S"), mv));
    }
    out
}

pub fn valid_moves(game: &Game) -> String {
    let moves = game.valid_moves();
    if moves.is_empty() {
        return "No valid moves.\n".to_string();
    }
    let mut out = format!("Valid moves for {} ({}):\n", game.current_player_name(), moves.len());
    for (from, to) in moves {
        let piece = game.board().piece_at(from).map(|p| p.kind().name()).unwrap_or("?");
        out.push_str(&format!("  {} {}  ({})\n", from, to, piece));
    }
    out
}

pub fn movable_pieces(game: &Game) -> String {
    let pieces = game.movable_pieces();
    if pieces.is_empty() {
        return "No movable pieces.\n".to_string();
    }
    let mut out = format!("Movable pieces for {}:\n", game.current_player_name());
    for piece in pieces {
        out.push_str(&format!("  {} {} at {}\n", piece, piece.kind().name(), piece.position()));
    }
    out
}

pub fn game_end(game: &Game) -> String {
    match (game.result(), game.winner_name()) {
        (Some(result), Some(name)) => format!("\n=== GAME OVER: {} wins by {:?} after {} moves. ===\n", name, result.reason, game.history().len()),
        _ => "\n=== Game ended without a winner. ===\n".to_string(),
    }
}

pub fn rankings(players: &[&PlayerAccount]) -> String {
    if players.is_empty() {
        return "No players found.\n".to_string();
    }
    let mut out = format!("{}\n                    PLAYER RANKINGS\n{}\n", rule('=', 60), rule('=', 60));
    out.push_str(&format!("{:<4} {:<15} {:<8} {:<6} {:<6} {:<8}\n", "Rank", "Username", "Games", "Won", "Lost", "Win Rate"));
    out.push_str(&rule('-', 60));
    out.push('\n');
    for (i, p) in players.iter().enumerate() {
        out.push_str(&format!("{:<4} {:<15} {:<8} {:<6} {:<6} {:.1}%\n",
            i + 1, p.username, p.games_played, p.games_won, p.games_lost, p.win_rate()));
    }
    out.push_str(&rule('=', 60));
    out.push('\n');
    out
}

pub fn game_history(username: &str, games: &[&GameHistory]) -> String {
    let mut out = format!("{}\nGAME HISTORY for {}\n{}\n", rule('=', 50), username, rule('=', 50));
    if games.is_empty() {
        out.push_str("No game history found.\n");
    }
    for game in games {
        out.push_str(&format!("{}\n", game));
    }
    out
}

pub fn help() -> &'static str {
    "\nAvailable Commands:
  move <from> <to>  Move a piece, e.g. 'move g3 g4' (columns a-g, rows 1-9).
  board             Show the board.
  info              Show whose turn it is and piece counts.
  moves             Show the last 10 moves.
  valid             List every legal move for the current player.
  pieces            List the current player's pieces that can move.
  history           Show the current player's recent games (accounts only).
  stats             Show both players' statistics (accounts only).
  forfeit           Concede the game (asks for confirmation).
  quit              Leave the game; an unfinished game is forfeited.
  help              Show this help message.
"
}
