// src/store.rs
//! Player accounts, win/loss tallies and finished-game history, kept in one JSON file.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::game::GameReport;
use crate::model::WinReason;

pub const DEFAULT_STORE_FILENAME: &str = "xoudouqi_data.json";
pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 4;

lazy_static! {
    static ref USERNAME_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

// --- Records ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerAccount {
    pub username: String,
    /// PHC string carrying the algorithm, parameters and salt.
    password_hash: String,
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub created_at: DateTime<Local>,
    pub last_login: DateTime<Local>,
}

impl PlayerAccount {
    /// Percentage of played games that were won, 0 when nothing has been played yet.
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 { return 0.0; }
        f64::from(self.games_won) / f64::from(self.games_played) * 100.0
    }

    fn password_matches(&self, password: &str) -> bool {
        match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                warn!(username = %self.username, error = %e, "stored password hash is unreadable");
                false
            }
        }
    }
}

impl fmt::Display for PlayerAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player: {} | Games: {} | Won: {} | Lost: {} | Win Rate: {:.1}%",
            self.username, self.games_played, self.games_won, self.games_lost, self.win_rate())
    }
}

/// How a recorded game ended.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameResultKind { Win, Forfeit }

impl From<WinReason> for GameResultKind {
    fn from(reason: WinReason) -> Self {
        match reason {
            WinReason::Forfeit => GameResultKind::Forfeit,
            WinReason::Sanctuary | WinReason::Elimination => GameResultKind::Win,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameHistory {
    pub id: u32,
    pub player1: String,
    pub player2: String,
    pub winner: Option<String>,
    pub total_moves: usize,
    pub started_at: DateTime<Local>,
    pub ended_at: Option<DateTime<Local>>,
    pub result: Option<GameResultKind>,
}

impl fmt::Display for GameHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self.result {
            Some(GameResultKind::Win) => "WIN",
            Some(GameResultKind::Forfeit) => "FORFEIT",
            None => "UNFINISHED",
        };
        write!(f, "Game: {} vs {} | Winner: {} | Moves: {} | Result: {}",
            self.player1, self.player2, self.winner.as_deref().unwrap_or("-"), self.total_moves, result)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    players: Vec<PlayerAccount>,
    games: Vec<GameHistory>,
    next_game_id: u32,
}

// --- Store ---

#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    data: StoreData,
}

impl Store {
    /// Loads the store at `path`. A missing file starts an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(StoreError::Io(path.display().to_string(), e)),
        };
        Ok(Store { path, data })
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Writes the whole store back to its file as pretty-printed JSON.
    pub fn save(&self) -> Result<(), StoreError> {
        let json_data = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, json_data)
            .map_err(|e| StoreError::Io(self.path.display().to_string(), e))
    }

    pub fn create_player(&mut self, username: &str, password: &str) -> Result<(), StoreError> {
        if username.len() < MIN_USERNAME_LEN || !USERNAME_PATTERN.is_match(username) {
            return Err(StoreError::InvalidUsername(MIN_USERNAME_LEN));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(StoreError::InvalidPassword(MIN_PASSWORD_LEN));
        }
        if self.find(username).is_some() {
            return Err(StoreError::UsernameTaken(username.to_string()));
        }
        let password_hash = hash_password(password)?;
        let now = Local::now();
        self.data.players.push(PlayerAccount {
            username: username.to_string(),
            password_hash,
            games_played: 0,
            games_won: 0,
            games_lost: 0,
            created_at: now,
            last_login: now,
        });
        info!(username, "account created");
        self.save()
    }

    /// Checks credentials and stamps the login time. `None` for unknown users or wrong passwords.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<Option<PlayerAccount>, StoreError> {
        let Some(account) = self.data.players.iter_mut().find(|p| p.username == username) else {
            warn!(username, "login for unknown user");
            return Ok(None);
        };
        if !account.password_matches(password) {
            warn!(username, "wrong password");
            return Ok(None);
        }
        account.last_login = Local::now();
        let account = account.clone();
        info!(username, "player logged in");
        self.save()?;
        Ok(Some(account))
    }

    pub fn find(&self, username: &str) -> Option<&PlayerAccount> {
        self.data.players.iter().find(|p| p.username == username)
    }

    pub fn update_player_stats(&mut self, username: &str, won: bool) -> Result<(), StoreError> {
        let account = self.data.players.iter_mut().find(|p| p.username == username)
            .ok_or_else(|| StoreError::UnknownPlayer(username.to_string()))?;
        account.games_played += 1;
        if won { account.games_won += 1; } else { account.games_lost += 1; }
        Ok(())
    }

    /// All players, most wins first, ties broken by games played.
    pub fn rankings(&self) -> Vec<&PlayerAccount> {
        let mut players: Vec<&PlayerAccount> = self.data.players.iter().collect();
        players.sort_by(|a, b| b.games_won.cmp(&a.games_won).then(b.games_played.cmp(&a.games_played)));
        players
    }

    /// Opens a history entry for a game between two accounts and returns its id.
    pub fn create_game_history(&mut self, player1: &str, player2: &str) -> Result<u32, StoreError> {
        self.data.next_game_id += 1;
        let id = self.data.next_game_id;
        self.data.games.push(GameHistory {
            id,
            player1: player1.to_string(),
            player2: player2.to_string(),
            winner: None,
            total_moves: 0,
            started_at: Local::now(),
            ended_at: None,
            result: None,
        });
        self.save()?;
        Ok(id)
    }

    pub fn end_game(&mut self, id: u32, winner: Option<&str>, result: GameResultKind, total_moves: usize) -> Result<(), StoreError> {
        let game = self.data.games.iter_mut().find(|g| g.id == id)
            .ok_or(StoreError::UnknownGame(id))?;
        game.winner = winner.map(str::to_string);
        game.result = Some(result);
        game.total_moves = total_moves;
        game.ended_at = Some(Local::now());
        self.save()
    }

    /// Applies a finished game: both players' tallies and the history entry, saved together.
    /// Nothing changes unless both accounts and the history entry exist.
    pub fn record_report(&mut self, report: &GameReport) -> Result<(), StoreError> {
        for username in [&report.winner, &report.loser] {
            if self.find(username).is_none() {
                return Err(StoreError::UnknownPlayer(username.clone()));
            }
        }
        if !self.data.games.iter().any(|g| g.id == report.history_id) {
            return Err(StoreError::UnknownGame(report.history_id));
        }
        self.update_player_stats(&report.winner, true)?;
        self.update_player_stats(&report.loser, false)?;
        self.end_game(report.history_id, Some(&report.winner), report.reason.into(), report.total_moves)?;
        info!(winner = %report.winner, loser = %report.loser, moves = report.total_moves, "game recorded");
        Ok(())
    }

    /// A player's games, newest first.
    pub fn player_game_history(&self, username: &str, limit: usize) -> Vec<&GameHistory> {
        self.data.games.iter()
            .rev()
            .filter(|g| g.player1 == username || g.player2 == username)
            .take(limit)
            .collect()
    }
}

fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static NEXT_FILE: AtomicU32 = AtomicU32::new(0);

    /// A store backed by a fresh temp file, removed on drop.
    struct TempStore {
        store: Store,
    }

    impl TempStore {
        fn new() -> Self {
            let n = NEXT_FILE.fetch_add(1, Ordering::SeqCst);
            let path = std::env::temp_dir().join(format!("xoudouqi-test-{}-{}.json", std::process::id(), n));
            let _ = fs::remove_file(&path);
            TempStore { store: Store::open(&path).unwrap() }
        }
    }

    impl Drop for TempStore {
        fn drop(&mut self) {
            let _ = fs::remove_file(self.store.path());
        }
    }

    #[test]
    fn accounts_are_validated() {
        let mut t = TempStore::new();
        assert!(matches!(t.store.create_player("ab", "secret"), Err(StoreError::InvalidUsername(3))));
        assert!(matches!(t.store.create_player("bad name", "secret"), Err(StoreError::InvalidUsername(3))));
        assert!(matches!(t.store.create_player("alice", "abc"), Err(StoreError::InvalidPassword(4))));
        t.store.create_player("alice", "secret").unwrap();
        assert!(matches!(t.store.create_player("alice", "other"), Err(StoreError::UsernameTaken(_))));
    }

    #[test]
    fn passwords_are_salted_and_checked() {
        let mut t = TempStore::new();
        t.store.create_player("alice", "secret").unwrap();
        t.store.create_player("bob", "secret").unwrap();
        let (alice, bob) = (t.store.find("alice").unwrap(), t.store.find("bob").unwrap());
        assert!(alice.password_hash.starts_with("$argon2"));
        assert!(!alice.password_hash.contains("secret"));
        // same password, different salts
        assert_ne!(alice.password_hash, bob.password_hash);

        assert!(t.store.authenticate("alice", "wrong").unwrap().is_none());
        assert!(t.store.authenticate("carol", "secret").unwrap().is_none());
        let account = t.store.authenticate("alice", "secret").unwrap().unwrap();
        assert_eq!(account.username, "alice");
    }

    #[test]
    fn stats_and_rankings() {
        let mut t = TempStore::new();
        for name in ["alice", "bob", "carol"] {
            t.store.create_player(name, "secret").unwrap();
        }
        t.store.update_player_stats("bob", true).unwrap();
        t.store.update_player_stats("bob", false).unwrap();
        t.store.update_player_stats("carol", true).unwrap();
        t.store.update_player_stats("alice", false).unwrap();
        assert!(matches!(t.store.update_player_stats("dave", true), Err(StoreError::UnknownPlayer(_))));

        let order: Vec<&str> = t.store.rankings().iter().map(|p| p.username.as_str()).collect();
        assert_eq!(order, ["bob", "carol", "alice"]);

        let bob = t.store.find("bob").unwrap();
        assert_eq!((bob.games_played, bob.games_won, bob.games_lost), (2, 1, 1));
        assert_eq!(bob.win_rate(), 50.0);
        assert_eq!(t.store.find("alice").unwrap().win_rate(), 0.0);
        assert_eq!(bob.to_string(), "Player: bob | Games: 2 | Won: 1 | Lost: 1 | Win Rate: 50.0%");
    }

    #[test]
    fn report_updates_both_players_and_history() {
        let mut t = TempStore::new();
        t.store.create_player("alice", "secret").unwrap();
        t.store.create_player("bob", "secret").unwrap();
        let id = t.store.create_game_history("alice", "bob").unwrap();
        t.store.record_report(&GameReport {
            history_id: id,
            winner: "bob".to_string(),
            loser: "alice".to_string(),
            reason: WinReason::Sanctuary,
            total_moves: 31,
        }).unwrap();

        let games = t.store.player_game_history("alice", 10);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].winner.as_deref(), Some("bob"));
        assert_eq!(games[0].result, Some(GameResultKind::Win));
        assert!(games[0].ended_at.is_some());
        assert_eq!(games[0].to_string(), "Game: alice vs bob | Winner: bob | Moves: 31 | Result: WIN");
        assert_eq!(t.store.find("bob").unwrap().games_won, 1);
        assert_eq!(t.store.find("alice").unwrap().games_lost, 1);
        assert!(matches!(t.store.end_game(99, None, GameResultKind::Forfeit, 0), Err(StoreError::UnknownGame(99))));
    }

    #[test]
    fn failed_report_changes_nothing() {
        let mut t = TempStore::new();
        t.store.create_player("alice", "secret").unwrap();
        t.store.create_player("bob", "secret").unwrap();
        let id = t.store.create_game_history("alice", "ghost").unwrap();
        let result = t.store.record_report(&GameReport {
            history_id: id,
            winner: "alice".to_string(),
            loser: "ghost".to_string(),
            reason: WinReason::Sanctuary,
            total_moves: 12,
        });
        assert!(matches!(result, Err(StoreError::UnknownPlayer(name)) if name == "ghost"));

        let missing_game = t.store.record_report(&GameReport {
            history_id: 99,
            winner: "alice".to_string(),
            loser: "bob".to_string(),
            reason: WinReason::Forfeit,
            total_moves: 3,
        });
        assert!(matches!(missing_game, Err(StoreError::UnknownGame(99))));

        // a later save must not carry any half-applied tallies to disk
        t.store.create_game_history("alice", "bob").unwrap();
        let reopened = Store::open(t.store.path()).unwrap();
        for name in ["alice", "bob"] {
            let account = reopened.find(name).unwrap();
            assert_eq!((account.games_played, account.games_won, account.games_lost), (0, 0, 0), "{name}");
        }
        assert!(reopened.player_game_history("alice", 10).iter().all(|g| g.result.is_none()));
    }

    #[test]
    fn unreadable_hash_never_authenticates() {
        let mut t = TempStore::new();
        t.store.create_player("alice", "secret").unwrap();
        t.store.data.players[0].password_hash = "not-a-phc-string".to_string();
        assert!(t.store.authenticate("alice", "secret").unwrap().is_none());
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let mut t = TempStore::new();
        let first = t.store.create_game_history("alice", "bob").unwrap();
        let _other = t.store.create_game_history("carol", "dave").unwrap();
        let second = t.store.create_game_history("bob", "alice").unwrap();
        let third = t.store.create_game_history("alice", "carol").unwrap();

        let ids: Vec<u32> = t.store.player_game_history("alice", 10).iter().map(|g| g.id).collect();
        assert_eq!(ids, [third, second, first]);
        assert_eq!(t.store.player_game_history("alice", 2).len(), 2);
        assert!(t.store.player_game_history("erin", 10).is_empty());
    }

    #[test]
    fn data_survives_reopen() {
        let mut t = TempStore::new();
        t.store.create_player("alice", "secret").unwrap();
        t.store.update_player_stats("alice", true).unwrap();
        let id = t.store.create_game_history("alice", "bob").unwrap();
        t.store.end_game(id, Some("alice"), GameResultKind::Forfeit, 4).unwrap();

        let mut reopened = Store::open(t.store.path()).unwrap();
        let alice = reopened.find("alice").unwrap();
        assert_eq!(alice.games_won, 1);
        assert_eq!(reopened.player_game_history("bob", 5)[0].result, Some(GameResultKind::Forfeit));
        assert!(reopened.authenticate("alice", "secret").unwrap().is_some());
        // ids keep counting after a reload
        assert_eq!(reopened.create_game_history("bob", "alice").unwrap(), id + 1);
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let t = TempStore::new();
        assert!(t.store.rankings().is_empty());
        assert!(!t.store.path().exists());
    }

    #[test]
    fn result_kind_serializes_in_caps() {
        assert_eq!(serde_json::to_string(&GameResultKind::Forfeit).unwrap(), "\"FORFEIT\"");
        assert_eq!(GameResultKind::from(WinReason::Elimination), GameResultKind::Win);
    }
}
