// src/error.rs
use std::io;
use thiserror::Error;

use crate::rules::IllegalMove;

/// Rejections from the text encoding of positions and move pairs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid position '{0}': use a column a-g followed by a row 1-9 (e.g. 'c3')")]
    BadPosition(String),
    #[error("invalid move '{0}': expected two positions like 'a1 a2'")]
    BadMovePair(String),
}

/// Why the turn layer refused to apply a move.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("the game is already over")]
    GameOver,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("illegal move: {0}")]
    Illegal(#[from] IllegalMove),
    #[error("internal move logic error: {0}")]
    Internal(&'static str),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error with file '{0}': {1}")]
    Io(String, #[source] io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("username must be at least {0} characters of letters, digits or '_'")]
    InvalidUsername(usize),
    #[error("password must be at least {0} characters long")]
    InvalidPassword(usize),
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("no player named '{0}'")]
    UnknownPlayer(String),
    #[error("no game history with id {0}")]
    UnknownGame(u32),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'. Type 'help' for commands.")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Move(#[from] MoveError),
    #[error("data store error: {0}")]
    Store(#[from] StoreError),
    #[error("input/output error: {0}")]
    Io(#[from] io::Error),
}
