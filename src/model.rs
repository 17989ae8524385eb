// src/model.rs
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

// --- Board Dimensions ---
pub const ROWS: usize = 9;
pub const COLS: usize = 7;
pub const SQUARE_COUNT: usize = ROWS * COLS;

lazy_static! {
    static ref POSITION_NOTATION: Regex = Regex::new(r"^([a-gA-G])([1-9])$").unwrap();
}

// --- Players ---
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Player { Player1, Player2 }

impl Player {
    pub const BOTH: [Player; 2] = [Player::Player1, Player::Player2];

    pub fn opponent(&self) -> Player {
        match self { Player::Player1 => Player::Player2, Player::Player2 => Player::Player1 }
    }
    pub fn name(&self) -> &'static str {
        match self { Player::Player1 => "Player 1", Player::Player2 => "Player 2" }
    }
    /// Digit appended to piece letters on the board ("E1", "R2").
    pub fn digit(&self) -> char {
        match self { Player::Player1 => '1', Player::Player2 => '2' }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a finished game was decided.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WinReason {
    /// A piece entered the opponent's sanctuary.
    Sanctuary,
    /// The opponent has no pieces left.
    Elimination,
    Forfeit,
}

// --- Positions ---

/// A square on the 9x7 board. Rows run 0..9 from player 1's home row, columns 0..7.
///
/// Coordinates are signed so that off-board positions can be represented and rejected by the
/// rule engine instead of failing at construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    row: i8,
    col: i8,
}

impl Position {
    pub const fn new(row: i8, col: i8) -> Self { Position { row, col } }

    pub fn row(&self) -> i8 { self.row }
    pub fn col(&self) -> i8 { self.col }

    pub fn is_valid(&self) -> bool {
        (0..ROWS as i8).contains(&self.row) && (0..COLS as i8).contains(&self.col)
    }

    /// Dense index `row * COLS + col`, or `None` when off the board.
    pub fn index(&self) -> Option<usize> {
        if self.is_valid() { Some(self.row as usize * COLS + self.col as usize) } else { None }
    }

    pub fn manhattan_distance(&self, other: Position) -> u16 {
        self.row.abs_diff(other.row) as u16 + self.col.abs_diff(other.col) as u16
    }

    /// Every square of the board, row by row.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..ROWS as i8).flat_map(|row| (0..COLS as i8).map(move |col| Position::new(row, col)))
    }

    /// Column letter followed by row digit, e.g. row 0 col 0 is "a1".
    pub fn to_notation(&self) -> Option<String> {
        if !self.is_valid() { return None; }
        let col_char = (b'a' + self.col as u8) as char;
        let row_char = (b'1' + self.row as u8) as char;
        Some(format!("{}{}", col_char, row_char))
    }
}

impl FromStr for Position {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = POSITION_NOTATION.captures(s)
            .ok_or_else(|| ParseError::BadPosition(s.to_string()))?;
        let col = caps[1].to_ascii_lowercase().as_bytes()[0] - b'a';
        let row = caps[2].as_bytes()[0] - b'1';
        Ok(Position::new(row as i8, col as i8))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_notation() {
            Some(notation) => f.write_str(&notation),
            None => write!(f, "({},{})", self.row, self.col),
        }
    }
}

/// Parses a move pair such as "a3 a4" into source and destination positions.
pub fn parse_move_pair(input: &str) -> Result<(Position, Position), ParseError> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(ParseError::BadMovePair(input.trim().to_string()));
    }
    Ok((parts[0].parse()?, parts[1].parse()?))
}

// --- Terrain ---
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TerrainType { Normal, Water, Trap, Sanctuary }

impl TerrainType {
    pub fn symbol(&self) -> &'static str {
        match self {
            TerrainType::Normal => "··",
            TerrainType::Water => "~~",
            TerrainType::Trap => "XX",
            TerrainType::Sanctuary => "##",
        }
    }
    pub fn description(&self) -> &'static str {
        match self {
            TerrainType::Normal => "Normal terrain",
            TerrainType::Water => "River - only certain animals can cross",
            TerrainType::Trap => "Trap - weakens enemy pieces",
            TerrainType::Sanctuary => "Sanctuary - pieces cannot be captured here",
        }
    }
}

// --- Animals ---

/// The eight ranks, declared weakest first so the derived ordering follows strength.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnimalType { Rat, Cat, Wolf, Dog, Panther, Tiger, Lion, Elephant }

impl AnimalType {
    pub const ALL: [AnimalType; 8] = [
        AnimalType::Rat, AnimalType::Cat, AnimalType::Wolf, AnimalType::Dog,
        AnimalType::Panther, AnimalType::Tiger, AnimalType::Lion, AnimalType::Elephant,
    ];

    pub fn strength(&self) -> u8 {
        match self {
            AnimalType::Rat => 1, AnimalType::Cat => 2, AnimalType::Wolf => 3, AnimalType::Dog => 4,
            AnimalType::Panther => 5, AnimalType::Tiger => 6, AnimalType::Lion => 7, AnimalType::Elephant => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnimalType::Rat => "Rat", AnimalType::Cat => "Cat", AnimalType::Wolf => "Wolf",
            AnimalType::Dog => "Dog", AnimalType::Panther => "Panther", AnimalType::Tiger => "Tiger",
            AnimalType::Lion => "Lion", AnimalType::Elephant => "Elephant",
        }
    }

    pub fn letter(&self) -> char {
        match self {
            AnimalType::Rat => 'R', AnimalType::Cat => 'C', AnimalType::Wolf => 'W',
            AnimalType::Dog => 'D', AnimalType::Panther => 'P', AnimalType::Tiger => 'T',
            AnimalType::Lion => 'L', AnimalType::Elephant => 'E',
        }
    }

    /// Lions and tigers may jump across a river.
    pub fn can_cross_water(&self) -> bool {
        matches!(self, AnimalType::Lion | AnimalType::Tiger)
    }

    /// Only the rat may enter water squares.
    pub fn can_swim_in_water(&self) -> bool {
        matches!(self, AnimalType::Rat)
    }

    /// Rank rule, ignoring terrain. The rat/elephant exception wins over strength in both directions.
    pub fn can_capture(&self, target: AnimalType) -> bool {
        match (self, target) {
            (AnimalType::Rat, AnimalType::Elephant) => true,
            (AnimalType::Elephant, AnimalType::Rat) => false,
            _ => self.strength() >= target.strength(),
        }
    }
}

impl fmt::Display for AnimalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notation_maps_a1_to_origin() {
        let pos: Position = "a1".parse().unwrap();
        assert_eq!(pos, Position::new(0, 0));
        assert_eq!(pos.to_notation().as_deref(), Some("a1"));

        let corner: Position = "G9".parse().unwrap();
        assert_eq!(corner, Position::new(8, 6));
        assert_eq!(corner.to_string(), "g9");
    }

    #[test]
    fn notation_covers_every_square() {
        for pos in Position::all() {
            let text = pos.to_notation().unwrap();
            assert_eq!(text.parse::<Position>().unwrap(), pos);
        }
        assert_eq!(Position::all().count(), SQUARE_COUNT);
    }

    #[test]
    fn malformed_notation_is_rejected() {
        for bad in ["", "a", "h1", "a0", "a10", "1a", "aa", " a1", "a1 "] {
            assert_eq!(bad.parse::<Position>(), Err(ParseError::BadPosition(bad.to_string())), "{bad:?}");
        }
    }

    #[test]
    fn off_board_positions_have_no_index_or_notation() {
        assert!(Position::new(-1, 0).index().is_none());
        assert!(Position::new(0, 7).to_notation().is_none());
        assert_eq!(Position::new(9, 0).to_string(), "(9,0)");
        assert_eq!(Position::new(8, 6).index(), Some(62));
    }

    #[test]
    fn move_pair_needs_exactly_two_positions() {
        assert_eq!(parse_move_pair("a3  a4"), Ok((Position::new(2, 0), Position::new(3, 0))));
        assert_eq!(parse_move_pair("a3"), Err(ParseError::BadMovePair("a3".to_string())));
        assert_eq!(parse_move_pair("a3 a4 a5"), Err(ParseError::BadMovePair("a3 a4 a5".to_string())));
        assert_eq!(parse_move_pair("a3 z4"), Err(ParseError::BadPosition("z4".to_string())));
    }

    #[test]
    fn rank_rule_follows_strength_between_ordinary_animals() {
        for attacker in AnimalType::ALL {
            for defender in AnimalType::ALL {
                let expected = match (attacker, defender) {
                    (AnimalType::Rat, AnimalType::Elephant) => true,
                    (AnimalType::Elephant, AnimalType::Rat) => false,
                    _ => attacker.strength() >= defender.strength(),
                };
                assert_eq!(attacker.can_capture(defender), expected, "{attacker} vs {defender}");
            }
        }
    }

    #[test]
    fn rat_and_elephant_exception() {
        assert!(AnimalType::Rat.can_capture(AnimalType::Elephant));
        assert!(!AnimalType::Elephant.can_capture(AnimalType::Rat));
        assert!(!AnimalType::Cat.can_capture(AnimalType::Elephant));
        assert!(AnimalType::Elephant.can_capture(AnimalType::Elephant));
    }

    #[test]
    fn water_capabilities() {
        let crossers: Vec<_> = AnimalType::ALL.iter().filter(|a| a.can_cross_water()).collect();
        let swimmers: Vec<_> = AnimalType::ALL.iter().filter(|a| a.can_swim_in_water()).collect();
        assert_eq!(crossers, [&AnimalType::Tiger, &AnimalType::Lion]);
        assert_eq!(swimmers, [&AnimalType::Rat]);
    }

    #[test]
    fn strengths_ascend_one_to_eight() {
        let strengths: Vec<u8> = AnimalType::ALL.iter().map(|a| a.strength()).collect();
        assert_eq!(strengths, (1..=8).collect::<Vec<u8>>());
    }
}
