// src/main.rs
mod board;
mod console;
mod error;
mod game;
mod model;
mod rules;
mod store;

use clap::Parser;
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::CommandError;
use crate::game::{Game, MoveRecord};
use crate::model::{parse_move_pair, Player, Position};
use crate::store::{PlayerAccount, Store, DEFAULT_STORE_FILENAME};

// --- Constants ---
const MAX_LOGIN_ATTEMPTS: u32 = 3;
const HISTORY_SHOWN: usize = 10;

/// Two-player jungle chess (Xou Dou Qi) in the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// JSON file holding player accounts and game history.
    #[arg(long, default_value = DEFAULT_STORE_FILENAME)]
    store: PathBuf,
    /// Start a quick game without accounts, skipping the menu.
    #[arg(long)]
    quick: bool,
    /// Log filter directive, e.g. "debug" or "xoudouqi=trace". RUST_LOG takes precedence.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

// --- Input Parsing ---

#[derive(Debug, PartialEq, Eq)]
enum GameCommand {
    Move(Position, Position),
    Help, Board, Info, Moves, Valid, Pieces,
    History, Stats, Forfeit, Quit,
}

/// Parses one line typed during a game.
fn parse_game_command(input: &str) -> Result<GameCommand, CommandError> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command_word = parts.next().unwrap_or("").to_lowercase();
    let argument = parts.next().unwrap_or("").trim();

    let command = match command_word.as_str() {
        "move" => {
            if argument.is_empty() { return Err(CommandError::Usage("move <from> <to> (e.g., move a1 a2)")); }
            let (from, to) = parse_move_pair(argument)?;
            GameCommand::Move(from, to)
        }
        "help" | "?" => GameCommand::Help,
        "board" => GameCommand::Board,
        "info" => GameCommand::Info,
        "moves" => GameCommand::Moves,
        "valid" => GameCommand::Valid,
        "pieces" => GameCommand::Pieces,
        "history" => GameCommand::History,
        "stats" => GameCommand::Stats,
        "forfeit" => GameCommand::Forfeit,
        "quit" | "exit" => GameCommand::Quit,
        other => return Err(CommandError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

/// Prints `prompt` and reads one trimmed line. `None` on end of input.
fn prompt_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    match io::stdin().read_line(&mut line)? {
        0 => Ok(None),
        _ => Ok(Some(line.trim().to_string())),
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    Ok(matches!(prompt_line(prompt)?.map(|s| s.to_lowercase()).as_deref(), Some("y") | Some("yes")))
}

// --- Menus ---

fn create_account(store: &mut Store) -> Result<(), CommandError> {
    println!("\n{}\nCREATE NEW ACCOUNT\n{}", "-".repeat(30), "-".repeat(30));
    let Some(username) = prompt_line("Enter username: ")? else { return Ok(()) };
    let Some(password) = prompt_line("Enter password: ")? else { return Ok(()) };
    store.create_player(&username, &password)?;
    println!("Account created successfully for {}!", username);
    Ok(())
}

fn authenticate(store: &mut Store) -> Result<Option<PlayerAccount>, CommandError> {
    for attempt in 1..=MAX_LOGIN_ATTEMPTS {
        let Some(username) = prompt_line("Username: ")? else { return Ok(None) };
        let Some(password) = prompt_line("Password: ")? else { return Ok(None) };
        if let Some(account) = store.authenticate(&username, &password)? {
            return Ok(Some(account));
        }
        println!("Error: Invalid credentials. {} attempts remaining.", MAX_LOGIN_ATTEMPTS - attempt);
    }
    Ok(None)
}

fn login_and_play(store: &mut Store) -> Result<(), CommandError> {
    println!("\n{}\nPLAYER LOGIN\n{}", "-".repeat(30), "-".repeat(30));
    println!("Player 1 Login:");
    let Some(player1) = authenticate(store)? else {
        println!("Error: Login failed for Player 1.");
        return Ok(());
    };
    println!("Player 1 logged in: {}", player1.username);

    println!("\nPlayer 2 Login:");
    let Some(player2) = authenticate(store)? else {
        println!("Error: Login failed for Player 2.");
        return Ok(());
    };
    if player1.username == player2.username {
        println!("Error: Both players cannot use the same account.");
        return Ok(());
    }
    println!("Player 2 logged in: {}", player2.username);

    let history_id = store.create_game_history(&player1.username, &player2.username)?;
    let mut game = Game::new();
    game.set_players(&player1.username, &player2.username, history_id);
    play(&mut game, store)
}

fn show_player_stats(game: &Game, store: &Store) {
    println!("\n{}\nPLAYER STATISTICS\n{}", "=".repeat(50), "=".repeat(50));
    for player in Player::BOTH {
        let name = game.player_name(player);
        match store.find(&name) {
            Some(account) => println!("{}: {}", player, account),
            None => println!("{}: {} (no account)", player, name),
        }
    }
    println!("{}", "=".repeat(50));
}

// --- Game Loop ---

fn apply_move(game: &mut Game, from: Position, to: Position) -> Result<MoveRecord, CommandError> {
    Ok(game.make_move(from, to)?.clone())
}

fn play(game: &mut Game, store: &mut Store) -> Result<(), CommandError> {
    println!("{}", console::board(game));
    print!("{}", console::game_info(game));
    println!("{}", console::help());

    while !game.is_over() {
        let prompt = format!("\n{}'s turn. Enter command: ", game.current_player_name());
        let Some(input) = prompt_line(&prompt)? else {
            println!("\nEnd of input detected. Forfeiting the game.");
            game.forfeit();
            break;
        };
        if input.is_empty() { continue; }

        match parse_game_command(&input) {
            Ok(GameCommand::Move(from, to)) => match apply_move(game, from, to) {
                Ok(record) => {
                    println!("Move executed: {}", record);
                    if record.is_capture() {
                        println!("{} captured a piece!", game.player_name(record.player));
                    }
                    println!("{}", console::board(game));
                    print!("{}", console::game_info(game));
                }
                Err(e) => println!("Error: {}", e),
            },
            Ok(GameCommand::Help) => println!("{}", console::help()),
            Ok(GameCommand::Board) => println!("{}", console::board(game)),
            Ok(GameCommand::Info) => print!("{}", console::game_info(game)),
            Ok(GameCommand::Moves) => print!("{}", console::recent_moves(game, console::RECENT_MOVES_SHOWN)),
            Ok(GameCommand::Valid) => print!("{}", console::valid_moves(game)),
            Ok(GameCommand::Pieces) => print!("{}", console::movable_pieces(game)),
            Ok(GameCommand::History) => {
                if game.has_accounts() {
                    let name = game.current_player_name();
                    print!("{}", console::game_history(&name, &store.player_game_history(&name, HISTORY_SHOWN)));
                } else {
                    println!("History not available in quick play mode.");
                }
            }
            Ok(GameCommand::Stats) => {
                if game.has_accounts() {
                    show_player_stats(game, store);
                } else {
                    println!("Stats not available in quick play mode.");
                }
            }
            Ok(GameCommand::Forfeit) => {
                if confirm("Are you sure you want to forfeit? (yes/no): ")? {
                    let name = game.current_player_name();
                    game.forfeit();
                    println!("{} forfeited the game.", name);
                }
            }
            Ok(GameCommand::Quit) => {
                if confirm("Are you sure you want to quit the game? (yes/no): ")? {
                    game.forfeit();
                }
            }
            Err(e) => println!("Error: {}", e),
        }
    }

    print!("{}", console::game_end(game));
    println!("{}", console::board(game));
    print!("{}", game.summary());

    if let Some(report) = game.report() {
        store.record_report(&report)?;
        show_player_stats(game, store);
    }
    Ok(())
}

fn main_menu(store: &mut Store) -> Result<(), Box<dyn Error>> {
    loop {
        println!("\n{}\n              MAIN MENU\n{}", "=".repeat(40), "=".repeat(40));
        println!("1. Login and Play");
        println!("2. Create New Account");
        println!("3. View Player Rankings");
        println!("4. Quick Play (No Login)");
        println!("5. Exit");
        println!("{}", "=".repeat(40));

        let Some(choice) = prompt_line("Choose an option (1-5): ")? else {
            println!("\nEnd of input detected.");
            return Ok(());
        };
        let outcome = match choice.as_str() {
            "1" => login_and_play(store),
            "2" => create_account(store),
            "3" => { print!("{}", console::rankings(&store.rankings())); Ok(()) }
            "4" => {
                println!("Starting game without player accounts...");
                play(&mut Game::new(), store)
            }
            "5" => {
                println!("Thanks for playing Xou Dou Qi!");
                return Ok(());
            }
            _ => { println!("Error: Invalid choice. Please try again."); Ok(()) }
        };
        if let Err(e) = outcome {
            warn!(error = %e, "menu action failed");
            println!("Error: {}", e);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    println!("==============================");
    println!("|   Xou Dou Qi (Jungle Chess) |");
    println!("==============================");

    let mut store = Store::open(&cli.store)?;
    info!(path = %store.path().display(), "store opened");
    if cli.quick {
        play(&mut Game::new(), &mut store)?;
    } else {
        main_menu(&mut store)?;
    }

    println!("\nGame session finished.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MoveError, ParseError};
    use crate::rules::IllegalMove;

    fn pos(s: &str) -> Position { s.parse().unwrap() }

    #[test]
    fn parses_move_commands() {
        assert_eq!(parse_game_command("move g3 g4").unwrap(), GameCommand::Move(pos("g3"), pos("g4")));
        assert_eq!(parse_game_command("  MOVE  G3   g4 ").unwrap(), GameCommand::Move(pos("g3"), pos("g4")));
    }

    #[test]
    fn rejects_malformed_moves() {
        assert!(matches!(parse_game_command("move"), Err(CommandError::Usage(_))));
        assert!(matches!(parse_game_command("move g3"), Err(CommandError::Parse(ParseError::BadMovePair(_)))));
        assert!(matches!(parse_game_command("move h1 a1"), Err(CommandError::Parse(ParseError::BadPosition(_)))));
        assert!(matches!(parse_game_command("move a0 a1"), Err(CommandError::Parse(ParseError::BadPosition(_)))));
    }

    #[test]
    fn parses_plain_commands() {
        for (text, expected) in [
            ("help", GameCommand::Help), ("?", GameCommand::Help), ("board", GameCommand::Board),
            ("info", GameCommand::Info), ("moves", GameCommand::Moves), ("valid", GameCommand::Valid),
            ("pieces", GameCommand::Pieces), ("history", GameCommand::History), ("stats", GameCommand::Stats),
            ("Forfeit", GameCommand::Forfeit), ("quit", GameCommand::Quit), ("exit", GameCommand::Quit),
        ] {
            assert_eq!(parse_game_command(text).unwrap(), expected, "{text}");
        }
        assert!(matches!(parse_game_command("dance"), Err(CommandError::UnknownCommand(c)) if c == "dance"));
    }

    #[test]
    fn rejected_moves_surface_as_command_errors() {
        let mut game = Game::new();
        let err = apply_move(&mut game, pos("a7"), pos("a6")).unwrap_err();
        assert!(matches!(err, CommandError::Move(MoveError::Illegal(IllegalMove::NotYourPiece(_)))));
        assert_eq!(err.to_string(), "illegal move: the piece on a7 belongs to the other player");

        let record = apply_move(&mut game, pos("g3"), pos("g4")).unwrap();
        assert_eq!(record.to_string(), "Rat g3->g4");
        game.forfeit();
        assert!(matches!(apply_move(&mut game, pos("a7"), pos("a6")), Err(CommandError::Move(MoveError::GameOver))));
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["xoudouqi"]);
        assert_eq!(cli.store, PathBuf::from(DEFAULT_STORE_FILENAME));
        assert!(!cli.quick);
        assert_eq!(cli.log_level, "warn");

        let cli = Cli::parse_from(["xoudouqi", "--quick", "--store", "/tmp/x.json", "--log-level", "debug"]);
        assert!(cli.quick);
        assert_eq!(cli.store, PathBuf::from("/tmp/x.json"));
        assert_eq!(cli.log_level, "debug");
    }
}
