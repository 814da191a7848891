use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use std::cmp::Ordering;
use std::io::{stdin, stdout, Write};

use connect4_solver::solver::move_order;
use connect4_solver::*;

mod arrayboard;
use arrayboard::*;

enum PlayerInput {
    Column(usize),
    Analyse,
}

fn main() -> Result<()> {
    let stdin = stdin();

    println!("Welcome to Connect 4\n");

    let mut ai_players = (false, false);

    // choose AI control of player 1
    loop {
        let mut buffer = String::new();
        print!("Is player 1 AI controlled? y/n: ");
        stdout().flush().expect("failed to flush to stdout!");
        stdin.read_line(&mut buffer)?;
        match buffer.to_lowercase().chars().next() {
            Some(_letter @ 'y') => {
                ai_players.0 = true;
                break;
            }
            Some(_letter @ 'n') => break,
            _ => println!("Unknown answer given"),
        }
    }

    // choose AI control of player 2
    loop {
        let mut buffer = String::new();
        print!("Is player 2 AI controlled? y/n: ");
        stdout().flush().expect("failed to flush to stdout!");
        stdin.read_line(&mut buffer)?;
        match buffer.to_lowercase().chars().next() {
            Some(_letter @ 'y') => {
                ai_players.1 = true;
                break;
            }
            Some(_letter @ 'n') => break,
            _ => println!("Unknown answer given"),
        }
    }

    // keep the solver out here so its transposition table carries over
    // between the moves of a game
    let mut solver = Solver::new();

    loop {
        play_game(&mut solver, ai_players)?;

        // unrelated games should not share cached results
        solver.reset();

        let mut again = false;
        loop {
            let mut buffer = String::new();
            print!("Play again? y/n: ");
            stdout().flush().expect("failed to flush to stdout!");
            stdin.read_line(&mut buffer)?;
            match buffer.to_lowercase().chars().next() {
                Some(_letter @ 'y') => {
                    again = true;
                    break;
                }
                Some(_letter @ 'n') => break,
                _ => println!("Unknown answer given"),
            }
        }
        if !again {
            break;
        }
    }
    Ok(())
}

fn play_game(solver: &mut Solver, ai_players: (bool, bool)) -> Result<()> {
    let mut board = BitBoard::new();
    let mut view = ArrayBoard::new();
    let mut player_one = true;

    loop {
        view.display().expect("Failed to draw board!");

        let column = if (player_one && ai_players.0) || (!player_one && ai_players.1) {
            // slow down play if both players are AI
            if ai_players == (true, true) {
                std::thread::sleep(std::time::Duration::new(3, 0));
            }
            ai_move(solver, &board, player_one)
        } else {
            match read_move(&board)? {
                PlayerInput::Column(column) => column,
                PlayerInput::Analyse => {
                    show_analysis(solver, &board);
                    continue;
                }
            }
        };

        let winning = board.is_winning_move(column);
        board.play_column(column);
        view.drop_tile(column, player_one);

        if winning {
            view.display().expect("Failed to draw board!");
            println!("Player {} wins!", if player_one { 1 } else { 2 });
            break;
        }
        if board.is_draw() {
            view.display().expect("Failed to draw board!");
            println!("Draw!");
            break;
        }

        player_one = !player_one;
    }
    Ok(())
}

fn read_move(board: &BitBoard) -> Result<PlayerInput> {
    let stdin = stdin();
    loop {
        print!("Move input (1-{} or 'a' to analyse) > ", WIDTH);
        stdout().flush().expect("failed to flush to stdout!");

        let mut input_str = String::new();
        stdin.read_line(&mut input_str)?;
        let input = input_str.trim();

        if input.eq_ignore_ascii_case("a") {
            return Ok(PlayerInput::Analyse);
        }
        match input.parse::<usize>() {
            Ok(column @ 1..=WIDTH) => {
                if board.playable(column - 1) {
                    return Ok(PlayerInput::Column(column - 1));
                }
                println!("Invalid move, column {} full", column);
            }
            Ok(column) => println!(
                "Invalid move, column {} out of range. Columns must be between 1 and {}",
                column, WIDTH
            ),
            Err(_) => println!("could not parse '{}' as a valid move", input),
        }
    }
}

fn ai_move(solver: &mut Solver, board: &BitBoard, player_one: bool) -> usize {
    let spinner = thinking_spinner();
    let scores = solver.analyze(board);
    spinner.finish_and_clear();

    // pick the best column, preferring the centre on equal scores
    let mut best: Option<(usize, i32)> = None;
    for &column in move_order().iter() {
        if let Some(score) = scores[column] {
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((column, score));
            }
        }
    }
    // the game loop never asks for a move in a finished position, so at
    // least one column is playable
    let (column, score) = best.expect("no playable columns");

    let win_distance = Solver::score_to_win_distance(board, score);
    let move_string = if win_distance == 1 { "move" } else { "moves" };
    match score.cmp(&0) {
        Ordering::Greater => {
            let player = if player_one { 1 } else { 2 };
            println!(
                "Player {} can force a win in at most {} {}.",
                player, win_distance, move_string
            );
        }
        Ordering::Less => {
            let player = if player_one { 2 } else { 1 };
            println!(
                "Player {} can force a win in at most {} {}.",
                player, win_distance, move_string
            );
        }
        Ordering::Equal => {
            let player = if player_one { 1 } else { 2 };
            println!(
                "Player {} can at best force a draw, {} {} remaining",
                player, win_distance, move_string
            );
        }
    }
    println!("AI plays column {}", column + 1);

    column
}

fn show_analysis(solver: &mut Solver, board: &BitBoard) {
    let spinner = thinking_spinner();
    let scores = solver.analyze(board);
    spinner.finish_and_clear();

    // positive scores favour the player about to move
    println!("Column scores: ");
    for (column, score) in scores.iter().enumerate() {
        match score {
            Some(score) => println!("  {}: {:+}", column + 1, score),
            None => println!("  {}: full", column + 1),
        }
    }
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg} {elapsed}"));
    spinner.set_message("AI is thinking...");
    spinner.enable_steady_tick(100);
    spinner
}
