#[cfg(test)]
pub mod test {
    use anyhow::Result;
    use std::collections::hash_map::Entry;
    use std::collections::HashMap;

    use crate::transposition_table::TABLE_SIZE;
    use crate::{BitBoard, Solver, TranspositionTable, HEIGHT, WIDTH};

    #[test]
    pub fn playable_tracks_column_capacity() -> Result<()> {
        let board = BitBoard::new();
        for column in 0..WIDTH {
            assert!(board.playable(column));
        }

        let board = BitBoard::from_moves("111111")?;
        assert!(!board.playable(0));
        for column in 1..WIDTH {
            assert!(board.playable(column));
        }
        assert_eq!(board.num_moves(), HEIGHT);
        Ok(())
    }

    #[test]
    pub fn occupancy_matches_move_count() -> Result<()> {
        for &moves in ["44", "112233", "436675553"].iter() {
            let board = BitBoard::from_moves(moves)?;
            assert_eq!(board.num_moves(), moves.len());
            assert_eq!(board.board_mask().count_ones() as usize, moves.len());
        }
        Ok(())
    }

    #[test]
    pub fn from_moves_rejects_invalid_input() {
        // unparseable character
        assert!(BitBoard::from_moves("12x").is_err());
        // column out of range
        assert!(BitBoard::from_moves("8").is_err());
        // seventh tile in a column
        assert!(BitBoard::from_moves("1111111").is_err());
        // the sequence plays on after a win
        assert!(BitBoard::from_moves("1122334").is_err());
    }

    #[test]
    pub fn from_slice_matches_from_moves() -> Result<()> {
        let board = BitBoard::from_slice(&[3, 3, 2, 4])?;
        assert_eq!(board.key(), BitBoard::from_moves("4435")?.key());

        // columns are 0-indexed here, so WIDTH is out of range
        assert!(BitBoard::from_slice(&[WIDTH]).is_err());
        Ok(())
    }

    #[test]
    pub fn key_is_unique_across_opening_positions() {
        // visit every legal sequence of up to 4 moves and check that no two
        // distinct positions ever share a key
        fn expand(board: BitBoard, depth: usize, seen: &mut HashMap<u64, (u64, u64)>) {
            let masks = (board.player_mask(), board.board_mask());
            match seen.entry(board.key()) {
                Entry::Occupied(entry) => assert_eq!(*entry.get(), masks),
                Entry::Vacant(entry) => {
                    entry.insert(masks);
                }
            }
            if depth == 0 {
                return;
            }
            for column in 0..WIDTH {
                if board.playable(column) {
                    let mut next = board;
                    next.play_column(column);
                    expand(next, depth - 1, seen);
                }
            }
        }

        let mut seen = HashMap::new();
        expand(BitBoard::new(), 4, &mut seen);
        assert!(seen.len() > 1000);
    }

    #[test]
    pub fn mirror_keys_reflect_positions() -> Result<()> {
        // "62524" plays the same game as "26364" reflected left to right
        let board = BitBoard::from_moves("26364")?;
        let mirrored = BitBoard::from_moves("62524")?;

        assert_eq!(board.mirror_key(), mirrored.key());
        assert_eq!(mirrored.mirror_key(), board.key());
        assert_ne!(board.key(), board.mirror_key());

        // a centre-symmetric position is its own reflection
        let symmetric = BitBoard::from_moves("4444")?;
        assert_eq!(symmetric.key(), symmetric.mirror_key());
        Ok(())
    }

    #[test]
    pub fn is_draw_only_on_a_full_board() -> Result<()> {
        let full = (0..WIDTH).fold(0, |mask, column| mask | BitBoard::column_mask(column));
        assert!(BitBoard::from_masks(0, full, WIDTH * HEIGHT).is_draw());

        assert!(!BitBoard::new().is_draw());
        assert!(!BitBoard::from_moves("4455")?.is_draw());
        Ok(())
    }

    #[test]
    pub fn winning_moves_are_detected() -> Result<()> {
        // three in a row on the bottom, the fourth column wins at once
        let board = BitBoard::from_moves("112233")?;
        assert!(board.can_win_next());
        assert!(board.is_winning_move(3));
        for &column in [0, 1, 2, 4, 5, 6].iter() {
            assert!(!board.is_winning_move(column));
        }

        // a vertical stack of three
        let board = BitBoard::from_moves("121212")?;
        assert!(board.is_winning_move(0));
        assert!(!board.is_winning_move(1));
        Ok(())
    }

    #[test]
    pub fn single_threat_forces_the_blocking_move() -> Result<()> {
        // the opponent owns three on the bottom row with one open end
        let board = BitBoard::from_moves("122334")?;
        assert!(!board.can_win_next());
        assert_eq!(board.non_losing_moves(), BitBoard::bottom_mask(4));
        Ok(())
    }

    #[test]
    pub fn double_threat_leaves_no_defence() -> Result<()> {
        // the opponent owns three on the bottom row with both ends open
        let board = BitBoard::from_moves("26364")?;
        assert!(!board.can_win_next());
        assert_eq!(board.non_losing_moves(), 0);

        // the opponent wins with their 5th tile whatever happens
        let mut solver = Solver::new();
        assert_eq!(solver.solve(&board), -18);
        assert!(solver.solve_weak(&board) < 0);
        Ok(())
    }

    #[test]
    pub fn immediate_win_scores_maximal() -> Result<()> {
        let board = BitBoard::from_moves("112233")?;
        let mut solver = Solver::new();

        // winning with the 4th tile is the best possible score
        assert_eq!(solver.solve(&board), 18);
        assert_eq!(Solver::score_to_win_distance(&board, 18), 1);

        // a score of 0 means the game runs to the last tile
        assert_eq!(
            Solver::score_to_win_distance(&BitBoard::from_moves("4455")?, 0),
            WIDTH * HEIGHT - 4
        );
        Ok(())
    }

    #[test]
    pub fn double_threat_is_forced_through() -> Result<()> {
        // the player to move can place a third tile on the bottom row with
        // both ends open, winning two moves later against any defence
        let board = BitBoard::from_moves("3346")?;
        let mut solver = Solver::new();

        assert_eq!(solver.solve(&board), 18);
        assert!(solver.node_count > 0);
        assert!(solver.solve_weak(&board) > 0);
        Ok(())
    }

    #[test]
    pub fn analysis_scores_every_column() -> Result<()> {
        // the player to move owns three on the bottom row with both ends
        // open, the opponent a vertical three in the last column
        let board = BitBoard::from_moves("273747")?;
        let mut solver = Solver::new();

        // columns 1 and 5 win at once; column 7 blocks the vertical threat
        // and leaves the opponent facing the double threat; everything else
        // loses to the vertical threat on the spot
        let scores = solver.analyze(&board);
        assert_eq!(
            scores,
            [
                Some(18),
                Some(-18),
                Some(-18),
                Some(-18),
                Some(18),
                Some(-18),
                Some(17)
            ]
        );

        // here the last column is full and the rest all lose to the double
        // threat on the bottom row
        let board = BitBoard::from_moves("273747777")?;
        solver.reset();
        let scores = solver.analyze(&board);
        for column in 0..WIDTH - 1 {
            assert_eq!(scores[column], Some(-16));
        }
        assert_eq!(scores[WIDTH - 1], None);
        Ok(())
    }

    #[test]
    pub fn best_column_score_matches_the_solve_value() -> Result<()> {
        // the value of a position is the value of its best move
        let mut solver = Solver::new();
        for &moves in ["273747", "273747777", "26364"].iter() {
            let board = BitBoard::from_moves(moves)?;
            let best = solver.analyze(&board).iter().flatten().max().copied();
            assert_eq!(best, Some(solver.solve(&board)));
            solver.reset();
        }
        Ok(())
    }

    #[test]
    pub fn analysis_of_mirrored_positions_is_mirrored() -> Result<()> {
        let board = BitBoard::from_moves("273747")?;
        let mirrored = BitBoard::from_moves("615141")?;

        let mut solver = Solver::new();
        let scores = solver.analyze(&board);
        solver.reset();
        let mirrored_scores = solver.analyze(&mirrored);

        for column in 0..WIDTH {
            assert_eq!(scores[column], mirrored_scores[WIDTH - 1 - column]);
        }
        Ok(())
    }

    #[test]
    pub fn weak_analysis_agrees_on_outcomes() -> Result<()> {
        let board = BitBoard::from_moves("273747")?;
        let mut solver = Solver::new();

        let strong = solver.analyze(&board);
        solver.reset();
        let weak = solver.analyze_weak(&board);

        for column in 0..WIDTH {
            let strong = strong[column].unwrap();
            let weak = weak[column].unwrap();
            assert_eq!(strong.signum(), weak.signum());
        }
        Ok(())
    }

    #[test]
    pub fn analysis_repeats_after_reset() -> Result<()> {
        let board = BitBoard::from_moves("273747")?;
        let mut solver = Solver::new();

        let first = solver.analyze(&board);
        solver.reset();
        assert_eq!(solver.node_count, 0);
        let second = solver.analyze(&board);

        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    pub fn solver_accepts_an_external_table() -> Result<()> {
        let board = BitBoard::from_moves("26364")?;
        let mut solver = Solver::new_with_transposition_table(TranspositionTable::new());
        assert_eq!(solver.solve(&board), -18);
        Ok(())
    }

    // solving from scratch takes a long time without any opening book, run
    // with `cargo test -- --ignored` to check the full game value
    #[test]
    #[ignore]
    pub fn full_search_from_empty_board() -> Result<()> {
        let mut solver = Solver::new();
        // the first player forces a win with their very last tile
        assert_eq!(solver.solve(&BitBoard::new()), 1);
        Ok(())
    }

    #[test]
    pub fn table_round_trips_values() {
        let mut table = TranspositionTable::new();
        assert_eq!(table.get(0xdead_beef), 0);

        table.put(0xdead_beef, 42);
        assert_eq!(table.get(0xdead_beef), 42);

        // a neighbouring key lands in a different slot
        table.put(0xdead_beef + 1, 7);
        assert_eq!(table.get(0xdead_beef), 42);
    }

    #[test]
    pub fn colliding_keys_overwrite_silently() {
        let mut table = TranspositionTable::new();
        let key = 12345;
        let collider = key + TABLE_SIZE as u64;

        table.put(key, 3);
        table.put(collider, 9);

        // the slot only answers to the newer key now
        assert_eq!(table.get(collider), 9);
        assert_eq!(table.get(key), 0);
    }

    #[test]
    pub fn reset_empties_the_table() {
        let mut table = TranspositionTable::new();
        table.put(98765, 11);
        table.reset();
        assert_eq!(table.get(98765), 0);
    }
}
