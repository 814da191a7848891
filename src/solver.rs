//! An agent to solve the game of Connect 4

use crate::{bitboard::BitBoard, transposition_table::TranspositionTable, HEIGHT, WIDTH};

use std::cmp::Ordering;

/// The minimum possible score of a position
pub const MIN_SCORE: i32 = -((WIDTH * HEIGHT) as i32) / 2 + 3;
/// The maximum possible score of a position
pub const MAX_SCORE: i32 = ((WIDTH * HEIGHT) as i32 + 1) / 2 - 3;

struct MoveSorter {
    size: usize,
    // move bitmap, column and score
    moves: [(u64, usize, i32); WIDTH],
}

impl MoveSorter {
    pub fn new() -> Self {
        Self {
            size: 0,
            moves: [(0, 0, 0); WIDTH],
        }
    }
    pub fn push(&mut self, new_move: u64, column: usize, score: i32) {
        let mut pos = self.size;
        self.size += 1;
        while pos != 0 && self.moves[pos - 1].2 > score {
            self.moves[pos] = self.moves[pos - 1];
            pos -= 1;
        }
        self.moves[pos] = (new_move, column, score);
    }
}
impl Iterator for MoveSorter {
    type Item = (u64, usize);

    fn next(&mut self) -> Option<Self::Item> {
        match self.size {
            0 => None,
            _ => {
                self.size -= 1;
                Some((self.moves[self.size].0, self.moves[self.size].1))
            }
        }
    }
}

/// Returns a slice ordering the columns from the middle outwards, as
/// the middle columns are often better moves
pub const fn move_order() -> [usize; WIDTH] {
    let mut move_order = [0; WIDTH];
    let mut i = 0;
    while i < WIDTH {
        move_order[i] = (WIDTH / 2) + (i % 2) * (i / 2 + 1) - (1 - i % 2) * (i / 2);
        i += 1;
    }
    move_order
}

/// An agent to solve Connect 4 positions
///
/// # Notes
/// The solver uses a classical game tree search with various optimisations
/// to find the game-theoretic value of any position. Its transposition
/// table persists across calls, so scoring related positions in sequence
/// gets cheaper as the cache warms up
///
/// # Position Scoring
/// A position is scored by how far a forced win is from the end of the game
/// for either player. If the first player wins with their final placed tile
/// (their 21st tile on a 7x6 board) the score is 1, or -1 if the second
/// player wins with their final tile. Earlier wins have scores further from
/// 0, up to 18/-18 where a player wins with their 4th tile. A drawn position
/// has a score of 0
pub struct Solver {
    /// The number of nodes searched by this `Solver` so far (for diagnostics only)
    pub node_count: usize,
    transposition_table: TranspositionTable,
}

impl Solver {
    /// Creates a new `Solver` with an empty transposition table
    pub fn new() -> Self {
        Self {
            node_count: 0,
            transposition_table: TranspositionTable::new(),
        }
    }

    /// Creates a new `Solver` with a given transposition table
    pub fn new_with_transposition_table(transposition_table: TranspositionTable) -> Self {
        Self {
            node_count: 0,
            transposition_table,
        }
    }

    /// Forgets all cached search state, detaching the solver from any
    /// previously analysed game
    pub fn reset(&mut self) {
        self.transposition_table.reset();
        self.node_count = 0;
    }

    /// Performs the recursive game tree search
    ///
    /// Expects a position where the current player cannot win this move,
    /// and an open `alpha` < `beta` window. Returns the score of the
    /// position (see [Position Scoring])
    ///
    /// [Position Scoring]: #position-scoring
    fn negamax(&mut self, board: BitBoard, mut alpha: i32, mut beta: i32) -> i32 {
        debug_assert!(alpha < beta);
        debug_assert!(!board.can_win_next());
        self.node_count += 1;

        // look for moves that don't give the opponent a next turn win
        let non_losing_moves = board.non_losing_moves();
        if non_losing_moves == 0 {
            return -((WIDTH * HEIGHT) as i32 - board.num_moves() as i32) / 2;
        }

        // check for draw
        if board.num_moves() >= WIDTH * HEIGHT - 1 {
            return 0;
        }

        // lower bound of score, as the opponent cannot win on their next move
        let min = -(((WIDTH * HEIGHT - 2) as i32 - board.num_moves() as i32) / 2);
        if alpha < min {
            // clamp alpha to calculated lower bound
            alpha = min;
            // if the lower bound is higher than beta, we can prune the exploration
            if alpha >= beta {
                return alpha;
            }
        }

        // upper bound of score
        let max = (((WIDTH * HEIGHT) - 1 - board.num_moves()) / 2) as i32;
        if beta > max {
            // clamp beta to calculated upper bound
            beta = max;
            // if the upper bound is lower than alpha, we can prune the exploration
            if alpha >= beta {
                return beta;
            }
        }

        // try to fetch upper/lower bounds of the score from the transposition
        // table, under the keys of this position and its mirror image
        let key = board.key();
        let mut value = self.transposition_table.get(key) as i32;
        if value == 0 {
            value = self.transposition_table.get(board.mirror_key()) as i32;
        }
        if value != 0 {
            // check if lower bound
            if value > MAX_SCORE - MIN_SCORE + 1 {
                let min = value + 2 * MIN_SCORE - MAX_SCORE - 2;
                if alpha < min {
                    alpha = min;
                    if alpha >= beta {
                        // prune the exploration
                        return alpha;
                    }
                }
            // else upper bound
            } else {
                let max = value + MIN_SCORE - 1;
                if beta > max {
                    beta = max;
                    if alpha >= beta {
                        // prune the exploration
                        return beta;
                    }
                }
            }
        }

        let mut moves = MoveSorter::new();
        // reversing move order to put edges first reduces the amount of sorting
        // as these moves are worse on average
        for i in (0..WIDTH).rev() {
            let column = move_order()[i];
            let candidate = non_losing_moves & BitBoard::column_mask(column);
            if candidate != 0 {
                moves.push(candidate, column, board.move_score(candidate))
            }
        }

        // search the next level of the tree
        for (move_bitmap, _column) in moves {
            let mut next = board;
            next.play(move_bitmap);
            // the search window is flipped for the other player
            let score = -self.negamax(next, -beta, -alpha);
            // if a child node's score is better than beta, we can prune the tree
            // here because a perfect opponent will not pick this branch
            if score >= beta {
                // save a lower bound of the score
                self.transposition_table
                    .put(key, (score + MAX_SCORE - 2 * MIN_SCORE + 2) as u8);
                return score;
            }
            if score > alpha {
                alpha = score;
            }
        }

        // offset of one to prevent putting a 0, which represents an empty entry
        self.transposition_table.put(key, (alpha - MIN_SCORE + 1) as u8);
        alpha
    }

    /// Calculates the exact score of a position (see [Position Scoring])
    ///
    /// [Position Scoring]: #position-scoring
    pub fn solve(&mut self, board: &BitBoard) -> i32 {
        self._solve(board, false)
    }

    /// Calculates the outcome of a position, faster than [`solve`]
    ///
    /// The returned score carries the correct sign but not the correct
    /// magnitude, so it names the winner without the win distance
    ///
    /// [`solve`]: #method.solve
    pub fn solve_weak(&mut self, board: &BitBoard) -> i32 {
        self._solve(board, true)
    }

    /// Performs the iterative narrowing search, returning the position score
    fn _solve(&mut self, board: &BitBoard, weak: bool) -> i32 {
        // the tree search expects positions with no immediate win available
        if board.can_win_next() {
            return (WIDTH * HEIGHT + 1 - board.num_moves()) as i32 / 2;
        }

        let (mut min, mut max) = if weak {
            // a unit window around 0 still resolves the sign of the score
            (-1, 1)
        } else {
            (
                -((WIDTH * HEIGHT) as i32 - board.num_moves() as i32) / 2,
                (WIDTH * HEIGHT + 1 - board.num_moves()) as i32 / 2,
            )
        };

        // iteratively narrow the search window
        while min < max {
            let mut mid = min + (max - min) / 2;
            // tweak the search value for both negative and positive searches
            if mid <= 0 && min / 2 < mid {
                mid = min / 2
            } else if mid >= 0 && max / 2 > mid {
                mid = max / 2
            }

            // use a null-window to determine if the actual score is greater or less than mid
            let r = self.negamax(*board, mid, mid + 1);

            // r is not necessarily the exact true score, but its value indicates
            // whether the true score is above or below the search target
            if r <= mid {
                // actual score <= mid
                max = r
            } else {
                // actual score > mid
                min = r;
            }
        }
        // min and max should be equal here
        min
    }

    /// Scores every column of a position (see [Position Scoring])
    ///
    /// Full columns yield `None`, all others the score of the position
    /// reached by that move, from the point of view of the player to move
    ///
    /// [Position Scoring]: #position-scoring
    pub fn analyze(&mut self, board: &BitBoard) -> [Option<i32>; WIDTH] {
        self._analyze(board, false)
    }

    /// Scores every column of a position like [`analyze`], but only
    /// resolves the sign of each score
    ///
    /// [`analyze`]: #method.analyze
    pub fn analyze_weak(&mut self, board: &BitBoard) -> [Option<i32>; WIDTH] {
        self._analyze(board, true)
    }

    fn _analyze(&mut self, board: &BitBoard, weak: bool) -> [Option<i32>; WIDTH] {
        let mut scores = [None; WIDTH];
        for column in 0..WIDTH {
            if !board.playable(column) {
                continue;
            }
            if board.is_winning_move(column) {
                scores[column] = Some((WIDTH * HEIGHT + 1 - board.num_moves()) as i32 / 2);
            } else {
                let mut next = *board;
                next.play_column(column);
                // the child position is scored for the opponent, flip it back
                scores[column] = Some(-self._solve(&next, weak));
            }
        }
        scores
    }

    /// Converts a position score to a win distance in a single player's moves
    pub fn score_to_win_distance(board: &BitBoard, score: i32) -> usize {
        match score.cmp(&0) {
            Ordering::Equal => WIDTH * HEIGHT - board.num_moves(),
            Ordering::Greater => {
                (WIDTH * HEIGHT / 2 + 1 - score as usize) - board.num_moves() / 2
            }
            Ordering::Less => {
                (WIDTH * HEIGHT / 2 + 1) - (-score as usize) - board.num_moves() / 2
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_order_zigzags_from_the_center() {
        assert_eq!(move_order(), [3, 4, 2, 5, 1, 6, 0]);
    }

    #[test]
    fn sorter_yields_moves_by_descending_score() {
        let mut moves = MoveSorter::new();
        moves.push(0b1, 0, 1);
        moves.push(0b10, 1, 4);
        moves.push(0b100, 2, 0);
        moves.push(0b1000, 3, 2);

        let sorted: Vec<_> = moves.collect();
        assert_eq!(sorted, vec![(0b10, 1), (0b1000, 3), (0b1, 0), (0b100, 2)]);
    }

    #[test]
    fn sorter_yields_later_pushes_first_on_ties() {
        let mut moves = MoveSorter::new();
        moves.push(0b1, 0, 5);
        moves.push(0b10, 3, 5);

        assert_eq!(moves.next(), Some((0b10, 3)));
        assert_eq!(moves.next(), Some((0b1, 0)));
        assert_eq!(moves.next(), None);
    }
}
