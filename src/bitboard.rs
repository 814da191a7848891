use anyhow::{anyhow, Result};

use crate::{HEIGHT, WIDTH};

mod static_masks {
    use crate::{HEIGHT, WIDTH};

    pub const fn bottom_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= 1 << (column * (HEIGHT + 1));
            column += 1;
        }
        mask
    }
    pub const fn full_board_mask() -> u64 {
        bottom_mask() * ((1 << HEIGHT as u64) - 1)
    }
}

/// A Connect 4 position in bitboard form
///
/// Tiles are packed column by column from the bottom up, with one unused
/// padding bit above each column. `player_mask` covers the tiles of the
/// player about to move, `board_mask` the tiles of both players.
#[derive(Copy, Clone)]
pub struct BitBoard {
    // mask of the current player's tiles
    player_mask: u64,
    // mask of all tiles
    board_mask: u64,
    num_moves: usize,
}
impl BitBoard {
    pub fn new() -> Self {
        Self {
            player_mask: 0,
            board_mask: 0,
            num_moves: 0,
        }
    }

    /// Builds a position from a string of 1-indexed columns, e.g. "4455"
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut board = Self::new();

        for column_char in moves.as_ref().chars() {
            // only play available moves
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    let column = column - 1;
                    if !board.playable(column) {
                        return Err(anyhow!("Invalid move, column {} full", column + 1));
                    }
                    // abort if the position is won at any point
                    if board.is_winning_move(column) {
                        return Err(anyhow!("Invalid position, game is over"));
                    }
                    board.play_column(column);
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(board)
    }

    /// Builds a position from a slice of 0-indexed columns
    pub fn from_slice(moves: &[usize]) -> Result<Self> {
        let mut board = Self::new();
        for &column in moves.iter() {
            if column >= WIDTH || !board.playable(column) {
                return Err(anyhow!("Invalid move, column {} unplayable", column));
            }
            // abort if the position is won at any point
            if board.is_winning_move(column) {
                return Err(anyhow!("Invalid position, game is over"));
            }
            board.play_column(column);
        }
        Ok(board)
    }

    pub fn from_masks(player_mask: u64, board_mask: u64, num_moves: usize) -> Self {
        Self {
            player_mask,
            board_mask,
            num_moves,
        }
    }

    pub fn player_mask(&self) -> u64 {
        self.player_mask
    }

    pub fn board_mask(&self) -> u64 {
        self.board_mask
    }

    pub fn top_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1) + (HEIGHT - 1))
    }

    pub fn bottom_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1))
    }

    pub fn column_mask(column: usize) -> u64 {
        ((1 << HEIGHT) - 1) << (column * (HEIGHT + 1))
    }

    /// Bitmap of the moves that do not hand the opponent an immediate win
    ///
    /// Only meaningful when the current player cannot win this move, see
    /// [`can_win_next`](Self::can_win_next)
    pub fn non_losing_moves(&self) -> u64 {
        debug_assert!(!self.can_win_next());
        let mut possible_moves = self.possible_moves();
        let opponent_winning_positions = self.opponent_winning_positions();
        let forced_moves = possible_moves & opponent_winning_positions;

        if forced_moves != 0 {
            // if more than one forced move exists, you can't prevent the opponent winning
            if forced_moves & (forced_moves - 1) != 0 {
                return 0;
            } else {
                possible_moves = forced_moves
            }
        }
        // avoid playing below an opponent's winning move
        possible_moves & !(opponent_winning_positions >> 1)
    }

    pub fn possible_moves(&self) -> u64 {
        (self.board_mask + static_masks::bottom_mask()) & static_masks::full_board_mask()
    }

    // create a bitmap of open squares that complete alignments for the opponent
    fn opponent_winning_positions(&self) -> u64 {
        let opp_mask = self.player_mask ^ self.board_mask;
        self.winning_positions(opp_mask)
    }

    fn winning_positions(&self, player_mask: u64) -> u64 {
        // vertical
        // find the top ends of 3-alignments
        let mut r = (player_mask << 1) & (player_mask << 2) & (player_mask << 3);

        // horizontal
        let mut p = (player_mask << (HEIGHT + 1)) & (player_mask << (2 * (HEIGHT + 1)));
        // find the right ends of 3-alignments
        r |= p & (player_mask << (3 * (HEIGHT + 1)));
        // find holes of the type ...O O _ O...
        r |= p & (player_mask >> (HEIGHT + 1));

        p = (player_mask >> (HEIGHT + 1)) & (player_mask >> (2 * (HEIGHT + 1)));
        // find the left ends of 3-alignments
        r |= p & (player_mask >> (3 * (HEIGHT + 1)));
        // find holes of the type ...O _ O O...
        r |= p & (player_mask << (HEIGHT + 1));

        // diagonal /
        p = (player_mask << HEIGHT) & (player_mask << (2 * HEIGHT));
        // find the right ends of 3-alignments
        r |= p & (player_mask << (3 * (HEIGHT)));
        // find holes of the type ...O O _ O...
        r |= p & (player_mask >> (HEIGHT));

        p = (player_mask >> (HEIGHT)) & (player_mask >> (2 * HEIGHT));
        // find the left ends of 3-alignments
        r |= p & (player_mask >> (3 * (HEIGHT)));
        // find holes of the type ...O _ O O...
        r |= p & (player_mask << (HEIGHT));

        // diagonal \
        p = (player_mask << (HEIGHT + 2)) & (player_mask << (2 * (HEIGHT + 2)));
        // find the right ends of 3-alignments
        r |= p & (player_mask << (3 * (HEIGHT + 2)));
        // find holes of the type ...O O _ O...
        r |= p & (player_mask >> (HEIGHT + 2));

        p = (player_mask >> (HEIGHT + 2)) & (player_mask >> (2 * (HEIGHT + 2)));
        // find the left ends of 3-alignments
        r |= p & (player_mask >> (3 * (HEIGHT + 2)));
        // find holes of the type ...O _ O O...
        r |= p & (player_mask << (HEIGHT + 2));

        r & (static_masks::full_board_mask() ^ self.board_mask)
    }

    pub fn move_score(&self, candidate: u64) -> i32 {
        // how many open ends of 3-alignments are there?
        self.winning_positions(self.player_mask | candidate)
            .count_ones() as i32
    }

    pub fn num_moves(&self) -> usize {
        self.num_moves
    }
    pub fn playable(&self, column: usize) -> bool {
        Self::top_mask(column) & self.board_mask == 0
    }
    /// Drops a tile into `column` for the player to move
    ///
    /// The column must be playable, see [`playable`](Self::playable)
    pub fn play_column(&mut self, column: usize) {
        let move_bitmap = (self.board_mask + Self::bottom_mask(column)) & Self::column_mask(column);
        self.play(move_bitmap);
    }
    /// Applies a move given as a one-bit mask of the landing square
    pub fn play(&mut self, move_bitmap: u64) {
        // switch the current player
        self.player_mask ^= self.board_mask;
        // add a cell of the previous player to the correct column
        self.board_mask |= move_bitmap;
        self.num_moves += 1;
    }
    /// True when every cell of the board is occupied
    pub fn is_draw(&self) -> bool {
        self.board_mask == static_masks::full_board_mask()
    }
    /// True if dropping a tile into `column` wins at once for the player to move
    pub fn is_winning_move(&self, column: usize) -> bool {
        self.winning_positions(self.player_mask) & self.possible_moves() & Self::column_mask(column)
            != 0
    }
    /// True if the player to move has any immediately winning column
    pub fn can_win_next(&self) -> bool {
        self.winning_positions(self.player_mask) & self.possible_moves() != 0
    }

    /// Unique key of the position, suitable for table lookups
    pub fn key(&self) -> u64 {
        self.player_mask + self.board_mask
    }

    /// Key of the left-right reflection of the position
    ///
    /// Reflection preserves the value of a position, so search results
    /// cached under either key hold for both.
    pub fn mirror_key(&self) -> u64 {
        Self::mirror_mask(self.player_mask) + Self::mirror_mask(self.board_mask)
    }

    // reverse the column order of a padded bitmask
    fn mirror_mask(mask: u64) -> u64 {
        let column_bits = (1 << (HEIGHT + 1)) - 1;
        let mut mirrored = 0;
        for column in 0..WIDTH {
            let bits = (mask >> (column * (HEIGHT + 1))) & column_bits;
            mirrored |= bits << ((WIDTH - 1 - column) * (HEIGHT + 1));
        }
        mirrored
    }
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_masks_cover_the_grid() {
        assert_eq!(static_masks::bottom_mask().count_ones() as usize, WIDTH);
        assert_eq!(
            static_masks::full_board_mask().count_ones() as usize,
            WIDTH * HEIGHT
        );
    }

    #[test]
    fn mirroring_a_mask_twice_is_the_identity() {
        let board = BitBoard::from_moves("1264").unwrap();
        for &mask in [board.player_mask(), board.board_mask()].iter() {
            assert_eq!(BitBoard::mirror_mask(BitBoard::mirror_mask(mask)), mask);
        }
    }
}
