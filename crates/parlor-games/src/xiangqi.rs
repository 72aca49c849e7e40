//! Xiangqi (Chinese chess): full rules including palace confinement,
//! river-bound elephants, horse-leg blocking, cannon screens, and the
//! flying-general rule.
//!
//! The board is 10 rows by 9 files of nullable piece codes, uppercase for
//! red. Row 0 is Black's back rank; red sits on rows 5–9 and moves toward
//! row 0. Red is the first mover and serializes as `w` on the wire.

use parlor_protocol::Square;

use crate::board::{FenError, MoveError, Side};

const START_FEN: &str =
    "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w";

type Board = [[Option<char>; 9]; 10];

/// A running xiangqi game.
pub struct XiangqiGame {
    board: Board,
    turn: Side,
    history: Vec<(Board, Side)>,
    over: bool,
}

impl XiangqiGame {
    pub fn new() -> Self {
        Self::from_fen(START_FEN).expect("initial position parses")
    }

    /// Parses a board-plus-side FEN (the xiangqi wire form).
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let mut fields = fen.split_whitespace();
        let rows = fields
            .next()
            .ok_or_else(|| FenError("empty string".into()))?;

        let mut board: Board = [[None; 9]; 10];
        let mut r = 0;
        let mut c = 0;
        for ch in rows.chars() {
            match ch {
                '/' => {
                    if c != 9 {
                        return Err(FenError(format!("short row {r}")));
                    }
                    r += 1;
                    c = 0;
                }
                '1'..='9' => c += ch as usize - '0' as usize,
                'k' | 'a' | 'b' | 'n' | 'r' | 'c' | 'p' | 'K' | 'A' | 'B'
                | 'N' | 'R' | 'C' | 'P' => {
                    if r >= 10 || c >= 9 {
                        return Err(FenError("board overflow".into()));
                    }
                    board[r][c] = Some(ch);
                    c += 1;
                }
                other => {
                    return Err(FenError(format!("bad piece code {other:?}")))
                }
            }
        }
        if r != 9 || c != 9 {
            return Err(FenError("wrong board dimensions".into()));
        }

        let turn = fields
            .next()
            .and_then(|f| f.chars().next())
            .and_then(Side::from_letter)
            .ok_or_else(|| FenError("missing side to move".into()))?;

        let mut game = Self {
            board,
            turn,
            history: Vec::new(),
            over: false,
        };
        game.over = !has_any_legal_move(&game.board, game.turn);
        Ok(game)
    }

    /// Serializes the board field plus the side-to-move letter.
    pub fn fen(&self) -> String {
        let mut out = String::new();
        for (r, row) in self.board.iter().enumerate() {
            let mut empties = 0;
            for cell in row {
                match cell {
                    Some(piece) => {
                        if empties > 0 {
                            out.push_str(&empties.to_string());
                            empties = 0;
                        }
                        out.push(*piece);
                    }
                    None => empties += 1,
                }
            }
            if empties > 0 {
                out.push_str(&empties.to_string());
            }
            if r < 9 {
                out.push('/');
            }
        }
        out.push(' ');
        out.push(self.turn.letter());
        out
    }

    /// The side to move: `w` is red.
    pub fn turn(&self) -> char {
        self.turn.letter()
    }

    pub fn in_check(&self) -> bool {
        in_check(&self.board, self.turn)
    }

    pub fn is_game_over(&self) -> bool {
        self.over
    }

    /// `red` or `black` once the game is over. A stalemated side loses;
    /// xiangqi has no draw by stalemate.
    pub fn winner(&self) -> Option<&'static str> {
        if !self.over {
            return None;
        }
        Some(match self.turn {
            Side::White => "black",
            Side::Black => "red",
        })
    }

    pub fn make_move(
        &mut self,
        from: Square,
        to: Square,
    ) -> Result<(), MoveError> {
        if self.over {
            return Err(MoveError::GameOver);
        }
        let (fr, fc) = (from.row as usize, from.col as usize);
        let (tr, tc) = (to.row as usize, to.col as usize);
        if fr >= 10 || fc >= 9 || tr >= 10 || tc >= 9 {
            return Err(MoveError::IllegalMove);
        }

        let piece = self.board[fr][fc].ok_or(MoveError::NoPieceAtSource)?;
        if Side::of_piece(piece) != self.turn {
            return Err(MoveError::NotYourPiece);
        }
        if !pseudo_moves(&self.board, fr, fc).contains(&(tr, tc)) {
            return Err(MoveError::IllegalMove);
        }

        let mut next = self.board;
        next[tr][tc] = next[fr][fc].take();
        if in_check(&next, self.turn) {
            return Err(MoveError::LeavesKingInCheck);
        }

        self.history.push((self.board, self.turn));
        self.board = next;
        self.turn = self.turn.flip();
        self.over = !has_any_legal_move(&self.board, self.turn);
        Ok(())
    }

    /// Takes back one ply. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some((board, turn)) => {
                self.board = board;
                self.turn = turn;
                self.over = false;
                true
            }
            None => false,
        }
    }
}

impl Default for XiangqiGame {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Move generation
// ---------------------------------------------------------------------------

fn on_board(r: i32, c: i32) -> bool {
    (0..10).contains(&r) && (0..9).contains(&c)
}

/// Palace: files 3–5, rows 7–9 for red, rows 0–2 for black.
fn in_palace(side: Side, r: i32, c: i32) -> bool {
    if !(3..=5).contains(&c) {
        return false;
    }
    match side {
        Side::White => (7..=9).contains(&r),
        Side::Black => (0..=2).contains(&r),
    }
}

/// Whether a square is on the mover's own side of the river.
fn own_half(side: Side, r: i32) -> bool {
    match side {
        Side::White => r >= 5,
        Side::Black => r <= 4,
    }
}

/// Pseudo-legal destinations for the piece on (r, c).
fn pseudo_moves(board: &Board, r: usize, c: usize) -> Vec<(usize, usize)> {
    let piece = match board[r][c] {
        Some(p) => p,
        None => return Vec::new(),
    };
    let side = Side::of_piece(piece);
    let (ri, ci) = (r as i32, c as i32);
    let mut out = Vec::new();

    let free_or_enemy = |tr: i32, tc: i32| -> bool {
        on_board(tr, tc)
            && board[tr as usize][tc as usize]
                .map(|t| Side::of_piece(t) != side)
                .unwrap_or(true)
    };

    const ORTHO: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

    match piece.to_ascii_lowercase() {
        'r' => {
            for (dr, dc) in ORTHO {
                let (mut tr, mut tc) = (ri + dr, ci + dc);
                while on_board(tr, tc) {
                    match board[tr as usize][tc as usize] {
                        None => out.push((tr as usize, tc as usize)),
                        Some(target) => {
                            if Side::of_piece(target) != side {
                                out.push((tr as usize, tc as usize));
                            }
                            break;
                        }
                    }
                    tr += dr;
                    tc += dc;
                }
            }
        }
        'c' => {
            for (dr, dc) in ORTHO {
                let (mut tr, mut tc) = (ri + dr, ci + dc);
                // Quiet moves up to the screen piece.
                while on_board(tr, tc)
                    && board[tr as usize][tc as usize].is_none()
                {
                    out.push((tr as usize, tc as usize));
                    tr += dr;
                    tc += dc;
                }
                // Past exactly one screen, the first piece is capturable.
                tr += dr;
                tc += dc;
                while on_board(tr, tc) {
                    if let Some(target) = board[tr as usize][tc as usize] {
                        if Side::of_piece(target) != side {
                            out.push((tr as usize, tc as usize));
                        }
                        break;
                    }
                    tr += dr;
                    tc += dc;
                }
            }
        }
        'n' => {
            for (dr, dc) in [
                (2i32, 1i32),
                (2, -1),
                (-2, 1),
                (-2, -1),
                (1, 2),
                (1, -2),
                (-1, 2),
                (-1, -2),
            ] {
                // The one-step orthogonal leg must be empty.
                let (lr, lc) = if dr.abs() == 2 {
                    (ri + dr / 2, ci)
                } else {
                    (ri, ci + dc / 2)
                };
                if !on_board(lr, lc)
                    || board[lr as usize][lc as usize].is_some()
                {
                    continue;
                }
                if free_or_enemy(ri + dr, ci + dc) {
                    out.push(((ri + dr) as usize, (ci + dc) as usize));
                }
            }
        }
        'b' => {
            for (dr, dc) in [(2, 2), (2, -2), (-2, 2), (-2, -2)] {
                let (tr, tc) = (ri + dr, ci + dc);
                let (mr, mc) = (ri + dr / 2, ci + dc / 2);
                if !on_board(tr, tc)
                    || !own_half(side, tr)
                    || board[mr as usize][mc as usize].is_some()
                {
                    continue;
                }
                if free_or_enemy(tr, tc) {
                    out.push((tr as usize, tc as usize));
                }
            }
        }
        'a' => {
            for (dr, dc) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
                let (tr, tc) = (ri + dr, ci + dc);
                if in_palace(side, tr, tc) && free_or_enemy(tr, tc) {
                    out.push((tr as usize, tc as usize));
                }
            }
        }
        'k' => {
            for (dr, dc) in ORTHO {
                let (tr, tc) = (ri + dr, ci + dc);
                if in_palace(side, tr, tc) && free_or_enemy(tr, tc) {
                    out.push((tr as usize, tc as usize));
                }
            }
        }
        'p' => {
            let forward = if side == Side::White { -1 } else { 1 };
            if free_or_enemy(ri + forward, ci) {
                out.push(((ri + forward) as usize, ci as usize));
            }
            // Sideways once across the river.
            if !own_half(side, ri) {
                for dc in [-1, 1] {
                    if free_or_enemy(ri, ci + dc) {
                        out.push((ri as usize, (ci + dc) as usize));
                    }
                }
            }
        }
        _ => {}
    }

    out
}

fn general_square(board: &Board, side: Side) -> Option<(usize, usize)> {
    let general = if side == Side::White { 'K' } else { 'k' };
    for (r, row) in board.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if *cell == Some(general) {
                return Some((r, c));
            }
        }
    }
    None
}

/// Flying generals: both generals share a file with nothing between.
fn generals_facing(board: &Board) -> bool {
    let (Some(red), Some(black)) = (
        general_square(board, Side::White),
        general_square(board, Side::Black),
    ) else {
        return false;
    };
    if red.1 != black.1 {
        return false;
    }
    let col = red.1;
    ((black.0 + 1)..red.0).all(|r| board[r][col].is_none())
}

fn in_check(board: &Board, side: Side) -> bool {
    if generals_facing(board) {
        return true;
    }
    let Some(general) = general_square(board, side) else {
        return false;
    };
    for r in 0..10 {
        for c in 0..9 {
            match board[r][c] {
                Some(p) if Side::of_piece(p) != side => {
                    if pseudo_moves(board, r, c).contains(&general) {
                        return true;
                    }
                }
                _ => {}
            }
        }
    }
    false
}

fn has_any_legal_move(board: &Board, side: Side) -> bool {
    for r in 0..10 {
        for c in 0..9 {
            match board[r][c] {
                Some(p) if Side::of_piece(p) == side => {}
                _ => continue,
            }
            for (tr, tc) in pseudo_moves(board, r, c) {
                let mut next = *board;
                next[tr][tc] = next[r][c].take();
                if !in_check(&next, side) {
                    return true;
                }
            }
        }
    }
    false
}

// =========================================================================
// Tests
// =========================================================================
