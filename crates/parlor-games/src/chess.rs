//! Western chess: full rules including castling, en passant, promotion,
//! and stalemate detection.
//!
//! The board is an 8x8 array of nullable piece codes, uppercase for white.
//! Row 0 is Black's back rank (the first rank listed in a FEN string), so
//! white pawns move toward row 0.

use parlor_protocol::Square;

use crate::board::{FenError, MoveError, Side};

const START_FEN: &str =
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

type Board = [[Option<char>; 8]; 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Castling {
    wk: bool,
    wq: bool,
    bk: bool,
    bq: bool,
}

/// One full position. Snapshots of this are the undo stack.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Position {
    board: Board,
    turn: Side,
    castling: Castling,
    en_passant: Option<(usize, usize)>,
    halfmove: u32,
    fullmove: u32,
}

/// A running chess game.
pub struct ChessGame {
    pos: Position,
    history: Vec<Position>,
    over: bool,
}

impl ChessGame {
    /// Starts a game from the standard initial position.
    pub fn new() -> Self {
        Self::from_fen(START_FEN).expect("initial position parses")
    }

    /// Starts a game from an arbitrary FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let pos = parse_fen(fen)?;
        let over = !has_any_legal_move(&pos);
        Ok(Self {
            pos,
            history: Vec::new(),
            over,
        })
    }

    /// Serializes the current position as a full FEN string.
    pub fn fen(&self) -> String {
        let p = &self.pos;
        let mut out = String::new();
        for (r, row) in p.board.iter().enumerate() {
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
            if r < 7 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(p.turn.letter());

        out.push(' ');
        let mut rights = String::new();
        if p.castling.wk {
            rights.push('K');
        }
        if p.castling.wq {
            rights.push('Q');
        }
        if p.castling.bk {
            rights.push('k');
        }
        if p.castling.bq {
            rights.push('q');
        }
        out.push_str(if rights.is_empty() { "-" } else { &rights });

        out.push(' ');
        match p.en_passant {
            Some((r, c)) => {
                out.push((b'a' + c as u8) as char);
                out.push_str(&(8 - r).to_string());
            }
            None => out.push('-'),
        }

        out.push_str(&format!(" {} {}", p.halfmove, p.fullmove));
        out
    }

    /// The side to move, as its wire letter.
    pub fn turn(&self) -> char {
        self.pos.turn.letter()
    }

    /// Whether the side to move is currently in check.
    pub fn in_check(&self) -> bool {
        in_check(&self.pos.board, self.pos.turn)
    }

    pub fn is_game_over(&self) -> bool {
        self.over
    }

    /// `white`, `black`, or `draw` once the game is over.
    pub fn winner(&self) -> Option<&'static str> {
        if !self.over {
            return None;
        }
        if self.in_check() {
            Some(match self.pos.turn {
                Side::White => "black",
                Side::Black => "white",
            })
        } else {
            Some("draw")
        }
    }

    /// Validates and applies one move. `promotion` is the promotion piece
    /// letter (`q`, `r`, `b`, `n`), queen when absent.
    pub fn make_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<char>,
    ) -> Result<(), MoveError> {
        if self.over {
            return Err(MoveError::GameOver);
        }
        let (fr, fc) = (from.row as usize, from.col as usize);
        let (tr, tc) = (to.row as usize, to.col as usize);
        if fr >= 8 || fc >= 8 || tr >= 8 || tc >= 8 {
            return Err(MoveError::IllegalMove);
        }

        let piece = self.pos.board[fr][fc].ok_or(MoveError::NoPieceAtSource)?;
        if Side::of_piece(piece) != self.pos.turn {
            return Err(MoveError::NotYourPiece);
        }

        let promo = promotion.map(|c| c.to_ascii_lowercase());
        if let Some(p) = promo {
            if !matches!(p, 'q' | 'r' | 'b' | 'n') {
                return Err(MoveError::IllegalMove);
            }
        }

        if !pseudo_moves(&self.pos, fr, fc).contains(&(tr, tc)) {
            return Err(MoveError::IllegalMove);
        }

        let next = apply(&self.pos, (fr, fc), (tr, tc), promo);
        if in_check(&next.board, self.pos.turn) {
            return Err(MoveError::LeavesKingInCheck);
        }

        self.history.push(std::mem::replace(&mut self.pos, next));
        self.over = !has_any_legal_move(&self.pos);
        Ok(())
    }

    /// Takes back one ply. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(prev) => {
                self.pos = prev;
                self.over = false;
                true
            }
            None => false,
        }
    }
}

impl Default for ChessGame {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Move generation
// ---------------------------------------------------------------------------

fn on_board(r: i32, c: i32) -> bool {
    (0..8).contains(&r) && (0..8).contains(&c)
}

fn is_white(piece: char) -> bool {
    piece.is_ascii_uppercase()
}

/// Pseudo-legal destinations for the piece on (r, c). Castling targets are
/// included only when the full no-cross-check condition already holds, so
/// the later self-check filter never has to special-case the king's path.
fn pseudo_moves(pos: &Position, r: usize, c: usize) -> Vec<(usize, usize)> {
    let board = &pos.board;
    let piece = match board[r][c] {
        Some(p) => p,
        None => return Vec::new(),
    };
    let side = Side::of_piece(piece);
    let mut out = Vec::new();

    const ORTHO: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
    const DIAG: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

    match piece.to_ascii_lowercase() {
        'r' => slide(board, side, r, c, &ORTHO, &mut out),
        'b' => slide(board, side, r, c, &DIAG, &mut out),
        'q' => {
            slide(board, side, r, c, &ORTHO, &mut out);
            slide(board, side, r, c, &DIAG, &mut out);
        }
        'n' => {
            for (dr, dc) in [
                (2, 1),
                (2, -1),
                (-2, 1),
                (-2, -1),
                (1, 2),
                (1, -2),
                (-1, 2),
                (-1, -2),
            ] {
                step(board, side, r as i32 + dr, c as i32 + dc, &mut out);
            }
        }
        'k' => {
            for (dr, dc) in ORTHO.iter().chain(DIAG.iter()) {
                step(board, side, r as i32 + dr, c as i32 + dc, &mut out);
            }
            castle_targets(pos, side, &mut out);
        }
        'p' => {
            let dir: i32 = if side == Side::White { -1 } else { 1 };
            let start_row = if side == Side::White { 6 } else { 1 };
            let one = r as i32 + dir;
            if on_board(one, c as i32) && board[one as usize][c].is_none() {
                out.push((one as usize, c));
                let two = r as i32 + 2 * dir;
                if r == start_row && board[two as usize][c].is_none() {
                    out.push((two as usize, c));
                }
            }
            for dc in [-1, 1] {
                let (tr, tc) = (r as i32 + dir, c as i32 + dc);
                if !on_board(tr, tc) {
                    continue;
                }
                let dest = (tr as usize, tc as usize);
                match board[dest.0][dest.1] {
                    Some(target) if Side::of_piece(target) != side => {
                        out.push(dest)
                    }
                    None if pos.en_passant == Some(dest) => out.push(dest),
                    _ => {}
                }
            }
        }
        _ => {}
    }

    out
}

/// Adds the target if it is on the board and not blocked by a friendly
/// piece. Returns true if a sliding ray may continue past it.
fn step(
    board: &Board,
    side: Side,
    tr: i32,
    tc: i32,
    out: &mut Vec<(usize, usize)>,
) -> bool {
    if !on_board(tr, tc) {
        return false;
    }
    match board[tr as usize][tc as usize] {
        Some(target) => {
            if Side::of_piece(target) != side {
                out.push((tr as usize, tc as usize));
            }
            false
        }
        None => {
            out.push((tr as usize, tc as usize));
            true
        }
    }
}

fn slide(
    board: &Board,
    side: Side,
    r: usize,
    c: usize,
    dirs: &[(i32, i32)],
    out: &mut Vec<(usize, usize)>,
) {
    for (dr, dc) in dirs {
        let (mut tr, mut tc) = (r as i32 + dr, c as i32 + dc);
        while step(board, side, tr, tc, out) {
            tr += dr;
            tc += dc;
        }
    }
}

fn castle_targets(pos: &Position, side: Side, out: &mut Vec<(usize, usize)>) {
    let board = &pos.board;
    let enemy = side.flip();
    let (home, rook) = match side {
        Side::White => (7, 'R'),
        Side::Black => (0, 'r'),
    };
    if board[home][4] != Some(if side == Side::White { 'K' } else { 'k' }) {
        return;
    }
    let (kingside, queenside) = match side {
        Side::White => (pos.castling.wk, pos.castling.wq),
        Side::Black => (pos.castling.bk, pos.castling.bq),
    };

    if kingside
        && board[home][5].is_none()
        && board[home][6].is_none()
        && board[home][7] == Some(rook)
        && !is_attacked(board, (home, 4), enemy)
        && !is_attacked(board, (home, 5), enemy)
        && !is_attacked(board, (home, 6), enemy)
    {
        out.push((home, 6));
    }
    if queenside
        && board[home][1].is_none()
        && board[home][2].is_none()
        && board[home][3].is_none()
        && board[home][0] == Some(rook)
        && !is_attacked(board, (home, 4), enemy)
        && !is_attacked(board, (home, 3), enemy)
        && !is_attacked(board, (home, 2), enemy)
    {
        out.push((home, 2));
    }
}

/// Whether `by` attacks the given square.
fn is_attacked(board: &Board, sq: (usize, usize), by: Side) -> bool {
    let (r, c) = (sq.0 as i32, sq.1 as i32);
    let owned = |piece: char| Side::of_piece(piece) == by;

    // Pawns: a white pawn attacks upward, so it sits one row below.
    let pawn_row = if by == Side::White { r + 1 } else { r - 1 };
    for dc in [-1, 1] {
        if on_board(pawn_row, c + dc) {
            if let Some(p) = board[pawn_row as usize][(c + dc) as usize] {
                if p.to_ascii_lowercase() == 'p' && owned(p) {
                    return true;
                }
            }
        }
    }

    for (dr, dc) in [
        (2, 1),
        (2, -1),
        (-2, 1),
        (-2, -1),
        (1, 2),
        (1, -2),
        (-1, 2),
        (-1, -2),
    ] {
        if on_board(r + dr, c + dc) {
            if let Some(p) = board[(r + dr) as usize][(c + dc) as usize] {
                if p.to_ascii_lowercase() == 'n' && owned(p) {
                    return true;
                }
            }
        }
    }

    for dr in -1..=1i32 {
        for dc in -1..=1i32 {
            if (dr, dc) == (0, 0) || !on_board(r + dr, c + dc) {
                continue;
            }
            if let Some(p) = board[(r + dr) as usize][(c + dc) as usize] {
                if p.to_ascii_lowercase() == 'k' && owned(p) {
                    return true;
                }
            }
        }
    }

    let rays: [((i32, i32), [char; 2]); 8] = [
        ((1, 0), ['r', 'q']),
        ((-1, 0), ['r', 'q']),
        ((0, 1), ['r', 'q']),
        ((0, -1), ['r', 'q']),
        ((1, 1), ['b', 'q']),
        ((1, -1), ['b', 'q']),
        ((-1, 1), ['b', 'q']),
        ((-1, -1), ['b', 'q']),
    ];
    for ((dr, dc), hitters) in rays {
        let (mut tr, mut tc) = (r + dr, c + dc);
        while on_board(tr, tc) {
            if let Some(p) = board[tr as usize][tc as usize] {
                if owned(p) && hitters.contains(&p.to_ascii_lowercase()) {
                    return true;
                }
                break;
            }
            tr += dr;
            tc += dc;
        }
    }

    false
}

fn king_square(board: &Board, side: Side) -> Option<(usize, usize)> {
    let king = if side == Side::White { 'K' } else { 'k' };
    for (r, row) in board.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if *cell == Some(king) {
                return Some((r, c));
            }
        }
    }
    None
}

fn in_check(board: &Board, side: Side) -> bool {
    match king_square(board, side) {
        Some(sq) => is_attacked(board, sq, side.flip()),
        None => false,
    }
}

/// Applies a pseudo-legal move, producing the next position.
fn apply(
    pos: &Position,
    from: (usize, usize),
    to: (usize, usize),
    promotion: Option<char>,
) -> Position {
    let mut p = pos.clone();
    let (fr, fc) = from;
    let (tr, tc) = to;
    let piece = p.board[fr][fc].take().expect("validated source");
    let is_pawn = piece.to_ascii_lowercase() == 'p';
    let mut captured = p.board[tr][tc].is_some();

    // En passant: a pawn landing diagonally on an empty square removes
    // the pawn that just double-pushed past it.
    if is_pawn && fc != tc && p.board[tr][tc].is_none() {
        p.board[fr][tc] = None;
        captured = true;
    }

    p.board[tr][tc] = Some(piece);

    // Castling: the king travelled two files, bring the rook across.
    if piece.to_ascii_lowercase() == 'k' && fc == 4 {
        if tc == 6 {
            p.board[tr][5] = p.board[tr][7].take();
        } else if tc == 2 {
            p.board[tr][3] = p.board[tr][0].take();
        }
    }

    if is_pawn && (tr == 0 || tr == 7) {
        let promo = promotion.unwrap_or('q');
        p.board[tr][tc] = Some(if is_white(piece) {
            promo.to_ascii_uppercase()
        } else {
            promo
        });
    }

    p.en_passant = if is_pawn && fr.abs_diff(tr) == 2 {
        Some(((fr + tr) / 2, fc))
    } else {
        None
    };

    match piece {
        'K' => {
            p.castling.wk = false;
            p.castling.wq = false;
        }
        'k' => {
            p.castling.bk = false;
            p.castling.bq = false;
        }
        _ => {}
    }
    for corner in [from, to] {
        match corner {
            (7, 0) => p.castling.wq = false,
            (7, 7) => p.castling.wk = false,
            (0, 0) => p.castling.bq = false,
            (0, 7) => p.castling.bk = false,
            _ => {}
        }
    }

    if is_pawn || captured {
        p.halfmove = 0;
    } else {
        p.halfmove += 1;
    }
    if p.turn == Side::Black {
        p.fullmove += 1;
    }
    p.turn = p.turn.flip();
    p
}

fn has_any_legal_move(pos: &Position) -> bool {
    for r in 0..8 {
        for c in 0..8 {
            match pos.board[r][c] {
                Some(p) if Side::of_piece(p) == pos.turn => {}
                _ => continue,
            }
            for (tr, tc) in pseudo_moves(pos, r, c) {
                let next = apply(pos, (r, c), (tr, tc), None);
                if !in_check(&next.board, pos.turn) {
                    return true;
                }
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// FEN
// ---------------------------------------------------------------------------

fn parse_fen(fen: &str) -> Result<Position, FenError> {
    let mut fields = fen.split_whitespace();
    let rows = fields
        .next()
        .ok_or_else(|| FenError("empty string".into()))?;

    let mut board: Board = [[None; 8]; 8];
    let mut r = 0;
    let mut c = 0;
    for ch in rows.chars() {
        match ch {
            '/' => {
                if c != 8 {
                    return Err(FenError(format!("short row {r}")));
                }
                r += 1;
                c = 0;
            }
            '1'..='8' => c += ch as usize - '0' as usize,
            'p' | 'n' | 'b' | 'r' | 'q' | 'k' | 'P' | 'N' | 'B' | 'R'
            | 'Q' | 'K' => {
                if r >= 8 || c >= 8 {
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
    if r != 7 || c != 8 {
        return Err(FenError("wrong board dimensions".into()));
    }

    let turn = fields
        .next()
        .and_then(|f| f.chars().next())
        .and_then(Side::from_letter)
        .ok_or_else(|| FenError("missing side to move".into()))?;

    let rights = fields.next().unwrap_or("-");
    let castling = Castling {
        wk: rights.contains('K'),
        wq: rights.contains('Q'),
        bk: rights.contains('k'),
        bq: rights.contains('q'),
    };

    let en_passant = match fields.next() {
        None | Some("-") => None,
        Some(sq) => {
            let mut chars = sq.chars();
            let file = chars
                .next()
                .filter(|f| ('a'..='h').contains(f))
                .ok_or_else(|| FenError(format!("bad ep square {sq}")))?;
            let rank = chars
                .next()
                .and_then(|d| d.to_digit(10))
                .filter(|d| (1..=8).contains(d))
                .ok_or_else(|| FenError(format!("bad ep square {sq}")))?;
            Some((8 - rank as usize, file as usize - 'a' as usize))
        }
    };

    let halfmove = fields
        .next()
        .map(|f| f.parse().map_err(|_| FenError("bad halfmove".into())))
        .transpose()?
        .unwrap_or(0);
    let fullmove = fields
        .next()
        .map(|f| f.parse().map_err(|_| FenError("bad fullmove".into())))
        .transpose()?
        .unwrap_or(1);

    Ok(Position {
        board,
        turn,
        castling,
        en_passant,
        halfmove,
        fullmove,
    })
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: u8, col: u8) -> Square {
        Square { row, col }
    }

    fn mv(game: &mut ChessGame, from: (u8, u8), to: (u8, u8)) {
        game.make_move(sq(from.0, from.1), sq(to.0, to.1), None)
            .unwrap_or_else(|e| panic!("move {from:?}->{to:?}: {e}"));
    }

    #[test]
    fn test_initial_fen_round_trips() {
        let game = ChessGame::new();
        assert_eq!(game.fen(), START_FEN);
        let reparsed = ChessGame::from_fen(&game.fen()).unwrap();
        assert_eq!(reparsed.fen(), START_FEN);
    }

    #[test]
    fn test_fen_round_trip_mid_game() {
        let mut game = ChessGame::new();
        mv(&mut game, (6, 4), (4, 4)); // e4
        mv(&mut game, (1, 2), (3, 2)); // c5
        mv(&mut game, (7, 6), (5, 5)); // Nf3
        let fen = game.fen();
        let reparsed = ChessGame::from_fen(&fen).unwrap();
        assert_eq!(reparsed.fen(), fen);
    }

    #[test]
    fn test_turn_alternates_strictly() {
        let mut game = ChessGame::new();
        assert_eq!(game.turn(), 'w');
        mv(&mut game, (6, 4), (4, 4));
        assert_eq!(game.turn(), 'b');
        mv(&mut game, (1, 4), (3, 4));
        assert_eq!(game.turn(), 'w');
    }

    #[test]
    fn test_move_rejections() {
        let mut game = ChessGame::new();
        assert_eq!(
            game.make_move(sq(4, 4), sq(3, 4), None),
            Err(MoveError::NoPieceAtSource)
        );
        assert_eq!(
            game.make_move(sq(1, 4), sq(3, 4), None),
            Err(MoveError::NotYourPiece)
        );
        // A rook cannot jump over its own pawn.
        assert_eq!(
            game.make_move(sq(7, 0), sq(4, 0), None),
            Err(MoveError::IllegalMove)
        );
    }

    #[test]
    fn test_pinned_piece_may_not_move() {
        // After 1.e4 e5 2.Bb5 the bishop pins the d7 pawn along b5-e8.
        let mut game = ChessGame::new();
        mv(&mut game, (6, 4), (4, 4)); // e4
        mv(&mut game, (1, 4), (3, 4)); // e5
        mv(&mut game, (7, 5), (3, 1)); // Bb5
        assert_eq!(
            game.make_move(sq(1, 3), sq(2, 3), None),
            Err(MoveError::LeavesKingInCheck)
        );
    }

    #[test]
    fn test_kingside_castle_moves_rook_and_clears_white_rights() {
        // 1.e4 e5 2.Nf3 Nc6 3.Bb5 Nf6 4.O-O
        let mut game = ChessGame::new();
        mv(&mut game, (6, 4), (4, 4));
        mv(&mut game, (1, 4), (3, 4));
        mv(&mut game, (7, 6), (5, 5));
        mv(&mut game, (0, 1), (2, 2));
        mv(&mut game, (7, 5), (3, 1));
        mv(&mut game, (0, 6), (2, 5));
        mv(&mut game, (7, 4), (7, 6)); // O-O

        assert_eq!(game.pos.board[7][6], Some('K'));
        assert_eq!(game.pos.board[7][5], Some('R'));
        assert_eq!(game.pos.board[7][7], None);
        assert!(!game.pos.castling.wk);
        assert!(!game.pos.castling.wq);
        assert!(game.pos.castling.bk && game.pos.castling.bq);
        assert!(game.fen().contains(" b kq "));
    }

    #[test]
    fn test_castle_blocked_while_transit_square_attacked() {
        // White king on e1, rook h1; a black rook eyes f1 from f8.
        let mut game = ChessGame::from_fen(
            "5r1k/8/8/8/8/8/8/4K2R w K - 0 1",
        )
        .unwrap();
        assert_eq!(
            game.make_move(sq(7, 4), sq(7, 6), None),
            Err(MoveError::IllegalMove)
        );
    }

    #[test]
    fn test_castling_rights_cleared_when_rook_home_vacated() {
        let mut game = ChessGame::new();
        mv(&mut game, (6, 7), (4, 7)); // h4
        mv(&mut game, (1, 0), (3, 0)); // a5
        mv(&mut game, (7, 7), (5, 7)); // Rh3
        mv(&mut game, (0, 0), (2, 0)); // Ra6
        assert!(!game.pos.castling.wk);
        assert!(game.pos.castling.wq);
        assert!(!game.pos.castling.bq);
        assert!(game.pos.castling.bk);
    }

    #[test]
    fn test_en_passant_capture_removes_bypassed_pawn() {
        // 1.e4 d5 2.e5 f5 3.exf6
        let mut game = ChessGame::new();
        mv(&mut game, (6, 4), (4, 4)); // e4
        mv(&mut game, (1, 3), (3, 3)); // d5
        mv(&mut game, (4, 4), (3, 4)); // e5
        mv(&mut game, (1, 5), (3, 5)); // f5 (double push past e5)
        assert_eq!(game.pos.en_passant, Some((2, 5)));

        mv(&mut game, (3, 4), (2, 5)); // exf6 e.p.
        assert_eq!(game.pos.board[2][5], Some('P'));
        assert_eq!(game.pos.board[3][5], None, "captured pawn removed");
        assert_eq!(game.pos.en_passant, None);
    }

    #[test]
    fn test_en_passant_target_lives_exactly_one_ply() {
        let mut game = ChessGame::new();
        mv(&mut game, (6, 4), (4, 4)); // e4
        assert_eq!(game.pos.en_passant, Some((5, 4)));
        mv(&mut game, (1, 6), (2, 6)); // g6 — unrelated quiet move
        assert_eq!(game.pos.en_passant, None);
    }

    #[test]
    fn test_promotion_defaults_to_queen_and_respects_choice() {
        let mut game =
            ChessGame::from_fen("8/P6k/8/8/8/8/7K/8 w - - 0 1").unwrap();
        mv(&mut game, (1, 0), (0, 0));
        assert_eq!(game.pos.board[0][0], Some('Q'));

        let mut game =
            ChessGame::from_fen("8/P6k/8/8/8/8/7K/8 w - - 0 1").unwrap();
        game.make_move(sq(1, 0), sq(0, 0), Some('n')).unwrap();
        assert_eq!(game.pos.board[0][0], Some('N'));
    }

    #[test]
    fn test_fools_mate_is_checkmate_for_black() {
        let mut game = ChessGame::new();
        mv(&mut game, (6, 5), (5, 5)); // f3
        mv(&mut game, (1, 4), (3, 4)); // e5
        mv(&mut game, (6, 6), (4, 6)); // g4
        mv(&mut game, (0, 3), (4, 7)); // Qh4#

        assert!(game.is_game_over());
        assert!(game.in_check());
        assert_eq!(game.winner(), Some("black"));
    }

    #[test]
    fn test_stalemate_is_a_draw() {
        let game =
            ChessGame::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(game.is_game_over());
        assert!(!game.in_check());
        assert_eq!(game.winner(), Some("draw"));
    }

    #[test]
    fn test_undo_restores_previous_position() {
        let mut game = ChessGame::new();
        let initial = game.fen();
        mv(&mut game, (6, 4), (4, 4));
        assert_ne!(game.fen(), initial);
        assert!(game.undo());
        assert_eq!(game.fen(), initial);
        assert!(!game.undo(), "nothing left to undo");
    }

    #[test]
    fn test_castling_rights_monotone_over_random_legal_play() {
        // Rights may only ever be taken away, never restored.
        use rand::seq::IndexedRandom;
        use rand::{rngs::StdRng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(42);
        let mut game = ChessGame::new();
        let mut prev = game.pos.castling;
        for _ in 0..60 {
            if game.is_game_over() {
                break;
            }
            let mut moves = Vec::new();
            for r in 0..8 {
                for c in 0..8 {
                    if let Some(p) = game.pos.board[r][c] {
                        if Side::of_piece(p) == game.pos.turn {
                            for to in pseudo_moves(&game.pos, r, c) {
                                moves.push(((r, c), to));
                            }
                        }
                    }
                }
            }
            let Some(&(from, to)) = moves.choose(&mut rng) else {
                break;
            };
            let result = game.make_move(
                sq(from.0 as u8, from.1 as u8),
                sq(to.0 as u8, to.1 as u8),
                None,
            );
            if result.is_err() {
                continue;
            }
            let cur = game.pos.castling;
            assert!(!(cur.wk && !prev.wk), "wk restored");
            assert!(!(cur.wq && !prev.wq), "wq restored");
            assert!(!(cur.bk && !prev.bk), "bk restored");
            assert!(!(cur.bq && !prev.bq), "bq restored");
            prev = cur;
        }
    }
}
