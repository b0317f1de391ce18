use cozy_chess::{Board, Color, File, Move, Piece, Rank, Square};
use crate::error::{EngineError, Result};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The session's single mutable position plus its take-back stack.
///
/// `history` holds the boards preceding each applied move. Once a move resets
/// the halfmove clock (capture or pawn move) the stack is emptied, so nothing
/// at or before that move can be taken back.
#[derive(Clone, Debug)]
pub struct Position {
    board: Board,
    history: Vec<Board>,
    plies_from_start: u32,
}

impl Default for Position {
    fn default() -> Self { Self::startpos() }
}

impl Position {
    pub fn startpos() -> Self {
        Self { board: Board::default(), history: Vec::new(), plies_from_start: 0 }
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        let full = complete_fen(fen);
        let board = Board::from_fen(&full, false)
            .map_err(|e| EngineError::InvalidFen { fen: fen.to_string(), reason: format!("{e:?}") })?;
        let plies = (board.fullmove_number().saturating_sub(1) as u32) * 2
            + if board.side_to_move() == Color::Black { 1 } else { 0 };
        Ok(Self { board, history: Vec::new(), plies_from_start: plies })
    }

    pub fn board(&self) -> &Board { &self.board }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    /// Plies played since game start, used to gate opening book usage.
    pub fn plies_from_start(&self) -> u32 { self.plies_from_start }

    pub fn reset_counters(&mut self) { self.plies_from_start = 0; }

    /// Number of plies that can currently be taken back.
    pub fn history_len(&self) -> usize { self.history.len() }

    pub fn make_move_uci(&mut self, mv_uci: &str) -> Result<()> {
        let mv = parse_move_text(&self.board, mv_uci)?;
        self.history.push(self.board.clone());
        self.board.play(mv);
        self.plies_from_start += 1;
        if self.board.halfmove_clock() == 0 {
            self.history.clear();
        }
        Ok(())
    }

    /// Applies moves in order, stopping at the first one that does not parse or is illegal.
    pub fn make_moves<'a, I>(&mut self, moves: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for m in moves { self.make_move_uci(m)?; }
        Ok(())
    }

    pub fn take_back(&mut self) -> Result<()> {
        let prev = self.history.pop().ok_or(EngineError::NothingToTakeBack)?;
        self.board = prev;
        self.plies_from_start = self.plies_from_start.saturating_sub(1);
        Ok(())
    }

    pub fn set_from_start_and_moves(moves: &[String]) -> Result<Self> {
        let mut pos = Self::startpos();
        pos.make_moves(moves.iter().map(String::as_str))?;
        Ok(pos)
    }

    /// Diagnostic board grid, rank 8 at the top.
    pub fn diagram(&self) -> String {
        let mut out = String::from("--------------------------------------------\n");
        for &rank in Rank::ALL.iter().rev() {
            for &file in File::ALL.iter() {
                let sq = Square::new(file, rank);
                let c = match (self.board.piece_on(sq), self.board.color_on(sq)) {
                    (Some(p), Some(color)) => piece_char(p, color),
                    _ => '.',
                };
                out.push(c);
                out.push(' ');
            }
            out.push_str(&format!(" {}\n", rank as usize + 1));
        }
        out.push_str("\na b c d e f g h\n\n--------------------------------------------\n");
        out
    }
}

fn piece_char(piece: Piece, color: Color) -> char {
    let c = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    if color == Color::White { c.to_ascii_uppercase() } else { c }
}

/// Adds default halfmove/fullmove counters to FENs that omit them.
pub fn complete_fen(fen: &str) -> String {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    match fields.len() {
        4 => format!("{} 0 1", fields.join(" ")),
        5 => format!("{} 1", fields.join(" ")),
        _ => fields.join(" "),
    }
}

/// Parses standard UCI move text. Castling arrives as the king's two-square
/// step (`e1g1`) and is mapped to the board's king-takes-rook encoding.
pub fn parse_move_text(board: &Board, text: &str) -> Result<Move> {
    let mut mv: Move = text.parse().map_err(|_| EngineError::IllegalMove(text.to_string()))?;
    let stm = board.side_to_move();
    if board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.from) == Some(stm)
        && board.color_on(mv.to) != Some(stm)
        && mv.from.rank() == mv.to.rank()
    {
        let from_file = mv.from.file() as i32;
        let to_file = mv.to.file() as i32;
        if (to_file - from_file).abs() == 2 {
            let rook_file = if to_file > from_file { File::H } else { File::A };
            mv.to = Square::new(rook_file, mv.from.rank());
        }
    }
    if board.is_legal(mv) { Ok(mv) } else { Err(EngineError::IllegalMove(text.to_string())) }
}

/// Formats a legal move as standard UCI text (inverse of [`parse_move_text`]).
pub fn format_move_text(board: &Board, mv: Move) -> String {
    let stm = board.side_to_move();
    let mut shown = mv;
    if board.piece_on(mv.from) == Some(Piece::King) && board.color_on(mv.to) == Some(stm) {
        let file = if (mv.to.file() as usize) > (mv.from.file() as usize) { File::G } else { File::C };
        shown.to = Square::new(file, mv.from.rank());
    }
    format!("{}", shown)
}

/// Formats a principal variation by replaying it on a scratch board.
pub fn format_line(board: &Board, line: &[Move]) -> Vec<String> {
    let mut scratch = board.clone();
    let mut out = Vec::with_capacity(line.len());
    for &mv in line {
        if !scratch.is_legal(mv) { break; }
        out.push(format_move_text(&scratch, mv));
        scratch.play(mv);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn castling_text_roundtrips_through_board_encoding() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("fen");
        let mv = parse_move_text(pos.board(), "e1g1").expect("castle");
        assert_eq!(format_move_text(pos.board(), mv), "e1g1");
        pos.make_move_uci("e1c1").expect("queenside castle");
        assert_eq!(pos.side_to_move(), Color::Black);
    }

    #[test]
    fn short_fen_is_completed() {
        assert_eq!(complete_fen("8/8/8/8/8/8/8/K6k w - -"), "8/8/8/8/8/8/8/K6k w - - 0 1");
        assert!(Position::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -").is_ok());
    }

    #[test]
    fn diagram_has_rank_labels() {
        let d = Position::startpos().diagram();
        assert!(d.contains("r n b q k b n r  8"));
        assert!(d.contains("R N B Q K B N R  1"));
    }
}
