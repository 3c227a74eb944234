use crate::board::zobrist::{PIECE_KEYS, SIDE_KEY};
use crate::board::{Bitboard, Square};
use crate::error::{EngineError, Result};
use crate::pieces::{Color, Piece, PieceType};

/// Immutable snapshot of a chess position.
///
/// The twelve piece bitboards partition `all_occupied` and the offset board
/// agrees with them; both are maintained by the constructors. `key` hashes
/// the full position (pieces + side to move), `pawn_key` hashes pawns only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub pieces: [Bitboard; 12],
    pub occupied: [Bitboard; 2],
    pub all_occupied: Bitboard,
    /// Offset board: 0 empty, 1..=6 white king..pawn, 7..=12 black.
    pub board: [u8; 64],
    pub side_to_move: Color,
    pub key: u64,
    pub pawn_key: u64,
}

impl Position {
    pub fn new() -> Self {
        Position {
            pieces: [Bitboard::EMPTY; 12],
            occupied: [Bitboard::EMPTY; 2],
            all_occupied: Bitboard::EMPTY,
            board: [0; 64],
            side_to_move: Color::White,
            key: 0,
            pawn_key: 0,
        }
    }

    pub fn starting() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w")
            .expect("starting position FEN is valid")
    }

    /// Parse the board and side-to-move fields of a FEN string. Castling,
    /// en-passant and clock fields are tolerated and ignored.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.is_empty() {
            return Err(EngineError::ParseError("Empty FEN string".to_string()));
        }

        let mut position = Position::new();

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(EngineError::ParseError("FEN must have 8 ranks".to_string()));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let mut file_idx = 0usize;
            for ch in rank_str.chars() {
                if file_idx >= 8 {
                    return Err(EngineError::ParseError(
                        "Too many files in rank".to_string(),
                    ));
                }
                if let Some(count) = ch.to_digit(10) {
                    file_idx += count as usize;
                    if file_idx > 8 {
                        return Err(EngineError::ParseError(
                            "Invalid empty square count".to_string(),
                        ));
                    }
                } else {
                    let piece: Piece = ch.to_string().parse()?;
                    // rank_idx 0 is rank 8
                    let square_idx = (7 - rank_idx) * 8 + file_idx;
                    let square = Square::new(square_idx as u8)
                        .expect("rank and file bounds were checked");
                    position.place_piece(square, piece);
                    file_idx += 1;
                }
            }
            if file_idx != 8 {
                return Err(EngineError::ParseError(
                    "Rank doesn't have 8 files".to_string(),
                ));
            }
        }

        if parts.len() > 1 {
            let side = match parts[1] {
                "w" => Color::White,
                "b" => Color::Black,
                _ => return Err(EngineError::ParseError("Invalid side to move".to_string())),
            };
            position.set_side_to_move(side);
        }

        Ok(position)
    }

    #[inline]
    pub fn piece_code_at(&self, square: Square) -> u8 {
        self.board[square.index() as usize]
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        Piece::from_code(self.piece_code_at(square))
    }

    pub fn place_piece(&mut self, square: Square, piece: Piece) {
        debug_assert_eq!(self.board[square.index() as usize], 0);
        let bb = square.bitboard();
        self.board[square.index() as usize] = piece.code();
        self.pieces[piece.board_index()] |= bb;
        self.occupied[piece.color.index()] |= bb;
        self.all_occupied |= bb;
        self.key ^= PIECE_KEYS[piece.board_index()][square.index() as usize];
        if piece.piece_type == PieceType::Pawn {
            self.pawn_key ^= PIECE_KEYS[piece.board_index()][square.index() as usize];
        }
    }

    pub fn remove_piece(&mut self, square: Square) {
        if let Some(piece) = self.piece_at(square) {
            let bb = square.bitboard();
            self.board[square.index() as usize] = 0;
            self.pieces[piece.board_index()] ^= bb;
            self.occupied[piece.color.index()] ^= bb;
            self.all_occupied ^= bb;
            self.key ^= PIECE_KEYS[piece.board_index()][square.index() as usize];
            if piece.piece_type == PieceType::Pawn {
                self.pawn_key ^= PIECE_KEYS[piece.board_index()][square.index() as usize];
            }
        }
    }

    pub fn set_side_to_move(&mut self, side: Color) {
        if self.side_to_move != side {
            self.key ^= SIDE_KEY;
            self.side_to_move = side;
        }
    }

    #[inline]
    pub fn pieces_of(&self, piece_type: PieceType, color: Color) -> Bitboard {
        self.pieces[color.index() * 6 + piece_type.index()]
    }

    #[inline]
    pub fn pieces_of_color(&self, color: Color) -> Bitboard {
        self.occupied[color.index()]
    }

    #[inline]
    pub fn all_pieces(&self) -> Bitboard {
        self.all_occupied
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of(PieceType::King, color)
            .lsb()
            .map(|idx| Square::new(idx as u8).expect("bit index below 64"))
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Check that the bitboards partition the occupancy and agree with the
    /// offset board. Intended for tests and debug assertions.
    pub fn is_consistent(&self) -> bool {
        let mut union = Bitboard::EMPTY;
        for (i, bb) in self.pieces.iter().enumerate() {
            if (union & *bb).is_not_empty() {
                return false;
            }
            union |= *bb;
            for sq in bb.iter() {
                if self.board[sq as usize] != (i + 1) as u8 {
                    return false;
                }
            }
        }
        union == self.all_occupied
            && (self.occupied[0] | self.occupied[1]) == self.all_occupied
            && (self.occupied[0] & self.occupied[1]).is_empty()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}
