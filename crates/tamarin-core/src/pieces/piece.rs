use crate::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Piece kinds in offset-board order: king first, pawn last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::King,
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
        PieceType::Pawn,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            PieceType::King => 0,
            PieceType::Queen => 1,
            PieceType::Rook => 2,
            PieceType::Bishop => 3,
            PieceType::Knight => 4,
            PieceType::Pawn => 5,
        }
    }

    #[inline]
    pub const fn from_index(index: usize) -> Option<PieceType> {
        match index {
            0 => Some(PieceType::King),
            1 => Some(PieceType::Queen),
            2 => Some(PieceType::Rook),
            3 => Some(PieceType::Bishop),
            4 => Some(PieceType::Knight),
            5 => Some(PieceType::Pawn),
            _ => None,
        }
    }

    /// Material value in centipawns.
    pub const fn value(self) -> i32 {
        match self {
            PieceType::King => 20000,
            PieceType::Queen => 900,
            PieceType::Rook => 500,
            PieceType::Bishop => 330,
            PieceType::Knight => 320,
            PieceType::Pawn => 100,
        }
    }

    /// Contribution to the game-phase counter. Kings and pawns carry none;
    /// both sides' full sets total 24.
    pub const fn phase_weight(self) -> i32 {
        match self {
            PieceType::King => 0,
            PieceType::Queen => 4,
            PieceType::Rook => 2,
            PieceType::Bishop => 1,
            PieceType::Knight => 1,
            PieceType::Pawn => 0,
        }
    }

    pub const fn is_sliding(self) -> bool {
        matches!(self, PieceType::Bishop | PieceType::Rook | PieceType::Queen)
    }

    pub const fn symbol(self) -> char {
        match self {
            PieceType::King => 'K',
            PieceType::Queen => 'Q',
            PieceType::Rook => 'R',
            PieceType::Bishop => 'B',
            PieceType::Knight => 'N',
            PieceType::Pawn => 'P',
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
}

impl Piece {
    pub const EMPTY_CODE: u8 = 0;

    #[inline]
    pub const fn new(piece_type: PieceType, color: Color) -> Self {
        Piece { piece_type, color }
    }

    /// Offset-board code: 0 empty, 1..=6 white king..pawn, 7..=12 black.
    #[inline]
    pub const fn code(self) -> u8 {
        1 + (self.color.index() * 6 + self.piece_type.index()) as u8
    }

    #[inline]
    pub const fn from_code(code: u8) -> Option<Piece> {
        if code == 0 || code > 12 {
            return None;
        }
        let idx = (code - 1) as usize;
        match (Color::from_index(idx / 6), PieceType::from_index(idx % 6)) {
            (Some(color), Some(piece_type)) => Some(Piece { piece_type, color }),
            _ => None,
        }
    }

    /// Index into the per-piece bitboard array (code minus one).
    #[inline]
    pub const fn board_index(self) -> usize {
        (self.code() - 1) as usize
    }

    #[inline]
    pub const fn value(self) -> i32 {
        self.piece_type.value()
    }

    pub const fn symbol(self) -> char {
        let upper = self.piece_type.symbol();
        match self.color {
            Color::White => upper,
            Color::Black => upper.to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl std::str::FromStr for Piece {
    type Err = crate::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (ch, rest) = (chars.next(), chars.next());
        let ch = match (ch, rest) {
            (Some(c), None) => c,
            _ => {
                return Err(crate::EngineError::ParseError(format!(
                    "Invalid piece: {}",
                    s
                )))
            }
        };
        let color = if ch.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece_type = match ch.to_ascii_uppercase() {
            'K' => PieceType::King,
            'Q' => PieceType::Queen,
            'R' => PieceType::Rook,
            'B' => PieceType::Bishop,
            'N' => PieceType::Knight,
            'P' => PieceType::Pawn,
            _ => {
                return Err(crate::EngineError::ParseError(format!(
                    "Invalid piece: {}",
                    s
                )))
            }
        };
        Ok(Piece::new(piece_type, color))
    }
}
