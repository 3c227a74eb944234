pub mod attacks;

use crate::pieces::{Piece, PieceType};
use crate::Square;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    Quiet,
    Capture,
    EnPassant,
    Castle,
    PromoteKnight,
    PromoteBishop,
    PromoteRook,
    PromoteQueen,
}

impl MoveKind {
    pub const fn promotion(self) -> Option<PieceType> {
        match self {
            MoveKind::PromoteKnight => Some(PieceType::Knight),
            MoveKind::PromoteBishop => Some(PieceType::Bishop),
            MoveKind::PromoteRook => Some(PieceType::Rook),
            MoveKind::PromoteQueen => Some(PieceType::Queen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub moved: Piece,
    pub captured: Option<Piece>,
    pub kind: MoveKind,
}

impl Move {
    pub const fn new(
        from: Square,
        to: Square,
        moved: Piece,
        captured: Option<Piece>,
        kind: MoveKind,
    ) -> Self {
        Move {
            from,
            to,
            moved,
            captured,
            kind,
        }
    }
}
