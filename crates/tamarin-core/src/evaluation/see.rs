//! Static exchange evaluation.
//!
//! Simulates the optimal capture sequence on a single square with a swap
//! list, recomputing slider attackers after every simulated capture so that
//! x-ray pieces join the exchange as they are revealed.

use crate::moves::attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};
use crate::moves::{Move, MoveKind};
use crate::pieces::{Color, PieceType};
use crate::utils::list::IntStack;
use crate::{Bitboard, Position};

/// Net material outcome of `mv` in centipawns, from the viewpoint of the
/// side making the move.
pub fn static_exchange_eval(pos: &Position, mv: Move) -> i32 {
    let target = mv.to.index();
    let mut occupied = pos.all_occupied ^ mv.from.bitboard();

    let mut first_gain = match mv.kind {
        MoveKind::EnPassant => {
            // The captured pawn is not on the target square.
            let captured_sq = match mv.moved.color {
                Color::White => target - 8,
                Color::Black => target + 8,
            };
            occupied ^= Bitboard::from_square(captured_sq);
            PieceType::Pawn.value()
        }
        _ => mv.captured.map_or(0, |piece| piece.value()),
    };

    let mut occupant_value = mv.moved.value();
    if let Some(promotion) = mv.kind.promotion() {
        first_gain += promotion.value() - PieceType::Pawn.value();
        occupant_value = promotion.value();
    }

    let mut gains = IntStack::new();
    gains.push(first_gain);
    let mut last_gain = first_gain;
    let mut side = !pos.side_to_move();

    loop {
        let Some((attacker_sq, attacker)) = least_valuable_attacker(pos, target, side, occupied)
        else {
            break;
        };
        // A defended square cannot legally be retaken by the king.
        if attacker == PieceType::King
            && has_attackers(
                pos,
                target,
                !side,
                occupied ^ Bitboard::from_square(attacker_sq),
            )
        {
            break;
        }

        let speculative = occupant_value - last_gain;
        gains.push(speculative);
        last_gain = speculative;
        occupant_value = attacker.value();
        occupied ^= Bitboard::from_square(attacker_sq);
        side = !side;
    }

    // Fold the swap list: at each depth the side to move may stand pat.
    let mut score = gains.pop().expect("swap list is never empty");
    while let Some(previous) = gains.pop() {
        score = -(-previous).max(score);
    }
    score
}

/// Cheapest piece of `side` attacking `target` under `occupied`.
fn least_valuable_attacker(
    pos: &Position,
    target: u8,
    side: Color,
    occupied: Bitboard,
) -> Option<(u8, PieceType)> {
    for piece_type in [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ] {
        let attackers = attackers_of_type(pos, target, side, piece_type, occupied);
        if let Some(sq) = attackers.lsb() {
            return Some((sq as u8, piece_type));
        }
    }
    None
}

fn has_attackers(pos: &Position, target: u8, side: Color, occupied: Bitboard) -> bool {
    PieceType::ALL
        .iter()
        .any(|&pt| attackers_of_type(pos, target, side, pt, occupied).is_not_empty())
}

fn attackers_of_type(
    pos: &Position,
    target: u8,
    side: Color,
    piece_type: PieceType,
    occupied: Bitboard,
) -> Bitboard {
    let candidates = pos.pieces_of(piece_type, side) & occupied;
    let reach = match piece_type {
        PieceType::Pawn => pawn_attacks(!side, target),
        PieceType::Knight => knight_attacks(target),
        PieceType::Bishop => bishop_attacks(target, occupied),
        PieceType::Rook => rook_attacks(target, occupied),
        PieceType::Queen => bishop_attacks(target, occupied) | rook_attacks(target, occupied),
        PieceType::King => king_attacks(target),
    };
    candidates & reach
}
