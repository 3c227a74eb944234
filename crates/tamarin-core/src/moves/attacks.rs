//! Precomputed attack masks and ray-scan sliding attacks.
//!
//! No move generator lives in this crate; these masks serve the evaluator's
//! king-zone terms and the static exchange evaluator, which must recompute
//! slider attacks as the occupancy changes.

use crate::pieces::Color;
use crate::Bitboard;

const fn shift_from(file: i8, rank: i8, df: i8, dr: i8) -> Option<u8> {
    let f = file + df;
    let r = rank + dr;
    if f >= 0 && f < 8 && r >= 0 && r < 8 {
        Some((r * 8 + f) as u8)
    } else {
        None
    }
}

const fn build_leaper(deltas: &[(i8, i8)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0;
    while sq < 64 {
        let file = (sq & 7) as i8;
        let rank = (sq >> 3) as i8;
        let mut i = 0;
        while i < deltas.len() {
            if let Some(target) = shift_from(file, rank, deltas[i].0, deltas[i].1) {
                table[sq] |= 1u64 << target;
            }
            i += 1;
        }
        sq += 1;
    }
    table
}

const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_DELTAS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

static KNIGHT_ATTACKS: [u64; 64] = build_leaper(&KNIGHT_DELTAS);
static KING_ATTACKS: [u64; 64] = build_leaper(&KING_DELTAS);
static WHITE_PAWN_CAPTURES: [u64; 64] = build_leaper(&[(-1, 1), (1, 1)]);
static BLACK_PAWN_CAPTURES: [u64; 64] = build_leaper(&[(-1, -1), (1, -1)]);

#[inline]
pub fn knight_attacks(sq: u8) -> Bitboard {
    Bitboard::new(KNIGHT_ATTACKS[sq as usize])
}

/// The king's eight move targets; together with the king's own square this
/// forms the king zone.
#[inline]
pub fn king_attacks(sq: u8) -> Bitboard {
    Bitboard::new(KING_ATTACKS[sq as usize])
}

/// Squares a pawn of `color` on `sq` attacks.
#[inline]
pub fn pawn_attacks(color: Color, sq: u8) -> Bitboard {
    match color {
        Color::White => Bitboard::new(WHITE_PAWN_CAPTURES[sq as usize]),
        Color::Black => Bitboard::new(BLACK_PAWN_CAPTURES[sq as usize]),
    }
}

/// Capture targets of every pawn in `pawns`, computed bit-parallel.
#[inline]
pub fn pawn_attack_set(color: Color, pawns: Bitboard) -> Bitboard {
    match color {
        Color::White => pawns.shift_northwest() | pawns.shift_northeast(),
        Color::Black => pawns.shift_southwest() | pawns.shift_southeast(),
    }
}

fn ray_attacks(sq: u8, occupied: Bitboard, deltas: &[(i8, i8); 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &(df, dr) in deltas {
        let mut file = (sq & 7) as i8 + df;
        let mut rank = (sq >> 3) as i8 + dr;
        while (0..8).contains(&file) && (0..8).contains(&rank) {
            let target = Bitboard::from_square((rank * 8 + file) as u8);
            attacks |= target;
            if (occupied & target).is_not_empty() {
                break;
            }
            file += df;
            rank += dr;
        }
    }
    attacks
}

pub fn bishop_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, &[(1, 1), (1, -1), (-1, 1), (-1, -1)])
}

pub fn rook_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, &[(1, 0), (-1, 0), (0, 1), (0, -1)])
}

pub fn queen_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Square;

    #[test]
    fn test_knight_attacks() {
        assert_eq!(knight_attacks(Square::E4.index()).count_bits(), 8);
        assert_eq!(knight_attacks(Square::A1.index()).count_bits(), 2);
        assert!(knight_attacks(Square::A1.index()).contains(Square::C2.index()));
    }

    #[test]
    fn test_king_attacks() {
        assert_eq!(king_attacks(Square::E4.index()).count_bits(), 8);
        assert_eq!(king_attacks(Square::A1.index()).count_bits(), 3);
    }

    #[test]
    fn test_pawn_attacks() {
        let white = pawn_attacks(Color::White, Square::E4.index());
        assert!(white.contains(Square::D5.index()));
        assert!(white.contains(Square::F5.index()));
        assert_eq!(white.count_bits(), 2);

        let edge = pawn_attacks(Color::Black, Square::A7.index());
        assert_eq!(edge.count_bits(), 1);
        assert!(edge.contains(Square::B6.index()));
    }

    #[test]
    fn test_pawn_attack_set_matches_per_square() {
        let pawns = Square::E4.bitboard() | Square::A2.bitboard() | Square::H7.bitboard();
        let set = pawn_attack_set(Color::White, pawns);
        let mut expected = Bitboard::EMPTY;
        for sq in pawns.iter() {
            expected |= pawn_attacks(Color::White, sq as u8);
        }
        assert_eq!(set, expected);
    }

    #[test]
    fn test_sliding_attacks_blocked() {
        let occ = Square::E6.bitboard();
        let rook = rook_attacks(Square::E4.index(), occ);
        assert!(rook.contains(Square::E5.index()));
        assert!(rook.contains(Square::E6.index()));
        assert!(!rook.contains(Square::E7.index()));
        assert!(rook.contains(Square::A4.index()));

        let empty = Bitboard::EMPTY;
        assert_eq!(bishop_attacks(Square::E4.index(), empty).count_bits(), 13);
        assert_eq!(rook_attacks(Square::E4.index(), empty).count_bits(), 14);
        assert_eq!(queen_attacks(Square::E4.index(), empty).count_bits(), 27);
    }
}
