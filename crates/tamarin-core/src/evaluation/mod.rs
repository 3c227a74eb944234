pub mod evaluator;
pub mod pst;
pub mod see;

pub use evaluator::{EtEntry, Evaluator, NodeType, PtEntry};
pub use see::static_exchange_eval;

/// Score returned for drawn material configurations.
pub const INSUFFICIENT_MATERIAL: i32 = 0;

/// Margin around the alpha-beta window outside of which the evaluator may
/// return the cheap core score without extensions.
pub const LAZY_EVAL_MARGIN: i32 = 151;

/// Combined phase weight of both sides' full non-pawn, non-king material.
pub const TOTAL_PHASE_WEIGHT: i32 = 24;

/// Phase score at full endgame.
pub const MAX_PHASE: i32 = 256;
