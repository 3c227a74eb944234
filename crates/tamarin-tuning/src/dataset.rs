//! Training-set loading for evaluation tuning.
//!
//! Reads EPD-style lines pairing a position with a game outcome, the usual
//! input for fitting evaluation weights against results:
//!
//! ```text
//! <FEN> "1-0";
//! <FEN> "1/2-1/2";
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tamarin_core::Position;

/// One training example: a position snapshot and the eventual game result
/// from white's viewpoint (1 win, 0.5 draw, 0 loss).
#[derive(Debug, Clone)]
pub struct LabeledPosition {
    pub position: Position,
    pub outcome: f64,
}

/// Parse an EPD file of `FEN "result"` lines. Suitable as the loader
/// injected into [`AsgdBuilder::cache_training_data`].
///
/// [`AsgdBuilder::cache_training_data`]: crate::AsgdBuilder::cache_training_data
pub fn load_epd(
    path: &Path,
) -> std::result::Result<Vec<LabeledPosition>, Box<dyn std::error::Error + Send + Sync>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut data = Vec::new();

    for line_result in reader.lines() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('"');
        let fen = fields.next().ok_or("missing FEN field")?;
        let position = Position::from_fen(fen)?;
        let outcome = match fields.next().ok_or("missing result field")? {
            "1-0" => 1.0,
            "1/2-1/2" => 0.5,
            "0-1" => 0.0,
            other => return Err(format!("unknown result: {:?}", other).into()),
        };
        data.push(LabeledPosition { position, outcome });
    }

    Ok(data)
}

/// Map a centipawn score to a win expectancy in (0, 1). `scale` controls
/// how many centipawns one unit of expectancy spans.
#[inline]
pub fn win_expectancy(score_cp: f64, scale: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(-score_cp / scale))
}

/// Squared error between a predicted win expectancy and the observed
/// outcome; summing this over a dataset gives the usual tuning cost.
#[inline]
pub fn prediction_error(score_cp: f64, outcome: f64, scale: f64) -> f64 {
    let err = outcome - win_expectancy(score_cp, scale);
    err * err
}
