use crate::error::AlignmentError;
use crate::types::EmissionMatrix;

/// Trellis cell: either excluded from every complete alignment, or the best
/// cumulative log-score of reaching it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Unreachable,
    Reachable(f32),
}

impl Cell {
    pub fn score(self) -> Option<f32> {
        match self {
            Cell::Reachable(score) => Some(score),
            Cell::Unreachable => None,
        }
    }
}

/// Dense (frames × tokens) score matrix, row-major.
#[derive(Debug, Clone)]
pub struct Trellis {
    num_frames: usize,
    num_tokens: usize,
    cells: Vec<Cell>,
}

impl Trellis {
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_tokens(&self) -> usize {
        self.num_tokens
    }

    #[inline]
    pub fn get(&self, t: usize, j: usize) -> Cell {
        self.cells[t * self.num_tokens + j]
    }

    /// `(t, j)` can lie on a path from `(0, 0)` to the last cell: at most one
    /// token advance per frame, and enough frames left to reach the last token.
    #[inline]
    fn feasible(&self, t: usize, j: usize) -> bool {
        j <= t && self.num_tokens - 1 - j <= self.num_frames - 1 - t
    }
}

/// Build the forced-alignment trellis for `tokens` over `emission`.
///
/// Moving from frame `t` to `t + 1` either stays on token `j` (emitting
/// blank at `t`) or advances from `j - 1` (emitting `tokens[j]` at `t`).
pub fn build_trellis(
    emission: &EmissionMatrix,
    tokens: &[usize],
    blank_id: usize,
) -> Result<Trellis, AlignmentError> {
    let num_frames = emission.num_frames();
    let num_tokens = tokens.len();
    let vocab_size = emission.vocab_size();

    if num_tokens == 0 {
        return Err(AlignmentError::invalid_input("token sequence is empty"));
    }
    if num_tokens > num_frames {
        return Err(AlignmentError::infeasible(format!(
            "{num_tokens} tokens cannot be aligned to {num_frames} frames"
        )));
    }
    if blank_id >= vocab_size {
        return Err(AlignmentError::vocabulary_mismatch(format!(
            "blank id {blank_id} is outside emission width {vocab_size}"
        )));
    }
    if let Some(&id) = tokens.iter().find(|&&id| id >= vocab_size) {
        return Err(AlignmentError::vocabulary_mismatch(format!(
            "token id {id} is outside emission width {vocab_size}"
        )));
    }

    let mut trellis = Trellis {
        num_frames,
        num_tokens,
        cells: vec![Cell::Unreachable; num_frames * num_tokens],
    };
    trellis.cells[0] = Cell::Reachable(0.0);

    let mut blank_run = 0.0f32;
    for t in 1..num_frames {
        if !trellis.feasible(t, 0) {
            break;
        }
        blank_run += emission.get(t, blank_id);
        trellis.cells[t * num_tokens] = Cell::Reachable(blank_run);
    }

    for t in 0..num_frames - 1 {
        let row = &emission.rows()[t];
        let stay_lp = row[blank_id];
        for j in 1..num_tokens {
            if !trellis.feasible(t + 1, j) {
                continue;
            }
            let stayed = trellis.get(t, j).score().map(|s| s + stay_lp);
            let changed = trellis.get(t, j - 1).score().map(|s| s + row[tokens[j]]);
            let best = match (stayed, changed) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
            if let Some(score) = best {
                if !score.is_finite() {
                    return Err(AlignmentError::non_finite("trellis", t + 1, j));
                }
                trellis.cells[(t + 1) * num_tokens + j] = Cell::Reachable(score);
            }
        }
    }

    tracing::debug!(
        frames = num_frames,
        tokens = num_tokens,
        "trellis: built"
    );
    Ok(trellis)
}
