use crate::alignment::trellis::Trellis;
use crate::error::AlignmentError;
use crate::types::{EmissionMatrix, Point};

/// Recover the best path through `trellis`, one point per frame in time order.
///
/// Walks back from the last frame and last token. At each frame the path
/// advances to the previous token only when that strictly beats staying;
/// equal scores stay.
pub fn backtrack(
    trellis: &Trellis,
    emission: &EmissionMatrix,
    tokens: &[usize],
    blank_id: usize,
) -> Result<Vec<Point>, AlignmentError> {
    let num_frames = trellis.num_frames();
    let num_tokens = trellis.num_tokens();
    if num_frames == 0 || num_tokens == 0 {
        return Err(AlignmentError::invalid_input("empty trellis"));
    }
    if emission.num_frames() != num_frames || tokens.len() != num_tokens {
        return Err(AlignmentError::invalid_input(format!(
            "trellis shape ({num_frames}, {num_tokens}) does not match emission frames {} and {} tokens",
            emission.num_frames(),
            tokens.len()
        )));
    }
    let vocab_size = emission.vocab_size();
    if let Some(&id) = tokens
        .iter()
        .chain(std::iter::once(&blank_id))
        .find(|&&id| id >= vocab_size)
    {
        return Err(AlignmentError::vocabulary_mismatch(format!(
            "id {id} is outside emission width {vocab_size}"
        )));
    }

    let mut t = num_frames - 1;
    let mut j = num_tokens - 1;
    if trellis.get(t, j).score().is_none() {
        return Err(AlignmentError::infeasible(
            "final trellis cell is unreachable",
        ));
    }

    let mut path = Vec::with_capacity(num_frames);
    path.push(Point {
        token_index: j,
        time_index: t,
        probability: emission.get(t, blank_id).exp(),
    });

    while j > 0 {
        if t == 0 {
            return Err(AlignmentError::infeasible(format!(
                "reached frame 0 with {j} tokens left"
            )));
        }
        let p_stay = emission.get(t - 1, blank_id);
        let p_change = emission.get(t - 1, tokens[j]);
        let stayed = trellis.get(t - 1, j).score().map(|s| s + p_stay);
        let changed = trellis.get(t - 1, j - 1).score().map(|s| s + p_change);

        let advance = match (stayed, changed) {
            (Some(stayed), Some(changed)) => changed > stayed,
            (None, Some(_)) => true,
            (Some(_), None) => false,
            (None, None) => {
                return Err(AlignmentError::infeasible(format!(
                    "no reachable predecessor for frame {t}, token {j}"
                )));
            }
        };

        t -= 1;
        let lp = if advance {
            j -= 1;
            p_change
        } else {
            p_stay
        };
        path.push(Point {
            token_index: j,
            time_index: t,
            probability: lp.exp(),
        });
    }

    while t > 0 {
        path.push(Point {
            token_index: j,
            time_index: t - 1,
            probability: emission.get(t - 1, blank_id).exp(),
        });
        t -= 1;
    }

    path.reverse();
    Ok(path)
}
