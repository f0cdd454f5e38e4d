use crate::error::AlignmentError;
use crate::types::{Point, Segment};

/// Collapse consecutive path points on the same token into one segment.
///
/// The segment score is the mean point probability; `labels` is indexed by
/// token position and must cover every token in `path`.
pub fn merge_repeats(path: &[Point], labels: &[String]) -> Result<Vec<Segment>, AlignmentError> {
    path.chunk_by(|a, b| a.token_index == b.token_index)
        .map(|run| {
            let first = run[0];
            let last = run[run.len() - 1];
            let label = labels.get(first.token_index).ok_or_else(|| {
                AlignmentError::invalid_input(format!(
                    "path token {} has no label ({} labels)",
                    first.token_index,
                    labels.len()
                ))
            })?;
            let score = run.iter().map(|p| p.probability).sum::<f32>() / run.len() as f32;
            Ok(Segment {
                label: label.clone(),
                start: first.time_index,
                end: last.time_index + 1,
                score,
            })
        })
        .collect()
}

/// Merge runs of non-separator segments into word segments.
///
/// Word score is the length-weighted mean of its segment scores. Separators
/// with nothing between them yield no word.
pub fn merge_words(segments: &[Segment], separator: &str) -> Vec<Segment> {
    segments
        .split(|seg| seg.label == separator)
        .filter(|run| !run.is_empty())
        .map(|run| {
            let label: String = run.iter().map(|seg| seg.label.as_str()).collect();
            let total_len: usize = run.iter().map(Segment::length).sum();
            let weighted: f32 = run.iter().map(|seg| seg.score * seg.length() as f32).sum();
            let score = if total_len == 0 {
                0.0
            } else {
                weighted / total_len as f32
            };
            Segment {
                label,
                start: run[0].start,
                end: run[run.len() - 1].end,
                score,
            }
        })
        .collect()
}
