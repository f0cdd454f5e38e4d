use crate::error::AlignmentError;
use crate::types::{AlignedSpan, Segment, TextUnit, WordSlot};

/// Frame-to-seconds conversion inputs for one alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioTiming {
    /// Frames in the trellis (equal to emission frames).
    pub frame_count: usize,
    pub sample_count: usize,
    pub sample_rate_hz: u32,
}

/// Word spans in time order, produced one at a time.
///
/// Consumed once; recompute the alignment to iterate again.
#[derive(Debug)]
pub struct AlignedSpans {
    words: Vec<Segment>,
    slots: Vec<WordSlot>,
    units: Vec<TextUnit>,
    leading_unit_count: usize,
    samples_per_frame: f64,
    sample_rate: f64,
    cursor: usize,
    display_start: f64,
}

impl AlignedSpans {
    pub(crate) fn empty() -> Self {
        Self {
            words: Vec::new(),
            slots: Vec::new(),
            units: Vec::new(),
            leading_unit_count: 0,
            samples_per_frame: 0.0,
            sample_rate: 1.0,
            cursor: 0,
            display_start: 0.0,
        }
    }

    fn frame_to_secs(&self, frame: usize) -> f64 {
        self.samples_per_frame * frame as f64 / self.sample_rate
    }

    fn word_text(&self, index: usize) -> String {
        let slot = self.slots[index];
        // Units before the first word belong to it.
        let first = if index == 0 {
            slot.unit_index - self.leading_unit_count
        } else {
            slot.unit_index
        };
        let last = slot.unit_index + slot.attached_unit_count;
        self.units[first..=last]
            .iter()
            .map(|unit| unit.text.as_str())
            .collect()
    }
}

impl Iterator for AlignedSpans {
    type Item = AlignedSpan;

    fn next(&mut self) -> Option<AlignedSpan> {
        let index = self.cursor;
        let word = self.words.get(index)?;
        let exact_start = self.frame_to_secs(word.start);
        let exact_end = self.frame_to_secs(word.end);
        // Stretch forward to the next word so displayed spans leave no gaps.
        let display_end = match self.words.get(index + 1) {
            Some(next) => exact_end.max(self.frame_to_secs(next.start)),
            None => exact_end,
        };
        let span = AlignedSpan {
            text: self.word_text(index),
            display_start: self.display_start,
            display_end,
            exact_start,
            exact_end,
        };
        self.display_start = display_end;
        self.cursor += 1;
        Some(span)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.words.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AlignedSpans {}

/// Map word segments back to audio time and reattach their original text.
///
/// The `leading_unit_count` units right before the first word are prefixed
/// to its text.
pub fn assemble(
    word_segments: Vec<Segment>,
    units: Vec<TextUnit>,
    slots: Vec<WordSlot>,
    leading_unit_count: usize,
    timing: AudioTiming,
) -> Result<AlignedSpans, AlignmentError> {
    if word_segments.len() != slots.len() {
        return Err(AlignmentError::invalid_input(format!(
            "{} word segments for {} transcript words",
            word_segments.len(),
            slots.len()
        )));
    }
    if timing.frame_count == 0 || timing.sample_rate_hz == 0 {
        return Err(AlignmentError::invalid_input(
            "frame count and sample rate must be non-zero",
        ));
    }
    if let Some(slot) = slots
        .iter()
        .find(|slot| slot.unit_index + slot.attached_unit_count >= units.len())
    {
        return Err(AlignmentError::invalid_input(format!(
            "word at unit {} with {} attached units exceeds {} text units",
            slot.unit_index,
            slot.attached_unit_count,
            units.len()
        )));
    }

    if let Some(first) = slots.first() {
        if leading_unit_count > first.unit_index {
            return Err(AlignmentError::invalid_input(format!(
                "{leading_unit_count} leading units before a first word at unit {}",
                first.unit_index
            )));
        }
    }

    Ok(AlignedSpans {
        words: word_segments,
        slots,
        units,
        leading_unit_count,
        samples_per_frame: timing.sample_count as f64 / timing.frame_count as f64,
        sample_rate: timing.sample_rate_hz as f64,
        cursor: 0,
        display_start: 0.0,
    })
}
