use crate::error::AlignmentError;
use crate::types::{TextUnit, TokenSequence, WordSlot};
use crate::vocabulary::Vocabulary;

/// Join the token groups of resolved units with separators.
///
/// Unresolved units (and resolved units without tokens) produce no tokens;
/// they are attached to the preceding word, or counted as leading units when
/// no word precedes them.
pub fn build_token_sequence(
    units: &[TextUnit],
    vocab: &Vocabulary,
) -> Result<TokenSequence, AlignmentError> {
    let sep = vocab.separator_id();
    let mut tokens = vec![sep];
    let mut words: Vec<WordSlot> = Vec::new();
    let mut leading_unit_count = 0usize;

    for (unit_index, unit) in units.iter().enumerate() {
        let resolved = unit
            .resolved
            .as_ref()
            .filter(|resolved| !resolved.token_ids.is_empty());
        let Some(resolved) = resolved else {
            match words.last_mut() {
                Some(word) => word.attached_unit_count += 1,
                None => leading_unit_count += 1,
            }
            continue;
        };

        if resolved.token_ids.contains(&sep) {
            return Err(AlignmentError::invalid_input(format!(
                "unit {unit_index} ({:?}) contains the word separator token",
                unit.text
            )));
        }
        tokens.extend_from_slice(&resolved.token_ids);
        tokens.push(sep);
        words.push(WordSlot {
            unit_index,
            attached_unit_count: 0,
        });
    }

    if words.is_empty() {
        tokens.clear();
    }
    let labels = vocab.labels_for(&tokens)?;

    Ok(TokenSequence {
        tokens,
        labels,
        words,
        leading_unit_count,
    })
}

/// Split `text` into alternating whitespace and non-whitespace units and
/// resolve each word to the vocabulary symbols it contains.
///
/// Concatenating the unit texts reproduces `text` exactly. Casing follows the
/// vocabulary: text is uppercased for uppercase-only vocabularies and
/// lowercased otherwise.
pub fn tokenize_units(text: &str, vocab: &Vocabulary) -> Vec<TextUnit> {
    let upper_only = is_upper_only(vocab);
    let mut units = Vec::new();
    let mut run = String::new();
    let mut run_is_space = false;

    for c in text.chars() {
        if !run.is_empty() && c.is_whitespace() != run_is_space {
            units.push(resolve_run(std::mem::take(&mut run), run_is_space, upper_only, vocab));
        }
        run_is_space = c.is_whitespace();
        run.push(c);
    }
    if !run.is_empty() {
        units.push(resolve_run(run, run_is_space, upper_only, vocab));
    }
    units
}

fn is_upper_only(vocab: &Vocabulary) -> bool {
    let mut has_upper = false;
    let mut has_lower = false;
    for c in vocab.symbols().filter_map(single_char).filter(|c| c.is_alphabetic()) {
        has_upper |= c.is_uppercase();
        has_lower |= c.is_lowercase();
    }
    has_upper && !has_lower
}

fn single_char(symbol: &str) -> Option<char> {
    let mut it = symbol.chars();
    let c = it.next()?;
    it.next().is_none().then_some(c)
}

fn resolve_run(run: String, is_space: bool, upper_only: bool, vocab: &Vocabulary) -> TextUnit {
    if is_space {
        return TextUnit::unresolved(run);
    }
    let cased = if upper_only {
        run.to_uppercase()
    } else {
        run.to_lowercase()
    };

    let mut phonemes = String::new();
    let mut token_ids = Vec::new();
    let mut buf = [0u8; 4];
    for c in cased.chars() {
        let Some(id) = vocab.id(c.encode_utf8(&mut buf)) else {
            continue;
        };
        if id == vocab.blank_id() || id == vocab.separator_id() {
            continue;
        }
        phonemes.push(c);
        token_ids.push(id);
    }

    if token_ids.is_empty() {
        TextUnit::unresolved(run)
    } else {
        TextUnit::resolved(run, phonemes, token_ids)
    }
}
