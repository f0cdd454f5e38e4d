use std::collections::HashMap;
use std::path::Path;

use crate::error::AlignmentError;

/// Phoneme inventory of the default Khmer wav2vec2 CTC model, in id order.
const PHONEME_SYMBOLS: [&str; 34] = [
    ".", "a", "c", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "r", "s", "t",
    "u", "w", "z", "ŋ", "ɑ", "ɓ", "ɔ", "ɗ", "ə", "ɛ", "ɨ", "ɲ", "ʔ", "|", "[UNK]", "[PAD]",
];

/// Symbol table shared by the tokenizer and the emission model.
///
/// Ids are contiguous `0..len()` and must match the width of every emission
/// matrix aligned against this vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    symbols: Vec<String>,
    ids: HashMap<String, usize>,
    blank_id: usize,
    separator_id: usize,
}

impl Vocabulary {
    pub fn new(
        ids: HashMap<String, usize>,
        blank_symbol: &str,
        separator_symbol: &str,
    ) -> Result<Self, AlignmentError> {
        let mut slots: Vec<Option<String>> = vec![None; ids.len()];
        for (symbol, &id) in &ids {
            let slot = slots.get_mut(id).ok_or_else(|| {
                AlignmentError::vocabulary_mismatch(format!(
                    "id {id} for symbol {symbol:?} is outside 0..{}",
                    ids.len()
                ))
            })?;
            if let Some(existing) = slot {
                return Err(AlignmentError::vocabulary_mismatch(format!(
                    "symbols {existing:?} and {symbol:?} share id {id}"
                )));
            }
            *slot = Some(symbol.clone());
        }
        // Every slot is filled: ids.len() distinct ids all below ids.len().
        let symbols: Vec<String> = slots.into_iter().flatten().collect();

        let lookup = |symbol: &str, role: &str| {
            ids.get(symbol).copied().ok_or_else(|| {
                AlignmentError::vocabulary_mismatch(format!(
                    "{role} symbol {symbol:?} is not in the vocabulary"
                ))
            })
        };
        let blank_id = lookup(blank_symbol, "blank")?;
        let separator_id = lookup(separator_symbol, "separator")?;
        if blank_id == separator_id {
            return Err(AlignmentError::vocabulary_mismatch(
                "blank and separator must be distinct symbols",
            ));
        }

        Ok(Self {
            symbols,
            ids,
            blank_id,
            separator_id,
        })
    }

    /// Load a HuggingFace-style `vocab.json` (`{"symbol": id, ...}`).
    pub fn load(
        path: &Path,
        blank_symbol: &str,
        separator_symbol: &str,
    ) -> Result<Self, AlignmentError> {
        let data =
            std::fs::read_to_string(path).map_err(|e| AlignmentError::io("read vocab.json", e))?;
        let raw: HashMap<String, usize> =
            serde_json::from_str(&data).map_err(|e| AlignmentError::json("parse vocab.json", e))?;
        Self::new(raw, blank_symbol, separator_symbol)
    }

    /// Built-in phoneme table with `[PAD]` as blank and `|` as separator.
    pub fn phonemes() -> Self {
        let symbols: Vec<String> = PHONEME_SYMBOLS.iter().map(|s| s.to_string()).collect();
        let ids = symbols
            .iter()
            .enumerate()
            .map(|(id, s)| (s.clone(), id))
            .collect();
        Self {
            symbols,
            ids,
            blank_id: 33,
            separator_id: 31,
        }
    }

    /// Built-in phoneme table with the blank and separator looked up by symbol.
    pub fn phonemes_with(
        blank_symbol: &str,
        separator_symbol: &str,
    ) -> Result<Self, AlignmentError> {
        let ids = PHONEME_SYMBOLS
            .iter()
            .enumerate()
            .map(|(id, s)| (s.to_string(), id))
            .collect();
        Self::new(ids, blank_symbol, separator_symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn blank_id(&self) -> usize {
        self.blank_id
    }

    pub fn separator_id(&self) -> usize {
        self.separator_id
    }

    pub fn separator_symbol(&self) -> &str {
        &self.symbols[self.separator_id]
    }

    pub fn id(&self, symbol: &str) -> Option<usize> {
        self.ids.get(symbol).copied()
    }

    pub fn symbol(&self, id: usize) -> Option<&str> {
        self.symbols.get(id).map(String::as_str)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    /// Map token ids to their symbols, failing on any id outside the table.
    pub fn labels_for(&self, tokens: &[usize]) -> Result<Vec<String>, AlignmentError> {
        tokens
            .iter()
            .map(|&id| {
                self.symbol(id).map(str::to_string).ok_or_else(|| {
                    AlignmentError::vocabulary_mismatch(format!(
                        "token id {id} is outside vocabulary of size {}",
                        self.len()
                    ))
                })
            })
            .collect()
    }

    /// Check that an emission model's output width matches this table.
    pub fn validate_width(&self, width: usize) -> Result<(), AlignmentError> {
        if width != self.len() {
            return Err(AlignmentError::vocabulary_mismatch(format!(
                "emission width {width} does not match vocabulary size {}",
                self.len()
            )));
        }
        Ok(())
    }
}
