use crate::alignment::tokenization::tokenize_units;
use crate::pipeline::traits::TextTokenizer;
use crate::types::TextUnit;
use crate::vocabulary::Vocabulary;

/// Maps each word's characters directly onto vocabulary symbols.
pub struct SymbolTokenizer;

impl TextTokenizer for SymbolTokenizer {
    fn tokenize(&self, text: &str, vocab: &Vocabulary) -> Vec<TextUnit> {
        tokenize_units(text, vocab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_tokenizer_tokenize() {
        let vocab = Vocabulary::phonemes();
        let units = SymbolTokenizer.tokenize("kam puʔ", &vocab);
        assert_eq!(units.len(), 3);
        assert_eq!(units, tokenize_units("kam puʔ", &vocab));
        assert!(units[0].is_resolved());
        assert!(!units[1].is_resolved());
    }
}
