use std::collections::HashMap;

use forced_align_rs::alignment::backtrack::backtrack;
use forced_align_rs::alignment::segments::{merge_repeats, merge_words};
use forced_align_rs::alignment::tokenization::{build_token_sequence, tokenize_units};
use forced_align_rs::alignment::trellis::build_trellis;
use forced_align_rs::{
    emit_chunked, AlignerConfig, AlignmentError, AlignmentInput, ChunkPlan, EmissionMatrix,
    EmissionModel, EmissionOutput, ForcedAlignerBuilder, Segment, Vocabulary,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const STRONG: f32 = -0.040_822; // ln(0.96)
const WEAK: f32 = -4.605_17; // ln(0.01)
const SAMPLE_RATE_HZ: u32 = 16_000;
const SAMPLES_PER_FRAME: usize = 320;

/// `<pad>`=0, a=1, b=2, c=3, `|`=4
fn abc_vocab() -> Vocabulary {
    let ids: HashMap<String, usize> = ["<pad>", "a", "b", "c", "|"]
        .iter()
        .enumerate()
        .map(|(id, s)| (s.to_string(), id))
        .collect();
    Vocabulary::new(ids, "<pad>", "|").expect("valid vocab")
}

fn peaked_row(width: usize, id: usize) -> Vec<f32> {
    let mut row = vec![WEAK; width];
    row[id] = STRONG;
    row
}

fn random_log_probs(rng: &mut StdRng, frames: usize, width: usize) -> EmissionMatrix {
    let rows: Vec<Vec<f32>> = (0..frames)
        .map(|_| (0..width).map(|_| rng.gen_range(-4.0f32..4.0)).collect::<Vec<f32>>())
        .collect();
    EmissionMatrix::from_logits(rows).expect("finite logits")
}

fn words_of(
    emission: &EmissionMatrix,
    tokens: &[usize],
    vocab: &Vocabulary,
) -> Result<Vec<Segment>, AlignmentError> {
    let trellis = build_trellis(emission, tokens, vocab.blank_id())?;
    let path = backtrack(&trellis, emission, tokens, vocab.blank_id())?;
    let labels = vocab.labels_for(tokens)?;
    let segments = merge_repeats(&path, &labels)?;
    Ok(merge_words(&segments, vocab.separator_symbol()))
}

#[test]
fn random_paths_cover_every_frame_monotonically() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let width = rng.gen_range(3..8);
        let frames = rng.gen_range(1..60);
        let num_tokens = rng.gen_range(1..=frames);
        let tokens: Vec<usize> = (0..num_tokens).map(|_| rng.gen_range(1..width)).collect();
        let emission = random_log_probs(&mut rng, frames, width);

        let trellis = build_trellis(&emission, &tokens, 0).unwrap();
        let path = backtrack(&trellis, &emission, &tokens, 0).unwrap();

        assert_eq!(path.len(), frames);
        for (t, point) in path.iter().enumerate() {
            assert_eq!(point.time_index, t);
            assert!(point.probability > 0.0 && point.probability <= 1.0);
        }
        assert_eq!(path[0].token_index, 0);
        assert_eq!(path[frames - 1].token_index, num_tokens - 1);
        for pair in path.windows(2) {
            let step = pair[1].token_index - pair[0].token_index;
            assert!(step <= 1, "token index jumped by {step}");
        }
    }
}

#[test]
fn two_word_scenario_recovers_designed_boundaries() {
    let vocab = abc_vocab();
    // frame: 0 a, 3 sep, 5 b, 8 sep; blank elsewhere.
    let spikes = [(0, 1), (3, 4), (5, 2), (8, 4)];
    let rows: Vec<Vec<f32>> = (0..10)
        .map(|t| {
            let id = spikes
                .iter()
                .find(|&&(frame, _)| frame == t)
                .map(|&(_, id)| id)
                .unwrap_or(0);
            peaked_row(5, id)
        })
        .collect();
    let emission = EmissionMatrix::from_rows(rows).unwrap();

    // The leading separator always owns frame 0, so "a" starts at frame 1.
    let words = words_of(&emission, &[4, 1, 4, 2, 4], &vocab).unwrap();
    assert_eq!(words.len(), 2);
    assert_eq!((words[0].label.as_str(), words[0].start, words[0].end), ("a", 1, 4));
    assert_eq!((words[1].label.as_str(), words[1].start, words[1].end), ("b", 6, 9));
    for word in &words {
        assert!((word.score - 0.96).abs() < 1e-4);
    }
}

#[test]
fn clean_emission_reconstructs_word_sequence() {
    let vocab = abc_vocab();
    let words = ["ab", "c", "abc", "ba"];
    let units: Vec<_> = words
        .iter()
        .map(|w| {
            let ids = w.chars().map(|c| vocab.id(&c.to_string()).unwrap()).collect();
            forced_align_rs::TextUnit::resolved(*w, *w, ids)
        })
        .collect();
    let sequence = build_token_sequence(&units, &vocab).unwrap();

    // Token j (j >= 1) spikes at frame spike[j]; the first word token at frame 0.
    let mut spike = vec![0usize; sequence.tokens.len()];
    for j in 2..sequence.tokens.len() {
        spike[j] = spike[j - 1] + 1 + j % 3;
    }
    let frames = spike[sequence.tokens.len() - 1] + 2;
    let rows: Vec<Vec<f32>> = (0..frames)
        .map(|t| {
            let id = (1..sequence.tokens.len())
                .find(|&j| spike[j] == t)
                .map(|j| sequence.tokens[j])
                .unwrap_or(vocab.blank_id());
            peaked_row(vocab.len(), id)
        })
        .collect();
    let emission = EmissionMatrix::from_rows(rows).unwrap();

    let aligned = words_of(&emission, &sequence.tokens, &vocab).unwrap();
    let labels: Vec<&str> = aligned.iter().map(|w| w.label.as_str()).collect();
    assert_eq!(labels, words);

    // A word covering token positions p..=q runs from spike[p] + 1 to spike[q + 1] + 1.
    let separators: Vec<usize> = (0..sequence.tokens.len())
        .filter(|&j| sequence.tokens[j] == vocab.separator_id())
        .collect();
    for (word, bounds) in aligned.iter().zip(separators.windows(2)) {
        let (p, next_sep) = (bounds[0] + 1, bounds[1]);
        assert_eq!(word.start, spike[p] + 1);
        assert_eq!(word.end, spike[next_sep] + 1);
    }
}

#[test]
fn exact_tie_prefers_staying() {
    let vocab = abc_vocab();
    let lp = -(5.0f32).ln();
    let emission = EmissionMatrix::from_rows(vec![vec![lp; 5]; 3]).unwrap();
    let tokens = [4, 1];
    let trellis = build_trellis(&emission, &tokens, vocab.blank_id()).unwrap();
    let path = backtrack(&trellis, &emission, &tokens, vocab.blank_id()).unwrap();
    let token_indices: Vec<usize> = path.iter().map(|p| p.token_index).collect();
    assert_eq!(token_indices, vec![0, 1, 1]);
}

#[test]
fn insufficient_frames_is_infeasible() {
    let vocab = abc_vocab();
    let emission = EmissionMatrix::from_rows(vec![peaked_row(5, 0); 4]).unwrap();
    let result = words_of(&emission, &[4, 1, 2, 4, 3, 4], &vocab);
    assert!(matches!(result, Err(AlignmentError::Infeasible { .. })));
}

/// Deterministic pseudo-model: frame scores derived from the frame's samples.
fn sample_driven_model(width: usize) -> impl Fn(&[f32]) -> Result<EmissionOutput, AlignmentError> {
    move |samples: &[f32]| -> Result<EmissionOutput, AlignmentError> {
        let frames: Vec<Vec<f32>> = samples
            .chunks_exact(SAMPLES_PER_FRAME)
            .map(|frame| {
                let energy = frame.iter().map(|s| s.abs()).sum::<f32>();
                (0..width)
                    .map(|id| ((energy + id as f32) * 0.7).sin() * 3.0)
                    .collect::<Vec<f32>>()
            })
            .collect();
        Ok(EmissionOutput::logits(frames))
    }
}

fn noise(rng: &mut StdRng, seconds: f32) -> Vec<f32> {
    let n = (seconds * SAMPLE_RATE_HZ as f32) as usize;
    (0..n).map(|_| rng.gen_range(-0.5f32..0.5)).collect()
}

#[test]
fn single_window_chunking_equals_direct_emission() {
    let mut rng = StdRng::seed_from_u64(7);
    let samples = noise(&mut rng, 4.0);
    let model = sample_driven_model(5);
    let plan = ChunkPlan::default();
    let chunked = emit_chunked(&samples, SAMPLE_RATE_HZ, &plan, &model, 5, None).unwrap();
    let direct = EmissionMatrix::from_logits(model.emit(&samples).unwrap().frames).unwrap();
    assert_eq!(chunked.num_frames(), 200);
    assert_eq!(chunked.num_frames(), direct.num_frames());
    for (a, b) in chunked.rows().iter().zip(direct.rows()) {
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}

#[test]
fn display_spans_chain_without_gaps() {
    let mut rng = StdRng::seed_from_u64(11);
    let aligner = ForcedAlignerBuilder::new(AlignerConfig::default())
        .with_vocabulary(abc_vocab())
        .with_emission_model(Box::new(sample_driven_model(5)))
        .build()
        .unwrap();
    let input = AlignmentInput {
        sample_rate_hz: SAMPLE_RATE_HZ,
        samples: noise(&mut rng, 3.0),
        transcript: "abc, ba cab!\nbb a".to_string(),
    };
    let spans: Vec<_> = aligner.align(&input).unwrap().collect();
    assert_eq!(spans.len(), 5);
    assert_eq!(spans[0].display_start, 0.0);
    for pair in spans.windows(2) {
        assert_eq!(pair[0].display_end, pair[1].display_start);
        assert!(pair[0].exact_end <= pair[1].exact_start + 1e-9);
        assert!(pair[0].display_end >= pair[0].exact_end);
    }
    for span in &spans {
        assert!(span.exact_start < span.exact_end);
        assert!(span.display_start <= span.exact_start + 1e-9);
    }
    assert!(spans[4].exact_end <= 3.0 + 1e-9);
}

#[test]
fn reconstructed_text_retokenizes_to_same_tokens() {
    let mut rng = StdRng::seed_from_u64(3);
    let vocab = abc_vocab();
    let aligner = ForcedAlignerBuilder::new(AlignerConfig::default())
        .with_vocabulary(vocab.clone())
        .with_emission_model(Box::new(sample_driven_model(5)))
        .build()
        .unwrap();
    let transcript = "\"Cab\" -- a? bac, x cc";
    let input = AlignmentInput {
        sample_rate_hz: SAMPLE_RATE_HZ,
        samples: noise(&mut rng, 2.0),
        transcript: transcript.to_string(),
    };
    let spans: Vec<_> = aligner.align(&input).unwrap().collect();
    let rebuilt: String = spans.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(rebuilt, transcript);

    let original = build_token_sequence(&tokenize_units(transcript, &vocab), &vocab).unwrap();
    let again = build_token_sequence(&tokenize_units(&rebuilt, &vocab), &vocab).unwrap();
    assert_eq!(original.tokens, again.tokens);
}

#[test]
fn long_audio_is_stitched_across_windows() {
    let samples = vec![0.0f32; 70 * SAMPLE_RATE_HZ as usize];
    let aligner = ForcedAlignerBuilder::new(AlignerConfig::default())
        .with_vocabulary(abc_vocab())
        .with_emission_model(Box::new(sample_driven_model(5)))
        .build()
        .unwrap();
    let input = AlignmentInput {
        sample_rate_hz: SAMPLE_RATE_HZ,
        samples,
        transcript: "abc cab bca".to_string(),
    };
    let spans: Vec<_> = aligner.align(&input).unwrap().collect();
    assert_eq!(spans.len(), 3);
    assert!(spans[2].exact_end <= 70.0 + 1e-9);
}

#[test]
fn failing_window_fails_whole_alignment() {
    // Only the middle window of a 70 s input receives 36 s of audio.
    let failing = |samples: &[f32]| -> Result<EmissionOutput, AlignmentError> {
        if samples.len() == 36 * SAMPLE_RATE_HZ as usize {
            return Err(AlignmentError::runtime("emission model", "device lost"));
        }
        Ok(EmissionOutput::log_probs(vec![
            vec![-(5.0f32).ln(); 5];
            samples.len() / SAMPLES_PER_FRAME
        ]))
    };
    let aligner = ForcedAlignerBuilder::new(AlignerConfig::default())
        .with_vocabulary(abc_vocab())
        .with_emission_model(Box::new(failing))
        .build()
        .unwrap();
    let input = AlignmentInput {
        sample_rate_hz: SAMPLE_RATE_HZ,
        samples: vec![0.0f32; 70 * SAMPLE_RATE_HZ as usize],
        transcript: "abc".to_string(),
    };
    let err = aligner.align(&input).unwrap_err();
    assert!(err.to_string().contains("device lost"));
}
