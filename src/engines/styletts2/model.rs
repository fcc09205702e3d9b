use std::collections::HashMap;
use std::path::Path;

use ndarray::Array2;
use ort::inputs;
use ort::session::Session;
use ort::value::TensorRef;

use super::style::StyleStore;
use super::vocab::tokenize;
use crate::engines::onnx::{find_input, init_session, input_is_int32, require_file, OnnxModelParams};

/// Maximum number of phoneme tokens per chunk (before padding).
pub const MAX_PHONEME_LEN: usize = 510;

/// Style vector dimension for StyleTTS2.
pub const STYLE_DIM: usize = 256;

/// Output sample rate from the StyleTTS2 model.
pub const SAMPLE_RATE: u32 = 24000;

/// Crossfade (in samples) used when concatenating chunk audio.
const CHUNK_CROSSFADE_SAMPLES: usize = 240; // 10ms @ 24kHz

/// Symbols a long sequence is preferably cut after.
const CLAUSE_BREAKS: &str = ";:,.!?";

#[derive(thiserror::Error, Debug)]
pub enum StyleTts2Error {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Model not loaded. Call load_model() first.")]
    ModelNotLoaded,
    #[error("Invalid config.json: {0}")]
    Config(String),
    #[error("Failed to parse style file: {0}")]
    StyleParse(String),
}

/// Internal StyleTTS2 ONNX model state.
pub struct StyleTts2Model {
    session: Session,
    styles: StyleStore,
    vocab: HashMap<char, i64>,
    breaks: Breaks,
    /// Detected input name: "tokens" or "input_ids"
    tokens_input_name: String,
    /// Detected input name: "style" or "ref_s"
    style_input_name: String,
    /// `Some(true)` if speed is int32, `Some(false)` for float32, `None` if absent
    speed_is_int32: Option<bool>,
}

impl StyleTts2Model {
    /// Load the acoustic model and its reference style.
    ///
    /// A `config.json` next to the model overrides the built-in symbol table.
    pub fn load(
        onnx_path: &Path,
        style_path: &Path,
        params: &OnnxModelParams,
    ) -> Result<Self, StyleTts2Error> {
        require_file(onnx_path, "StyleTTS2 model")?;
        require_file(style_path, "StyleTTS2 style vector")?;
        log::info!("Loading StyleTTS2 model from {}", onnx_path.display());

        let session = init_session(onnx_path, params)?;

        let tokens_input_name =
            find_input(&session, &["tokens", "input_ids"]).unwrap_or_else(|| "tokens".to_string());
        let style_input_name =
            find_input(&session, &["style", "ref_s"]).unwrap_or_else(|| "style".to_string());
        let speed_is_int32 = input_is_int32(&session, "speed");

        log::info!(
            "Detected: tokens_input='{}', style_input='{}', speed_is_int32={:?}",
            tokens_input_name,
            style_input_name,
            speed_is_int32
        );

        let styles = StyleStore::load(style_path)?;

        let config_path = onnx_path.with_file_name("config.json");
        let vocab = if config_path.exists() {
            log::info!("Loading vocab from config.json");
            super::vocab::load_vocab(&config_path)?
        } else {
            super::vocab::default_vocab()
        };

        let breaks = Breaks::from_vocab(&vocab);

        Ok(Self {
            session,
            styles,
            vocab,
            breaks,
            tokens_input_name,
            style_input_name,
            speed_is_int32,
        })
    }

    /// Synthesize audio from an IPA phoneme string.
    pub fn synthesize_phonemes(
        &mut self,
        phonemes: &str,
        speed: f32,
        style_idx_override: Option<usize>,
    ) -> Result<Vec<f32>, StyleTts2Error> {
        let ids = tokenize(phonemes, &self.vocab);

        if ids.is_empty() {
            log::warn!("No phoneme tokens produced for {phonemes:?}");
            return Ok(vec![]);
        }

        // One style row for the whole utterance so chunks share prosody.
        let row = style_idx_override
            .unwrap_or(ids.len())
            .min(self.styles.len().saturating_sub(1));
        log::debug!("Style row {row} of {}", self.styles.len());
        let style = *self.styles.get_style(row);

        let chunks = split_chunks(&ids, MAX_PHONEME_LEN, &self.breaks);
        if chunks.len() > 1 {
            log::debug!(
                "{} phoneme tokens exceed {MAX_PHONEME_LEN}, synthesizing {} chunks",
                ids.len(),
                chunks.len()
            );
        }

        let mut waveform = Vec::with_capacity(ids.len() * 300);
        for chunk in chunks {
            let audio = self.synthesize_chunk(chunk, &style, speed)?;
            crossfade_into(&mut waveform, &audio, CHUNK_CROSSFADE_SAMPLES);
        }
        Ok(waveform)
    }

    /// Run ONNX inference on a single chunk of phoneme token IDs.
    fn synthesize_chunk(
        &mut self,
        tokens: &[i64],
        style: &[f32; STYLE_DIM],
        speed: f32,
    ) -> Result<Vec<f32>, StyleTts2Error> {
        let tokens_arr = Array2::from_shape_vec((1, tokens.len() + 2), pad_tokens(tokens))?;
        let style_view = ndarray::ArrayView2::from_shape((1, STYLE_DIM), style.as_slice())?;
        let tokens_name = self.tokens_input_name.as_str();
        let style_name = self.style_input_name.as_str();

        let output = match self.speed_is_int32 {
            Some(true) => {
                let speed_arr = ndarray::arr1(&[speed.round() as i32]);
                let inputs = inputs![
                    tokens_name => TensorRef::from_array_view(tokens_arr.view())?,
                    style_name => TensorRef::from_array_view(style_view)?,
                    "speed" => TensorRef::from_array_view(speed_arr.view())?,
                ];
                self.session.run(inputs)?
            }
            Some(false) => {
                let speed_arr = ndarray::arr1(&[speed]);
                let inputs = inputs![
                    tokens_name => TensorRef::from_array_view(tokens_arr.view())?,
                    style_name => TensorRef::from_array_view(style_view)?,
                    "speed" => TensorRef::from_array_view(speed_arr.view())?,
                ];
                self.session.run(inputs)?
            }
            None => {
                let inputs = inputs![
                    tokens_name => TensorRef::from_array_view(tokens_arr.view())?,
                    style_name => TensorRef::from_array_view(style_view)?,
                ];
                self.session.run(inputs)?
            }
        };

        let first_output = output
            .iter()
            .next()
            .ok_or_else(|| StyleTts2Error::Ort(ort::Error::new("No output from model")))?;
        let waveform = first_output.1.try_extract_array::<f32>()?;

        Ok(waveform.iter().copied().collect())
    }
}

/// Wrap token ids in the pad token: `[0, t1..tN, 0]`.
fn pad_tokens(tokens: &[i64]) -> Vec<i64> {
    let mut padded = vec![0i64; tokens.len() + 2];
    padded[1..=tokens.len()].copy_from_slice(tokens);
    padded
}

/// Token ids that may end a chunk, resolved against the active vocab.
#[derive(Debug, Clone, Default)]
struct Breaks {
    clause: Vec<i64>,
    word: Option<i64>,
}

impl Breaks {
    fn from_vocab(vocab: &HashMap<char, i64>) -> Self {
        Self {
            clause: CLAUSE_BREAKS.chars().filter_map(|c| vocab.get(&c).copied()).collect(),
            word: vocab.get(&' ').copied(),
        }
    }
}

/// Cut `ids` into runs of at most `limit` tokens. Each cut goes after the
/// last clause punctuation in the window, else after the last space, else
/// at the limit.
fn split_chunks<'a>(ids: &'a [i64], limit: usize, breaks: &Breaks) -> Vec<&'a [i64]> {
    let mut chunks = Vec::with_capacity(ids.len() / limit.max(1) + 1);
    let mut rest = ids;

    while rest.len() > limit {
        let window = &rest[..limit];
        let cut = window
            .iter()
            .rposition(|id| breaks.clause.contains(id))
            .or_else(|| window.iter().rposition(|&id| Some(id) == breaks.word))
            .map_or(limit, |i| i + 1);
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// Append `src`, blending its first samples linearly into the tail of `dst`.
fn crossfade_into(dst: &mut Vec<f32>, src: &[f32], fade: usize) {
    let overlap = fade.min(dst.len()).min(src.len());
    let tail = dst.len() - overlap;
    let step = 1.0 / (overlap as f32 + 1.0);

    for (k, (d, &s)) in dst[tail..].iter_mut().zip(src).enumerate() {
        let t = (k + 1) as f32 * step;
        *d += (s - *d) * t;
    }
    dst.extend_from_slice(&src[overlap..]);
}
