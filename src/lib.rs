//! # hebrew-sentence-audio
//!
//! Batch generation of spoken audio for a list of Hebrew sentences, using
//! pretrained ONNX text-to-speech pipelines.
//!
//! ## Features
//!
//! - **StyleTTS2 pipeline**: Phonikud diacritics, rule-based IPA phonemes, StyleTTS2 acoustic model
//! - **Robo-Shaul pipeline**: Nakdimon diacritics, Latin transliteration, Tacotron2 + WaveGlow
//! - **Batch driver**: one normalized, AAC-encoded `<index>.m4a` per sentence
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! hebrew-sentence-audio = { version = "2026.2", features = ["styletts2"] }
//! ```
//!
//! ```rust,no_run
//! # #[cfg(feature = "styletts2")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::Path;
//! use hebrew_sentence_audio::{
//!     audio::FfmpegTranscoder,
//!     batch::{BatchConfigBuilder, BatchDriver},
//!     pipelines::{StyleTts2Paths, StyleTts2Pipeline},
//!     sentences::load_sentences,
//! };
//!
//! let sentences = load_sentences(Path::new("scripts/sentences.json"))?;
//! let mut pipeline = StyleTts2Pipeline::load(&StyleTts2Paths::default(), &Default::default())?;
//! let config = BatchConfigBuilder::default()
//!     .output_dir("web/public/audio/styletts2")
//!     .build()?;
//! let report = BatchDriver::new(config).run(&sentences, &mut pipeline, &FfmpegTranscoder::default())?;
//! println!("{} files, {:.1}s of audio", report.outputs.len(), report.audio_secs);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "styletts2"))]
//! # fn main() {}
//! ```

pub mod audio;
pub mod batch;
pub mod engines;
#[cfg(any(feature = "styletts2", feature = "roboshaul"))]
pub mod pipelines;
pub mod sentences;
pub mod text;

use std::path::Path;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw mono f32 audio samples and the sample rate of the output audio.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio (24000 for StyleTTS2, 22050 for Robo-Shaul)
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// Engines take text in the representation their acoustic model expects
/// (IPA phonemes for StyleTTS2, cleaned Latin text for Robo-Shaul); the
/// Hebrew front-end lives in [`text`] and is chained by [`pipelines`].
pub trait SynthesisEngine {
    /// Parameters for configuring inference behavior (speed, sigma, etc.)
    type SynthesisParams;
    /// Parameters for configuring model loading (threads, etc.)
    type ModelParams: Default;

    /// Load a model from the specified path using default parameters.
    fn load_model(&mut self, model_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.load_model_with_params(model_path, Self::ModelParams::default())
    }

    /// Load a model from the specified path with custom parameters.
    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Unload the currently loaded model and free associated resources.
    fn unload_model(&mut self);

    /// Synthesize speech from the given text.
    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>>;

    /// Synthesize speech from the given text and write to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_wav()`.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        wav_path: &Path,
        params: Option<Self::SynthesisParams>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.synthesize(text, params)?.write_wav(wav_path)?;
        Ok(())
    }
}
