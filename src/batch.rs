//! Sequential batch driver: one normalized, transcoded audio file per sentence.
//!
//! For every sentence index `i` the driver vocalizes the text, synthesizes
//! it, writes `<i>.tmp.wav`, loads and peak-normalizes it, transcodes it to
//! `<i>.m4a` and removes the temporary file. Output names are positional, so
//! a re-run overwrites the previous outputs index by index.

use std::error::Error;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use indicatif::{ProgressBar, ProgressStyle};

use crate::audio::{normalize_peak, TempWav, TranscodeError, Transcoder, DEFAULT_HEADROOM_DB};
use crate::SynthesisResult;

/// Extension of the final per-sentence artifact.
pub const OUTPUT_EXTENSION: &str = "m4a";

/// Suffix of the per-sentence intermediate WAV.
pub const TEMP_SUFFIX: &str = "tmp.wav";

/// A text-to-audio pipeline driven by [`BatchDriver`].
///
/// Implementations load their models up front and keep them for the whole
/// batch; both steps take `&mut self` because ONNX sessions run mutably.
pub trait Pipeline {
    /// Short pipeline name, used in logs.
    fn name(&self) -> &str;

    /// Add diacritics (niqqud) to an unvocalized sentence.
    fn vocalize(&mut self, sentence: &str) -> Result<String, Box<dyn Error>>;

    /// Convert vocalized text to the model's representation and run inference.
    fn synthesize(&mut self, vocalized: &str) -> Result<SynthesisResult, Box<dyn Error>>;
}

impl<P: Pipeline + ?Sized> Pipeline for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn vocalize(&mut self, sentence: &str) -> Result<String, Box<dyn Error>> {
        (**self).vocalize(sentence)
    }

    fn synthesize(&mut self, vocalized: &str) -> Result<SynthesisResult, Box<dyn Error>> {
        (**self).synthesize(vocalized)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Sentence {index}: vocalization failed: {source}")]
    Vocalize { index: usize, source: Box<dyn Error> },
    #[error("Sentence {index}: synthesis failed: {source}")]
    Synthesize { index: usize, source: Box<dyn Error> },
    #[error("Sentence {index}: temporary WAV failed: {source}")]
    TempWav { index: usize, source: hound::Error },
    #[error("Sentence {index}: failed to remove temporary WAV: {source}")]
    Cleanup {
        index: usize,
        source: std::io::Error,
    },
    #[error("Sentence {index}: transcoding failed: {source}")]
    Transcode {
        index: usize,
        source: TranscodeError,
    },
}

/// Settings for a batch run.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct BatchConfig {
    /// Directory receiving `<index>.m4a` files. Created if missing.
    pub output_dir: PathBuf,
    /// Headroom below full scale left by peak normalization, in dB.
    #[builder(default = "DEFAULT_HEADROOM_DB")]
    pub headroom_db: f32,
    /// Draw a progress bar on stderr.
    #[builder(default = "true")]
    pub show_progress: bool,
    /// Number of characters of each sentence echoed to the console.
    #[builder(default = "50")]
    pub preview_chars: usize,
}

/// What a completed batch produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Output files, indexed like the input sentences.
    pub outputs: Vec<PathBuf>,
    /// Total duration of the synthesized audio, in seconds.
    pub audio_secs: f64,
}

pub struct BatchDriver {
    config: BatchConfig,
}

impl BatchDriver {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Final artifact path for sentence `index`.
    pub fn output_path(&self, index: usize) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{index}.{OUTPUT_EXTENSION}"))
    }

    /// Intermediate WAV path for sentence `index`.
    pub fn temp_path(&self, index: usize) -> PathBuf {
        self.config.output_dir.join(format!("{index}.{TEMP_SUFFIX}"))
    }

    /// Synthesize every sentence in order.
    ///
    /// Stops at the first failure; outputs written before it stay on disk and
    /// the failing sentence's temporary WAV is removed.
    pub fn run<P, T>(
        &self,
        sentences: &[String],
        pipeline: &mut P,
        transcoder: &T,
    ) -> Result<BatchReport, BatchError>
    where
        P: Pipeline + ?Sized,
        T: Transcoder + ?Sized,
    {
        let output_dir = &self.config.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|source| BatchError::CreateDir {
            path: output_dir.clone(),
            source,
        })?;

        log::info!(
            "Generating {} sentences with {} into {}",
            sentences.len(),
            pipeline.name(),
            output_dir.display()
        );

        let progress = self.progress_bar(sentences.len());
        let mut report = BatchReport {
            outputs: Vec::with_capacity(sentences.len()),
            audio_secs: 0.0,
        };

        for (index, sentence) in sentences.iter().enumerate() {
            let vocalized = pipeline
                .vocalize(sentence)
                .map_err(|source| BatchError::Vocalize { index, source })?;

            progress.suspend(|| {
                println!("[{index}] {}...", preview(sentence, self.config.preview_chars));
                println!("     -> {}...", preview(&vocalized, self.config.preview_chars));
            });

            let audio = pipeline
                .synthesize(&vocalized)
                .map_err(|source| BatchError::Synthesize { index, source })?;
            if audio.samples.is_empty() {
                log::warn!("Sentence {index} produced no audio");
            }
            report.audio_secs += audio.duration_secs();

            let output = self.output_path(index);
            self.write_output(index, &audio, transcoder, &output)?;
            report.outputs.push(output);
            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(report)
    }

    fn write_output<T: Transcoder + ?Sized>(
        &self,
        index: usize,
        audio: &SynthesisResult,
        transcoder: &T,
        output: &Path,
    ) -> Result<(), BatchError> {
        let temp = TempWav::create(self.temp_path(index), audio)
            .map_err(|source| BatchError::TempWav { index, source })?;

        let mut normalized = temp
            .load()
            .map_err(|source| BatchError::TempWav { index, source })?;
        normalize_peak(&mut normalized.samples, self.config.headroom_db);

        transcoder
            .transcode(&normalized, output)
            .map_err(|source| BatchError::Transcode { index, source })?;

        temp.finish()
            .map_err(|source| BatchError::Cleanup { index, source })
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::with_template(
            "{msg}: {percent:>3}%|{wide_bar}| {pos}/{len} [{elapsed_precise}<{eta_precise}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        ProgressBar::new(len as u64)
            .with_style(style)
            .with_message("Generating")
    }
}

/// First `max_chars` characters of `text` (not bytes, Hebrew is multi-byte).
fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundaries() {
        assert_eq!(preview("שלום עולם", 4), "שלום");
        assert_eq!(preview("short", 50), "short");
        assert_eq!(preview("", 3), "");
    }

    #[test]
    fn builder_fills_defaults() {
        let config = BatchConfigBuilder::default()
            .output_dir("out/audio")
            .build()
            .expect("build config");
        assert_eq!(config.output_dir, PathBuf::from("out/audio"));
        assert!((config.headroom_db - 0.1).abs() < f32::EPSILON);
        assert!(config.show_progress);
        assert_eq!(config.preview_chars, 50);
    }

    #[test]
    fn builder_requires_output_dir() {
        assert!(BatchConfigBuilder::default().build().is_err());
    }

    #[test]
    fn paths_are_positional() {
        let config = BatchConfigBuilder::default()
            .output_dir("audio")
            .build()
            .expect("build config");
        let driver = BatchDriver::new(config);
        assert_eq!(driver.output_path(12), PathBuf::from("audio/12.m4a"));
        assert_eq!(driver.temp_path(12), PathBuf::from("audio/12.tmp.wav"));
    }
}
