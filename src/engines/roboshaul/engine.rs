use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::engines::onnx::OnnxModelParams;
use crate::text::cleaners::{symbol_table, text_to_sequence};
use crate::{SynthesisEngine, SynthesisResult};

use super::tacotron2::Tacotron2;
use super::waveglow::WaveGlow;
use super::{RoboShaulError, SAMPLE_RATE};

/// Parameters for configuring a Robo-Shaul synthesis request.
#[derive(Debug, Clone)]
pub struct RoboShaulInferenceParams {
    /// Standard deviation of the WaveGlow noise. Default 0.8.
    pub sigma: f32,
    /// Stop-gate probability that ends decoding. Default 0.1.
    pub gate_threshold: f32,
    /// Hard cap on decoded mel frames. Default 1000.
    pub max_decoder_steps: usize,
}

impl Default for RoboShaulInferenceParams {
    fn default() -> Self {
        Self {
            sigma: 0.8,
            gate_threshold: 0.1,
            max_decoder_steps: 1000,
        }
    }
}

/// Model loading parameters: the shared ONNX options plus the noise seed.
#[derive(Debug, Clone, Default)]
pub struct RoboShaulModelParams {
    pub onnx: OnnxModelParams,
    /// Seed for the WaveGlow noise. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

struct Loaded {
    tacotron2: Tacotron2,
    waveglow: WaveGlow,
}

/// Tacotron2 + WaveGlow engine for romanized Hebrew.
///
/// ```rust,no_run
/// use hebrew_sentence_audio::{SynthesisEngine, engines::roboshaul::RoboShaulEngine};
/// use std::path::PathBuf;
///
/// let mut engine = RoboShaulEngine::new();
/// engine.load_model(&PathBuf::from("scripts/prepare_audio/roboshaul"))?;
/// let result = engine.synthesize("shalom olam", None)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct RoboShaulEngine {
    models: Option<Loaded>,
    model_path: Option<PathBuf>,
    symbols: HashMap<char, i64>,
}

impl Default for RoboShaulEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RoboShaulEngine {
    pub fn new() -> Self {
        Self {
            models: None,
            model_path: None,
            symbols: symbol_table(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.models.is_some()
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    /// Symbol ids the text encoder sees for `text`.
    pub fn sequence(&self, text: &str) -> Vec<i64> {
        text_to_sequence(text, &self.symbols)
    }
}

impl Drop for RoboShaulEngine {
    fn drop(&mut self) {
        self.unload_model();
    }
}

impl SynthesisEngine for RoboShaulEngine {
    type SynthesisParams = RoboShaulInferenceParams;
    type ModelParams = RoboShaulModelParams;

    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let tacotron2 = Tacotron2::load(model_path, &params.onnx)?;
        let waveglow = WaveGlow::load(model_path, &params.onnx, params.seed)?;
        self.models = Some(Loaded {
            tacotron2,
            waveglow,
        });
        self.model_path = Some(model_path.to_path_buf());
        Ok(())
    }

    fn unload_model(&mut self) {
        self.models = None;
        self.model_path = None;
    }

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>> {
        let sequence = self.sequence(text);
        let models = self.models.as_mut().ok_or(RoboShaulError::ModelNotLoaded)?;
        let p = params.unwrap_or_default();

        if sequence.is_empty() {
            log::warn!("No symbols produced for text: {text:?}");
            return Ok(SynthesisResult {
                samples: vec![],
                sample_rate: SAMPLE_RATE,
            });
        }

        let mel = models
            .tacotron2
            .infer(&sequence, p.gate_threshold, p.max_decoder_steps)?;
        let samples = models.waveglow.infer(&mel, p.sigma)?;

        Ok(SynthesisResult {
            samples,
            sample_rate: SAMPLE_RATE,
        })
    }
}
