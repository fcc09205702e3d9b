use std::path::{Path, PathBuf};

use crate::engines::onnx::OnnxModelParams;
use crate::{SynthesisEngine, SynthesisResult};

use super::model::{StyleTts2Error, StyleTts2Model, SAMPLE_RATE};

/// Acoustic model file expected in a model directory.
pub const MODEL_FILE: &str = "libritts_hebrew.onnx";
/// Reference style file expected in a model directory.
pub const STYLE_FILE: &str = "636_female_style.npy";

/// Parameters for configuring a StyleTTS2 synthesis request.
#[derive(Debug, Clone)]
pub struct StyleTts2InferenceParams {
    /// Speech speed multiplier. Default 1.32.
    pub speed: f32,
    /// Row of the style file to use. `None` = phoneme token count, clamped.
    pub style_index: Option<usize>,
}

impl Default for StyleTts2InferenceParams {
    fn default() -> Self {
        Self {
            speed: 1.32,
            style_index: None,
        }
    }
}

/// StyleTTS2 text-to-speech engine.
///
/// Takes IPA phonemes, not raw text. Use [`crate::text::phonemizer::phonemize`]
/// on vocalized Hebrew first, or the ready-made
/// [`StyleTts2Pipeline`](crate::pipelines::StyleTts2Pipeline).
///
/// `load_model` accepts either a directory holding `libritts_hebrew.onnx`
/// and `636_female_style.npy`, or the `.onnx` file itself with the style
/// file next to it.
///
/// ```rust,no_run
/// use hebrew_sentence_audio::{SynthesisEngine, engines::styletts2::StyleTts2Engine};
/// use std::path::PathBuf;
///
/// let mut engine = StyleTts2Engine::new();
/// engine.load_model(&PathBuf::from("scripts/prepare_audio"))?;
/// let result = engine.synthesize("ʃalˈom", None)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct StyleTts2Engine {
    model: Option<StyleTts2Model>,
    model_path: Option<PathBuf>,
    style_path: Option<PathBuf>,
}

impl Default for StyleTts2Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleTts2Engine {
    pub fn new() -> Self {
        Self {
            model: None,
            model_path: None,
            style_path: None,
        }
    }

    /// Use an explicit style file instead of the one next to the model.
    pub fn with_style(style_path: PathBuf) -> Self {
        Self {
            model: None,
            model_path: None,
            style_path: Some(style_path),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    fn resolve_paths(&self, model_path: &Path) -> (PathBuf, PathBuf) {
        let onnx = if model_path.is_dir() {
            model_path.join(MODEL_FILE)
        } else {
            model_path.to_path_buf()
        };
        let style = self.style_path.clone().unwrap_or_else(|| {
            let dir = if model_path.is_dir() {
                model_path
            } else {
                model_path.parent().unwrap_or(Path::new("."))
            };
            dir.join(STYLE_FILE)
        });
        (onnx, style)
    }
}

impl Drop for StyleTts2Engine {
    fn drop(&mut self) {
        self.unload_model();
    }
}

impl SynthesisEngine for StyleTts2Engine {
    type SynthesisParams = StyleTts2InferenceParams;
    type ModelParams = OnnxModelParams;

    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (onnx, style) = self.resolve_paths(model_path);
        let model = StyleTts2Model::load(&onnx, &style, &params)?;
        self.model = Some(model);
        self.model_path = Some(onnx);
        Ok(())
    }

    fn unload_model(&mut self) {
        self.model = None;
        self.model_path = None;
    }

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>> {
        let model = self.model.as_mut().ok_or(StyleTts2Error::ModelNotLoaded)?;

        let p = params.unwrap_or_default();
        let samples = model.synthesize_phonemes(text, p.speed, p.style_index)?;

        Ok(SynthesisResult {
            samples,
            sample_rate: SAMPLE_RATE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_speed_matches_the_hebrew_voice() {
        let p = StyleTts2InferenceParams::default();
        assert!((p.speed - 1.32).abs() < f32::EPSILON);
        assert_eq!(p.style_index, None);
    }

    #[test]
    fn synthesize_without_model_fails() {
        let mut engine = StyleTts2Engine::new();
        let err = engine.synthesize("ʃalˈom", None).unwrap_err();
        assert!(err.to_string().contains("Model not loaded"));
    }

    #[test]
    fn directory_resolves_to_model_and_style_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = StyleTts2Engine::new();
        let (onnx, style) = engine.resolve_paths(dir.path());
        assert_eq!(onnx, dir.path().join(MODEL_FILE));
        assert_eq!(style, dir.path().join(STYLE_FILE));
    }

    #[test]
    fn explicit_style_path_wins() {
        let engine = StyleTts2Engine::with_style(PathBuf::from("voices/other.npy"));
        let (onnx, style) = engine.resolve_paths(Path::new("models/custom.onnx"));
        assert_eq!(onnx, PathBuf::from("models/custom.onnx"));
        assert_eq!(style, PathBuf::from("voices/other.npy"));
    }

    #[test]
    fn failed_load_leaves_engine_unloaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut engine = StyleTts2Engine::new();
        assert!(engine.load_model(dir.path()).is_err());
        assert!(!engine.is_loaded());
    }
}
