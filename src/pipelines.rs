//! Ready-made Hebrew sentence pipelines for the [`batch`](crate::batch) driver.
//!
//! | Pipeline | Vocalizer | Front-end | Acoustic model |
//! |---|---|---|---|
//! | [`StyleTts2Pipeline`] | Phonikud | [`phonemize`](crate::text::phonemizer::phonemize) | StyleTTS2 |
//! | [`RoboShaulPipeline`] | Nakdimon | [`transliterate`](crate::text::transliterate::transliterate) | Tacotron2 + WaveGlow |
//!
//! Both load every model once in `load` and keep them for the whole batch.

use std::error::Error;
use std::path::{Path, PathBuf};

use crate::engines::diacritizer::{Diacritizer, DiacritizerLabels};
use crate::engines::onnx::OnnxModelParams;

/// Directory holding the downloaded model files.
pub const MODELS_DIR: &str = "scripts/prepare_audio";

fn load_labels(
    override_path: Option<&Path>,
    builtin: impl FnOnce() -> Result<DiacritizerLabels, Box<dyn Error>>,
) -> Result<DiacritizerLabels, Box<dyn Error>> {
    match override_path {
        Some(path) => {
            log::info!("Loading diacritizer labels from {}", path.display());
            Ok(DiacritizerLabels::from_json(path)?)
        }
        None => builtin(),
    }
}

#[cfg(feature = "styletts2")]
pub use self::styletts2::{StyleTts2Paths, StyleTts2Pipeline};

#[cfg(feature = "styletts2")]
mod styletts2 {
    use super::*;

    use crate::batch::Pipeline;
    use crate::engines::styletts2::{StyleTts2Engine, StyleTts2InferenceParams};
    use crate::text::phonemizer::phonemize;
    use crate::{SynthesisEngine, SynthesisResult};

    /// Model files of the StyleTTS2 pipeline.
    #[derive(Debug, Clone)]
    pub struct StyleTts2Paths {
        pub phonikud_model: PathBuf,
        pub phonikud_tokenizer: PathBuf,
        /// Labels JSON replacing the built-in Phonikud heads.
        pub phonikud_labels: Option<PathBuf>,
        pub acoustic_model: PathBuf,
        pub style: PathBuf,
    }

    impl Default for StyleTts2Paths {
        fn default() -> Self {
            let dir = Path::new(MODELS_DIR);
            Self {
                phonikud_model: dir.join("phonikud-1.0.int8.onnx"),
                phonikud_tokenizer: dir.join("tokenizer.json"),
                phonikud_labels: None,
                acoustic_model: dir.join("libritts_hebrew.onnx"),
                style: dir.join("636_female_style.npy"),
            }
        }
    }

    /// Phonikud diacritics, IPA phonemes, StyleTTS2 waveform.
    pub struct StyleTts2Pipeline {
        phonikud: Diacritizer,
        engine: StyleTts2Engine,
        params: StyleTts2InferenceParams,
    }

    impl StyleTts2Pipeline {
        pub fn load(paths: &StyleTts2Paths, onnx: &OnnxModelParams) -> Result<Self, Box<dyn Error>> {
            log::info!("Loading StyleTTS2 model...");
            let mut engine = StyleTts2Engine::with_style(paths.style.clone());
            engine.load_model_with_params(&paths.acoustic_model, onnx.clone())?;

            log::info!("Loading Phonikud model...");
            let labels = load_labels(paths.phonikud_labels.as_deref(), || {
                Ok(DiacritizerLabels::phonikud(&paths.phonikud_tokenizer)?)
            })?;
            let phonikud = Diacritizer::load(&paths.phonikud_model, labels, onnx)?;

            log::info!("Models loaded.");
            Ok(Self {
                phonikud,
                engine,
                params: StyleTts2InferenceParams::default(),
            })
        }

        pub fn with_params(mut self, params: StyleTts2InferenceParams) -> Self {
            self.params = params;
            self
        }
    }

    impl Pipeline for StyleTts2Pipeline {
        fn name(&self) -> &str {
            "styletts2"
        }

        fn vocalize(&mut self, sentence: &str) -> Result<String, Box<dyn Error>> {
            Ok(self.phonikud.compute(sentence)?)
        }

        fn synthesize(&mut self, vocalized: &str) -> Result<SynthesisResult, Box<dyn Error>> {
            let phonemes = phonemize(vocalized);
            log::debug!("Phonemes: {phonemes}");
            self.engine.synthesize(&phonemes, Some(self.params.clone()))
        }
    }
}

#[cfg(feature = "roboshaul")]
pub use self::roboshaul::{RoboShaulPaths, RoboShaulPipeline};

#[cfg(feature = "roboshaul")]
mod roboshaul {
    use super::*;

    use crate::batch::Pipeline;
    use crate::engines::roboshaul::{RoboShaulEngine, RoboShaulInferenceParams, RoboShaulModelParams};
    use crate::text::transliterate::transliterate;
    use crate::{SynthesisEngine, SynthesisResult};

    /// Model files of the Robo-Shaul pipeline.
    #[derive(Debug, Clone)]
    pub struct RoboShaulPaths {
        pub nakdimon_model: PathBuf,
        /// Labels JSON replacing the built-in Nakdimon heads.
        pub nakdimon_labels: Option<PathBuf>,
        /// Directory with the encoder, decoder step, postnet and WaveGlow graphs.
        pub tts_dir: PathBuf,
        /// Seed for the WaveGlow noise.
        pub seed: Option<u64>,
    }

    impl Default for RoboShaulPaths {
        fn default() -> Self {
            let dir = Path::new(MODELS_DIR);
            Self {
                nakdimon_model: dir.join("nakdimon.onnx"),
                nakdimon_labels: None,
                tts_dir: dir.join("roboshaul"),
                seed: None,
            }
        }
    }

    /// Nakdimon diacritics, Latin transliteration, Tacotron2 + WaveGlow.
    pub struct RoboShaulPipeline {
        nakdimon: Diacritizer,
        engine: RoboShaulEngine,
        params: RoboShaulInferenceParams,
    }

    impl RoboShaulPipeline {
        pub fn load(paths: &RoboShaulPaths, onnx: &OnnxModelParams) -> Result<Self, Box<dyn Error>> {
            log::info!("Loading Tacotron2 and WaveGlow models...");
            let mut engine = RoboShaulEngine::new();
            engine.load_model_with_params(
                &paths.tts_dir,
                RoboShaulModelParams {
                    onnx: onnx.clone(),
                    seed: paths.seed,
                },
            )?;

            log::info!("Loading Nakdimon model...");
            let labels =
                load_labels(paths.nakdimon_labels.as_deref(), || Ok(DiacritizerLabels::nakdimon()))?;
            let nakdimon = Diacritizer::load(&paths.nakdimon_model, labels, onnx)?;

            log::info!("Models loaded.");
            Ok(Self {
                nakdimon,
                engine,
                params: RoboShaulInferenceParams::default(),
            })
        }

        pub fn with_params(mut self, params: RoboShaulInferenceParams) -> Self {
            self.params = params;
            self
        }
    }

    impl Pipeline for RoboShaulPipeline {
        fn name(&self) -> &str {
            "roboshaul"
        }

        fn vocalize(&mut self, sentence: &str) -> Result<String, Box<dyn Error>> {
            Ok(self.nakdimon.compute(sentence)?)
        }

        fn synthesize(&mut self, vocalized: &str) -> Result<SynthesisResult, Box<dyn Error>> {
            let latin = transliterate(vocalized);
            log::debug!("Transliterated: {latin}");
            self.engine.synthesize(&latin, Some(self.params.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_override_is_read_from_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labels.json");
        std::fs::write(&path, "not json").expect("write");

        let mut builtin_called = false;
        let result = load_labels(Some(&path), || {
            builtin_called = true;
            Ok(DiacritizerLabels::nakdimon())
        });
        assert!(result.is_err());
        assert!(!builtin_called);
    }

    #[test]
    fn builtin_labels_without_override() {
        let labels = load_labels(None, || Ok(DiacritizerLabels::nakdimon())).expect("labels");
        assert_eq!(labels.max_len, DiacritizerLabels::nakdimon().max_len);
    }

    #[cfg(feature = "styletts2")]
    #[test]
    fn styletts2_paths_live_under_the_models_dir() {
        let paths = StyleTts2Paths::default();
        assert_eq!(
            paths.acoustic_model,
            Path::new(MODELS_DIR).join("libritts_hebrew.onnx")
        );
        assert_eq!(paths.style, Path::new(MODELS_DIR).join("636_female_style.npy"));
    }

    #[cfg(feature = "roboshaul")]
    #[test]
    fn roboshaul_paths_live_under_the_models_dir() {
        let paths = RoboShaulPaths::default();
        assert_eq!(paths.nakdimon_model, Path::new(MODELS_DIR).join("nakdimon.onnx"));
        assert_eq!(paths.tts_dir, Path::new(MODELS_DIR).join("roboshaul"));
    }

    #[cfg(feature = "roboshaul")]
    #[test]
    fn missing_models_fail_to_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = RoboShaulPaths {
            nakdimon_model: dir.path().join("nakdimon.onnx"),
            nakdimon_labels: None,
            tts_dir: dir.path().to_path_buf(),
            seed: Some(1),
        };
        assert!(RoboShaulPipeline::load(&paths, &OnnxModelParams::default()).is_err());
    }
}
