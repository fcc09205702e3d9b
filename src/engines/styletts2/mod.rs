//! StyleTTS2 text-to-speech engine for Hebrew.
//!
//! Runs a StyleTTS2 acoustic model exported to ONNX with a fixed reference
//! style vector. The engine consumes IPA phoneme strings; Hebrew text is
//! diacritized and phonemized upstream.
//!
//! # Model Directory Layout
//!
//! ```text
//! scripts/prepare_audio/
//! ├── libritts_hebrew.onnx    # StyleTTS2 acoustic model
//! ├── 636_female_style.npy    # Reference style, float32 [1, 256]
//! └── config.json             # Optional: {"vocab": {...}} symbol table override
//! ```
//!
//! Download links:
//! - <https://github.com/thewh1teagle/style-onnx/releases/download/model-files-v1.0/libritts_hebrew.onnx>
//! - <https://github.com/thewh1teagle/style-onnx/releases/download/model-files-v1.0/636_female_style.npy>
//!
//! # Example
//!
//! ```rust,no_run
//! use hebrew_sentence_audio::{SynthesisEngine, engines::styletts2::{StyleTts2Engine, StyleTts2InferenceParams}};
//! use std::path::PathBuf;
//!
//! let mut engine = StyleTts2Engine::new();
//! engine.load_model(&PathBuf::from("scripts/prepare_audio"))?;
//!
//! let params = StyleTts2InferenceParams { speed: 1.0, ..Default::default() };
//! engine.synthesize_to_file("ʃalˈom", &PathBuf::from("out.wav"), Some(params))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod model;
pub mod style;
pub mod vocab;

pub use engine::{StyleTts2Engine, StyleTts2InferenceParams};
pub use model::StyleTts2Error;
