//! Robo-Shaul text-to-speech engine.
//!
//! A Hebrew-trained Tacotron2 acoustic model with a WaveGlow vocoder, both
//! exported to ONNX in the split layout used for Tacotron2 inference
//! servers: an encoder, a single decoder step run in a loop, and a postnet.
//! The engine consumes romanized text (see [`crate::text::transliterate`]);
//! English cleaners and symbol mapping happen inside.
//!
//! # Model Directory Layout
//!
//! ```text
//! scripts/prepare_audio/roboshaul/
//! ├── encoder.onnx        # sequences, sequence_lengths -> memory, processed_memory, lens
//! ├── decoder_iter.onnx   # one attention + decoder step
//! ├── postnet.onnx        # mel_outputs -> mel_outputs_postnet
//! └── waveglow.onnx       # mel, z -> audio
//! ```
//!
//! The graphs are exported from the `roboshaul_90K.pt` Tacotron2 checkpoint
//! and `waveglow_256channels_universal_v5.pt`, both at
//! <https://huggingface.co/notmax123/robo_shaul>.

pub mod engine;
pub mod tacotron2;
pub mod waveglow;

pub use engine::{RoboShaulEngine, RoboShaulInferenceParams, RoboShaulModelParams};

/// Output sample rate of the WaveGlow vocoder.
pub const SAMPLE_RATE: u32 = 22050;

#[derive(thiserror::Error, Debug)]
pub enum RoboShaulError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Model not loaded. Call load_model() first.")]
    ModelNotLoaded,
    #[error("Unexpected model output: {0}")]
    Output(String),
}
