//! ONNX model wrappers.
//!
//! Enable engines via Cargo features:
//! - `styletts2` - StyleTTS2 acoustic model and the Phonikud diacritizer
//! - `roboshaul` - Tacotron2 + WaveGlow and the Nakdimon diacritizer
//! - `cuda` - register the CUDA execution provider when the GPU is usable

pub mod diacritizer;
#[cfg(feature = "onnx")]
pub mod onnx;
#[cfg(feature = "roboshaul")]
pub mod roboshaul;
#[cfg(feature = "styletts2")]
pub mod styletts2;
