//! Character-level Hebrew diacritization (niqqud restoration).
//!
//! Two pretrained ONNX models are supported through [`DiacritizerLabels`]:
//!
//! | Model | Labels | Output marks |
//! |---|---|---|
//! | Nakdimon (`nakdimon.onnx`) | [`DiacritizerLabels::nakdimon`] | niqqud, dagesh, shin/sin dot |
//! | Phonikud (`phonikud-1.0.int8.onnx` + `tokenizer.json`) | [`DiacritizerLabels::phonikud`] | niqqud, shin/sin dot, stress, vocal shva, prefix |
//!
//! Other exports can be described with a labels JSON file and
//! [`DiacritizerLabels::from_json`].
//!
//! ```rust,ignore
//! use hebrew_sentence_audio::engines::diacritizer::{Diacritizer, DiacritizerLabels};
//! use std::path::Path;
//!
//! let mut nakdimon = Diacritizer::load(
//!     Path::new("nakdimon.onnx"),
//!     DiacritizerLabels::nakdimon(),
//!     &Default::default(),
//! )?;
//! println!("{}", nakdimon.compute("שלום עולם")?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod labels;
#[cfg(feature = "onnx")]
pub mod model;

pub use labels::{DiacritizerLabels, Head, HeadKind, HeadLogits};
#[cfg(feature = "onnx")]
pub use model::Diacritizer;

#[derive(thiserror::Error, Debug)]
pub enum DiacritizerError {
    #[cfg(feature = "onnx")]
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "onnx")]
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Invalid diacritizer labels: {0}")]
    Labels(String),
}
