//! Text front-ends turning vocalized Hebrew into what the acoustic models read.
//!
//! - [`hebrew`]: parses niqqud and resolves each word into [`hebrew::Sound`]s
//! - [`phonemizer`]: IPA rendering for StyleTTS2
//! - [`transliterate`]: Latin rendering for the Robo-Shaul Tacotron2 model
//! - [`cleaners`]: `english_cleaners` and the Tacotron2 symbol table

pub mod cleaners;
pub mod hebrew;
pub mod phonemizer;
mod segment;
pub mod transliterate;
