//! Generate audio for every sentence in `scripts/sentences.json` with the
//! Robo-Shaul pipeline, into `web/public/audio/roboshaul/`.
//!
//! Setup (from the repository root):
//!
//! ```text
//! cd scripts/prepare_audio
//! wget https://github.com/thewh1teagle/nakdimon-onnx/releases/download/v0.1.0/nakdimon.onnx
//! mkdir -p roboshaul
//! # Export the checkpoints to ONNX into roboshaul/ as encoder.onnx,
//! # decoder_iter.onnx, postnet.onnx and waveglow.onnx:
//! #   https://huggingface.co/notmax123/robo_shaul/resolve/main/roboshaul_90K.pt
//! #   https://huggingface.co/notmax123/robo_shaul/resolve/main/waveglow_256channels_universal_v5.pt
//! cd ../..
//! cargo run --release --features roboshaul --bin roboshaul
//! ```
//!
//! `ffmpeg` must be on PATH.

use std::path::Path;
use std::time::Instant;

use hebrew_sentence_audio::{
    audio::FfmpegTranscoder,
    batch::{BatchConfigBuilder, BatchDriver},
    engines::onnx::OnnxModelParams,
    pipelines::{RoboShaulPaths, RoboShaulPipeline},
    sentences::load_sentences,
};

const SENTENCES_PATH: &str = "scripts/sentences.json";
const OUTPUT_DIR: &str = "web/public/audio/roboshaul";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let onnx = OnnxModelParams::default();
    println!("Using device: {}", onnx.device);

    let sentences_path = Path::new(SENTENCES_PATH);
    let sentences = load_sentences(sentences_path)?;
    println!("Loaded {} sentences from {}", sentences.len(), sentences_path.display());

    let load_start = Instant::now();
    let mut pipeline = RoboShaulPipeline::load(&RoboShaulPaths::default(), &onnx)?;
    println!("Models loaded in {:.2?}", load_start.elapsed());

    let config = BatchConfigBuilder::default().output_dir(OUTPUT_DIR).build()?;
    let report =
        BatchDriver::new(config).run(&sentences, &mut pipeline, &FfmpegTranscoder::default())?;

    println!("Done. Generated {} files in {OUTPUT_DIR}", report.outputs.len());
    Ok(())
}
