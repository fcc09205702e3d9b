//! Generate audio for every sentence in `scripts/sentences.json` with the
//! StyleTTS2 pipeline, into `web/public/audio/styletts2/`.
//!
//! Setup (from the repository root):
//!
//! ```text
//! cd scripts/prepare_audio
//! wget https://huggingface.co/thewh1teagle/phonikud-onnx/resolve/main/phonikud-1.0.int8.onnx
//! wget https://huggingface.co/thewh1teagle/phonikud-onnx/resolve/main/tokenizer.json
//! wget https://github.com/thewh1teagle/style-onnx/releases/download/model-files-v1.0/636_female_style.npy
//! wget https://github.com/thewh1teagle/style-onnx/releases/download/model-files-v1.0/libritts_hebrew.onnx
//! cd ../..
//! cargo run --release --features styletts2 --bin styletts2
//! ```
//!
//! `ffmpeg` must be on PATH.

use std::path::Path;
use std::time::Instant;

use hebrew_sentence_audio::{
    audio::FfmpegTranscoder,
    batch::{BatchConfigBuilder, BatchDriver},
    engines::onnx::OnnxModelParams,
    pipelines::{StyleTts2Paths, StyleTts2Pipeline},
    sentences::load_sentences,
};

const SENTENCES_PATH: &str = "scripts/sentences.json";
const OUTPUT_DIR: &str = "web/public/audio/styletts2";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let onnx = OnnxModelParams::default();
    println!("Using device: {}", onnx.device);

    let sentences_path = Path::new(SENTENCES_PATH);
    let sentences = load_sentences(sentences_path)?;
    println!("Loaded {} sentences from {}", sentences.len(), sentences_path.display());

    let load_start = Instant::now();
    let mut pipeline = StyleTts2Pipeline::load(&StyleTts2Paths::default(), &onnx)?;
    println!("Models loaded in {:.2?}", load_start.elapsed());

    let config = BatchConfigBuilder::default().output_dir(OUTPUT_DIR).build()?;
    let report =
        BatchDriver::new(config).run(&sentences, &mut pipeline, &FfmpegTranscoder::default())?;

    println!("Done. Generated {} files in {OUTPUT_DIR}", report.outputs.len());
    Ok(())
}
