use std::path::Path;

use ndarray::{Array1, Array2, Array3, ArrayD, Axis};
use ort::inputs;
use ort::session::Session;
use ort::value::{TensorRef, ValueRef};

use super::RoboShaulError;
use crate::engines::onnx::{init_session, require_file, OnnxModelParams};

pub const N_MEL_CHANNELS: usize = 80;
pub const ATTENTION_RNN_DIM: usize = 1024;
pub const DECODER_RNN_DIM: usize = 1024;
pub const ENCODER_EMBEDDING_DIM: usize = 512;

pub const ENCODER_FILE: &str = "encoder.onnx";
pub const DECODER_FILE: &str = "decoder_iter.onnx";
pub const POSTNET_FILE: &str = "postnet.onnx";

/// Recurrent state carried between decoder steps.
struct DecoderState {
    decoder_input: ArrayD<f32>,
    attention_hidden: ArrayD<f32>,
    attention_cell: ArrayD<f32>,
    decoder_hidden: ArrayD<f32>,
    decoder_cell: ArrayD<f32>,
    attention_weights: ArrayD<f32>,
    attention_weights_cum: ArrayD<f32>,
    attention_context: ArrayD<f32>,
}

impl DecoderState {
    fn zeros(seq_len: usize) -> Self {
        Self {
            decoder_input: ArrayD::zeros(vec![1, N_MEL_CHANNELS]),
            attention_hidden: ArrayD::zeros(vec![1, ATTENTION_RNN_DIM]),
            attention_cell: ArrayD::zeros(vec![1, ATTENTION_RNN_DIM]),
            decoder_hidden: ArrayD::zeros(vec![1, DECODER_RNN_DIM]),
            decoder_cell: ArrayD::zeros(vec![1, DECODER_RNN_DIM]),
            attention_weights: ArrayD::zeros(vec![1, seq_len]),
            attention_weights_cum: ArrayD::zeros(vec![1, seq_len]),
            attention_context: ArrayD::zeros(vec![1, ENCODER_EMBEDDING_DIM]),
        }
    }
}

/// Tacotron2 split into encoder, single decoder step, and postnet sessions.
pub struct Tacotron2 {
    encoder: Session,
    decoder: Session,
    postnet: Session,
}

impl Tacotron2 {
    pub fn load(model_dir: &Path, params: &OnnxModelParams) -> Result<Self, RoboShaulError> {
        let encoder_path = model_dir.join(ENCODER_FILE);
        let decoder_path = model_dir.join(DECODER_FILE);
        let postnet_path = model_dir.join(POSTNET_FILE);
        require_file(&encoder_path, "Tacotron2 encoder")?;
        require_file(&decoder_path, "Tacotron2 decoder")?;
        require_file(&postnet_path, "Tacotron2 postnet")?;

        log::info!("Loading Tacotron2 from {}", model_dir.display());
        Ok(Self {
            encoder: init_session(&encoder_path, params)?,
            decoder: init_session(&decoder_path, params)?,
            postnet: init_session(&postnet_path, params)?,
        })
    }

    /// Run the full acoustic model and return the postnet mel `[1, 80, frames]`.
    ///
    /// Decoding stops at the first frame whose stop-gate probability exceeds
    /// `gate_threshold`, or after `max_decoder_steps` frames.
    pub fn infer(
        &mut self,
        sequence: &[i64],
        gate_threshold: f32,
        max_decoder_steps: usize,
    ) -> Result<Array3<f32>, RoboShaulError> {
        let seq_len = sequence.len();
        let sequences = Array2::from_shape_vec((1, seq_len), sequence.to_vec())?;
        let lengths = Array1::from_vec(vec![seq_len as i64]);

        let mut encoded = owned_outputs(self.encoder.run(inputs![
            "sequences" => TensorRef::from_array_view(sequences.view())?,
            "sequence_lengths" => TensorRef::from_array_view(lengths.view())?,
        ])?.iter())?
        .into_iter();
        let memory = next_output(&mut encoded, "memory")?;
        let processed_memory = next_output(&mut encoded, "processed_memory")?;

        let mask = Array2::from_elem((1, seq_len), true);
        let mut state = DecoderState::zeros(seq_len);
        let mut frames: Vec<ArrayD<f32>> = Vec::new();

        loop {
            let outputs = owned_outputs(self.decoder.run(inputs![
                "decoder_input" => TensorRef::from_array_view(state.decoder_input.view())?,
                "attention_hidden" => TensorRef::from_array_view(state.attention_hidden.view())?,
                "attention_cell" => TensorRef::from_array_view(state.attention_cell.view())?,
                "decoder_hidden" => TensorRef::from_array_view(state.decoder_hidden.view())?,
                "decoder_cell" => TensorRef::from_array_view(state.decoder_cell.view())?,
                "attention_weights" => TensorRef::from_array_view(state.attention_weights.view())?,
                "attention_weights_cum" => TensorRef::from_array_view(state.attention_weights_cum.view())?,
                "attention_context" => TensorRef::from_array_view(state.attention_context.view())?,
                "memory" => TensorRef::from_array_view(memory.view())?,
                "processed_memory" => TensorRef::from_array_view(processed_memory.view())?,
                "mask" => TensorRef::from_array_view(mask.view())?,
            ])?.iter())?;
            let mut outputs = outputs.into_iter();

            let frame = next_output(&mut outputs, "decoder_output")?;
            let gate = next_output(&mut outputs, "gate_prediction")?
                .iter()
                .next()
                .copied()
                .ok_or_else(|| RoboShaulError::Output("empty gate prediction".to_string()))?;
            let next = DecoderState {
                decoder_input: frame.clone(),
                attention_hidden: next_output(&mut outputs, "attention_hidden")?,
                attention_cell: next_output(&mut outputs, "attention_cell")?,
                decoder_hidden: next_output(&mut outputs, "decoder_hidden")?,
                decoder_cell: next_output(&mut outputs, "decoder_cell")?,
                attention_weights: next_output(&mut outputs, "attention_weights")?,
                attention_weights_cum: next_output(&mut outputs, "attention_weights_cum")?,
                attention_context: next_output(&mut outputs, "attention_context")?,
            };

            frames.push(frame);
            state = next;

            if should_stop(gate, gate_threshold) {
                break;
            }
            if frames.len() >= max_decoder_steps {
                log::warn!("Reached max decoder steps ({max_decoder_steps}) without a stop gate");
                break;
            }
        }

        log::debug!("Decoded {} mel frames for {} symbols", frames.len(), seq_len);
        let mel = stack_frames(&frames)?;

        let mut post = owned_outputs(self.postnet.run(inputs![
            "mel_outputs" => TensorRef::from_array_view(mel.view())?,
        ])?.iter())?
        .into_iter();
        let mel_postnet = next_output(&mut post, "mel_outputs_postnet")?;
        Ok(mel_postnet.into_dimensionality()?)
    }
}

/// Copy every f32 output of a run, in declaration order.
pub(crate) fn owned_outputs<'s, 'v, I>(outputs: I) -> Result<Vec<ArrayD<f32>>, ort::Error>
where
    I: IntoIterator<Item = (&'s str, ValueRef<'v>)>,
{
    outputs
        .into_iter()
        .map(|(_, value)| Ok(value.try_extract_array::<f32>()?.to_owned()))
        .collect()
}

pub(crate) fn next_output(
    outputs: &mut impl Iterator<Item = ArrayD<f32>>,
    name: &str,
) -> Result<ArrayD<f32>, RoboShaulError> {
    outputs
        .next()
        .ok_or_else(|| RoboShaulError::Output(format!("missing output '{name}'")))
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn should_stop(gate_logit: f32, gate_threshold: f32) -> bool {
    sigmoid(gate_logit) > gate_threshold
}

/// Stack per-step `[1, 80]` frames into a `[1, 80, frames]` mel.
fn stack_frames(frames: &[ArrayD<f32>]) -> Result<Array3<f32>, RoboShaulError> {
    let mut mel = Array3::<f32>::zeros((1, N_MEL_CHANNELS, frames.len()));
    for (t, frame) in frames.iter().enumerate() {
        if frame.len() != N_MEL_CHANNELS {
            return Err(RoboShaulError::Output(format!(
                "decoder frame has {} values, expected {N_MEL_CHANNELS}",
                frame.len()
            )));
        }
        let mut column = mel.index_axis_mut(Axis(2), t);
        for (dst, &src) in column.iter_mut().zip(frame.iter()) {
            *dst = src;
        }
    }
    Ok(mel)
}
