use std::path::Path;

use ndarray::{Array3, ArrayD, IxDyn};
use ort::inputs;
use ort::session::Session;
use ort::value::TensorRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tacotron2::{next_output, owned_outputs, N_MEL_CHANNELS};
use super::RoboShaulError;
use crate::engines::onnx::{init_session, input_rank, require_file, OnnxModelParams};

pub const WAVEGLOW_FILE: &str = "waveglow.onnx";

/// Audio samples produced per mel frame.
pub const HOP_LENGTH: usize = 256;
/// Channels the flow squeezes audio into.
pub const N_GROUP: usize = 8;

/// WaveGlow vocoder: mel spectrogram plus Gaussian noise in, waveform out.
///
/// The graph takes the noise `z` unscaled; `sigma` is applied here.
pub struct WaveGlow {
    session: Session,
    /// 4 when the graph takes `[1, C, T, 1]` inputs, 3 for `[1, C, T]`
    input_rank: usize,
    rng: StdRng,
}

impl WaveGlow {
    pub fn load(
        model_dir: &Path,
        params: &OnnxModelParams,
        seed: Option<u64>,
    ) -> Result<Self, RoboShaulError> {
        let path = model_dir.join(WAVEGLOW_FILE);
        require_file(&path, "WaveGlow vocoder")?;
        log::info!("Loading WaveGlow from {}", path.display());

        let session = init_session(&path, params)?;
        let input_rank = match input_rank(&session, "mel") {
            Some(rank @ (3 | 4)) => rank,
            other => {
                log::debug!("WaveGlow mel rank {other:?}, assuming 4");
                4
            }
        };
        log::info!("Detected: waveglow_input_rank={input_rank}");

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            session,
            input_rank,
            rng,
        })
    }

    /// Vocode a `[1, 80, frames]` mel into mono samples.
    pub fn infer(&mut self, mel: &Array3<f32>, sigma: f32) -> Result<Vec<f32>, RoboShaulError> {
        let frames = mel.shape()[2];
        let z_len = noise_len(frames);
        let noise = gaussian(&mut self.rng, N_GROUP * z_len, sigma);

        let mel_shape = with_rank(&[1, N_MEL_CHANNELS, frames], self.input_rank);
        let z_shape = with_rank(&[1, N_GROUP, z_len], self.input_rank);
        let mel_in = ArrayD::from_shape_vec(IxDyn(&mel_shape), mel.iter().copied().collect())?;
        let z_in = ArrayD::from_shape_vec(IxDyn(&z_shape), noise)?;

        let mut outputs = owned_outputs(
            self.session
                .run(inputs![
                    "mel" => TensorRef::from_array_view(mel_in.view())?,
                    "z" => TensorRef::from_array_view(z_in.view())?,
                ])?
                .iter(),
        )?
        .into_iter();
        let audio = next_output(&mut outputs, "audio")?;

        Ok(audio.iter().copied().collect())
    }
}

/// Length of each noise channel for `frames` mel frames.
fn noise_len(frames: usize) -> usize {
    frames * HOP_LENGTH / N_GROUP
}

fn with_rank(dims: &[usize; 3], rank: usize) -> Vec<usize> {
    let mut shape = dims.to_vec();
    if rank == 4 {
        shape.push(1);
    }
    shape
}

/// `n` samples of N(0, sigma²) via the Box-Muller transform.
fn gaussian<R: Rng>(rng: &mut R, n: usize, sigma: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(n + 1);
    while out.len() < n {
        let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
        let u2: f32 = rng.gen();
        let radius = (-2.0 * u1.ln()).sqrt() * sigma;
        let angle = std::f32::consts::TAU * u2;
        out.push(radius * angle.cos());
        out.push(radius * angle.sin());
    }
    out.truncate(n);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_covers_the_upsampled_mel() {
        assert_eq!(noise_len(10), 320);
        assert_eq!(N_GROUP * noise_len(10), 10 * HOP_LENGTH);
    }

    #[test]
    fn shapes_gain_a_trailing_axis_for_rank_four() {
        assert_eq!(with_rank(&[1, 80, 5], 4), vec![1, 80, 5, 1]);
        assert_eq!(with_rank(&[1, 80, 5], 3), vec![1, 80, 5]);
    }

    #[test]
    fn gaussian_noise_is_scaled_by_sigma() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = gaussian(&mut rng, 20_001, 0.8);
        assert_eq!(samples.len(), 20_001);

        let n = samples.len() as f32;
        let mean = samples.iter().sum::<f32>() / n;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var.sqrt() - 0.8).abs() < 0.05, "std {}", var.sqrt());
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let a = gaussian(&mut StdRng::seed_from_u64(42), 16, 1.0);
        let b = gaussian(&mut StdRng::seed_from_u64(42), 16, 1.0);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_sigma_is_silent_noise() {
        let samples = gaussian(&mut StdRng::seed_from_u64(1), 8, 0.0);
        assert!(samples.iter().all(|s| *s == 0.0));
    }
}
