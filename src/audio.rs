//! Audio post-processing: temporary WAV handling, peak normalization and
//! transcoding to AAC/M4A through the `ffmpeg` executable.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::SynthesisResult;

/// Default bitrate of the compressed output.
pub const DEFAULT_BITRATE: &str = "128k";

/// Default headroom left below full scale by [`normalize_peak`], in dB.
pub const DEFAULT_HEADROOM_DB: f32 = 0.1;

#[derive(thiserror::Error, Debug)]
pub enum TranscodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
    #[error(
        "ffmpeg not found. Install: Linux: `sudo apt-get install ffmpeg`, \
         macOS: `brew install ffmpeg`, Windows: https://ffmpeg.org/download.html"
    )]
    FfmpegNotFound,
    #[error("ffmpeg failed: {0}")]
    Failed(String),
}

/// Read a WAV file into mono f32 samples.
///
/// Integer PCM is scaled into `[-1.0, 1.0]`; multi-channel audio is
/// downmixed by averaging the channels of each frame.
pub fn read_wav(path: &Path) -> Result<SynthesisResult, hound::Error> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<_, _>>()?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(SynthesisResult {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Scale the audio so its absolute peak sits `headroom_db` below full scale.
///
/// Empty and fully silent buffers are left untouched.
pub fn normalize_peak(samples: &mut [f32], headroom_db: f32) {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak == 0.0 || !peak.is_finite() {
        return;
    }

    let target = 10f32.powf(-headroom_db / 20.0);
    let gain = target / peak;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}

/// Encode mono f32 audio as an in-memory 16-bit PCM WAV.
pub fn encode_wav_pcm16(audio: &SynthesisResult) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::with_capacity(44 + audio.samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut buffer, spec)?;
        for &sample in &audio.samples {
            let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            writer.write_sample(scaled)?;
        }
        writer.finalize()?;
    }
    Ok(buffer.into_inner())
}

/// A temporary WAV file that is removed when the guard goes out of scope.
#[derive(Debug)]
pub struct TempWav {
    path: PathBuf,
    removed: bool,
}

impl TempWav {
    /// Write `audio` to `path` and take ownership of the file.
    pub fn create(path: PathBuf, audio: &SynthesisResult) -> Result<Self, hound::Error> {
        // Own the path before writing so a failed write is still cleaned up.
        let guard = Self {
            path,
            removed: false,
        };
        audio.write_wav(&guard.path)?;
        Ok(guard)
    }

    /// Load the file back into memory.
    pub fn load(&self) -> Result<SynthesisResult, hound::Error> {
        read_wav(&self.path)
    }

    /// Delete the file now, reporting any error other than NotFound.
    pub fn finish(mut self) -> std::io::Result<()> {
        self.removed = true;
        remove_if_exists(&self.path)
    }
}

impl Drop for TempWav {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(e) = remove_if_exists(&self.path) {
                log::warn!("Failed to remove {}: {e}", self.path.display());
            }
        }
    }
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Converts normalized audio into the final compressed artifact.
pub trait Transcoder {
    /// Encode `audio` and write it to `output`, overwriting any existing file.
    fn transcode(&self, audio: &SynthesisResult, output: &Path) -> Result<(), TranscodeError>;
}

/// AAC-in-MP4 (`.m4a`) encoder backed by the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    /// `ffmpeg` binary to run. `None` uses `ffmpeg` from PATH.
    pub bin_path: Option<PathBuf>,
    /// Target audio bitrate, in ffmpeg syntax (e.g. `"128k"`).
    pub bitrate: String,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self {
            bin_path: None,
            bitrate: DEFAULT_BITRATE.to_string(),
        }
    }
}

impl FfmpegTranscoder {
    pub fn with_bitrate(bitrate: impl Into<String>) -> Self {
        Self {
            bitrate: bitrate.into(),
            ..Default::default()
        }
    }

    fn program(&self) -> &Path {
        self.bin_path.as_deref().unwrap_or(Path::new("ffmpeg"))
    }

    fn args<'a>(&'a self, output: &'a Path) -> Vec<&'a std::ffi::OsStr> {
        let mut args: Vec<&std::ffi::OsStr> = [
            "-y",
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "wav",
            "-i",
            "pipe:0",
            "-c:a",
            "aac",
            "-b:a",
        ]
        .iter()
        .map(|s| std::ffi::OsStr::new(*s))
        .collect();
        args.push(std::ffi::OsStr::new(self.bitrate.as_str()));
        args.push(std::ffi::OsStr::new("-f"));
        args.push(std::ffi::OsStr::new("ipod"));
        args.push(output.as_os_str());
        args
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, audio: &SynthesisResult, output: &Path) -> Result<(), TranscodeError> {
        let wav = encode_wav_pcm16(audio)?;

        let mut child = Command::new(self.program())
            .args(self.args(output))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        // Stdin is written on its own thread while stderr is collected.
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || stdin.write_all(&wav))
        });

        let result = child.wait_with_output()?;
        let written = match writer {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked"))),
            None => Ok(()),
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TranscodeError::Failed(format!(
                "exited with code {:?}: {}",
                result.status.code(),
                stderr.trim()
            )));
        }
        written?;

        log::debug!("Wrote {}", output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_peak_to_headroom() {
        let mut samples = vec![0.1, -0.25, 0.2];
        normalize_peak(&mut samples, 0.1);
        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        let expected = 10f32.powf(-0.1 / 20.0);
        assert!((peak - expected).abs() < 1e-6);
        // ratios are preserved
        assert!((samples[0] / samples[2] - 0.5).abs() < 1e-6);
        assert!(samples[1] < 0.0);
    }

    #[test]
    fn leaves_silence_and_empty_audio_alone() {
        let mut silent = vec![0.0; 4];
        normalize_peak(&mut silent, 0.1);
        assert_eq!(silent, vec![0.0; 4]);

        let mut empty: Vec<f32> = Vec::new();
        normalize_peak(&mut empty, 0.1);
        assert!(empty.is_empty());
    }

    #[test]
    fn attenuates_clipping_audio() {
        let mut loud = vec![2.0, -4.0];
        normalize_peak(&mut loud, 0.0);
        assert!((loud[1] + 1.0).abs() < 1e-6);
        assert!((loud[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn temp_wav_roundtrips_and_is_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("0.tmp.wav");
        let audio = SynthesisResult {
            samples: vec![0.0, 0.5, -0.5],
            sample_rate: 22050,
        };

        let temp = TempWav::create(path.clone(), &audio).expect("write temp wav");
        assert!(path.exists());
        assert_eq!(temp.load().expect("load temp wav"), audio);
        temp.finish().expect("remove temp wav");
        assert!(!path.exists());
    }

    #[test]
    fn dropped_temp_wav_is_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("3.tmp.wav");
        let audio = SynthesisResult {
            samples: vec![0.25; 8],
            sample_rate: 24000,
        };
        {
            let _temp = TempWav::create(path.clone(), &audio).expect("write temp wav");
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn reads_integer_stereo_as_mono() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
        for (l, r) in [(16384i16, 0i16), (-16384, -16384)] {
            writer.write_sample(l).expect("write");
            writer.write_sample(r).expect("write");
        }
        writer.finalize().expect("finalize");

        let audio = read_wav(&path).expect("read wav");
        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.samples.len(), 2);
        assert!((audio.samples[0] - 0.25).abs() < 1e-4);
        assert!((audio.samples[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn pcm16_encoding_has_wav_header() {
        let audio = SynthesisResult {
            samples: vec![0.0; 100],
            sample_rate: 24000,
        };
        let bytes = encode_wav_pcm16(&audio).expect("encode");
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert!(bytes.len() >= 44 + 200);
    }

    #[test]
    fn ffmpeg_args_select_aac_in_ipod_container() {
        let transcoder = FfmpegTranscoder::with_bitrate("96k");
        let out = Path::new("out/7.m4a");
        let args: Vec<String> = transcoder
            .args(out)
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let joined = args.join(" ");
        assert!(joined.contains("-i pipe:0"));
        assert!(joined.contains("-c:a aac -b:a 96k"));
        assert!(joined.ends_with("-f ipod out/7.m4a"));
    }

    #[test]
    fn missing_ffmpeg_binary_is_reported() {
        let transcoder = FfmpegTranscoder {
            bin_path: Some(PathBuf::from("/nonexistent/bin/ffmpeg-missing")),
            ..Default::default()
        };
        let dir = tempfile::tempdir().expect("tempdir");
        let audio = SynthesisResult {
            samples: vec![0.0; 10],
            sample_rate: 24000,
        };
        let err = transcoder
            .transcode(&audio, &dir.path().join("0.m4a"))
            .unwrap_err();
        assert!(matches!(err, TranscodeError::FfmpegNotFound));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn early_exit_reports_the_exit_status() {
        let transcoder = FfmpegTranscoder {
            bin_path: Some(PathBuf::from("/bin/false")),
            ..Default::default()
        };
        let dir = tempfile::tempdir().expect("tempdir");
        // Larger than a pipe buffer, so the child exits before stdin is drained.
        let audio = SynthesisResult {
            samples: vec![0.1; 24000 * 5],
            sample_rate: 24000,
        };
        let err = transcoder
            .transcode(&audio, &dir.path().join("0.m4a"))
            .unwrap_err();
        match err {
            TranscodeError::Failed(message) => assert!(message.contains("Some(1)"), "{message}"),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(!dir.path().join("0.m4a").exists());
    }
}
