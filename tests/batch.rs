use std::cell::RefCell;
use std::error::Error;
use std::path::{Path, PathBuf};

use hebrew_sentence_audio::audio::{TranscodeError, Transcoder};
use hebrew_sentence_audio::batch::{BatchConfigBuilder, BatchDriver, BatchError, Pipeline};
use hebrew_sentence_audio::SynthesisResult;

const SAMPLE_RATE: u32 = 16000;

/// Marks each sentence and emits one sample per character, at half scale.
struct MockPipeline {
    fail_at: Option<usize>,
    calls: usize,
}

impl MockPipeline {
    fn new() -> Self {
        Self {
            fail_at: None,
            calls: 0,
        }
    }

    fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            calls: 0,
        }
    }
}

impl Pipeline for MockPipeline {
    fn name(&self) -> &str {
        "mock"
    }

    fn vocalize(&mut self, sentence: &str) -> Result<String, Box<dyn Error>> {
        Ok(format!("~{sentence}"))
    }

    fn synthesize(&mut self, vocalized: &str) -> Result<SynthesisResult, Box<dyn Error>> {
        let index = self.calls;
        self.calls += 1;
        if self.fail_at == Some(index) {
            return Err(format!("model exploded on {vocalized:?}").into());
        }
        Ok(SynthesisResult {
            samples: vocalized.chars().map(|_| 0.5).collect(),
            sample_rate: SAMPLE_RATE,
        })
    }
}

/// Writes `<sample count> <peak>` instead of encoding audio and records
/// whether the temporary WAV existed while it ran.
#[derive(Default)]
struct RecordingTranscoder {
    saw_temp: RefCell<Vec<bool>>,
}

impl Transcoder for RecordingTranscoder {
    fn transcode(&self, audio: &SynthesisResult, output: &Path) -> Result<(), TranscodeError> {
        let index = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let temp = output.with_file_name(format!("{index}.tmp.wav"));
        self.saw_temp.borrow_mut().push(temp.exists());

        let peak = audio.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        std::fs::write(output, format!("{} {peak:.4}", audio.samples.len()))?;
        Ok(())
    }
}

fn driver(dir: &Path) -> BatchDriver {
    let config = BatchConfigBuilder::default()
        .output_dir(dir.join("audio"))
        .show_progress(false)
        .build()
        .expect("build config");
    BatchDriver::new(config)
}

fn sentences(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read output dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn sample_count(path: &PathBuf) -> usize {
    let content = std::fs::read_to_string(path).expect("read output");
    content
        .split(' ')
        .next()
        .and_then(|n| n.parse().ok())
        .expect("sample count")
}

#[test]
fn writes_one_output_per_sentence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let driver = driver(dir.path());
    let input = sentences(&["שלום", "מה שלומך", "תודה רבה"]);

    let report = driver
        .run(&input, &mut MockPipeline::new(), &RecordingTranscoder::default())
        .expect("batch run");

    assert_eq!(report.outputs.len(), 3);
    assert_eq!(files_in(&dir.path().join("audio")), vec!["0.m4a", "1.m4a", "2.m4a"]);
}

#[test]
fn output_index_matches_sentence_position() {
    let dir = tempfile::tempdir().expect("tempdir");
    let driver = driver(dir.path());
    let input = sentences(&["אבגד", "א", "אבגדהוזח"]);

    let report = driver
        .run(&input, &mut MockPipeline::new(), &RecordingTranscoder::default())
        .expect("batch run");

    for (i, sentence) in input.iter().enumerate() {
        assert_eq!(report.outputs[i], driver.output_path(i));
        // vocalized text is the sentence plus one marker char
        assert_eq!(sample_count(&report.outputs[i]), sentence.chars().count() + 1);
    }
}

#[test]
fn audio_is_peak_normalized_before_transcoding() {
    let dir = tempfile::tempdir().expect("tempdir");
    let driver = driver(dir.path());

    let report = driver
        .run(&sentences(&["שלום"]), &mut MockPipeline::new(), &RecordingTranscoder::default())
        .expect("batch run");

    let content = std::fs::read_to_string(&report.outputs[0]).expect("read output");
    let expected = 10f32.powf(-0.1 / 20.0);
    assert_eq!(content, format!("5 {expected:.4}"));
}

#[test]
fn rerun_overwrites_instead_of_duplicating() {
    let dir = tempfile::tempdir().expect("tempdir");
    let driver = driver(dir.path());
    let out = dir.path().join("audio");

    driver
        .run(&sentences(&["ארוך מאוד מאוד", "ב"]), &mut MockPipeline::new(), &RecordingTranscoder::default())
        .expect("first run");
    driver
        .run(&sentences(&["א", "ב"]), &mut MockPipeline::new(), &RecordingTranscoder::default())
        .expect("second run");

    assert_eq!(files_in(&out), vec!["0.m4a", "1.m4a"]);
    assert_eq!(sample_count(&out.join("0.m4a")), 2);
}

#[test]
fn temporary_wavs_exist_only_during_transcoding() {
    let dir = tempfile::tempdir().expect("tempdir");
    let driver = driver(dir.path());
    let transcoder = RecordingTranscoder::default();

    driver
        .run(&sentences(&["א", "ב", "ג"]), &mut MockPipeline::new(), &transcoder)
        .expect("batch run");

    assert_eq!(*transcoder.saw_temp.borrow(), vec![true, true, true]);
    assert!(files_in(&dir.path().join("audio"))
        .iter()
        .all(|name| !name.ends_with(".tmp.wav")));
}

#[test]
fn empty_input_produces_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let driver = driver(dir.path());

    let report = driver
        .run(&[], &mut MockPipeline::new(), &RecordingTranscoder::default())
        .expect("batch run");

    assert!(report.outputs.is_empty());
    assert_eq!(report.audio_secs, 0.0);
    assert!(files_in(&dir.path().join("audio")).is_empty());
}

#[test]
fn failure_aborts_and_keeps_earlier_outputs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let driver = driver(dir.path());
    let input = sentences(&["א", "ב", "ג", "ד"]);

    let err = driver
        .run(&input, &mut MockPipeline::failing_at(2), &RecordingTranscoder::default())
        .unwrap_err();

    assert!(matches!(err, BatchError::Synthesize { index: 2, .. }));
    assert!(err.to_string().contains("Sentence 2"));
    assert_eq!(files_in(&dir.path().join("audio")), vec!["0.m4a", "1.m4a"]);
}

#[test]
fn transcode_failure_removes_the_temporary_wav() {
    struct Broken;
    impl Transcoder for Broken {
        fn transcode(&self, _: &SynthesisResult, _: &Path) -> Result<(), TranscodeError> {
            Err(TranscodeError::Failed("unsupported codec".to_string()))
        }
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let driver = driver(dir.path());

    let err = driver
        .run(&sentences(&["א"]), &mut MockPipeline::new(), &Broken)
        .unwrap_err();

    assert!(matches!(err, BatchError::Transcode { index: 0, .. }));
    assert!(files_in(&dir.path().join("audio")).is_empty());
}

#[test]
fn report_sums_audio_duration() {
    let dir = tempfile::tempdir().expect("tempdir");
    let driver = driver(dir.path());
    let input = vec!["א".repeat(7999), "ב".repeat(3999)];

    let report = driver
        .run(&input, &mut MockPipeline::new(), &RecordingTranscoder::default())
        .expect("batch run");

    // 8000 + 4000 samples at 16 kHz
    assert!((report.audio_secs - 0.75).abs() < 1e-9);
}
