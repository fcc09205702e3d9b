use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::DiacritizerError;
use crate::text::hebrew::{
    is_letter, DAGESH, HATAF_PATAH, HATAF_QAMATS, HATAF_SEGOL, HIRIQ, HOLAM, PATAH,
    PREFIX_MARK, QAMATS, QAMATS_QATAN, QUBUTS, SEGOL, SHIN_DOT, SHVA, SIN_DOT, STRESS_MARK,
    TSERE, VOCAL_SHVA_MARK,
};

const HEBREW_LETTERS: &str = "אבגדהוזחטיכךלמםנןסעפףצץקרשת";
const DAGESH_LETTERS: &str = "בגדהוזטיכךלמנספףצקשת";

/// How one model output head is turned into marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadKind {
    /// Softmax over mutually exclusive labels; the argmax label is emitted.
    Classes,
    /// Independent binary logits; every label whose logit is positive is emitted.
    Flags,
}

/// One output head of a diacritization model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Head {
    pub kind: HeadKind,
    /// Text emitted for each class / flag. Empty strings emit nothing.
    pub labels: Vec<String>,
    /// Letters this head may mark. `None` means every Hebrew letter.
    #[serde(default)]
    pub letters: Option<String>,
}

impl Head {
    fn classes(labels: Vec<String>, letters: Option<&str>) -> Self {
        Self {
            kind: HeadKind::Classes,
            labels,
            letters: letters.map(str::to_string),
        }
    }

    fn flags(labels: Vec<String>, letters: Option<&str>) -> Self {
        Self {
            kind: HeadKind::Flags,
            ..Self::classes(labels, letters)
        }
    }

    fn applies_to(&self, ch: char) -> bool {
        match &self.letters {
            Some(letters) => letters.contains(ch),
            None => is_letter(ch),
        }
    }

    /// Marks for one character given its logits row.
    fn marks(&self, row: &[f32], out: &mut String) {
        match self.kind {
            HeadKind::Classes => {
                let best = row
                    .iter()
                    .enumerate()
                    .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
                        Some((_, bv)) if bv >= v => best,
                        _ => Some((i, v)),
                    });
                if let Some(label) = best.and_then(|(i, _)| self.labels.get(i)) {
                    out.push_str(label);
                }
            }
            HeadKind::Flags => {
                for (label, &logit) in self.labels.iter().zip(row) {
                    if logit > 0.0 {
                        out.push_str(label);
                    }
                }
            }
        }
    }
}

/// Logits of one head for one chunk, row-major `[positions, classes]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadLogits {
    pub data: Vec<f32>,
    pub classes: usize,
}

impl HeadLogits {
    fn row(&self, position: usize) -> Option<&[f32]> {
        let start = position * self.classes;
        self.data.get(start..start + self.classes)
    }
}

/// Input encoding and output decoding of a character-level diacritizer.
#[derive(Debug, Clone, PartialEq)]
pub struct DiacritizerLabels {
    pub vocab: HashMap<char, i64>,
    pub pad_id: i64,
    pub unk_id: i64,
    pub bos_id: Option<i64>,
    pub eos_id: Option<i64>,
    /// Maximum number of characters per model call (excluding bos/eos).
    pub max_len: usize,
    /// Pad every chunk to `max_len` (fixed-shape exports).
    pub pad_to_max_len: bool,
    /// Character folding applied before the vocab lookup.
    pub aliases: HashMap<char, char>,
    /// Stand-in for any digit.
    pub digit_char: Option<char>,
    /// Stand-in for non-Hebrew letters.
    pub foreign_letter_char: Option<char>,
    /// Stand-in for anything else not in the vocab.
    pub other_char: Option<char>,
    pub heads: Vec<Head>,
}

/// On-disk form of [`DiacritizerLabels`].
#[derive(Debug, Deserialize)]
struct LabelsFile {
    vocab: HashMap<String, i64>,
    #[serde(default)]
    pad_id: i64,
    unk_id: Option<i64>,
    bos_id: Option<i64>,
    eos_id: Option<i64>,
    max_len: usize,
    #[serde(default)]
    pad_to_max_len: bool,
    #[serde(default)]
    aliases: HashMap<String, String>,
    digit_char: Option<char>,
    foreign_letter_char: Option<char>,
    other_char: Option<char>,
    heads: Vec<Head>,
}

fn single_char(key: &str) -> Result<char, DiacritizerError> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(DiacritizerError::Labels(format!(
            "expected a single character, got {key:?}"
        ))),
    }
}

impl DiacritizerLabels {
    /// Load labels from a JSON file.
    pub fn from_json(path: &Path) -> Result<Self, DiacritizerError> {
        let content = std::fs::read_to_string(path)?;
        let file: LabelsFile = serde_json::from_str(&content)
            .map_err(|e| DiacritizerError::Labels(format!("{}: {e}", path.display())))?;

        let vocab = file
            .vocab
            .iter()
            .map(|(k, &v)| Ok((single_char(k)?, v)))
            .collect::<Result<HashMap<_, _>, DiacritizerError>>()?;
        let aliases = file
            .aliases
            .iter()
            .map(|(k, v)| Ok((single_char(k)?, single_char(v)?)))
            .collect::<Result<HashMap<_, _>, DiacritizerError>>()?;

        let labels = Self {
            vocab,
            pad_id: file.pad_id,
            unk_id: file.unk_id.unwrap_or(file.pad_id),
            bos_id: file.bos_id,
            eos_id: file.eos_id,
            max_len: file.max_len,
            pad_to_max_len: file.pad_to_max_len,
            aliases,
            digit_char: file.digit_char,
            foreign_letter_char: file.foreign_letter_char,
            other_char: file.other_char,
            heads: file.heads,
        };
        labels.validate()?;
        Ok(labels)
    }

    /// Labels of the Nakdimon model: letters table with pad 0, fixed
    /// 80-character windows, niqqud / dagesh / sin heads.
    pub fn nakdimon() -> Self {
        let table: Vec<char> = "HO51"
            .chars()
            .chain(" !\"'(),-.:;?".chars())
            .chain(HEBREW_LETTERS.chars())
            .collect();
        let vocab = table
            .iter()
            .enumerate()
            .map(|(i, &ch)| (ch, i as i64 + 1))
            .collect();

        let aliases = [
            ('\n', ' '),
            ('\t', ' '),
            ('\u{05BE}', '-'),
            ('\u{2012}', '-'),
            ('\u{2013}', '-'),
            ('\u{2014}', '-'),
            ('\u{2015}', '-'),
            ('\u{2212}', '-'),
            ('[', '('),
            (']', ')'),
            ('\u{05F4}', '"'),
            ('\u{201C}', '"'),
            ('\u{201D}', '"'),
            ('\u{201E}', '"'),
            ('\u{05F3}', '\''),
            ('\u{2018}', '\''),
            ('\u{2019}', '\''),
        ]
        .into_iter()
        .collect();

        // Index 0 is the mask class and index 1 is rafe; neither adds a mark.
        let mut niqqud = vec![String::new(), String::new()];
        niqqud.extend(
            [
                SHVA, HATAF_SEGOL, HATAF_PATAH, HATAF_QAMATS, HIRIQ, TSERE, SEGOL, PATAH, QAMATS,
                HOLAM, QUBUTS,
            ]
            .map(s),
        );

        Self {
            vocab,
            pad_id: 0,
            unk_id: 1,
            bos_id: None,
            eos_id: None,
            max_len: 80,
            pad_to_max_len: true,
            aliases,
            digit_char: Some('5'),
            foreign_letter_char: Some('O'),
            other_char: Some('H'),
            heads: vec![
                Head::classes(niqqud, None),
                Head::classes(
                    vec![String::new(), String::new(), s(DAGESH)],
                    Some(DAGESH_LETTERS),
                ),
                Head::classes(
                    vec![String::new(), String::new(), s(SHIN_DOT), s(SIN_DOT)],
                    Some("ש"),
                ),
            ],
        }
    }

    /// Labels of the Phonikud model. The input vocabulary is the WordPiece
    /// vocab of the character BERT tokenizer shipped with it.
    pub fn phonikud(tokenizer_json: &Path) -> Result<Self, DiacritizerError> {
        let vocab = load_wordpiece_vocab(tokenizer_json)?;
        let special = |name: &str| {
            vocab.specials.get(name).copied().ok_or_else(|| {
                DiacritizerError::Labels(format!("tokenizer has no {name} token"))
            })
        };

        let vowels = [
            SHVA, HATAF_SEGOL, HATAF_PATAH, HATAF_QAMATS, HIRIQ, TSERE, SEGOL, PATAH, QAMATS,
            HOLAM, QUBUTS, QAMATS_QATAN,
        ];
        let mut nikud: Vec<String> = vec![String::new(), s(DAGESH)];
        nikud.extend(vowels.iter().map(|&v| s(v)));
        nikud.extend(vowels.iter().map(|&v| format!("{DAGESH}{v}")));

        let labels = Self {
            pad_id: special("[PAD]")?,
            unk_id: special("[UNK]")?,
            bos_id: Some(special("[CLS]")?),
            eos_id: Some(special("[SEP]")?),
            vocab: vocab.chars,
            max_len: 2046,
            pad_to_max_len: false,
            aliases: HashMap::new(),
            digit_char: None,
            foreign_letter_char: None,
            other_char: None,
            heads: vec![
                Head::classes(nikud, None),
                Head::classes(vec![String::new(), s(SHIN_DOT), s(SIN_DOT)], Some("ש")),
                Head::flags(
                    vec![s(STRESS_MARK), s(VOCAL_SHVA_MARK), s(PREFIX_MARK)],
                    None,
                ),
            ],
        };
        labels.validate()?;
        Ok(labels)
    }

    fn validate(&self) -> Result<(), DiacritizerError> {
        if self.max_len == 0 {
            return Err(DiacritizerError::Labels("max_len must be positive".to_string()));
        }
        if self.heads.is_empty() {
            return Err(DiacritizerError::Labels("at least one head is required".to_string()));
        }
        Ok(())
    }

    /// Input id for one character.
    pub fn encode_char(&self, ch: char) -> i64 {
        let ch = self.aliases.get(&ch).copied().unwrap_or(ch);
        if let Some(&id) = self.vocab.get(&ch) {
            return id;
        }
        let stand_in = if ch.is_ascii_digit() {
            self.digit_char
        } else if ch.is_alphabetic() && !is_letter(ch) {
            self.foreign_letter_char
        } else {
            self.other_char
        };
        stand_in
            .and_then(|c| self.vocab.get(&c).copied())
            .unwrap_or(self.unk_id)
    }

    /// Model input for one chunk: ids plus the offset of the first character.
    pub fn encode(&self, chars: &[char]) -> (Vec<i64>, usize) {
        let mut ids = Vec::with_capacity(self.max_len + 2);
        if let Some(bos) = self.bos_id {
            ids.push(bos);
        }
        let offset = ids.len();
        ids.extend(chars.iter().map(|&ch| self.encode_char(ch)));
        if let Some(eos) = self.eos_id {
            ids.push(eos);
        }
        if self.pad_to_max_len {
            let target = self.max_len + offset + usize::from(self.eos_id.is_some());
            if ids.len() < target {
                ids.resize(target, self.pad_id);
            }
        }
        (ids, offset)
    }

    /// Re-insert the predicted marks after each character of the chunk.
    pub fn decode(
        &self,
        chars: &[char],
        offset: usize,
        logits: &[HeadLogits],
    ) -> Result<String, DiacritizerError> {
        if logits.len() != self.heads.len() {
            return Err(DiacritizerError::Labels(format!(
                "model produced {} outputs, labels describe {} heads",
                logits.len(),
                self.heads.len()
            )));
        }

        for (index, (head, head_logits)) in self.heads.iter().zip(logits).enumerate() {
            if head_logits.classes != head.labels.len() {
                return Err(DiacritizerError::Labels(format!(
                    "output {index} has {} classes, labels describe {}",
                    head_logits.classes,
                    head.labels.len()
                )));
            }
        }

        let mut out = String::with_capacity(chars.len() * 3);
        for (i, &ch) in chars.iter().enumerate() {
            out.push(ch);
            for (head, head_logits) in self.heads.iter().zip(logits) {
                if !head.applies_to(ch) {
                    continue;
                }
                let row = head_logits.row(offset + i).ok_or_else(|| {
                    DiacritizerError::Labels(format!(
                        "output too short for position {}",
                        offset + i
                    ))
                })?;
                head.marks(row, &mut out);
            }
        }
        Ok(out)
    }

    /// Split text into chunks of at most `max_len` characters, breaking
    /// after the last space inside the window when there is one.
    pub fn chunks<'a>(&self, chars: &'a [char]) -> Vec<&'a [char]> {
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.max_len).min(chars.len());
            if end == chars.len() {
                chunks.push(&chars[start..end]);
                break;
            }
            let split = chars[start..end]
                .iter()
                .rposition(|&c| c == ' ')
                .map(|i| start + i + 1)
                .filter(|&split| split > start)
                .unwrap_or(end);
            chunks.push(&chars[start..split]);
            start = split;
        }
        chunks
    }
}

fn s(ch: char) -> String {
    ch.to_string()
}

struct WordPieceVocab {
    chars: HashMap<char, i64>,
    specials: HashMap<String, i64>,
}

/// Read single-character entries and `[XXX]` specials from the
/// `model.vocab` table of a HuggingFace `tokenizer.json`.
fn load_wordpiece_vocab(path: &Path) -> Result<WordPieceVocab, DiacritizerError> {
    let content = std::fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| DiacritizerError::Labels(format!("Failed to parse JSON: {e}")))?;

    let vocab_obj = json
        .get("model")
        .and_then(|m| m.get("vocab"))
        .ok_or_else(|| DiacritizerError::Labels("Missing 'model.vocab' field".to_string()))?
        .as_object()
        .ok_or_else(|| DiacritizerError::Labels("'model.vocab' must be an object".to_string()))?;

    let mut chars = HashMap::new();
    let mut specials = HashMap::new();
    for (k, v) in vocab_obj {
        let id = v.as_i64().ok_or_else(|| {
            DiacritizerError::Labels(format!("Non-integer vocab value for key {k:?}"))
        })?;
        let mut it = k.chars();
        match (it.next(), it.next()) {
            (Some(ch), None) => {
                chars.insert(ch, id);
            }
            _ if k.starts_with('[') && k.ends_with(']') => {
                specials.insert(k.clone(), id);
            }
            _ => {}
        }
    }

    Ok(WordPieceVocab { chars, specials })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(classes: usize, picks: &[usize]) -> HeadLogits {
        let mut data = vec![0.0; classes * picks.len()];
        for (row, &pick) in picks.iter().enumerate() {
            data[row * classes + pick] = 5.0;
        }
        HeadLogits { data, classes }
    }

    #[test]
    fn nakdimon_table_starts_after_pad() {
        let labels = DiacritizerLabels::nakdimon();
        assert_eq!(labels.encode_char('H'), 1);
        assert_eq!(labels.encode_char(' '), 5);
        assert_eq!(labels.encode_char('א'), 17);
        assert_eq!(labels.encode_char('ת'), 17 + 26);
    }

    #[test]
    fn nakdimon_folds_unknown_characters() {
        let labels = DiacritizerLabels::nakdimon();
        assert_eq!(labels.encode_char('7'), labels.encode_char('5'));
        assert_eq!(labels.encode_char('x'), labels.encode_char('O'));
        assert_eq!(labels.encode_char('#'), labels.encode_char('H'));
        assert_eq!(labels.encode_char('\u{2014}'), labels.encode_char('-'));
    }

    #[test]
    fn fixed_shape_encoding_is_padded() {
        let labels = DiacritizerLabels::nakdimon();
        let (ids, offset) = labels.encode(&['ש', 'ם']);
        assert_eq!(offset, 0);
        assert_eq!(ids.len(), 80);
        assert!(ids[2..].iter().all(|&id| id == 0));
    }

    #[test]
    fn bos_and_eos_wrap_the_chunk() {
        let mut labels = DiacritizerLabels::nakdimon();
        labels.bos_id = Some(100);
        labels.eos_id = Some(101);
        labels.pad_to_max_len = false;
        let (ids, offset) = labels.encode(&['א']);
        assert_eq!(ids, vec![100, 17, 101]);
        assert_eq!(offset, 1);
    }

    #[test]
    fn decodes_classes_per_head_and_letter() {
        let labels = DiacritizerLabels::nakdimon();
        let chars: Vec<char> = "שם!".chars().collect();
        // shin: qamats + shin dot; mem: nothing; '!' is never marked
        let niqqud = one_hot(13, &[10, 0, 10]);
        let dagesh = one_hot(3, &[0, 2, 2]);
        let sin = one_hot(4, &[2, 0, 3]);
        let out = labels
            .decode(&chars, 0, &[niqqud, dagesh, sin])
            .expect("decode");
        // final mem takes no dagesh, so only ש gets marks
        assert_eq!(out, format!("ש{QAMATS}{SHIN_DOT}ם!"));
    }

    #[test]
    fn flags_emit_every_positive_label() {
        let labels = DiacritizerLabels {
            heads: vec![Head::flags(
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                None,
            )],
            ..DiacritizerLabels::nakdimon()
        };
        let logits = HeadLogits {
            data: vec![1.0, -1.0, 0.5],
            classes: 3,
        };
        let out = labels.decode(&['ב'], 0, &[logits]).expect("decode");
        assert_eq!(out, "בac");
    }

    #[test]
    fn decode_rejects_head_count_mismatch() {
        let labels = DiacritizerLabels::nakdimon();
        assert!(labels.decode(&['א'], 0, &[]).is_err());
    }

    #[test]
    fn decode_rejects_class_count_mismatch() {
        let labels = DiacritizerLabels::nakdimon();
        // niqqud head one class short
        let niqqud = one_hot(12, &[10]);
        let dagesh = one_hot(3, &[0]);
        let sin = one_hot(4, &[0]);
        let err = labels
            .decode(&['א'], 0, &[niqqud, dagesh, sin])
            .expect_err("width mismatch");
        assert!(err.to_string().contains("12 classes"));
    }

    #[test]
    fn chunks_break_after_spaces() {
        let labels = DiacritizerLabels {
            max_len: 5,
            ..DiacritizerLabels::nakdimon()
        };
        let chars: Vec<char> = "ab cd efghijk".chars().collect();
        let chunks: Vec<String> = labels
            .chunks(&chars)
            .iter()
            .map(|c| c.iter().collect())
            .collect();
        assert_eq!(chunks, vec!["ab ", "cd ", "efghi", "jk"]);
    }

    #[test]
    fn phonikud_reads_tokenizer_vocab() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tokenizer.json");
        std::fs::write(
            &path,
            r###"{"model": {"type": "WordPiece", "vocab": {
                "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3, "א": 4, "ב": 5, "##א": 6
            }}}"###,
        )
        .expect("write tokenizer");

        let labels = DiacritizerLabels::phonikud(&path).expect("labels");
        assert_eq!(labels.bos_id, Some(2));
        assert_eq!(labels.eos_id, Some(3));
        assert_eq!(labels.encode_char('ב'), 5);
        assert_eq!(labels.encode_char('ג'), 1);
        assert_eq!(labels.heads.len(), 3);
        assert_eq!(labels.heads[2].kind, HeadKind::Flags);
    }

    #[test]
    fn phonikud_requires_special_tokens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, r#"{"model": {"vocab": {"א": 4}}}"#).expect("write");
        assert!(DiacritizerLabels::phonikud(&path).is_err());
    }

    #[test]
    fn loads_labels_from_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labels.json");
        std::fs::write(
            &path,
            r#"{
                "vocab": {"א": 1, "ב": 2},
                "max_len": 16,
                "aliases": {"-": " "},
                "heads": [{"kind": "classes", "labels": ["", "ַ"], "letters": "ב"}]
            }"#,
        )
        .expect("write labels");

        let labels = DiacritizerLabels::from_json(&path).expect("labels");
        assert_eq!(labels.max_len, 16);
        assert_eq!(labels.unk_id, 0);
        assert_eq!(labels.aliases.get(&'-'), Some(&' '));
        assert_eq!(labels.heads[0].letters.as_deref(), Some("ב"));
    }
}
