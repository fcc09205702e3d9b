use std::path::Path;

use ndarray::Array2;
use ort::session::{Session, SessionInputValue};
use ort::value::Tensor;

use super::labels::{DiacritizerLabels, HeadLogits};
use super::DiacritizerError;
use crate::engines::onnx::{find_input, init_session, input_names, require_file, OnnxModelParams};
use crate::text::hebrew::strip_diacritics;

/// Element type the ids input expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdsType {
    Int64,
    Int32,
    Float32,
}

/// A loaded diacritization model.
pub struct Diacritizer {
    session: Session,
    labels: DiacritizerLabels,
    ids_input: String,
    ids_type: IdsType,
    attention_mask_input: Option<String>,
    token_type_input: Option<String>,
}

impl Diacritizer {
    pub fn load(
        onnx_path: &Path,
        labels: DiacritizerLabels,
        params: &OnnxModelParams,
    ) -> Result<Self, DiacritizerError> {
        require_file(onnx_path, "Diacritizer model")?;
        log::info!("Loading diacritizer from {}", onnx_path.display());
        let session = init_session(onnx_path, params)?;

        let names = input_names(&session);
        let ids_input = find_input(&session, &["input_ids", "input", "x"])
            .or_else(|| names.first().cloned())
            .ok_or_else(|| DiacritizerError::Labels("model declares no inputs".to_string()))?;
        let ids_type = detect_ids_type(&session, &ids_input);
        let attention_mask_input = find_input(&session, &["attention_mask"]);
        let token_type_input = find_input(&session, &["token_type_ids"]);

        log::info!(
            "Detected: ids_input='{}' ({:?}), attention_mask={}, token_type_ids={}",
            ids_input,
            ids_type,
            attention_mask_input.is_some(),
            token_type_input.is_some()
        );

        Ok(Self {
            session,
            labels,
            ids_input,
            ids_type,
            attention_mask_input,
            token_type_input,
        })
    }

    /// Return `text` with diacritics added. Marks already present are
    /// replaced by the model's prediction.
    pub fn compute(&mut self, text: &str) -> Result<String, DiacritizerError> {
        let bare = strip_diacritics(text);
        let chars: Vec<char> = bare.chars().collect();
        if chars.is_empty() {
            return Ok(String::new());
        }

        let chunks: Vec<Vec<char>> = self
            .labels
            .chunks(&chars)
            .into_iter()
            .map(<[char]>::to_vec)
            .collect();
        if chunks.len() > 1 {
            log::debug!("Diacritizing {} chars in {} chunks", chars.len(), chunks.len());
        }

        let mut out = String::with_capacity(bare.len() * 2);
        for chunk in &chunks {
            out.push_str(&self.compute_chunk(chunk)?);
        }
        Ok(out)
    }

    fn compute_chunk(&mut self, chars: &[char]) -> Result<String, DiacritizerError> {
        let (ids, offset) = self.labels.encode(chars);
        let seq_len = ids.len();
        let real_len = offset + chars.len() + usize::from(self.labels.eos_id.is_some());

        let mut feeds: Vec<(String, SessionInputValue<'_>)> = Vec::with_capacity(3);
        let ids_value: SessionInputValue<'_> = match self.ids_type {
            IdsType::Int64 => Tensor::from_array(Array2::from_shape_vec((1, seq_len), ids)?)?.into(),
            IdsType::Int32 => Tensor::from_array(Array2::from_shape_vec(
                (1, seq_len),
                ids.iter().map(|&id| id as i32).collect(),
            )?)?
            .into(),
            IdsType::Float32 => Tensor::from_array(Array2::from_shape_vec(
                (1, seq_len),
                ids.iter().map(|&id| id as f32).collect(),
            )?)?
            .into(),
        };
        feeds.push((self.ids_input.clone(), ids_value));

        if let Some(name) = &self.attention_mask_input {
            let mask: Vec<i64> = (0..seq_len).map(|i| i64::from(i < real_len)).collect();
            let mask = Tensor::from_array(Array2::from_shape_vec((1, seq_len), mask)?)?;
            feeds.push((name.clone(), mask.into()));
        }
        if let Some(name) = &self.token_type_input {
            let types = Tensor::from_array(Array2::<i64>::zeros((1, seq_len)))?;
            feeds.push((name.clone(), types.into()));
        }

        let outputs = self.session.run(feeds)?;

        let mut logits = Vec::with_capacity(self.labels.heads.len());
        for (_, value) in outputs.iter() {
            let array = value.try_extract_array::<f32>()?;
            let shape = array.shape();
            let classes = shape.last().copied().unwrap_or(0);
            let data = array.iter().copied().collect();
            logits.push(HeadLogits { data, classes });
        }

        self.labels.decode(chars, offset, &logits)
    }
}

fn detect_ids_type(session: &Session, name: &str) -> IdsType {
    for input in session.inputs() {
        if input.name() == name {
            let type_str = format!("{:?}", input.dtype());
            if type_str.contains("Float32") || type_str.contains("float") {
                return IdsType::Float32;
            }
            if type_str.contains("Int32") || type_str.contains("int32") {
                return IdsType::Int32;
            }
        }
    }
    IdsType::Int64
}

#[cfg(test)]
mod tests {
    use super::Diacritizer;
    use crate::engines::diacritizer::{DiacritizerError, DiacritizerLabels};
    use std::path::Path;

    #[test]
    fn missing_model_file_is_an_io_error() {
        let err = Diacritizer::load(
            Path::new("models/does-not-exist.onnx"),
            DiacritizerLabels::nakdimon(),
            &Default::default(),
        )
        .err()
        .expect("load should fail");
        assert!(matches!(err, DiacritizerError::Io(_)));
        assert!(err.to_string().contains("does-not-exist.onnx"));
    }
}
