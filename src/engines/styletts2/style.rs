use std::path::Path;

use super::model::{StyleTts2Error, STYLE_DIM};

/// Reference style vectors for a single speaker.
///
/// Loaded from a `.npy` file of shape `[N, 256]`; most exports ship `N = 1`.
pub struct StyleStore {
    styles: Vec<[f32; STYLE_DIM]>,
}

impl StyleStore {
    pub fn load(path: &Path) -> Result<Self, StyleTts2Error> {
        let data = std::fs::read(path)?;
        let name = path.display().to_string();
        let styles = parse_npy(&data, &name)?;
        if styles.is_empty() {
            return Err(StyleTts2Error::StyleParse(format!("{name}: no style vectors")));
        }
        log::info!("Loaded {} style vector(s) from {name}", styles.len());
        Ok(Self { styles })
    }

    pub(crate) fn len(&self) -> usize {
        self.styles.len()
    }

    /// The style vector at `idx`, clamped to the valid range.
    pub fn get_style(&self, idx: usize) -> &[f32; STYLE_DIM] {
        &self.styles[idx.min(self.styles.len().saturating_sub(1))]
    }
}

/// Parse a numpy .npy file into a list of style vectors.
///
/// Expects float32 little-endian data whose element count is a multiple of 256.
fn parse_npy(data: &[u8], name: &str) -> Result<Vec<[f32; STYLE_DIM]>, StyleTts2Error> {
    if data.len() < 10 {
        return Err(StyleTts2Error::StyleParse(format!(
            "{name}: file too short ({} bytes)",
            data.len()
        )));
    }

    if &data[0..6] != b"\x93NUMPY" {
        return Err(StyleTts2Error::StyleParse(format!(
            "{name}: invalid numpy magic bytes"
        )));
    }

    // v1 stores a u16 header length at [8..10], v2+ a u32 at [8..12]
    let (header_len, header_start) = if data[6] == 1 {
        (u16::from_le_bytes([data[8], data[9]]) as usize, 10)
    } else {
        if data.len() < 12 {
            return Err(StyleTts2Error::StyleParse(format!("{name}: header truncated")));
        }
        (
            u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize,
            12,
        )
    };
    let data_offset = header_start + header_len;

    if data.len() < data_offset {
        return Err(StyleTts2Error::StyleParse(format!(
            "{name}: header truncated (need {data_offset} bytes, got {})",
            data.len()
        )));
    }

    let header = String::from_utf8_lossy(&data[header_start..data_offset]);
    if !header.contains("<f4") {
        return Err(StyleTts2Error::StyleParse(format!(
            "{name}: expected little-endian float32 data, header is {}",
            header.trim()
        )));
    }

    let float_data = &data[data_offset..];
    if float_data.len() % 4 != 0 {
        return Err(StyleTts2Error::StyleParse(format!(
            "{name}: float data length {} is not a multiple of 4",
            float_data.len()
        )));
    }

    let n_floats = float_data.len() / 4;
    if n_floats % STYLE_DIM != 0 {
        return Err(StyleTts2Error::StyleParse(format!(
            "{name}: float count {n_floats} is not a multiple of {STYLE_DIM} (style vector dim)"
        )));
    }

    let result = float_data
        .chunks_exact(STYLE_DIM * 4)
        .map(|row| {
            let mut vec = [0f32; STYLE_DIM];
            for (dst, bytes) in vec.iter_mut().zip(row.chunks_exact(4)) {
                *dst = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            vec
        })
        .collect();

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npy_bytes(rows: usize, fill: impl Fn(usize, usize) -> f32) -> Vec<u8> {
        let mut header =
            format!("{{'descr': '<f4', 'fortran_order': False, 'shape': ({rows}, {STYLE_DIM}), }}");
        while (10 + header.len() + 1) % 64 != 0 {
            header.push(' ');
        }
        header.push('\n');

        let mut out = b"\x93NUMPY\x01\x00".to_vec();
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        for r in 0..rows {
            for c in 0..STYLE_DIM {
                out.extend_from_slice(&fill(r, c).to_le_bytes());
            }
        }
        out
    }

    #[test]
    fn parses_rows_of_style_vectors() {
        let bytes = npy_bytes(2, |r, c| r as f32 * 1000.0 + c as f32);
        let styles = parse_npy(&bytes, "test.npy").expect("parse");
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0][5], 5.0);
        assert_eq!(styles[1][255], 1255.0);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = npy_bytes(1, |_, _| 0.0);
        bytes[1] = b'X';
        assert!(matches!(
            parse_npy(&bytes, "bad.npy"),
            Err(StyleTts2Error::StyleParse(_))
        ));
    }

    #[test]
    fn rejects_partial_vectors() {
        let mut bytes = npy_bytes(1, |_, _| 0.0);
        bytes.truncate(bytes.len() - 4);
        let err = parse_npy(&bytes, "short.npy").unwrap_err();
        assert!(err.to_string().contains("not a multiple of 256"));
    }

    #[test]
    fn style_index_is_clamped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("style.npy");
        std::fs::write(&path, npy_bytes(3, |r, _| r as f32)).expect("write");

        let store = StyleStore::load(&path).expect("load");
        assert_eq!(store.len(), 3);
        assert_eq!(store.get_style(1)[0], 1.0);
        assert_eq!(store.get_style(99)[0], 2.0);
    }
}
