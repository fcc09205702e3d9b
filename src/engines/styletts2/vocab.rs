use std::collections::HashMap;
use std::path::Path;

use super::model::StyleTts2Error;

const PAD: &str = "$";
const PUNCTUATION: &str = ";:,.!?¡¿—…\"«»“” ";
const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const LETTERS_IPA: &str = "ɑɐɒæɓʙβɔɕçɗɖðʤəɘɚɛɜɝɞɟʄɡɠɢʛɦɧħɥʜɨɪʝɭɬɫɮʟɱɯɰŋɳɲɴøɵɸθœɶʘɹɺɾɻʀʁɽʂʃʈʧʉʊʋⱱʌɣɤʍχʎʏʑʐʒʔʡʕʢǀǁǂǃˈˌːˑʼʴʰʱʲʷˠˤ˞↓↑→↗↘'\u{0329}'ᵻ";

/// Load a vocabulary override from a config.json file.
///
/// The config.json must contain a `"vocab"` field mapping single-character
/// strings to integer token IDs.
pub fn load_vocab(config_path: &Path) -> Result<HashMap<char, i64>, StyleTts2Error> {
    let content = std::fs::read_to_string(config_path)?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| StyleTts2Error::Config(format!("Failed to parse JSON: {e}")))?;

    let vocab_obj = json
        .get("vocab")
        .ok_or_else(|| StyleTts2Error::Config("Missing 'vocab' field".to_string()))?
        .as_object()
        .ok_or_else(|| StyleTts2Error::Config("'vocab' must be an object".to_string()))?;

    let mut map = HashMap::new();
    for (k, v) in vocab_obj {
        let ch = k
            .chars()
            .next()
            .ok_or_else(|| StyleTts2Error::Config(format!("Empty key in vocab: {k:?}")))?;
        let id = v
            .as_i64()
            .ok_or_else(|| StyleTts2Error::Config(format!("Non-integer vocab value for key {k:?}")))?;
        map.insert(ch, id);
    }

    Ok(map)
}

/// The StyleTTS2 symbol table: pad, punctuation, ASCII letters, IPA letters.
///
/// A symbol listed twice keeps its later id.
pub fn default_vocab() -> HashMap<char, i64> {
    let mut map = HashMap::new();
    for (id, ch) in PAD
        .chars()
        .chain(PUNCTUATION.chars())
        .chain(LETTERS.chars())
        .chain(LETTERS_IPA.chars())
        .enumerate()
    {
        map.insert(ch, id as i64);
    }
    map
}

/// Map phonemes to token ids. Characters outside the vocab are dropped.
pub fn tokenize(phonemes: &str, vocab: &HashMap<char, i64>) -> Vec<i64> {
    phonemes
        .chars()
        .filter_map(|ch| vocab.get(&ch).copied())
        .collect()
}
