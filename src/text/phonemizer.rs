//! Vocalized Hebrew to IPA, in the phoneme inventory the Hebrew StyleTTS2
//! model was trained on.

use super::hebrew::{contains_hebrew, read_word, Consonant, Sound, Vowel};
use super::segment::render_text;

/// Primary stress marker placed before the stressed syllable.
pub const STRESS: char = 'ˈ';

/// Convert vocalized Hebrew text to an IPA phoneme string.
///
/// Punctuation is kept in place. Words without Hebrew letters pass through
/// lowercased, so Latin acronyms and digits reach the model's vocabulary
/// filter unchanged.
pub fn phonemize(vocalized: &str) -> String {
    render_text(vocalized, |word| {
        if contains_hebrew(word) {
            sounds_to_ipa(&read_word(word))
        } else {
            word.to_lowercase()
        }
    })
}

pub fn sounds_to_ipa(sounds: &[Sound]) -> String {
    let mut out = String::with_capacity(sounds.len() * 2);
    for sound in sounds {
        match sound {
            Sound::Stress => out.push(STRESS),
            Sound::Vowel(v) => out.push(vowel_ipa(*v)),
            Sound::Consonant(c) => out.push_str(consonant_ipa(*c)),
        }
    }
    out
}

fn vowel_ipa(vowel: Vowel) -> char {
    match vowel {
        Vowel::A => 'a',
        Vowel::E => 'e',
        Vowel::I => 'i',
        Vowel::O => 'o',
        Vowel::U => 'u',
    }
}

fn consonant_ipa(consonant: Consonant) -> &'static str {
    use Consonant::*;
    match consonant {
        B => "b",
        V => "v",
        G => "g",
        Dj => "dʒ",
        D => "d",
        H => "h",
        Z => "z",
        Zh => "ʒ",
        Kh => "χ",
        T => "t",
        Y => "j",
        K => "k",
        L => "l",
        M => "m",
        N => "n",
        S => "s",
        Glottal => "ʔ",
        P => "p",
        F => "f",
        Ts => "ts",
        Ch => "tʃ",
        R => "ʁ",
        Sh => "ʃ",
    }
}
