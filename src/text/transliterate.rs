//! Vocalized Hebrew to lowercase Latin letters, the input alphabet of the
//! Robo-Shaul Tacotron2 checkpoint.

use super::hebrew::{contains_hebrew, read_word, Consonant, Sound, Vowel};
use super::segment::render_text;

/// Transliterate vocalized Hebrew into Latin letters.
///
/// Stress is not represented. Words without Hebrew letters pass through
/// unchanged and are left to the cleaners.
pub fn transliterate(vocalized: &str) -> String {
    render_text(vocalized, |word| {
        if contains_hebrew(word) {
            sounds_to_latin(&read_word(word))
        } else {
            word.to_string()
        }
    })
}

pub fn sounds_to_latin(sounds: &[Sound]) -> String {
    let mut out = String::with_capacity(sounds.len() * 2);
    for sound in sounds {
        match sound {
            Sound::Stress => {}
            Sound::Vowel(v) => out.push(vowel_latin(*v)),
            Sound::Consonant(c) => out.push_str(consonant_latin(*c)),
        }
    }
    out
}

fn vowel_latin(vowel: Vowel) -> char {
    match vowel {
        Vowel::A => 'a',
        Vowel::E => 'e',
        Vowel::I => 'i',
        Vowel::O => 'o',
        Vowel::U => 'u',
    }
}

fn consonant_latin(consonant: Consonant) -> &'static str {
    use Consonant::*;
    match consonant {
        B => "b",
        V => "v",
        G => "g",
        Dj => "j",
        D => "d",
        H => "h",
        Z => "z",
        Zh => "zh",
        Kh => "kh",
        T => "t",
        Y => "y",
        K => "k",
        L => "l",
        M => "m",
        N => "n",
        S => "s",
        Glottal => "'",
        P => "p",
        F => "f",
        Ts => "ts",
        Ch => "ch",
        R => "r",
        Sh => "sh",
    }
}

#[cfg(test)]
mod tests {
    use super::transliterate;
    use crate::text::hebrew::STRESS_MARK;

    #[test]
    fn transliterates_sentence() {
        assert_eq!(transliterate("שָׁלוֹם, מָה שְׁלוֹמְךָ?"), "shalom, ma shelomkha?");
    }

    #[test]
    fn drops_stress() {
        let text = format!("שָׁל{STRESS_MARK}וֹם");
        assert_eq!(transliterate(&text), "shalom");
    }

    #[test]
    fn keeps_latin_and_digits() {
        assert_eq!(transliterate("iPhone 15 חָדָשׁ"), "iPhone 15 khadash");
    }

    #[test]
    fn glottal_stop_is_an_apostrophe() {
        assert_eq!(transliterate("שְׁאֵלָה"), "she'ela");
    }
}
