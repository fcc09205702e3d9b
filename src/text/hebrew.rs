//! Reading rules for vocalized (pointed) Hebrew.
//!
//! A word is parsed into [`Letter`]s (base letter plus its points) and then
//! resolved into [`Sound`]s. Besides standard niqqud, the marks emitted by
//! the Phonikud diacritizer are understood: [`STRESS_MARK`] before the
//! stressed syllable, [`VOCAL_SHVA_MARK`] on a pronounced shva, and
//! [`PREFIX_MARK`] between a prefix and its stem.

pub const SHVA: char = '\u{05B0}';
pub const HATAF_SEGOL: char = '\u{05B1}';
pub const HATAF_PATAH: char = '\u{05B2}';
pub const HATAF_QAMATS: char = '\u{05B3}';
pub const HIRIQ: char = '\u{05B4}';
pub const TSERE: char = '\u{05B5}';
pub const SEGOL: char = '\u{05B6}';
pub const PATAH: char = '\u{05B7}';
pub const QAMATS: char = '\u{05B8}';
pub const HOLAM: char = '\u{05B9}';
pub const HOLAM_HASER_FOR_VAV: char = '\u{05BA}';
pub const QUBUTS: char = '\u{05BB}';
pub const DAGESH: char = '\u{05BC}';
pub const METEG: char = '\u{05BD}';
pub const MAQAF: char = '\u{05BE}';
pub const RAFE: char = '\u{05BF}';
pub const SHIN_DOT: char = '\u{05C1}';
pub const SIN_DOT: char = '\u{05C2}';
pub const QAMATS_QATAN: char = '\u{05C7}';
pub const GERESH: char = '\u{05F3}';
pub const GERSHAYIM: char = '\u{05F4}';

/// Hebrew accent "ole", used by Phonikud to mark the stressed syllable.
pub const STRESS_MARK: char = '\u{05AB}';
/// Meteg, used by Phonikud to mark a vocal shva.
pub const VOCAL_SHVA_MARK: char = METEG;
/// Boundary between a prefix (ו, ה, ב, ל, מ, ש, כ) and its stem.
pub const PREFIX_MARK: char = '|';

pub fn is_letter(ch: char) -> bool {
    ('\u{05D0}'..='\u{05EA}').contains(&ch)
}

/// Combining points and accents that attach to the preceding letter.
pub fn is_mark(ch: char) -> bool {
    matches!(ch, '\u{0591}'..='\u{05BD}' | '\u{05BF}' | '\u{05C1}' | '\u{05C2}' | '\u{05C4}' | '\u{05C5}' | '\u{05C7}')
}

pub fn contains_hebrew(text: &str) -> bool {
    text.chars().any(is_letter)
}

/// Remove every point, accent and prefix mark, leaving bare letters.
pub fn strip_diacritics(text: &str) -> String {
    text.chars()
        .filter(|&ch| !is_mark(ch) && ch != PREFIX_MARK)
        .collect()
}

/// Vowel points, before resolving them to a [`Vowel`] sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Point {
    Shva,
    HatafSegol,
    HatafPatah,
    HatafQamats,
    Hiriq,
    Tsere,
    Segol,
    Patah,
    Qamats,
    QamatsQatan,
    Holam,
    Qubuts,
}

impl Point {
    fn from_char(ch: char) -> Option<Self> {
        Some(match ch {
            SHVA => Self::Shva,
            HATAF_SEGOL => Self::HatafSegol,
            HATAF_PATAH => Self::HatafPatah,
            HATAF_QAMATS => Self::HatafQamats,
            HIRIQ => Self::Hiriq,
            TSERE => Self::Tsere,
            SEGOL => Self::Segol,
            PATAH => Self::Patah,
            QAMATS => Self::Qamats,
            QAMATS_QATAN => Self::QamatsQatan,
            HOLAM | HOLAM_HASER_FOR_VAV => Self::Holam,
            QUBUTS => Self::Qubuts,
            _ => return None,
        })
    }

    /// The vowel this point is read as; `None` for a plain shva.
    pub fn vowel(self) -> Option<Vowel> {
        match self {
            Self::Shva => None,
            Self::HatafPatah | Self::Patah | Self::Qamats => Some(Vowel::A),
            Self::HatafSegol | Self::Segol | Self::Tsere => Some(Vowel::E),
            Self::Hiriq => Some(Vowel::I),
            Self::HatafQamats | Self::QamatsQatan | Self::Holam => Some(Vowel::O),
            Self::Qubuts => Some(Vowel::U),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vowel {
    A,
    E,
    I,
    O,
    U,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consonant {
    B,
    V,
    G,
    /// ג׳
    Dj,
    D,
    H,
    Z,
    /// ז׳
    Zh,
    /// ח, and כ without dagesh
    Kh,
    T,
    Y,
    K,
    L,
    M,
    N,
    S,
    /// א / ע between vowels
    Glottal,
    P,
    F,
    Ts,
    /// צ׳
    Ch,
    R,
    Sh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Consonant(Consonant),
    Vowel(Vowel),
    /// Primary stress on the syllable that follows.
    Stress,
}

/// A base letter with the marks attached to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Letter {
    pub base: char,
    pub point: Option<Point>,
    pub dagesh: bool,
    pub shin_dot: bool,
    pub sin_dot: bool,
    pub geresh: bool,
    pub stress: bool,
    pub vocal_shva: bool,
}

impl Letter {
    fn new(base: char) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    fn apply(&mut self, mark: char) {
        match mark {
            DAGESH => self.dagesh = true,
            SHIN_DOT => self.shin_dot = true,
            SIN_DOT => self.sin_dot = true,
            STRESS_MARK => self.stress = true,
            VOCAL_SHVA_MARK => self.vocal_shva = true,
            other => {
                if let Some(point) = Point::from_char(other) {
                    // Holam next to another vowel on the same letter is a
                    // holam male carrier mark; keep the full vowel.
                    if self.point.is_none() || point != Point::Holam {
                        self.point = Some(point);
                    }
                }
            }
        }
    }

    fn is_bare(&self) -> bool {
        self.point.is_none() && !self.dagesh
    }

    fn vowel(&self) -> Option<Vowel> {
        self.point.and_then(Point::vowel)
    }
}

/// Split a word into letters with their marks. Non-Hebrew characters are
/// skipped; a geresh after a letter is recorded on it.
pub fn parse_letters(word: &str) -> Vec<Letter> {
    let mut letters: Vec<Letter> = Vec::new();
    for ch in word.chars() {
        if is_letter(ch) {
            letters.push(Letter::new(ch));
        } else if let Some(last) = letters.last_mut() {
            if is_mark(ch) {
                last.apply(ch);
            } else if matches!(ch, GERESH | '\'' | '\u{2019}') {
                last.geresh = true;
            }
        }
    }
    letters
}

/// Resolve a single vocalized word into sounds.
pub fn read_word(word: &str) -> Vec<Sound> {
    let letters = parse_letters(word);
    let mut sounds = Vec::with_capacity(letters.len() * 2);

    for (i, letter) in letters.iter().enumerate() {
        let first = i == 0;
        let last = i + 1 == letters.len();
        let prev = if first { None } else { letters.get(i - 1) };

        if letter.stress {
            sounds.push(Sound::Stress);
        }

        // Vav as a vowel carrier: holam male and shuruk.
        if letter.base == 'ו' && !first {
            let prev_has_vowel = prev.is_some_and(|p| p.vowel().is_some());
            if letter.point == Some(Point::Holam) && !letter.dagesh && !prev_has_vowel {
                sounds.push(Sound::Vowel(Vowel::O));
                continue;
            }
            if letter.dagesh && letter.point.is_none() && !prev_has_vowel {
                sounds.push(Sound::Vowel(Vowel::U));
                continue;
            }
            if letter.is_bare() && prev.is_some_and(|p| matches!(p.vowel(), Some(Vowel::O | Vowel::U))) {
                continue;
            }
        }
        if letter.base == 'ו' && first && letter.dagesh && letter.point.is_none() {
            sounds.push(Sound::Vowel(Vowel::U));
            continue;
        }

        let consonant = consonant_of(letter, first, last, prev);

        // Furtive patah: the vowel is read before a final guttural.
        let furtive = last
            && letter.point == Some(Point::Patah)
            && matches!(letter.base, 'ח' | 'ע')
            || (last && letter.base == 'ה' && letter.dagesh && letter.point == Some(Point::Patah));
        if furtive {
            sounds.push(Sound::Vowel(Vowel::A));
            // a final ayin is silent after its furtive patah
            if let Some(c) = consonant.filter(|_| letter.base != 'ע') {
                sounds.push(Sound::Consonant(c));
            }
            continue;
        }

        if let Some(c) = consonant {
            sounds.push(Sound::Consonant(c));
        }

        match letter.point {
            Some(Point::Shva) => {
                if letter.vocal_shva || (first && !last) {
                    sounds.push(Sound::Vowel(Vowel::E));
                }
            }
            Some(point) => {
                if let Some(v) = point.vowel() {
                    sounds.push(Sound::Vowel(v));
                }
            }
            None => {}
        }
    }

    // Stress marks with nothing after them carry no information.
    while sounds.last() == Some(&Sound::Stress) {
        sounds.pop();
    }
    sounds
}

fn consonant_of(letter: &Letter, first: bool, last: bool, prev: Option<&Letter>) -> Option<Consonant> {
    use Consonant::*;
    let c = match letter.base {
        'א' | 'ע' => {
            // Silent at the start of a word and as a mater; a glottal stop
            // only when it carries its own vowel mid-word.
            if first || letter.vowel().is_none() {
                return None;
            }
            Glottal
        }
        'ב' => {
            if letter.dagesh {
                B
            } else {
                V
            }
        }
        'ג' => {
            if letter.geresh {
                Dj
            } else {
                G
            }
        }
        'ד' => D,
        'ה' => {
            if last && !letter.dagesh && letter.point.is_none() {
                return None;
            }
            H
        }
        'ו' => V,
        'ז' => {
            if letter.geresh {
                Zh
            } else {
                Z
            }
        }
        'ח' => Kh,
        'ט' | 'ת' => T,
        'י' => {
            let after_front_vowel = prev.is_some_and(|p| matches!(p.vowel(), Some(Vowel::I | Vowel::E)));
            if letter.is_bare() && !first && after_front_vowel {
                return None;
            }
            Y
        }
        'כ' | 'ך' => {
            if letter.dagesh {
                K
            } else {
                Kh
            }
        }
        'ל' => L,
        'מ' | 'ם' => M,
        'נ' | 'ן' => N,
        'ס' => S,
        'פ' | 'ף' => {
            if letter.dagesh {
                P
            } else {
                F
            }
        }
        'צ' | 'ץ' => {
            if letter.geresh {
                Ch
            } else {
                Ts
            }
        }
        'ק' => K,
        'ר' => R,
        'ש' => {
            if letter.sin_dot {
                S
            } else {
                Sh
            }
        }
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::Consonant::*;
    use super::Sound::{Consonant as C, Stress, Vowel as V};
    use super::Vowel::*;
    use super::*;

    #[test]
    fn strips_points_and_prefix_marks() {
        assert_eq!(strip_diacritics("שָׁלוֹם"), "שלום");
        let marked = format!("וְ|הַ|בַּ{STRESS_MARK}יִת");
        assert_eq!(strip_diacritics(&marked), "והבית");
        assert_eq!(strip_diacritics("abc, 12"), "abc, 12");
    }

    #[test]
    fn parses_marks_onto_letters() {
        let letters = parse_letters("שָׁ");
        assert_eq!(letters.len(), 1);
        assert!(letters[0].shin_dot);
        assert_eq!(letters[0].point, Some(Point::Qamats));

        let letters = parse_letters("ג׳");
        assert!(letters[0].geresh);
    }

    #[test]
    fn reads_shalom_with_holam_male() {
        assert_eq!(
            read_word("שָׁלוֹם"),
            vec![C(Sh), V(A), C(L), V(O), C(M)]
        );
    }

    #[test]
    fn begadkefat_follow_dagesh() {
        assert_eq!(read_word("בַּ"), vec![C(B), V(A)]);
        assert_eq!(read_word("בַ"), vec![C(Consonant::V), V(A)]);
        assert_eq!(read_word("כֶּלֶב"), vec![C(K), V(E), C(L), V(E), C(Consonant::V)]);
        assert_eq!(read_word("פֹּה"), vec![C(P), V(O)]);
    }

    #[test]
    fn shuruk_and_conjunction_vav() {
        assert_eq!(read_word("הוּא"), vec![C(H), V(U)]);
        assert_eq!(read_word("וּ"), vec![V(U)]);
    }

    #[test]
    fn mater_yod_after_hiriq_is_silent() {
        assert_eq!(read_word("שִׁיר"), vec![C(Sh), V(I), C(R)]);
    }

    #[test]
    fn final_he_is_silent_without_mappiq() {
        assert_eq!(read_word("תּוֹדָה"), vec![C(T), V(O), C(D), V(A)]);
        assert_eq!(read_word("לָהּ"), vec![C(L), V(A), C(H)]);
    }

    #[test]
    fn furtive_patah_precedes_guttural() {
        assert_eq!(read_word("רוּחַ"), vec![C(R), V(U), V(A), C(Kh)]);
        assert_eq!(read_word("שָׁבוּעַ"), vec![C(Sh), V(A), C(Consonant::V), V(U), V(A)]);
    }

    #[test]
    fn initial_shva_is_read() {
        assert_eq!(read_word("בְּלִי"), vec![C(B), V(E), C(L), V(I)]);
    }

    #[test]
    fn shva_is_read_only_when_vocal() {
        // medial silent shva
        assert_eq!(read_word("מִדְבָּר"), vec![C(M), V(I), C(D), C(B), V(A), C(R)]);
        // marked vocal shva
        let vocal = format!("הַמ{SHVA}{VOCAL_SHVA_MARK}לָ");
        assert_eq!(read_word(&vocal), vec![C(H), V(A), C(M), V(E), C(L), V(A)]);
    }

    #[test]
    fn stress_mark_precedes_syllable() {
        let word = format!("שָׁל{STRESS_MARK}וֹם");
        assert_eq!(
            read_word(&word),
            vec![C(Sh), V(A), Stress, C(L), V(O), C(M)]
        );
        let word = format!("שָׁ{STRESS_MARK}");
        assert_eq!(read_word(&word), vec![Stress, C(Sh), V(A)]);
    }

    #[test]
    fn sin_dot_and_geresh_variants() {
        assert_eq!(read_word("שׂ"), vec![C(S)]);
        assert_eq!(read_word("ג׳"), vec![C(Dj)]);
        assert_eq!(read_word("צ'"), vec![C(Ch)]);
    }

    #[test]
    fn initial_aleph_is_silent_medial_is_glottal() {
        assert_eq!(read_word("אַבָּא"), vec![V(A), C(B), V(A)]);
        assert_eq!(read_word("שְׁאֵ"), vec![C(Sh), V(E), C(Glottal), V(E)]);
    }
}
