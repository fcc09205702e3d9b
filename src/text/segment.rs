use super::hebrew::{is_letter, is_mark, GERSHAYIM, MAQAF};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TextPart {
    Text(String),
    Punct(char),
}

/// Split text into word runs and boundary punctuation.
///
/// Whitespace (and maqaf) is collapsed to single spaces; a `.` or `,`
/// between two digits stays inside the text run. Gershayim between two
/// Hebrew letters (acronyms such as צה״ל) is dropped and the word kept whole.
pub(crate) fn split_text_parts(text: &str) -> Vec<TextPart> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for (idx, ch) in text.char_indices() {
        let ch_len = ch.len_utf8();
        if is_acronym_mark(text, idx, ch_len, ch) {
            continue;
        }
        if let Some(punct) = map_boundary_punctuation(ch) {
            if !is_numeric_connector_between_digits(text, idx, ch_len, ch) {
                flush_text_part(&mut parts, &mut current);
                parts.push(TextPart::Punct(punct));
                continue;
            }
        }

        if ch.is_whitespace() || ch == MAQAF {
            if !current.is_empty() && !current.ends_with(' ') {
                current.push(' ');
            }
            continue;
        }

        current.push(ch);
    }

    flush_text_part(&mut parts, &mut current);
    parts
}

/// Render every word with `render_word` and stitch the result back together
/// with the punctuation in place.
pub(crate) fn render_text(text: &str, mut render_word: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut glue_next = false;

    for part in split_text_parts(text) {
        match part {
            TextPart::Text(run) => {
                for word in run.split(' ') {
                    let rendered = render_word(word);
                    if rendered.is_empty() {
                        continue;
                    }
                    if !out.is_empty() && !glue_next {
                        out.push(' ');
                    }
                    out.push_str(&rendered);
                    glue_next = false;
                }
            }
            TextPart::Punct(ch) if is_opening(ch) => {
                if !out.is_empty() && !glue_next {
                    out.push(' ');
                }
                out.push(ch);
                glue_next = true;
            }
            TextPart::Punct(ch) => {
                out.push(ch);
                glue_next = false;
            }
        }
    }

    out
}

fn flush_text_part(parts: &mut Vec<TextPart>, current: &mut String) {
    let trimmed = current.trim();
    if trimmed.is_empty() {
        current.clear();
        return;
    }
    parts.push(TextPart::Text(trimmed.to_string()));
    current.clear();
}

fn map_boundary_punctuation(ch: char) -> Option<char> {
    match ch {
        '.' | '!' | '?' | ',' | ';' | ':' | '—' | '…' | '"' | '(' | ')' | '\u{201c}'
        | '\u{201d}' => Some(ch),
        GERSHAYIM => Some('"'),
        '\n' | '\r' => Some('.'),
        _ => None,
    }
}

fn is_opening(ch: char) -> bool {
    matches!(ch, '(' | '\u{201c}')
}

fn is_numeric_connector_between_digits(text: &str, idx: usize, ch_len: usize, ch: char) -> bool {
    if !matches!(ch, '.' | ',') {
        return false;
    }

    let prev = text[..idx].chars().next_back();
    let next = text[idx + ch_len..].chars().next();

    matches!(
        (prev, next),
        (Some(left), Some(right)) if left.is_ascii_digit() && right.is_ascii_digit()
    )
}

fn is_acronym_mark(text: &str, idx: usize, ch_len: usize, ch: char) -> bool {
    if !matches!(ch, '"' | GERSHAYIM) {
        return false;
    }

    let prev = text[..idx].chars().rev().find(|&c| !is_mark(c));
    let next = text[idx + ch_len..].chars().next();

    matches!(
        (prev, next),
        (Some(left), Some(right)) if is_letter(left) && is_letter(right)
    )
}
