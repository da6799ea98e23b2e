//! German character normalization
//!
//! Folds umlauts (`ä` → `a`, `ö` → `o`, `ü` → `u`), expands `ß` to `ss` and
//! collapses the transliterated digraphs `ae`, `oe` and `ue`, so that
//! "Müller", "Mueller" and "Muller" all normalize to the same term.

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    /// Previous char was not a vowel of interest
    Neutral,
    /// Previous char was part of a longer vowel sequence; a following `e` is kept
    Vowel,
    /// Previous char was `a`, `o` or a leading `u`; a following `e` is dropped
    Umlaut,
}

/// Normalize a lowercased token using German substitution rules
pub fn normalize_german(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut state = State::Neutral;

    for ch in token.chars() {
        match ch {
            'a' | 'o' => {
                out.push(ch);
                state = State::Umlaut;
            }
            'u' => {
                out.push(ch);
                state = if state == State::Neutral {
                    State::Umlaut
                } else {
                    State::Vowel
                };
            }
            'e' => {
                if state != State::Umlaut {
                    out.push(ch);
                }
                state = State::Vowel;
            }
            'i' | 'q' | 'y' => {
                out.push(ch);
                state = State::Vowel;
            }
            'ä' => {
                out.push('a');
                state = State::Vowel;
            }
            'ö' => {
                out.push('o');
                state = State::Vowel;
            }
            'ü' => {
                out.push('u');
                state = State::Vowel;
            }
            'ß' => {
                out.push_str("ss");
                state = State::Neutral;
            }
            _ => {
                out.push(ch);
                state = State::Neutral;
            }
        }
    }

    out
}
