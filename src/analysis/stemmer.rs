//! Light German stemmer
//!
//! Removes common inflectional suffixes in two ordered steps. Within a step
//! only the first applicable rule fires. No rule may shorten a token below the
//! configured minimum stem length.

/// Condition a suffix rule places on the char preceding the suffix
#[derive(Clone, Copy, Debug)]
enum Guard {
    None,
    /// Preceding char must be a valid s/st-ending consonant
    StEnding,
}

#[derive(Clone, Copy, Debug)]
struct SuffixRule {
    suffix: &'static str,
    guard: Guard,
}

const fn rule(suffix: &'static str) -> SuffixRule {
    SuffixRule {
        suffix,
        guard: Guard::None,
    }
}

const fn st_rule(suffix: &'static str) -> SuffixRule {
    SuffixRule {
        suffix,
        guard: Guard::StEnding,
    }
}

const STEP1: &[SuffixRule] = &[
    rule("ern"),
    rule("em"),
    rule("en"),
    rule("er"),
    rule("es"),
    rule("e"),
    st_rule("s"),
];

const STEP2: &[SuffixRule] = &[rule("est"), rule("er"), rule("en"), st_rule("st")];

fn is_st_ending(ch: char) -> bool {
    matches!(
        ch,
        'b' | 'd' | 'f' | 'g' | 'h' | 'k' | 'l' | 'm' | 'n' | 't'
    )
}

fn fold_accent(ch: char) -> char {
    match ch {
        'ä' | 'à' | 'á' | 'â' => 'a',
        'ö' | 'ò' | 'ó' | 'ô' => 'o',
        'ï' | 'ì' | 'í' | 'î' => 'i',
        'ü' | 'ù' | 'ú' | 'û' => 'u',
        _ => ch,
    }
}

/// Suffix-stripping stemmer for lowercased German tokens
#[derive(Clone, Debug)]
pub struct GermanLightStemmer {
    min_stem_length: usize,
}

impl GermanLightStemmer {
    pub fn new(min_stem_length: usize) -> Self {
        Self { min_stem_length }
    }

    pub fn min_stem_length(&self) -> usize {
        self.min_stem_length
    }

    pub fn stem(&self, token: &str) -> String {
        let mut chars: Vec<char> = token.chars().map(fold_accent).collect();
        self.apply_step(&mut chars, STEP1);
        self.apply_step(&mut chars, STEP2);
        chars.into_iter().collect()
    }

    fn apply_step(&self, chars: &mut Vec<char>, rules: &[SuffixRule]) {
        for rule in rules {
            let suffix_len = rule.suffix.chars().count();
            if chars.len() < self.min_stem_length + suffix_len {
                continue;
            }
            let stem_len = chars.len() - suffix_len;
            if !chars[stem_len..].iter().copied().eq(rule.suffix.chars()) {
                continue;
            }
            let guard_ok = match rule.guard {
                Guard::None => true,
                Guard::StEnding => stem_len > 0 && is_st_ending(chars[stem_len - 1]),
            };
            if guard_ok {
                chars.truncate(stem_len);
                return;
            }
        }
    }
}

impl Default for GermanLightStemmer {
    fn default() -> Self {
        Self::new(3)
    }
}
