/// Query normalization for titles written in Hangul.
///
/// Korean queries are romanized with a fixed Revised Romanization table so they can be
/// fuzzy-matched against Latin page titles. Characters outside the Hangul syllable block
/// pass through unchanged.

const HANGUL_FIRST: u32 = 0xAC00;
const HANGUL_LAST: u32 = 0xD7A3;
const MEDIALS_PER_INITIAL: u32 = 21 * 28;
const FINALS_PER_MEDIAL: u32 = 28;

const INITIALS: [&str; 19] = [
    "g", "kk", "n", "d", "tt", "l", "m", "b", "pp", "s", "ss", "", "j", "jj", "ch", "k", "t",
    "p", "h",
];

const MEDIALS: [&str; 21] = [
    "a", "ae", "ya", "yae", "eo", "e", "yeo", "ye", "o", "wa", "wae", "oe", "yo", "u", "wo",
    "we", "wi", "yu", "eu", "ui", "i",
];

const FINALS: [&str; 28] = [
    "", "g", "kk", "gs", "n", "nj", "nh", "d", "l", "lg", "lm", "lb", "ls", "lt", "lp", "lh",
    "m", "b", "bs", "s", "ss", "ng", "j", "ch", "k", "t", "p", "h",
];

/// Jamo indices of a precomposed syllable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Syllable {
    initial: usize,
    medial: usize,
    final_: usize,
}

impl Syllable {
    fn decompose(c: char) -> Option<Self> {
        let code = c as u32;
        if !(HANGUL_FIRST..=HANGUL_LAST).contains(&code) {
            return None;
        }
        let offset = code - HANGUL_FIRST;
        Some(Self {
            initial: (offset / MEDIALS_PER_INITIAL) as usize,
            medial: ((offset % MEDIALS_PER_INITIAL) / FINALS_PER_MEDIAL) as usize,
            final_: (offset % FINALS_PER_MEDIAL) as usize,
        })
    }
}

fn is_hangul_syllable(c: char) -> bool {
    (HANGUL_FIRST..=HANGUL_LAST).contains(&(c as u32))
}

/// Returns `true` iff `text` contains at least one Hangul syllable.
pub fn is_non_latin_script(text: Option<&str>) -> bool {
    match text {
        Some(text) => text.chars().any(is_hangul_syllable),
        None => false,
    }
}

/// Romanize every Hangul syllable in `text`.
///
/// A `-` separates two syllables when the previous final followed by the next initial
/// could be read back as a different final/initial split (`` + `kk` vs `k` + `k`).
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut previous: Option<Syllable> = None;

    for c in text.chars() {
        let Some(syllable) = Syllable::decompose(c) else {
            out.push(c);
            previous = None;
            continue;
        };

        if let Some(prev) = previous {
            let joint = format!("{}{}", FINALS[prev.final_], INITIALS[syllable.initial]);
            if is_ambiguous_joint(&joint) {
                out.push('-');
            }
        }

        out.push_str(INITIALS[syllable.initial]);
        out.push_str(MEDIALS[syllable.medial]);
        out.push_str(FINALS[syllable.final_]);
        previous = Some(syllable);
    }

    out
}

/// Lower-cased romanization for Hangul queries; anything else is returned as-is.
pub fn normalize_query(query: &str) -> String {
    if is_non_latin_script(Some(query)) {
        transliterate(query).to_lowercase()
    } else {
        query.to_string()
    }
}

fn is_ambiguous_joint(joint: &str) -> bool {
    let splits = (0..joint.len())
        .filter(|&i| joint.is_char_boundary(i))
        .filter(|&i| FINALS.contains(&&joint[..i]) && INITIALS.contains(&&joint[i..]))
        .count();
    splits > 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_hangul() {
        assert!(is_non_latin_script(Some("피기뱀")));
        assert!(is_non_latin_script(Some("page 안녕")));
        assert!(!is_non_latin_script(Some("Piggy Bam Ahoy")));
        assert!(!is_non_latin_script(Some("")));
        assert!(!is_non_latin_script(None));
        // Compatibility jamo sit outside the syllable block.
        assert!(!is_non_latin_script(Some("ㅎㅎ")));
    }

    #[test]
    fn romanizes_single_syllables() {
        assert_eq!(transliterate("가"), "ga");
        assert_eq!(transliterate("뱀"), "baem");
        assert_eq!(transliterate("힣"), "hih");
        assert_eq!(transliterate("쌍"), "ssang");
    }

    #[test]
    fn romanizes_words() {
        assert_eq!(transliterate("안녕"), "annyeong");
        assert_eq!(transliterate("피기"), "pigi");
        assert_eq!(transliterate("서울"), "seoul");
    }

    #[test]
    fn marks_ambiguous_syllable_boundaries() {
        assert_eq!(transliterate("아까"), "a-kka");
        assert_eq!(transliterate("이따"), "i-tta");
        assert_eq!(transliterate("옷소"), "os-so");
    }

    #[test]
    fn unambiguous_boundaries_stay_joined() {
        assert_eq!(transliterate("한국"), "hangug");
        assert_eq!(transliterate("국어"), "gugeo");
        assert_eq!(transliterate("빙고"), "binggo");
    }

    #[test]
    fn passes_through_other_characters() {
        assert_eq!(transliterate("abc 123!"), "abc 123!");
        assert_eq!(transliterate("뱀 Ahoy"), "baem Ahoy");
    }

    #[test]
    fn transliteration_is_deterministic() {
        let input = "피기 뱀 아호이";
        assert_eq!(transliterate(input), "pigi baem ahoi");
        assert_eq!(transliterate(input), transliterate(input));
    }

    #[test]
    fn normalize_lowercases_only_hangul_queries() {
        assert_eq!(normalize_query("뱀 Ahoy"), "baem ahoy");
        assert_eq!(normalize_query("Piggy Bam"), "Piggy Bam");
    }
}
