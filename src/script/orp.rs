use crate::script::tokenize::Token;

/// Optimal Recognition Point index for a word, in characters.
///
/// Short words focus just left of center; longer words pin the focus to a
/// fixed early position so the eye never travels far.
pub fn focus_index(word: &str) -> usize {
    let len = word.chars().count();
    match len {
        0 | 1 => 0,
        2..=5 => (len - 1) / 2,
        6..=9 => 2,
        _ => 3,
    }
}

/// A word split around its focus character.
///
/// Invariant: `before + focus + after` reassembles the word exactly, and
/// `focus` is a single character whenever the word is non-empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FocusSplit {
    pub before: String,
    pub focus: String,
    pub after: String,
}

impl FocusSplit {
    /// Split `word` at its ORP. Character-boundary safe for any UTF-8
    /// input; an empty word yields three empty parts.
    pub fn of_word(word: &str) -> Self {
        let index = focus_index(word);

        let mut before = String::new();
        let mut focus = String::new();
        let mut after = String::new();
        for (i, ch) in word.chars().enumerate() {
            if i < index {
                before.push(ch);
            } else if i == index {
                focus.push(ch);
            } else {
                after.push(ch);
            }
        }

        Self {
            before,
            focus,
            after,
        }
    }

    pub fn of(token: &Token) -> Self {
        Self::of_word(token.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_index_policy_table() {
        assert_eq!(focus_index(""), 0);
        assert_eq!(focus_index("a"), 0);
        assert_eq!(focus_index("ab"), 0);
        assert_eq!(focus_index("abc"), 1);
        assert_eq!(focus_index("abcd"), 1);
        assert_eq!(focus_index("abcde"), 2);
        assert_eq!(focus_index("abcdef"), 2);
        assert_eq!(focus_index("abcdefghi"), 2);
        assert_eq!(focus_index("abcdefghij"), 3);
        assert_eq!(focus_index("abcdefghijklmnop"), 3);
    }

    #[test]
    fn split_reassembles_exactly() {
        for word in ["a", "ab", "abc", "palavra", "inteligência", "margem."] {
            let s = FocusSplit::of_word(word);
            assert_eq!(format!("{}{}{}", s.before, s.focus, s.after), word);
            assert_eq!(s.focus.chars().count(), 1, "word {word:?}");
        }
    }

    #[test]
    fn split_is_char_based_not_byte_based() {
        // 5 chars, focus index 2 lands on the accented char.
        let s = FocusSplit::of_word("açaís");
        assert_eq!(s.before, "aç");
        assert_eq!(s.focus, "a");
        assert_eq!(s.after, "ís");
    }

    #[test]
    fn empty_word_yields_empty_parts() {
        let s = FocusSplit::of_word("");
        assert!(s.before.is_empty() && s.focus.is_empty() && s.after.is_empty());
    }
}
