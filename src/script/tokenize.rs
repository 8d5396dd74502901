/// A single whitespace-delimited word of the script, the atomic unit of
/// pacing. Only [`tokenize`] constructs these; a token is never empty and
/// never contains whitespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Character count (not byte length).
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Last character, used for punctuation-aware pacing delays.
    pub fn trailing_char(&self) -> Option<char> {
        self.0.chars().next_back()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split a raw script into reading-order tokens.
///
/// Splits on runs of Unicode whitespace (including newlines) and drops
/// empty results. Pure and deterministic; an empty or whitespace-only
/// script yields an empty sequence.
pub fn tokenize(script: &str) -> Vec<Token> {
    script
        .split_whitespace()
        .map(|w| Token(w.to_string()))
        .collect()
}
