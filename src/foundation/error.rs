pub type PromptResult<T> = Result<T, PromptError>;

#[derive(thiserror::Error, Debug)]
pub enum PromptError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("pacing error: {0}")]
    Pacing(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PromptError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn pacing(msg: impl Into<String>) -> Self {
        Self::Pacing(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            PromptError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(PromptError::pacing("x").to_string().contains("pacing error:"));
        assert!(
            PromptError::capture("x")
                .to_string()
                .contains("capture error:")
        );
        assert!(PromptError::encode("x").to_string().contains("encode error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = PromptError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
