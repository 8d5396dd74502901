use crate::foundation::error::PromptResult;

/// Optional script rewriting step applied before a session loads text.
///
/// Implementations may call out to external services; the session treats
/// them as best-effort through [`enhance_or_keep`].
pub trait ScriptEnhancer {
    fn enhance(&self, script: &str) -> PromptResult<String>;
}

/// Enhancer that returns the script unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEnhancer;

impl ScriptEnhancer for NoopEnhancer {
    fn enhance(&self, script: &str) -> PromptResult<String> {
        Ok(script.to_string())
    }
}

/// Run the enhancer, keeping the original script when it fails or returns
/// an empty result. Enhancement is a convenience, never a gate: a broken
/// enhancer must not block prompting.
pub fn enhance_or_keep(enhancer: &dyn ScriptEnhancer, script: &str) -> String {
    match enhancer.enhance(script) {
        Ok(enhanced) if !enhanced.trim().is_empty() => enhanced,
        Ok(_) => {
            tracing::warn!("script enhancer returned empty output; keeping original");
            script.to_string()
        }
        Err(err) => {
            tracing::warn!(error = %err, "script enhancement failed; keeping original");
            script.to_string()
        }
    }
}
