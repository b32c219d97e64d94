use rustc_hash::FxHashMap;

use crate::cancellation::CancellationToken;

/// Message templates keyed by a stable template id (§6 "LocalizationTemplates").
///
/// Out of scope per spec.md §1 ("Localization of error messages"); this is
/// the minimal real implementation behind that collaborator's interface —
/// a lookup table, not a localization engine.
#[derive(Debug, Clone)]
pub struct LocalizationTemplates {
    templates: FxHashMap<&'static str, String>,
}

impl LocalizationTemplates {
    pub fn new(templates: FxHashMap<&'static str, String>) -> Self {
        Self { templates }
    }

    pub fn get(&self, template_id: &str) -> Option<&str> {
        self.templates.get(template_id).map(String::as_str)
    }

    /// The handful of message templates the §7 error variants need,
    /// in `en-US`.
    pub fn default_templates() -> Self {
        let mut templates = FxHashMap::default();
        templates.insert("expectedTokenKind", "expected a different token kind".to_string());
        templates.insert("expectedAnyTokenKind", "expected one of several token kinds".to_string());
        templates.insert("expectedCsvContinuation", "unexpected comma".to_string());
        templates.insert("unusedTokensRemain", "unexpected trailing input".to_string());
        templates.insert("unterminatedParentheses", "unterminated parentheses".to_string());
        templates.insert("unterminatedBracket", "unterminated bracket".to_string());
        templates.insert("invalidPrimitiveType", "not a valid primitive type".to_string());
        templates.insert(
            "requiredParameterAfterOptionalParameter",
            "a required parameter cannot follow an optional parameter".to_string(),
        );
        Self::new(templates)
    }
}

impl Default for LocalizationTemplates {
    fn default() -> Self {
        Self::default_templates()
    }
}

/// The single configuration surface consumed by the parser (§6 "Settings").
///
/// `cancellation_token` is boxed/type-erased since embedders supply
/// whichever cancellation mechanism fits their host (a `tokio`
/// `CancellationToken`, an editor's request-lifecycle flag, ...); the
/// parser only ever calls `check()`.
pub struct Settings {
    pub locale: String,
    pub cancellation_token: Option<Box<dyn CancellationToken>>,
    pub localization_templates: LocalizationTemplates,
}

impl Settings {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            cancellation_token: None,
            localization_templates: LocalizationTemplates::default_templates(),
        }
    }

    pub fn with_cancellation_token(mut self, token: Box<dyn CancellationToken>) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Poll the cancellation token, if any. A `Settings` with no token
    /// configured never cancels.
    pub fn check_cancellation(&self) -> Result<(), crate::error::CommonError> {
        match &self.cancellation_token {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new("en-US")
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("locale", &self.locale)
            .field("has_cancellation_token", &self.cancellation_token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::FlagCancellationToken;

    #[test]
    fn default_settings_never_cancels() {
        let settings = Settings::default();
        assert!(settings.check_cancellation().is_ok());
    }

    #[test]
    fn settings_with_cancellation_token_propagates_cancel() {
        let flag = FlagCancellationToken::new();
        flag.cancel();
        let settings = Settings::default().with_cancellation_token(Box::new(flag));
        assert!(settings.check_cancellation().is_err());
    }

    #[test]
    fn default_templates_cover_every_parse_error_variant() {
        let templates = LocalizationTemplates::default_templates();
        for id in [
            "expectedTokenKind",
            "expectedAnyTokenKind",
            "expectedCsvContinuation",
            "unusedTokensRemain",
            "unterminatedParentheses",
            "unterminatedBracket",
            "invalidPrimitiveType",
            "requiredParameterAfterOptionalParameter",
        ] {
            assert!(templates.get(id).is_some(), "missing template {id}");
        }
    }
}
