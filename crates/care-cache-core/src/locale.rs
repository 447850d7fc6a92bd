//! Locale tag resolution.
//!
//! Callers pass ISO-639-like tags, optionally region-qualified (`pt-BR`,
//! `pt_br`). The engine works on the primary subtag unless the full tag is
//! itself a supported locale. Unsupported or empty tags resolve to the base
//! language, so they never trigger a translation call.

use crate::models::BASE_LOCALE;

/// Locales translated out of the box.
pub const DEFAULT_SUPPORTED_LOCALES: &[&str] = &[
    "en", "de", "fr", "es", "it", "pt", "pt-BR", "nl", "pl", "el", "tr", "ru", "sv", "da", "fi",
    "cs", "ja", "zh",
];

/// Which locales exist and which one is the base language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalePolicy {
    base: String,
    supported: Vec<String>,
}

impl LocalePolicy {
    pub fn new(base: impl Into<String>, supported: Vec<String>) -> Self {
        Self {
            base: base.into(),
            supported,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn is_base(&self, locale: &str) -> bool {
        locale.eq_ignore_ascii_case(&self.base)
    }

    /// Resolve a caller-supplied tag to the locale used for cache keys.
    ///
    /// 1. Trim and replace `_` with `-`.
    /// 2. A supported full tag wins, spelled as in the supported list.
    /// 3. Otherwise the lower-cased primary subtag, if supported.
    /// 4. Otherwise the base locale.
    pub fn resolve(&self, tag: &str) -> String {
        let cleaned = tag.trim().replace('_', "-");
        if cleaned.is_empty() {
            return self.base.clone();
        }
        if let Some(full) = self.lookup(&cleaned) {
            return full;
        }
        let primary = cleaned
            .split('-')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if self.is_base(&primary) {
            return self.base.clone();
        }
        self.lookup(&primary).unwrap_or_else(|| self.base.clone())
    }

    fn lookup(&self, tag: &str) -> Option<String> {
        self.supported
            .iter()
            .find(|s| s.eq_ignore_ascii_case(tag))
            .cloned()
    }
}

impl Default for LocalePolicy {
    fn default() -> Self {
        Self::new(
            BASE_LOCALE,
            DEFAULT_SUPPORTED_LOCALES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_tag_when_supported() {
        let policy = LocalePolicy::default();
        assert_eq!(policy.resolve("pt-BR"), "pt-BR");
        assert_eq!(policy.resolve("pt_br"), "pt-BR");
    }

    #[test]
    fn test_primary_subtag_fallback() {
        let policy = LocalePolicy::default();
        assert_eq!(policy.resolve("de-AT"), "de");
        assert_eq!(policy.resolve("EL"), "el");
        assert_eq!(policy.resolve("en-GB"), "en");
    }

    #[test]
    fn test_unsupported_resolves_to_base() {
        let policy = LocalePolicy::default();
        assert_eq!(policy.resolve("xx-YY"), "en");
        assert_eq!(policy.resolve("   "), "en");
        assert!(policy.is_base(&policy.resolve("klingon")));
    }
}
