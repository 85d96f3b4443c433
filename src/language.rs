//! Output languages accepted by the analysis backends

use serde::Serialize;

/// A language the analysis can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportedLanguage {
    pub code: &'static str,
    pub name: &'static str,
}

pub const DEFAULT_LANGUAGE: &str = "en";

pub const SUPPORTED_LANGUAGES: &[SupportedLanguage] = &[
    SupportedLanguage { code: "en", name: "English" },
    SupportedLanguage { code: "hi", name: "Hindi" },
    SupportedLanguage { code: "bn", name: "Bengali" },
    SupportedLanguage { code: "ta", name: "Tamil" },
    SupportedLanguage { code: "te", name: "Telugu" },
    SupportedLanguage { code: "mr", name: "Marathi" },
    SupportedLanguage { code: "gu", name: "Gujarati" },
    SupportedLanguage { code: "kn", name: "Kannada" },
    SupportedLanguage { code: "ml", name: "Malayalam" },
    SupportedLanguage { code: "es", name: "Spanish" },
    SupportedLanguage { code: "fr", name: "French" },
    SupportedLanguage { code: "de", name: "German" },
];

/// Look up a language by code, ignoring case and surrounding whitespace.
pub fn find_language(code: &str) -> Option<&'static SupportedLanguage> {
    let code = code.trim();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| lang.code.eq_ignore_ascii_case(code))
}

pub fn is_supported(code: &str) -> bool {
    find_language(code).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let lang = find_language(" HI ").unwrap();
        assert_eq!(lang.name, "Hindi");
    }

    #[test]
    fn default_language_is_supported() {
        assert!(is_supported(DEFAULT_LANGUAGE));
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(!is_supported("xx"));
        assert!(!is_supported(""));
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<_> = SUPPORTED_LANGUAGES.iter().map(|l| l.code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), SUPPORTED_LANGUAGES.len());
    }
}
