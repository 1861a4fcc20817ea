//! Closed catalog of target languages.
//!
//! Every language listed here is accepted by both the translation and the
//! speech synthesis endpoints under the same code.

use crate::error::DubError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported dubbing target language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    #[default]
    Hindi,
    Bengali,
    Gujarati,
    Kannada,
    Malayalam,
    Marathi,
    Nepali,
    Tamil,
    Telugu,
    Urdu,
    English,
    Spanish,
    French,
    German,
    Portuguese,
    Russian,
    Chinese,
}

impl Language {
    /// All supported languages, in catalog order.
    pub const ALL: [Language; 17] = [
        Language::Hindi,
        Language::Bengali,
        Language::Gujarati,
        Language::Kannada,
        Language::Malayalam,
        Language::Marathi,
        Language::Nepali,
        Language::Tamil,
        Language::Telugu,
        Language::Urdu,
        Language::English,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Portuguese,
        Language::Russian,
        Language::Chinese,
    ];

    /// Language code as understood by the remote services.
    pub fn code(self) -> &'static str {
        match self {
            Language::Hindi => "hi",
            Language::Bengali => "bn",
            Language::Gujarati => "gu",
            Language::Kannada => "kn",
            Language::Malayalam => "ml",
            Language::Marathi => "mr",
            Language::Nepali => "ne",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Urdu => "ur",
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Portuguese => "pt",
            Language::Russian => "ru",
            Language::Chinese => "zh-CN",
        }
    }

    /// English display name.
    pub fn name(self) -> &'static str {
        match self {
            Language::Hindi => "Hindi",
            Language::Bengali => "Bengali",
            Language::Gujarati => "Gujarati",
            Language::Kannada => "Kannada",
            Language::Malayalam => "Malayalam",
            Language::Marathi => "Marathi",
            Language::Nepali => "Nepali",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Urdu => "Urdu",
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Portuguese => "Portuguese",
            Language::Russian => "Russian",
            Language::Chinese => "Chinese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = DubError;

    /// Codes are matched case-insensitively (`zh-cn` is accepted for `zh-CN`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DubError::UnsupportedLanguage {
                code: wanted.to_string(),
            })
    }
}

impl TryFrom<String> for Language {
    type Error = DubError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_parses_from_its_code() {
        for lang in Language::ALL {
            assert_eq!(lang.code().parse::<Language>().unwrap(), lang);
        }
    }

    #[test]
    fn chinese_code_is_case_insensitive() {
        assert_eq!("zh-cn".parse::<Language>().unwrap(), Language::Chinese);
        assert_eq!("zh-CN".parse::<Language>().unwrap(), Language::Chinese);
    }

    #[test]
    fn unknown_code_is_rejected() {
        match "xx".parse::<Language>() {
            Err(DubError::UnsupportedLanguage { code }) => assert_eq!(code, "xx"),
            other => panic!("expected UnsupportedLanguage, got {:?}", other),
        }
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<&str> = Language::ALL.iter().map(|l| l.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), Language::ALL.len());
    }

    #[test]
    fn serde_uses_the_code() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            lang: Language,
        }
        let toml_str = toml::to_string(&Wrapper {
            lang: Language::Chinese,
        })
        .unwrap();
        assert!(toml_str.contains("\"zh-CN\""));

        let parsed: Wrapper = toml::from_str("lang = \"ta\"").unwrap();
        assert_eq!(parsed.lang, Language::Tamil);

        assert!(toml::from_str::<Wrapper>("lang = \"klingon\"").is_err());
    }

    #[test]
    fn default_is_hindi() {
        assert_eq!(Language::default().code(), crate::defaults::DEFAULT_LANGUAGE);
    }
}
