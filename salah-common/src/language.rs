//! Narration language selection
//!
//! The player ships two narration languages. The language code doubles as
//! the asset folder name, so `Language::Malayalam` resolves clips under
//! `.../malayalam/`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Narration language for step audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Malayalam,
}

impl Language {
    /// All supported languages, in menu order
    pub const ALL: [Language; 2] = [Language::Malayalam, Language::English];

    /// Lowercase code used for asset folders and config values
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Malayalam => "malayalam",
        }
    }

    /// Label shown on the language menu, in the language itself
    pub fn native_label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Malayalam => "മലയാളം",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "malayalam" | "ml" => Ok(Language::Malayalam),
            other => Err(Error::InvalidInput(format!("Unknown language: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_names_and_short_codes() {
        assert_eq!("English".parse::<Language>().unwrap(), Language::English);
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!(" MALAYALAM ".parse::<Language>().unwrap(), Language::Malayalam);
        assert_eq!("ml".parse::<Language>().unwrap(), Language::Malayalam);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "arabic".parse::<Language>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_code_is_lowercase_folder_name() {
        for language in Language::ALL {
            assert_eq!(language.code(), language.code().to_lowercase());
            assert_eq!(language.to_string(), language.code());
        }
    }

    #[test]
    fn test_serde_uses_code() {
        let json = serde_json::to_string(&Language::Malayalam).unwrap();
        assert_eq!(json, "\"malayalam\"");
        let parsed: Language = serde_json::from_str("\"english\"").unwrap();
        assert_eq!(parsed, Language::English);
    }
}
