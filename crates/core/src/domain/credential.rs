// Credential and IaC source value objects

use std::fmt;

/// Cloud provider token.
///
/// Deliberately not `Serialize`: it must never end up in the job store or a response.
/// `Debug` and `Display` are redacted so it cannot leak through log fields.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub const REDACTED: &'static str = "***";

    /// Build a credential from caller input. Blank input yields `None`.
    pub fn parse(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Raw token, for handing to the provider API or the tool environment only
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Replace every occurrence of the token in `text`
    pub fn redact(&self, text: &str) -> String {
        text.replace(self.0.as_str(), Self::REDACTED)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", Self::REDACTED)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::REDACTED)
    }
}

/// Terraform source text, stored verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IacSource(String);

impl IacSource {
    /// Blank (whitespace-only) input yields `None`
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substring check, not a parse
    pub fn contains(&self, marker: &str) -> bool {
        self.0.contains(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_credential_rejected() {
        assert!(Credential::parse("").is_none());
        assert!(Credential::parse("   \n").is_none());
        assert_eq!(Credential::parse(" tok ").unwrap().expose(), "tok");
    }

    #[test]
    fn test_credential_never_formats_raw() {
        let cred = Credential::parse("dop_v1_secret").unwrap();
        assert_eq!(format!("{:?}", cred), "Credential(***)");
        assert_eq!(cred.to_string(), "***");
    }

    #[test]
    fn test_redact_replaces_all_occurrences() {
        let cred = Credential::parse("abc123").unwrap();
        let out = cred.redact("token=abc123; again abc123");
        assert_eq!(out, "token=***; again ***");
    }

    #[test]
    fn test_iac_source_kept_verbatim() {
        assert!(IacSource::parse("  \t").is_none());
        let src = IacSource::parse("  resource \"x\" {}\n").unwrap();
        assert_eq!(src.as_str(), "  resource \"x\" {}\n");
        assert!(src.contains("resource"));
    }
}
