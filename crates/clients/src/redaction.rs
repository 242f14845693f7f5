//! Secret redaction for logged HTTP traffic.
//!
//! Each API client owns a [`Redactor`] seeded with the credentials it was
//! configured with. Request and response bodies pass through it before they
//! reach a log line.

/// Minimum secret length to redact (shorter secrets may cause false positives)
pub const MIN_SECRET_LENGTH: usize = 4;

/// Placeholder for redacted secrets
pub const REDACTED_PLACEHOLDER: &str = "*_*";

/// A fixed set of secrets to strip from log output.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    /// Longest first, so overlapping secrets are replaced greedily
    secrets: Vec<String>,
}

impl Redactor {
    /// Builds a redactor; secrets shorter than [`MIN_SECRET_LENGTH`] are ignored.
    pub fn new(secrets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut secrets: Vec<String> = secrets
            .into_iter()
            .map(Into::into)
            .filter(|s| s.len() >= MIN_SECRET_LENGTH)
            .collect();
        secrets.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        secrets.dedup();
        Self { secrets }
    }

    /// Returns `input` with every registered secret replaced.
    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        let mut result = input.to_string();
        for secret in &self.secrets {
            result = result.replace(secret.as_str(), REDACTED_PLACEHOLDER);
        }
        result
    }

    /// Number of registered secrets.
    #[must_use]
    pub fn secret_count(&self) -> usize {
        self.secrets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_redaction() {
        let redactor = Redactor::new(["changeme123"]);
        assert_eq!(
            redactor.redact(r#"{"password":"changeme123"}"#),
            r#"{"password":"*_*"}"#
        );
    }

    #[test]
    fn test_overlapping_secrets_longest_first() {
        let redactor = Redactor::new(["abcd", "abcdefgh"]);
        assert_eq!(redactor.redact("key=abcdefgh"), "key=*_*");
    }

    #[test]
    fn test_short_secret_ignored() {
        let redactor = Redactor::new(["ab", "abc", "abcd"]);
        assert_eq!(redactor.secret_count(), 1);
        assert_eq!(redactor.redact("ab abc abcd"), "ab abc *_*");
    }

    #[test]
    fn test_duplicates_counted_once() {
        let redactor = Redactor::new(["abcd", "wxyz", "abcd"]);
        assert_eq!(redactor.secret_count(), 2);
        assert_eq!(redactor.redact("abcd wxyz"), "*_* *_*");
    }

    #[test]
    fn test_no_secrets() {
        let redactor = Redactor::default();
        assert_eq!(redactor.redact("nothing to redact here"), "nothing to redact here");
    }
}
