//! Candidate filename generation.
//!
//! The remote server names each document after its identifier and date in a
//! handful of conventions. For `Copom` / `-not` / `pdf` and meeting 205 on
//! 2017-03-22 the candidates are, in probe order:
//!
//! ```text
//! Copom205-not20170322205.pdf
//! COPOM205-not20170322205.pdf
//! Copom205-not2017-03-22-205.pdf
//! COPOM205-not2017-03-22-205.pdf
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, Identifier};

/// The server's filename convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingScheme {
    /// Token before the identifier, in its usual casing.
    pub prefix: String,
    /// Token between the identifier and the date.
    pub tag: String,
    /// File extension without the dot.
    pub extension: String,
}

impl Default for NamingScheme {
    fn default() -> Self {
        Self {
            prefix: "Copom".to_string(),
            tag: "-not".to_string(),
            extension: "pdf".to_string(),
        }
    }
}

impl NamingScheme {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::InvalidNaming("prefix is empty".to_string()));
        }
        // The tag separates the identifier from the date; without one, or
        // with a leading digit, `{prefix}20{tag}` is a prefix of identifier 200's files.
        if self.tag.is_empty() || self.tag.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidNaming(format!(
                "tag {:?} must be non-empty and must not start with a digit",
                self.tag
            )));
        }
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(ConfigError::InvalidNaming(format!(
                "extension {:?} must be non-empty and given without a dot",
                self.extension
            )));
        }
        if self
            .prefix
            .chars()
            .chain(self.tag.chars())
            .chain(self.extension.chars())
            .any(|c| c == '/' || c == '\\')
        {
            return Err(ConfigError::InvalidNaming(
                "tokens must not contain path separators".to_string(),
            ));
        }
        Ok(())
    }

    /// Candidate filenames for identifier `n` on date `d`, in probe order.
    ///
    /// Pure: the same `(n, d)` always yields the same list. When the
    /// configured prefix is already uppercase the duplicate spellings are
    /// dropped, keeping first-seen order.
    pub fn candidates(&self, n: Identifier, d: NaiveDate) -> Vec<String> {
        let compact = d.format("%Y%m%d").to_string();
        let dashed = d.format("%Y-%m-%d").to_string();
        let upper = self.prefix.to_uppercase();
        let (tag, ext) = (&self.tag, &self.extension);

        let all = [
            format!("{}{n}{tag}{compact}{n}.{ext}", self.prefix),
            format!("{upper}{n}{tag}{compact}{n}.{ext}"),
            format!("{}{n}{tag}{dashed}-{n}.{ext}", self.prefix),
            format!("{upper}{n}{tag}{dashed}-{n}.{ext}"),
        ];

        let mut out: Vec<String> = Vec::with_capacity(all.len());
        for name in all {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }

    /// Lowercased filename prefix shared by every candidate of `n`.
    pub fn local_prefix(&self, n: Identifier) -> String {
        format!("{}{n}{}", self.prefix, self.tag).to_lowercase()
    }

    /// Whether a file already on disk belongs to identifier `n`.
    ///
    /// Case-insensitive, so a file saved under any casing counts.
    pub fn matches_local(&self, n: Identifier, filename: &str) -> bool {
        let lower = filename.to_lowercase();
        let suffix = format!(".{}", self.extension.to_lowercase());
        lower.starts_with(&self.local_prefix(n)) && lower.ends_with(&suffix)
    }
}
