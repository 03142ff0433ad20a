//! Parsing error types for infobox extraction

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    /// No table on the page has a two-column heading equal to the NPC name
    #[error("No infobox headed '{expected}' found in page")]
    InfoboxNotFound { expected: String },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid pattern: {pattern} - {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ParsingError {
    pub fn infobox_not_found(expected: &str) -> Self {
        Self::InfoboxNotFound {
            expected: expected.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
