//! Error types for markup conversion.

/// Error building a conversion rule.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// Rule pattern is not a valid regular expression.
    #[error("Invalid rule pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern as supplied by the caller.
        pattern: String,
        /// Underlying regex compilation error.
        #[source]
        source: regex::Error,
    },
}
