//! Engine error types.

use tal_tales::TalesError;

/// Error raised while parsing or processing a template.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// XML parsing error.
    #[error("XML parse error")]
    Parse(#[from] quick_xml::Error),

    /// The template source ended with unclosed elements.
    #[error("unclosed element at end of template")]
    UnbalancedTags,

    /// Expression evaluation error from a directive value.
    #[error("{0}")]
    Expression(#[from] TalesError),
}
