//! Result and error types for Trazar.
//!
//! The taxonomy separates programmer errors (missing metadata, missing
//! bookkeeping attributes, unsupported host capabilities) from runtime
//! query failures (cardinality, type mismatch, timeout). All of them
//! propagate unhandled to the calling test step; nothing is retried
//! transparently outside the bounded settle loops in `wait`.

use thiserror::Error;

/// Result type for Trazar operations
pub type TrazarResult<T> = Result<T, TrazarError>;

/// Errors that can occur in Trazar
#[derive(Debug, Error)]
pub enum TrazarError {
    /// A wrapper class was used in a typed query before metadata was attached
    #[error("No element metadata registered for `{class}`. Call Metadata::add::<{class}>(..) before first use")]
    MissingMetadata {
        /// Fully-qualified name of the offending wrapper class
        class: &'static str,
    },

    /// A required bookkeeping attribute is absent from a located element
    #[error("Element matching `{selector}` is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// Attribute name
        attribute: String,
        /// Selector that located the element
        selector: String,
    },

    /// A required attribute carries a value outside its expected vocabulary
    #[error("Element matching `{selector}` has unexpected value `{value}` for attribute `{attribute}`")]
    InvalidAttributeValue {
        /// Attribute name
        attribute: String,
        /// The offending value
        value: String,
        /// Selector that located the element
        selector: String,
    },

    /// A located element's type tag does not match the expected wrapper class
    #[error("Type mismatch for `{selector}`: expected `{expected}` but the live element is `{actual}`")]
    TypeMismatch {
        /// Type string registered for the wrapper class
        expected: String,
        /// Type string read from the live element
        actual: String,
        /// Selector that located the element
        selector: String,
    },

    /// A singular query resolved to zero or more than one element
    #[error("Expected {expected} element(s) for {criteria}, found {found}")]
    Cardinality {
        /// Required cardinality ("exactly one", "at least one")
        expected: &'static str,
        /// Number of matches actually found
        found: usize,
        /// The attempted search criteria
        criteria: String,
    },

    /// A wait/poll loop exceeded its bound
    #[error("Timed out after {ms}ms waiting for {waiting_for}")]
    Timeout {
        /// Description of the awaited condition
        waiting_for: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A typed edge accessor was invoked without its corresponding hint
    #[error("Typed `{accessor}` accessor invoked without a {accessor} type hint")]
    MissingTypeHint {
        /// The accessor that was invoked ("source" or "target")
        accessor: &'static str,
    },

    /// The active hosting context cannot provide the requested capability
    #[error("Capability `{capability}` is not supported by hosting context `{host}`")]
    UnsupportedCapability {
        /// Capability name
        capability: &'static str,
        /// Hosting context name
        host: String,
    },

    /// Error reported by the underlying automation driver
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Browser or hosting-context launch failure
    #[error("Launch failed: {message}")]
    Launch {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
