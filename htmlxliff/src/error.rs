use thiserror::Error;

/// Errors produced while reading or writing XLIFF documents.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not a well-formed XLIFF document.
    #[error("invalid XLIFF file: {reason}")]
    InvalidXliff { reason: String },

    /// XML writer failure.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error while writing XML: {0}")]
    Io(#[from] std::io::Error),

    #[error("generated document is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidXliff {
            reason: reason.into(),
        }
    }

    /// True for problems with the input document rather than with this crate.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidXliff { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
