use std::fmt;

use crate::backend::BackendError;

#[derive(Debug)]
pub enum Error {
    InvalidDocx(String),
    Zip(zip::result::ZipError),
    Xml(roxmltree::Error),
    Pdf(String),
    Io(std::io::Error),
    Config(String),
    /// A radio widget was rejected while the strict radio policy is active.
    RadioRejected { name: String, reason: BackendError },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDocx(reason) => write!(f, "not a valid DOCX file: {reason}"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Xml(e) => write!(f, "XML error: {e}"),
            Error::Pdf(e) => write!(f, "PDF error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Config(e) => write!(f, "invalid configuration: {e}"),
            Error::RadioRejected { name, reason } => {
                write!(f, "radio field '{name}' rejected (strict mode): {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Errors contained at the level of a single placeholder. None of these abort
/// the page or the document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    MalformedToken { raw: String },
    GeometryUnresolved { raw: String },
    WidgetCreationRejected { name: String, reason: String },
    BackendMutationFailed { name: String, reason: String },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::MalformedToken { raw } => write!(f, "malformed placeholder '{raw}'"),
            FieldError::GeometryUnresolved { raw } => {
                write!(f, "no rectangle could be derived for '{raw}'")
            }
            FieldError::WidgetCreationRejected { name, reason } => {
                write!(f, "backend rejected widget '{name}': {reason}")
            }
            FieldError::BackendMutationFailed { name, reason } => {
                write!(f, "update of widget '{name}' failed: {reason}")
            }
        }
    }
}

impl std::error::Error for FieldError {}
