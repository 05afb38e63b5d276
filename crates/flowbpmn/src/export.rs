//! Export of laid-out flowcharts to interchange formats.
//!
//! Only BPMN 2.0 XML is produced today, see [`bpmn`].

pub mod bpmn;

#[derive(Debug)]
pub enum Error {
    /// The XML writer rejected an event.
    Write(String),
    /// The written document was not valid UTF-8.
    Encoding(std::string::FromUtf8Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write(msg) => write!(f, "Write error: {msg}"),
            Self::Encoding(err) => write!(f, "Encoding error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Write(_) => None,
            Self::Encoding(err) => Some(err),
        }
    }
}
