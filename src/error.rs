use std::io;
use thiserror::Error;

type FallbackError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    /// A read was attempted past the end of the buffer.
    #[error("read out of range; offset: {offset}, len: {len}, buffer size: {size}")]
    OutOfRange {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("parse failed; {0}")]
    ParseFailed(FallbackError),

    #[error("unrecognized file format")]
    UnrecognizedFileFormat,

    #[error("exif segment not found")]
    ExifNotFound,

    #[error("io error; {0}")]
    Io(#[from] io::Error),

    #[error("http error; {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error; {0}")]
    Json(#[from] serde_json::Error),
}

use Error::*;

impl From<String> for Error {
    fn from(src: String) -> Error {
        ParseFailed(src.into())
    }
}

impl From<&str> for Error {
    fn from(src: &str) -> Error {
        src.to_string().into()
    }
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for crate::Error {
    fn from(e: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        convert_parse_error(e, "")
    }
}

pub(crate) fn convert_parse_error(e: nom::Err<nom::error::Error<&[u8]>>, message: &str) -> Error {
    let s = match e {
        nom::Err::Incomplete(_) => format!("{e}; {message}"),
        nom::Err::Error(e) => format!("{}; {message}", e.code.description()),
        nom::Err::Failure(e) => format!("{}; {message}", e.code.description()),
    };

    s.into()
}
