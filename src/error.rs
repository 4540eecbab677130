use std::fmt;

#[derive(Debug)]
pub enum BingoError {
    InvalidConfiguration(String),
    FontUnavailable(String),
    Raster(String),
    Encode(String),
    Inspect(String),
    Io(std::io::Error),
}

impl fmt::Display for BingoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BingoError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            BingoError::FontUnavailable(message) => {
                write!(f, "no usable font: {}", message)
            }
            BingoError::Raster(message) => write!(f, "raster error: {}", message),
            BingoError::Encode(message) => write!(f, "image encode error: {}", message),
            BingoError::Inspect(message) => write!(f, "pdf inspect error: {}", message),
            BingoError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for BingoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BingoError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BingoError {
    fn from(value: std::io::Error) -> Self {
        BingoError::Io(value)
    }
}
