use std::{error, fmt, io};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by grainline.
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// A buffer name could not be resolved in the buffer storage.
    InvalidBufferReference(String),
    /// A buffer has a channel layout the engine can't read from.
    UnsupportedChannelCount { name: String, channel_count: usize },
    /// A parameter value got rejected. The previously set value is kept.
    InvalidParameter(String),
    /// A buffer exists, but its samples currently can not be accessed.
    BufferUnavailable(String),
    /// A buffer is currently read by an engine and should not be replaced.
    BufferInUse(String),
    /// Invalid options, or a parameter or message the engine variant doesn't support.
    ParameterError(String),
    /// The engine's message queue is full.
    SendError(String),
    IoError(io::Error),
    #[cfg(feature = "wav-output")]
    WavError(hound::Error),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBufferReference(name) => write!(f, "No buffer named '{name}' found"),
            Self::UnsupportedChannelCount {
                name,
                channel_count,
            } => write!(
                f,
                "Buffer '{name}' has an unsupported channel count of {channel_count}"
            ),
            Self::InvalidParameter(str) => write!(f, "Invalid parameter value: {str}"),
            Self::BufferUnavailable(name) => write!(f, "Buffer '{name}' is not available"),
            Self::BufferInUse(name) => write!(f, "Buffer '{name}' is in use"),
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
            Self::SendError(str) => write!(f, "Failed to send channel message: {str}"),
            Self::IoError(err) => err.fmt(f),
            #[cfg(feature = "wav-output")]
            Self::WavError(err) => err.fmt(f),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

#[cfg(feature = "wav-output")]
impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Error {
        Error::WavError(err)
    }
}
