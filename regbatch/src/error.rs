use crate::client::MonitorState;
use crate::codec::DataType;

/// Top level error type returned by requests made to the gateway
///
/// Every variant except [`RequestError::Rejected`] means the request never produced
/// a usable answer. The [`BatchReadEngine`](crate::client::BatchReadEngine) folds these
/// into a negative-state result instead of returning them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    /// the gateway did not answer within the configured timeout
    #[error("no response from the gateway within the timeout")]
    Timeout,
    /// a connection to the gateway could not be established
    #[error("unable to connect to the gateway: {0}")]
    Connect(String),
    /// the gateway answered with a non-success HTTP status
    #[error("gateway returned HTTP status {0}")]
    Status(u16),
    /// the body of the response could not be decoded
    #[error("bad response from the gateway: {0}")]
    BadResponse(String),
    /// any other error reported by the HTTP client
    #[error("http error: {0}")]
    Http(String),
    /// the gateway processed the command but reported a failure code
    #[error("gateway rejected the command (code {code}): {message}")]
    Rejected {
        /// code returned by the gateway
        code: i32,
        /// message returned by the gateway
        message: String,
    },
    /// the request was rejected locally before any I/O took place
    #[error(transparent)]
    Invalid(#[from] InvalidRequest),
    /// the value returned by the gateway does not fit the requested type
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// the value supplied for a write cannot be represented in the requested type
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return RequestError::Timeout;
        }
        if let Some(status) = err.status() {
            return RequestError::Status(status.as_u16());
        }
        if err.is_connect() {
            return RequestError::Connect(err.to_string());
        }
        if err.is_decode() {
            return RequestError::BadResponse(err.to_string());
        }
        RequestError::Http(err.to_string())
    }
}

/// Errors that result from a malformed request made by the caller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRequest {
    /// two items in the same batch share a name, so results could not be correlated
    #[error("duplicate item name in batch: '{0}'")]
    DuplicateName(String),
}

/// Errors that occur while interpreting a raw value under a requested type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// the type tag is not one the codec understands
    #[error("unsupported data type: '{0}'")]
    UnsupportedType(String),
    /// the raw value is of the wrong JSON kind for the type (e.g. a string for an int16)
    #[error("expected a value of type {data_type} but found {found}")]
    WrongKind {
        /// requested type
        data_type: DataType,
        /// description of what was actually received
        found: String,
    },
    /// the raw value is numeric but outside the range of the type
    #[error("value {value} is out of range for {data_type}")]
    OutOfRange {
        /// requested type
        data_type: DataType,
        /// textual form of the offending value
        value: String,
    },
    /// the number of registers does not match the width of the type
    #[error("{data_type} requires {expected} register(s) but {actual} were supplied")]
    RegisterCount {
        /// requested type
        data_type: DataType,
        /// number of registers the type occupies
        expected: usize,
        /// number of registers received
        actual: usize,
    },
    /// an element of a register array is not a 16-bit unsigned integer
    #[error("bad register value: {0}")]
    BadRegister(String),
    /// a coil status word other than 0xFF00 or 0x0000
    #[error("received coil state with unspecified value: 0x{0:04X}")]
    UnknownCoilState(u16),
    /// the payload carries no value at all
    #[error("payload does not contain a value")]
    MissingValue,
}

/// Errors that occur while encoding a value for a write request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    /// the value is of the wrong kind for the type (e.g. a bool for a float32)
    #[error("a {found} value cannot be written as {data_type}")]
    WrongKind {
        /// requested type
        data_type: DataType,
        /// kind of the supplied value
        found: &'static str,
    },
    /// the value does not fit within the range of the type
    #[error("value {value} is out of range for {data_type}")]
    OutOfRange {
        /// requested type
        data_type: DataType,
        /// textual form of the offending value
        value: String,
    },
    /// NaN and infinities cannot be carried on the wire
    #[error("non-finite value {0} cannot be encoded")]
    NotFinite(f64),
}

/// Failure of a single item within a batch. Sibling items are unaffected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ItemError {
    /// the gateway reported a failure for the item; the message is passed through unmodified
    #[error("{0}")]
    Gateway(String),
    /// the gateway reported success but the payload does not fit the requested type
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// the gateway answer did not contain an entry for the item
    #[error("gateway returned no result for this item")]
    NoResult,
}

/// Errors returned when driving a [`RealtimeMonitor`](crate::client::RealtimeMonitor)
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    /// the monitor can only be started from the idle state
    #[error("monitor cannot be started from the {0:?} state")]
    NotIdle(MonitorState),
}

/// Errors that occur while parsing or checking an ASCII hex frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// frame does not begin with ':'
    #[error("frame does not begin with the ':' start character")]
    MissingStart,
    /// frame does not end with CR LF
    #[error("frame does not end with CR LF")]
    MissingEnd,
    /// the frame body is not valid hexadecimal
    #[error("invalid hex in frame: {0}")]
    BadHex(String),
    /// the frame is too short to carry a checksum
    #[error("frame is too short to contain an LRC")]
    TooShort,
    /// the trailing LRC does not match the payload
    #[error("LRC mismatch - received: 0x{received:02X} expected: 0x{expected:02X}")]
    ChecksumMismatch {
        /// checksum carried by the frame
        received: u8,
        /// checksum computed over the payload
        expected: u8,
    },
}

impl From<hex::FromHexError> for FrameError {
    fn from(err: hex::FromHexError) -> Self {
        FrameError::BadHex(err.to_string())
    }
}
