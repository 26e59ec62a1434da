use std::{fmt, result};

/// Result type used by this crate, parameterized over [Error].
pub type Result<T> = result::Result<T, Error>;

/// Error type for this crate.
///
/// Every variant carries a `(location, message)` pair, the location being
/// the `file!():line!()` that raised it, stamped by [err_at].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// An I/O failure: read, write, seek, flush, open, lock.
    IoError(String, String),
    /// Checkpoint header mismatch, length-prefix overrun, or any other
    /// sign that the log file is not what it claims to be.
    Corrupt(String, String),
    /// Lookup found no live value for the key.
    NotFound(String, String),
    /// Failed to serialize a value into cbor.
    EncodeFail(String, String),
    /// Failed to deserialize a value from cbor.
    DecodeFail(String, String),
    /// Integer/offset narrowing failed (u64 -> u32, u64 -> usize, ...).
    FailConvert(String, String),
    /// Condition that should never arise in a correctly operating index,
    /// but that cannot be checked with a plain assertion because it
    /// depends on data read back from disk.
    Fatal(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Error::IoError(p, msg) => write!(f, "{} IoError: {}", p, msg),
            Error::Corrupt(p, msg) => write!(f, "{} Corrupt: {}", p, msg),
            Error::NotFound(p, msg) => write!(f, "{} NotFound: {}", p, msg),
            Error::EncodeFail(p, msg) => write!(f, "{} EncodeFail: {}", p, msg),
            Error::DecodeFail(p, msg) => write!(f, "{} DecodeFail: {}", p, msg),
            Error::FailConvert(p, msg) => write!(f, "{} FailConvert: {}", p, msg),
            Error::Fatal(p, msg) => write!(f, "{} Fatal: {}", p, msg),
        }
    }
}

impl std::error::Error for Error {}

/// Stamp the call-site and wrap a fallible expression (or a bare message)
/// into an [Error] variant.
///
/// ```ignore
/// err_at!(IoError, file.sync_all())?;
/// err_at!(Corrupt, msg: "header mismatch {} != {}", a, b)?;
/// err_at!(IoError, file.write(buf), "writing checkpoint at {:?}", loc)?;
/// ```
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err($crate::Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err($crate::Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err($crate::Error::$v(prefix, format!("{} {}", format!($($arg),+), err)))
            }
        }
    }};
}
