//! Common helpers: cbor encode/decode, file-open wrappers, read/write macros.

use cbordata::{Cbor, FromCbor, IntoCbor};

use std::{ffi, fs, path};

use crate::{err_at, Result};

/// Read `$n` bytes from `$fd` at `$seek`, or fail with a located [crate::Error].
#[macro_export]
macro_rules! read_file {
    ($fd:expr, $seek:expr, $n:expr, $msg:expr) => {{
        use std::{convert::TryFrom, io::Read, io::Seek};

        match $fd.seek($seek) {
            Ok(_) => {
                let mut buf = vec![0; usize::try_from($n).unwrap()];
                match $fd.read(&mut buf) {
                    Ok(n) if buf.len() == n => Ok(buf),
                    Ok(n) => {
                        let m = buf.len();
                        err_at!(Corrupt, msg: concat!($msg, " short read {}/{} at {:?}"), n, m, $seek)
                    }
                    Err(err) => err_at!(IoError, Err(err)),
                }
            }
            Err(err) => err_at!(IoError, Err(err)),
        }
    }};
}

/// Write the entirety of `$buffer` to `$fd`, or fail on a partial write.
#[macro_export]
macro_rules! write_file {
    ($fd:expr, $buffer:expr, $loc:expr, $msg:expr) => {{
        use std::io::Write;

        match err_at!(IoError, $fd.write($buffer)) {
            Ok(n) if $buffer.len() == n => Ok(n),
            Ok(n) => err_at!(
                Fatal, msg: "partial write {}, {:?}, {}/{}", $msg, $loc, $buffer.len(), n
            ),
            Err(err) => Err(err),
        }
    }};
}

/// Guard against a buffer shorter than `$want` bytes before decoding it.
#[macro_export]
macro_rules! check_remaining {
    ($buf:expr, $want:expr, $msg:expr) => {
        if $buf.len() < $want {
            err_at!(Corrupt, msg: "insufficient input {} {}/{}", $msg, $buf.len(), $want)
        } else {
            Ok(())
        }
    };
}

/// Serialize `val` to its cbor byte representation.
pub fn into_cbor_bytes<T>(val: T) -> Result<Vec<u8>>
where
    T: IntoCbor,
{
    let mut data: Vec<u8> = vec![];
    let n = err_at!(EncodeFail, err_at!(EncodeFail, val.into_cbor())?.encode(&mut data))?;
    if n != data.len() {
        err_at!(Fatal, msg: "cbor encoding length mismatch {} {}", n, data.len())
    } else {
        Ok(data)
    }
}

/// Deserialize a value of type `T` from its cbor byte representation.
/// Returns `(value, bytes-consumed)`.
pub fn from_cbor_bytes<T>(mut data: &[u8]) -> Result<(T, usize)>
where
    T: FromCbor,
{
    let (val, n) = err_at!(DecodeFail, Cbor::decode(&mut data))?;
    Ok((err_at!(DecodeFail, T::from_cbor(val))?, n))
}

/// Create (or truncate) a file for read-write access, creating parent
/// directories as needed.
pub fn create_file_rw(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    if let Some(parent) = os_file.parent() {
        err_at!(IoError, fs::create_dir_all(parent))?;
    }
    fs::remove_file(os_file).ok();
    let mut opts = fs::OpenOptions::new();
    err_at!(IoError, opts.read(true).write(true).create_new(true).open(os_file))
}

/// Open an existing file for read-write access.
pub fn open_file_rw(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    let mut opts = fs::OpenOptions::new();
    err_at!(IoError, opts.read(true).write(true).open(os_file))
}

/// Open a file for read-only access.
pub fn open_file_r(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    err_at!(IoError, fs::OpenOptions::new().read(true).open(os_file))
}
