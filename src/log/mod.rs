//! Append-only, length-framed log file with a duplicated-header checkpoint.
//!
//! Layout:
//!
//! ```text
//! bytes 0..4   root offset R, u32 big-endian
//! bytes 4..8   second copy of R, u32 big-endian
//! bytes 8..    [u32 length][length bytes payload] ...
//! ```
//!
//! `write_checkpoint` is the single durability point: applications only get
//! crash-atomicity if every other append is allowed to land as garbage on a
//! crash.

use fs2::FileExt;

use std::{
    convert::TryFrom,
    ffi,
    fs::File,
    io::{Seek, SeekFrom},
};

use crate::{err_at, util, Result};

/// Byte offset of the checkpoint header's first copy.
const HEADER_OFFSET_0: u64 = 0;
/// Byte offset of the checkpoint header's second copy.
const HEADER_OFFSET_1: u64 = 4;
/// Size, in bytes, of the checkpoint header.
pub const HEADER_SIZE: u64 = 8;

/// An append-only log file: framed records behind a duplicated root pointer.
pub struct Log {
    loc: ffi::OsString,
    fd: File,
    fsync: bool,
}

impl Log {
    /// Open an existing log, or create one if `loc` does not exist.
    ///
    /// A freshly created log gets its header initialized to point at an
    /// empty root record.
    pub fn open(loc: &ffi::OsStr, fsync: bool) -> Result<Log> {
        let is_new = !std::path::Path::new(loc).exists();
        let fd = if is_new {
            util::create_file_rw(loc)?
        } else {
            util::open_file_rw(loc)?
        };
        err_at!(IoError, fd.lock_exclusive())?;

        let mut log = Log {
            loc: loc.to_os_string(),
            fd,
            fsync,
        };

        if is_new {
            log.write_checkpoint(0)?;
            let root = log.append(&util::into_cbor_bytes(Vec::<u8>::new())?)?;
            log.write_checkpoint(root)?;
        }

        Ok(log)
    }

    /// Append `bytes` as a new length-prefixed record, returning the offset
    /// at which its length prefix begins.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        use std::io::Write;

        let offset = err_at!(IoError, self.fd.seek(SeekFrom::End(0)))?;

        let len = err_at!(FailConvert, u32::try_from(bytes.len()))?;
        err_at!(IoError, self.fd.write_all(&len.to_be_bytes()))?;
        err_at!(IoError, self.fd.write_all(bytes))?;
        if self.fsync {
            err_at!(IoError, self.fd.sync_data())?;
        }

        Ok(offset)
    }

    /// Read back the record previously returned by [Log::append].
    pub fn read(&mut self, offset: u64) -> Result<Vec<u8>> {
        let mut len_buf = [0_u8; 4];
        {
            use std::io::Read;
            err_at!(IoError, self.fd.seek(SeekFrom::Start(offset)))?;
            err_at!(IoError, self.fd.read_exact(&mut len_buf))?;
        }
        let len = u32::from_be_bytes(len_buf) as u64;

        let seek = SeekFrom::Start(offset + 4);
        read_file!(self.fd, seek, len, "reading log record")
    }

    /// Durably write both copies of the checkpoint header.
    ///
    /// This is the commit point: once this returns,
    /// `offset` is the visible root for any subsequent `open`.
    pub fn write_checkpoint(&mut self, offset: u64) -> Result<()> {
        let off = err_at!(FailConvert, u32::try_from(offset))?;
        let bytes = off.to_be_bytes();

        {
            use std::io::Write;
            err_at!(IoError, self.fd.seek(SeekFrom::Start(HEADER_OFFSET_0)))?;
            err_at!(IoError, self.fd.write_all(&bytes))?;
            err_at!(IoError, self.fd.seek(SeekFrom::Start(HEADER_OFFSET_1)))?;
            err_at!(IoError, self.fd.write_all(&bytes))?;
        }
        err_at!(IoError, self.fd.sync_all())?;

        Ok(())
    }

    /// Read the checkpoint header, verifying both copies agree.
    pub fn read_checkpoint(&mut self) -> Result<u64> {
        let mut buf = [0_u8; 8];
        {
            use std::io::Read;
            err_at!(IoError, self.fd.seek(SeekFrom::Start(0)))?;
            err_at!(IoError, self.fd.read_exact(&mut buf))?;
        }

        let a = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let b = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        if a != b {
            return err_at!(Corrupt, msg: "torn checkpoint header {} != {} in {:?}", a, b, self.loc);
        }

        Ok(a as u64)
    }

    /// Total size of the log file, in bytes.
    pub fn len(&mut self) -> Result<u64> {
        err_at!(IoError, self.fd.seek(SeekFrom::End(0)))
    }

    pub fn to_location(&self) -> ffi::OsString {
        self.loc.clone()
    }
}

impl Drop for Log {
    fn drop(&mut self) {
        self.fd.unlock().ok();
    }
}

#[cfg(test)]
#[path = "log_test.rs"]
mod log_test;
