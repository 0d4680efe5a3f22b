#![deny(unsafe_code)]
//! Encoder and reader for the chunked IFF container used by Wing Commander
//! mesh (`.iff`) and texture (`.mat`) files.
//!
//! The container is a tree of tagged records. A [`Chunk`] is a leaf holding
//! primitive values; a [`Form`] holds other records. Record lengths are
//! big-endian, primitive values are little-endian, and children of a form
//! are padded to even sizes.
//!
//! ```rust
//! use wcp_iff::{Chunk, IffFile, Tag};
//!
//! let mut file = IffFile::new(Tag::new("TEST")?);
//! let mut fib = Chunk::new(Tag::new("FIB")?);
//! for n in [1, 1, 2, 3, 5, 8, 13] {
//!     fib.add_member(n)?;
//! }
//! file.root_form_mut().add_member(fib);
//! let bytes = file.serialize()?;
//! assert_eq!(&bytes[..4], b"FORM");
//! # Ok::<(), wcp_iff::Error>(())
//! ```
//!
//! On top of the container sits the MAT image schema, decoded by
//! [`read_mat`] and [`MatDecoder`] into RGBA pixels.

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use fallible_collections::TryReserveError;
use std::io::Read;

mod file;
pub mod mat;
mod palette;
mod reader;
mod record;
mod tags;
pub mod value;

pub use crate::file::IffFile;
pub use crate::mat::{MatDecoder, MatImage, MatPalette, PaletteOrigin, build_mat, read_mat, read_mat_file};
pub use crate::palette::{Palette, PaletteLocator, SiblingPaletteDir};
pub use crate::reader::{FormHeader, IffReader, RawChunk, RawRecord, Snapshot};
pub use crate::record::{Chunk, Form, Record};
pub use crate::tags::Tag;
pub use crate::value::{IntoValue, Value, ValueReader};

#[doc(hidden)]
pub type TryVec<T> = fallible_collections::TryVec<T>;

/// A trait to indicate a type can be infallibly converted to `u64`.
/// This should only be implemented for infallible conversions, so only unsigned types are valid.
trait ToU64 {
    fn to_u64(self) -> u64;
}

/// Statically verify that the platform `usize` can fit within a `u64`.
/// If the size won't fit on the given platform, this will fail at compile time, but if a type
/// which can fail `TryInto<usize>` is used, it may panic.
impl ToU64 for usize {
    fn to_u64(self) -> u64 {
        const _: () = assert!(std::mem::size_of::<usize>() <= std::mem::size_of::<u64>());
        self.try_into().ok().unwrap()
    }
}

/// A trait to indicate a type can be infallibly converted to `usize`.
/// This should only be implemented for infallible conversions, so only unsigned types are valid.
pub(crate) trait ToUsize {
    fn to_usize(self) -> usize;
}

macro_rules! impl_to_usize_from {
    ( $from_type:ty ) => {
        impl ToUsize for $from_type {
            fn to_usize(self) -> usize {
                const _: () = assert!(std::mem::size_of::<$from_type>() <= std::mem::size_of::<usize>());
                self.try_into().ok().unwrap()
            }
        }
    };
}

impl_to_usize_from!(u8);
impl_to_usize_from!(u16);
impl_to_usize_from!(u32);

/// Indicate the current offset (i.e., bytes already read) in a reader
trait Offset {
    fn offset(&self) -> u64;
}

/// Wraps a reader to track the current offset
struct OffsetReader<T> {
    reader: T,
    offset: u64,
}

impl<T> OffsetReader<T> {
    fn new(reader: T) -> Self {
        Self { reader, offset: 0 }
    }
}

impl<T> Offset for OffsetReader<T> {
    fn offset(&self) -> u64 {
        self.offset
    }
}

impl<T: Read> Read for OffsetReader<T> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let bytes_read = self.reader.read(buf)?;
        self.offset = self
            .offset
            .checked_add(bytes_read.to_u64())
            .ok_or(Error::InvalidData("total bytes read too large for offset type"))?;
        Ok(bytes_read)
    }
}

/// Describes codec failures.
///
/// Errors name the offending tag and byte offset where one is known, so
/// callers can report a malformed file precisely.
#[derive(Debug)]
pub enum Error {
    /// A value of the wrong primitive kind, or out of range, was given to a builder.
    TypeKind(&'static str),
    /// A tag name that is not 1 to 4 printable ASCII characters.
    InvalidTag,
    /// Input ended inside the record starting at `offset`.
    TruncatedInput { offset: u64 },
    /// A record did not fit the layout a schema expects.
    SchemaMismatch {
        expected: &'static str,
        found: Tag,
        offset: u64,
    },
    /// Structurally malformed container data.
    InvalidData(&'static str),
    /// A configured resource limit would be exceeded.
    ResourceLimitExceeded(&'static str),
    /// Out of memory
    OutOfMemory,
    /// Propagate underlying errors from `std::io`.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::TypeKind(s) | Self::InvalidData(s) | Self::ResourceLimitExceeded(s) => s,
            Self::InvalidTag => "tag must be 1 to 4 printable ASCII characters",
            Self::TruncatedInput { offset } => {
                return write!(f, "truncated input in record at byte {offset}");
            },
            Self::SchemaMismatch { expected, found, offset } => {
                return write!(f, "expected {expected}, found '{found}' at byte {offset}");
            },
            Self::OutOfMemory => "OOM",
            Self::Io(err) => return err.fmt(f),
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(_: std::num::TryFromIntError) -> Self {
        Self::ResourceLimitExceeded("length does not fit in 32 bits")
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::InvalidData(_) | Error::SchemaMismatch { .. } => std::io::ErrorKind::InvalidData,
            Error::TypeKind(_) | Error::InvalidTag => std::io::ErrorKind::InvalidInput,
            Error::TruncatedInput { .. } => std::io::ErrorKind::UnexpectedEof,
            Error::OutOfMemory => std::io::ErrorKind::OutOfMemory,
            Error::Io(io_err) => return io_err,
            _ => std::io::ErrorKind::Other,
        };
        Self::new(kind, err)
    }
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

/// Result shorthand using our Error enum.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Resource limits and validation options for decoding.
///
/// Limits are checked **before** allocations occur, so a file declaring a
/// huge chunk or absurd image dimensions fails cleanly instead of running
/// the process out of memory.
///
/// # Examples
///
/// ```rust
/// use wcp_iff::DecodeConfig;
///
/// // Default limits
/// let config = DecodeConfig::default();
///
/// // Strict limits for untrusted input
/// let config = DecodeConfig::default()
///     .with_peak_memory_limit(16_000_000)
///     .with_total_megapixels_limit(4);
///
/// // No limits
/// let config = DecodeConfig::unlimited();
/// ```
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    /// Maximum size in bytes of any single allocation driven by the input:
    /// one chunk payload, or one decoded pixel buffer.
    /// Default: 1GB (1,000,000,000 bytes)
    pub peak_memory_limit: Option<u64>,

    /// Maximum image size in megapixels.
    /// Default: 512 megapixels
    pub total_megapixels_limit: Option<u32>,

    /// Tolerate pixel and alpha chunks whose size does not match the
    /// image dimensions, truncating or leaving pixels untouched.
    /// Default: false (strict validation)
    pub lenient: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            peak_memory_limit: Some(1_000_000_000),
            total_megapixels_limit: Some(512),
            lenient: false,
        }
    }
}

impl DecodeConfig {
    /// Create a configuration with no resource limits.
    pub fn unlimited() -> Self {
        Self {
            peak_memory_limit: None,
            total_megapixels_limit: None,
            lenient: false,
        }
    }

    /// Set the peak memory limit in bytes
    pub fn with_peak_memory_limit(mut self, bytes: u64) -> Self {
        self.peak_memory_limit = Some(bytes);
        self
    }

    /// Set the image size limit in megapixels
    pub fn with_total_megapixels_limit(mut self, megapixels: u32) -> Self {
        self.total_megapixels_limit = Some(megapixels);
        self
    }

    /// Enable lenient parsing mode
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    fn validate_allocation(&self, bytes: u64) -> Result<()> {
        if let Some(limit) = self.peak_memory_limit {
            if bytes > limit {
                return Err(Error::ResourceLimitExceeded("peak memory limit exceeded"));
            }
        }

        Ok(())
    }

    fn validate_total_megapixels(&self, width: u32, height: u32) -> Result<()> {
        if let Some(limit) = self.total_megapixels_limit {
            let megapixels = u64::from(width)
                .checked_mul(u64::from(height))
                .ok_or(Error::InvalidData("dimension overflow"))?
                / 1_000_000;

            if megapixels > u64::from(limit) {
                return Err(Error::ResourceLimitExceeded("total megapixels limit exceeded"));
            }
        }

        Ok(())
    }
}

#[test]
fn offset_reader_counts_bytes() {
    let mut src = OffsetReader::new(&b"1234567890"[..]);
    let mut buf = [0u8; 4];
    src.read_exact(&mut buf).unwrap();
    assert_eq!(src.offset(), 4);
    let mut rest = std::vec::Vec::new();
    src.read_to_end(&mut rest).unwrap();
    assert_eq!(src.offset(), 10);
    assert_eq!(rest, b"567890");
}

#[test]
fn megapixel_limit() {
    let config = DecodeConfig::default().with_total_megapixels_limit(1);
    assert!(config.validate_total_megapixels(1000, 1000).is_ok());
    assert!(matches!(
        config.validate_total_megapixels(2000, 1000),
        Err(Error::ResourceLimitExceeded(_))
    ));
    assert!(DecodeConfig::unlimited().validate_total_megapixels(u32::MAX, u32::MAX).is_ok());
}

#[test]
fn allocation_limit() {
    let config = DecodeConfig::default().with_peak_memory_limit(100);
    assert!(config.validate_allocation(100).is_ok());
    assert!(config.validate_allocation(101).is_err());
}

#[test]
fn errors_name_tag_and_offset() {
    let err = Error::SchemaMismatch { expected: "BITM form", found: Tag::PAL, offset: 12 };
    assert_eq!(err.to_string(), "expected BITM form, found 'PAL ' at byte 12");
    let io: std::io::Error = Error::TruncatedInput { offset: 3 }.into();
    assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);
}
