// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use arrayvec::ArrayVec;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Four-byte record identifier.
///
/// Tags built from names are validated: 1 to 4 printable ASCII characters,
/// right-padded with spaces (`"FIB"` becomes `"FIB "`). Tags read from a
/// file are kept verbatim, whatever bytes they hold.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag([u8; 4]);

macro_rules! tag_database {
    ($($(#[$attr:meta])* $name:ident $value:expr),* $(,)?) => {
        impl Tag {
            $(
                $(#[$attr])*
                pub const $name: Tag = Tag(*$value);
            )*
        }

        /// Human-readable name of a well-known tag, if it is one.
        pub(crate) fn known_name(tag: Tag) -> Option<&'static str> {
            match tag {
                $(Tag::$name => Some(stringify!($name)),)*
                _ => None,
            }
        }
    };
}

tag_database!(
    /// Header of every container record.
    FORM b"FORM",
    /// Root form of a MAT image.
    BITM b"BITM",
    /// The single frame form inside `BITM`.
    FRAM b"FRAM",
    /// Image dimensions: two little-endian 32-bit integers.
    INFO b"INFO",
    /// Palette form, inline in a MAT or the root of a palette file.
    PAL b"PAL ",
    /// 256 RGB triples.
    CMAP b"CMAP",
    /// Name of an external resource, as a NUL-terminated string.
    NAME b"NAME",
    /// One palette index per pixel.
    PXLS b"PXLS",
    /// One inverted alpha value per pixel.
    ALPH b"ALPH",
);

impl Tag {
    /// Build a tag from a name of 1 to 4 printable ASCII characters.
    pub fn new(name: &str) -> Result<Self> {
        let mut bytes = ArrayVec::<u8, 4>::new();
        for &b in name.as_bytes() {
            if !(b' '..=b'~').contains(&b) {
                return Err(Error::InvalidTag);
            }
            bytes.try_push(b).map_err(|_| Error::InvalidTag)?;
        }
        if bytes.is_empty() {
            return Err(Error::InvalidTag);
        }
        while !bytes.is_full() {
            bytes.push(b' ');
        }
        bytes.into_inner().map(Tag).map_err(|_| Error::InvalidTag)
    }

    /// Wrap four raw bytes without validation.
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Tag(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub const fn is_form(&self) -> bool {
        matches!(self.0, [b'F', b'O', b'R', b'M'])
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Tag {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl From<[u8; 4]> for Tag {
    fn from(bytes: [u8; 4]) -> Self {
        Tag(bytes)
    }
}

impl From<u32> for Tag {
    fn from(value: u32) -> Self {
        Tag(value.to_be_bytes())
    }
}

impl PartialEq<[u8; 4]> for Tag {
    fn eq(&self, other: &[u8; 4]) -> bool {
        self.0 == *other
    }
}

impl PartialEq<&[u8; 4]> for Tag {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        self.0 == **other
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if (b' '..=b'~').contains(&b) {
                fmt::Write::write_char(f, b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match known_name(*self) {
            Some(name) => write!(f, "Tag::{name}"),
            None => write!(f, "Tag({:?})", self.to_string()),
        }
    }
}

#[test]
fn short_names_are_space_padded() {
    assert_eq!(Tag::new("FIB").unwrap(), b"FIB ");
    assert_eq!(Tag::new("PAL").unwrap(), Tag::PAL);
    assert_eq!(Tag::new("A").unwrap().as_bytes(), b"A   ");
}

#[test]
fn invalid_names_are_rejected() {
    assert!(matches!(Tag::new(""), Err(Error::InvalidTag)));
    assert!(matches!(Tag::new("TOOLONG"), Err(Error::InvalidTag)));
    assert!(matches!(Tag::new("\x02Aéâ"), Err(Error::InvalidTag)));
    assert!(matches!(Tag::new("AB\tC"), Err(Error::InvalidTag)));
}

#[test]
fn raw_tags_display_escaped() {
    assert_eq!(Tag::from_bytes(*b"PAL ").to_string(), "PAL ");
    assert_eq!(Tag::from_bytes([b'A', 0, b'B', 0xff]).to_string(), "A\\x00B\\xff");
    assert_eq!(format!("{:?}", Tag::CMAP), "Tag::CMAP");
    assert_eq!(format!("{:?}", Tag::new("GONE").unwrap()), "Tag(\"GONE\")");
}
