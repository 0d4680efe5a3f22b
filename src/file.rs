// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;
use std::io::Write;
use std::path::Path;

use crate::{Error, Form, Result, Tag};

/// A complete IFF file: one root form plus an optional trailing comment.
///
/// The comment is written after the root form as raw ASCII, unterminated
/// and not counted in any length field. Readers stop at the end of the
/// root form and never see it.
#[derive(Debug, Clone, PartialEq)]
pub struct IffFile {
    root: Form,
    comment: Option<String>,
}

impl IffFile {
    /// Empty file whose root form is tagged `tag` (e.g. `DETA` for meshes).
    pub fn new(tag: Tag) -> Self {
        Self::from_form(Form::new(tag))
    }

    pub fn from_form(root: Form) -> Self {
        Self { root, comment: None }
    }

    pub fn root_form(&self) -> &Form {
        &self.root
    }

    pub fn root_form_mut(&mut self) -> &mut Form {
        &mut self.root
    }

    pub fn into_root_form(self) -> Form {
        self.root
    }

    pub fn set_comment(&mut self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        if !text.is_ascii() {
            return Err(Error::TypeKind("comment is not ASCII"));
        }
        self.comment = Some(text);
        Ok(())
    }

    pub fn clear_comment(&mut self) {
        self.comment = None;
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<()> {
        self.root.write_to(dst)?;
        if let Some(comment) = &self.comment {
            dst.write_all(comment.as_bytes())?;
        }
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Write the file to `path`, replacing whatever is there.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.serialize()?;
        debug!("writing {} bytes of '{}' to {}", bytes.len(), self.root.tag(), path.display());
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
fn fib_file() -> IffFile {
    let mut file = IffFile::new(Tag::new("TEST").unwrap());
    let fib = crate::Chunk::with_members(Tag::new("FIB").unwrap(), [1, 1, 2, 3, 5, 8, 13]).unwrap();
    file.root_form_mut().add_member(fib);
    file.set_comment(
        "The FIB chunk represents the first 7 numbers of a fibonacci sequence, \
         as little-endian 32-bit integers.",
    )
    .unwrap();
    file
}

#[test]
fn comment_trails_root_form() {
    let expected: &[u8] = b"FORM\x00\x00\x00(TESTFIB \x00\x00\x00\x1C\x01\x00\x00\x00\
        \x01\x00\x00\x00\x02\x00\x00\x00\x03\x00\x00\x00\x05\x00\x00\x00\
        \x08\x00\x00\x00\x0D\x00\x00\x00The FIB chunk represents the \
        first 7 numbers of a fibonacci sequence, as little-endian \
        32-bit integers.";
    assert_eq!(fib_file().serialize().unwrap(), expected);
}

#[test]
fn comment_is_not_counted() {
    let mut file = fib_file();
    let with_comment = file.serialize().unwrap();
    file.clear_comment();
    let without = file.serialize().unwrap();
    assert_eq!(with_comment[..8], without[..8]);
    assert!(with_comment.len() > without.len());
    assert_eq!(without.len() as u64, 8 + file.root_form().serialized_length());
}

#[test]
fn non_ascii_comment_is_rejected() {
    let mut file = IffFile::new(Tag::new("TEST").unwrap());
    assert!(matches!(file.set_comment("naïve"), Err(Error::TypeKind(_))));
    assert_eq!(file.comment(), None);
}
