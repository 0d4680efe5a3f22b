// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use byteorder::{BigEndian, WriteBytesExt};
use std::fmt;
use std::io::Write;

use crate::value::{IntoValue, Value};
use crate::{Result, Tag};

/// Size of a record header: 4-byte tag + 4-byte length.
pub(crate) const HEADER_SIZE: u64 = 8;

/// Leaf record: a tag and an ordered list of primitive values.
///
/// Serialized as `tag ++ u32_be(length) ++ members`. The length counts the
/// member bytes only. A chunk written on its own is never padded; padding
/// is added by the enclosing [`Form`].
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    tag: Tag,
    members: Vec<Value>,
}

impl Chunk {
    pub fn new(tag: Tag) -> Self {
        Self { tag, members: Vec::new() }
    }

    /// Create a chunk pre-populated with `members`, in order.
    pub fn with_members<I>(tag: Tag, members: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoValue,
    {
        let mut chunk = Self::new(tag);
        for member in members {
            chunk.add_member(member)?;
        }
        Ok(chunk)
    }

    /// Chunk holding `data` as its only member; no member when `data` is empty.
    pub(crate) fn from_payload(tag: Tag, data: Vec<u8>) -> Self {
        let members = if data.is_empty() { Vec::new() } else { vec![Value::Bytes(data)] };
        Self { tag, members }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Append a value. Fails with [`Error::TypeKind`](crate::Error::TypeKind)
    /// if the value cannot be stored in a chunk.
    pub fn add_member<V: IntoValue>(&mut self, value: V) -> Result<()> {
        self.members.push(value.into_value()?);
        Ok(())
    }

    pub fn clear_members(&mut self) {
        self.members.clear();
    }

    pub fn has_members(&self) -> bool {
        !self.members.is_empty()
    }

    pub fn members(&self) -> &[Value] {
        &self.members
    }

    /// Declared length: bytes of encoded members, without padding.
    pub fn serialized_length(&self) -> u64 {
        self.members.iter().map(Value::encoded_len).sum()
    }

    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<()> {
        dst.write_all(self.tag.as_bytes())?;
        dst.write_u32::<BigEndian>(u32::try_from(self.serialized_length())?)?;
        for member in &self.members {
            member.write_to(dst)?;
        }
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chunk '{}'", self.tag)
    }
}

/// Container record: a tag and an ordered list of child records.
///
/// Serialized as `"FORM" ++ u32_be(length) ++ tag ++ children`, where one
/// zero byte follows every child of odd total size. The length covers the
/// inner tag and every child including its padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    tag: Tag,
    members: Vec<Record>,
}

impl Form {
    pub fn new(tag: Tag) -> Self {
        Self { tag, members: Vec::new() }
    }

    pub fn with_members<I>(tag: Tag, members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Record>,
    {
        Self { tag, members: members.into_iter().map(Into::into).collect() }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn add_member(&mut self, record: impl Into<Record>) {
        self.members.push(record.into());
    }

    /// Remove and return the child at `index`, if there is one.
    pub fn remove_member(&mut self, index: usize) -> Option<Record> {
        (index < self.members.len()).then(|| self.members.remove(index))
    }

    pub fn clear_members(&mut self) {
        self.members.clear();
    }

    pub fn has_members(&self) -> bool {
        !self.members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[Record] {
        &self.members
    }

    pub fn member(&self, index: usize) -> Option<&Record> {
        self.members.get(index)
    }

    pub fn member_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.members.get_mut(index)
    }

    /// First child chunk tagged `tag`.
    pub fn find_chunk(&self, tag: Tag) -> Option<&Chunk> {
        self.members.iter().find_map(|m| match m {
            Record::Chunk(c) if c.tag == tag => Some(c),
            _ => None,
        })
    }

    /// First child form tagged `tag`.
    pub fn find_form(&self, tag: Tag) -> Option<&Form> {
        self.members.iter().find_map(|m| match m {
            Record::Form(f) if f.tag == tag => Some(f),
            _ => None,
        })
    }

    /// Declared length: 4 for the inner tag plus every padded child.
    pub fn serialized_length(&self) -> u64 {
        4 + self.members.iter().map(Record::padded_len).sum::<u64>()
    }

    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<()> {
        dst.write_all(Tag::FORM.as_bytes())?;
        dst.write_u32::<BigEndian>(u32::try_from(self.serialized_length())?)?;
        dst.write_all(self.tag.as_bytes())?;
        for member in &self.members {
            member.write_to(dst)?;
            if member.total_len() % 2 == 1 {
                dst.write_u8(0)?;
            }
        }
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Form '{}'", self.tag)
    }
}

/// Any record that can sit inside a [`Form`].
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Chunk(Chunk),
    Form(Form),
}

impl Record {
    pub fn tag(&self) -> Tag {
        match self {
            Self::Chunk(c) => c.tag(),
            Self::Form(f) => f.tag(),
        }
    }

    pub fn serialized_length(&self) -> u64 {
        match self {
            Self::Chunk(c) => c.serialized_length(),
            Self::Form(f) => f.serialized_length(),
        }
    }

    /// Bytes written by [`Record::serialize`]: header plus declared length.
    pub fn total_len(&self) -> u64 {
        HEADER_SIZE + self.serialized_length()
    }

    /// Bytes this record takes up inside a parent, alignment pad included.
    pub fn padded_len(&self) -> u64 {
        let len = self.total_len();
        len + len % 2
    }

    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<()> {
        match self {
            Self::Chunk(c) => c.write_to(dst),
            Self::Form(f) => f.write_to(dst),
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        match self {
            Self::Chunk(c) => c.serialize(),
            Self::Form(f) => f.serialize(),
        }
    }

    pub fn as_chunk(&self) -> Option<&Chunk> {
        match self {
            Self::Chunk(c) => Some(c),
            Self::Form(_) => None,
        }
    }

    pub fn as_form(&self) -> Option<&Form> {
        match self {
            Self::Form(f) => Some(f),
            Self::Chunk(_) => None,
        }
    }
}

impl From<Chunk> for Record {
    fn from(chunk: Chunk) -> Self {
        Self::Chunk(chunk)
    }
}

impl From<Form> for Record {
    fn from(form: Form) -> Self {
        Self::Form(form)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chunk(c) => c.fmt(f),
            Self::Form(form) => form.fmt(f),
        }
    }
}

#[cfg(test)]
fn tag(name: &str) -> Tag {
    Tag::new(name).unwrap()
}

#[cfg(test)]
fn fong() -> Form {
    let mut ponf = Chunk::new(tag("PONF"));
    ponf.add_member(12.345f32).unwrap();
    ponf.add_member("I am poncho man!").unwrap();
    ponf.add_member(12345).unwrap();
    let gone = Chunk::with_members(tag("GONE"), [42]).unwrap();
    Form::with_members(tag("FONG"), [Record::from(ponf), gone.into(), Form::new(tag("EMPT")).into()])
}

#[test]
fn chunk_lengths_and_bytes() {
    let form = fong();
    let ponf = form.member(0).and_then(Record::as_chunk).unwrap();
    let gone = form.find_chunk(tag("GONE")).unwrap();
    assert_eq!(ponf.serialized_length(), 25);
    assert_eq!(gone.serialized_length(), 4);
    assert_eq!(gone.serialize().unwrap(), b"GONE\x00\x00\x00\x04*\x00\x00\x00");
    assert_eq!(
        ponf.serialize().unwrap(),
        b"PONF\x00\x00\x00\x19\x1F\x85EAI am poncho man!\x0090\x00\x00"
    );
}

#[test]
fn standalone_odd_chunk_is_not_padded() {
    let odd = Chunk::with_members(tag("ODD"), ["ab"]).unwrap();
    assert_eq!(odd.serialize().unwrap(), b"ODD \x00\x00\x00\x03ab\x00");
}

#[test]
fn cleared_chunk_is_empty() {
    let mut void = Chunk::new(tag("VOID"));
    void.add_member(42).unwrap();
    assert!(void.has_members());
    void.clear_members();
    assert!(!void.has_members());
    assert_eq!(void.serialized_length(), 0);
    assert_eq!(void.serialize().unwrap(), b"VOID\x00\x00\x00\x00");
}

#[test]
fn form_padding_and_length() {
    let form = fong();
    assert_eq!(form.serialized_length(), 62);
    assert_eq!(
        form.serialize().unwrap(),
        &b"FORM\x00\x00\x00>FONGPONF\x00\x00\x00\x19\x1f\x85EAI am poncho \
           man!\x0090\x00\x00\x00GONE\x00\x00\x00\x04*\x00\x00\x00FORM\x00\
           \x00\x00\x04EMPT"[..]
    );
}

#[test]
fn empty_form() {
    let empt = Form::new(tag("EMPT"));
    assert_eq!(empt.serialized_length(), 4);
    assert_eq!(empt.serialize().unwrap(), b"FORM\x00\x00\x00\x04EMPT");
}

#[test]
fn odd_last_child_is_padded_inside_form() {
    let mut form = Form::new(tag("LAST"));
    form.add_member(Chunk::with_members(tag("ODD"), [&b"xyz"[..]]).unwrap());
    let bytes = form.serialize().unwrap();
    assert_eq!(form.serialized_length(), 4 + 12);
    assert_eq!(bytes.len() as u64, 8 + form.serialized_length());
    assert_eq!(bytes, b"FORM\x00\x00\x00\x10LASTODD \x00\x00\x00\x03xyz\x00");
}

#[test]
fn remove_members() {
    let mut form = fong();
    assert_eq!(form.member_count(), 3);
    assert!(form.remove_member(7).is_none());
    let removed = form.remove_member(0).unwrap();
    assert_eq!(removed.tag(), tag("PONF"));
    assert_eq!(form.member(0).unwrap().tag(), tag("GONE"));
    form.clear_members();
    assert!(!form.has_members());
    assert_eq!(form.serialize().unwrap(), b"FORM\x00\x00\x00\x04FONG");
}

#[test]
fn display_names() {
    assert_eq!(Form::new(tag("BOOK")).to_string(), "Form 'BOOK'");
    assert_eq!(Chunk::new(tag("SOCK")).to_string(), "Chunk 'SOCK'");
}
