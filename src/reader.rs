// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, trace};
use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::record::HEADER_SIZE;
use crate::value::ValueReader;
use crate::{Chunk, DecodeConfig, Error, Form, Offset, OffsetReader, Result, Tag, ToUsize, TryVec};

/// Forms nested deeper than this are refused by [`IffReader::read_form`].
const MAX_FORM_DEPTH: usize = 64;

/// Header of a container record.
///
/// Reading one advances the cursor past the 12 header bytes only; the
/// children follow and must be read or skipped by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormHeader {
    /// Inner tag, e.g. `BITM`.
    pub tag: Tag,
    /// Declared length: inner tag plus all padded children.
    pub length: u32,
    /// Absolute offset of the `FORM` bytes.
    pub offset: u64,
}

impl FormHeader {
    /// `"FORM"` + length + inner tag
    pub const SIZE: u64 = 12;

    /// Offset just past the last byte of the form's content.
    pub fn end(&self) -> u64 {
        self.offset + HEADER_SIZE + u64::from(self.length)
    }

    /// Bytes of children, i.e. the declared length minus the inner tag.
    pub fn content_len(&self) -> u64 {
        u64::from(self.length).saturating_sub(4)
    }
}

/// A leaf record with its payload read into memory.
#[derive(Debug)]
pub struct RawChunk {
    pub tag: Tag,
    pub length: u32,
    /// Absolute offset of the tag bytes.
    pub offset: u64,
    pub data: TryVec<u8>,
}

impl RawChunk {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decoder over the payload, reporting absolute offsets.
    pub fn values(&self) -> ValueReader<'_> {
        ValueReader::at(&self.data, self.offset + HEADER_SIZE)
    }

    /// Convert into a builder chunk holding the payload as one raw member.
    pub fn into_chunk(self) -> Chunk {
        Chunk::from_payload(self.tag, self.data.to_vec())
    }
}

/// One record as seen by [`IffReader::read_header`].
#[derive(Debug)]
pub enum RawRecord {
    Form(FormHeader),
    Chunk(RawChunk),
}

impl RawRecord {
    pub fn tag(&self) -> Tag {
        match self {
            Self::Form(h) => h.tag,
            Self::Chunk(c) => c.tag,
        }
    }

    pub fn length(&self) -> u32 {
        match self {
            Self::Form(h) => h.length,
            Self::Chunk(c) => c.length,
        }
    }

    pub fn offset(&self) -> u64 {
        match self {
            Self::Form(h) => h.offset,
            Self::Chunk(c) => c.offset,
        }
    }

    /// Bytes the record occupies in its parent, alignment pad included.
    pub fn padded_len(&self) -> u64 {
        let len = HEADER_SIZE + u64::from(self.length());
        len + len % 2
    }

    pub fn is_form(&self) -> bool {
        matches!(self, Self::Form(_))
    }
}

/// A saved cursor position, see [`IffReader::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    offset: u64,
    position: u64,
}

/// Sequential, schema-free decoder of IFF records.
///
/// The reader only knows two shapes: `FORM` headers and chunks. It has no
/// idea which children belong to which form; callers track that with
/// [`FormHeader::end`] against [`IffReader::offset`].
///
/// Iterating yields every record in file order (a pre-order walk of the
/// tree) until a clean end of input, and stops after the first error.
pub struct IffReader<T> {
    src: OffsetReader<T>,
    config: DecodeConfig,
    fused: bool,
}

impl<'a> IffReader<Cursor<&'a [u8]>> {
    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self::new(Cursor::new(data))
    }
}

impl<T: Read> IffReader<T> {
    pub fn new(src: T) -> Self {
        Self::with_config(src, &DecodeConfig::default())
    }

    /// Reader that refuses chunk payloads over `config.peak_memory_limit`.
    pub fn with_config(src: T, config: &DecodeConfig) -> Self {
        Self { src: OffsetReader::new(src), config: config.clone(), fused: false }
    }

    /// Absolute offset of the cursor.
    pub fn offset(&self) -> u64 {
        self.src.offset()
    }

    pub fn get_ref(&self) -> &T {
        &self.src.reader
    }

    pub fn into_inner(self) -> T {
        self.src.reader
    }

    /// Read the next record header.
    ///
    /// Returns `None` when the input ends cleanly on a record boundary.
    /// A `FORM` yields its header and leaves the children unread. Any other
    /// tag is a chunk: its payload is read in full, then the pad byte that
    /// follows an odd-sized payload is consumed.
    pub fn read_header(&mut self) -> Result<Option<RawRecord>> {
        let offset = self.offset();
        let Some(tag) = self.read_tag()? else {
            return Ok(None);
        };
        let length = self.be_u32(offset)?;

        if tag.is_form() {
            if length < 4 {
                return Err(Error::InvalidData("form length shorter than its tag"));
            }
            let mut inner = [0u8; 4];
            self.read_exact_at(&mut inner, offset)?;
            let header = FormHeader { tag: Tag::from_bytes(inner), length, offset };
            trace!("{header:?}");
            return Ok(Some(RawRecord::Form(header)));
        }

        self.config.validate_allocation(u64::from(length))?;
        let mut data = std::vec::Vec::new();
        data.try_reserve_exact(length.to_usize()).map_err(|_| Error::OutOfMemory)?;
        (&mut self.src).take(u64::from(length)).read_to_end(&mut data)?;
        if data.len() != length.to_usize() {
            return Err(Error::TruncatedInput { offset });
        }
        self.skip_pad(length)?;
        trace!("chunk '{tag}' length {length} at {offset}");
        Ok(Some(RawRecord::Chunk(RawChunk { tag, length, offset, data: data.into() })))
    }

    /// Move past the next record without reading chunk payloads.
    ///
    /// A `FORM` is skipped by its 12 header bytes only, so the cursor lands
    /// on its first child. A chunk is skipped whole, pad byte included.
    pub fn skip_data(&mut self) -> Result<()> {
        let offset = self.offset();
        let tag = self.read_tag()?.ok_or(Error::TruncatedInput { offset })?;
        let length = self.be_u32(offset)?;

        if tag.is_form() {
            if length < 4 {
                return Err(Error::InvalidData("form length shorter than its tag"));
            }
            let mut inner = [0u8; 4];
            self.read_exact_at(&mut inner, offset)?;
            debug!("form '{}' header (skipped)", Tag::from_bytes(inner));
            return Ok(());
        }

        debug!("chunk '{tag}' length {length} (skipped)");
        self.skip_bytes(u64::from(length), offset)?;
        self.skip_pad(length)
    }

    /// Skip whatever remains unread of the form described by `header`.
    pub fn skip_form_content(&mut self, header: &FormHeader) -> Result<()> {
        let remain = header
            .end()
            .checked_sub(self.offset())
            .ok_or(Error::InvalidData("reader is past the end of the form"))?;
        debug!("remain {remain} (skipped) in {header:?}");
        self.skip_bytes(remain, header.offset)?;
        self.skip_pad(header.length)
    }

    /// Decode the next record, which must be a form, with all descendants.
    ///
    /// Chunk payloads become a single raw-bytes member. Anything after the
    /// form, such as a file comment, is left unread.
    pub fn read_form(&mut self) -> Result<Option<Form>> {
        match self.read_header()? {
            None => Ok(None),
            Some(RawRecord::Form(header)) => self.read_form_content(&header).map(Some),
            Some(RawRecord::Chunk(c)) => Err(Error::SchemaMismatch {
                expected: "FORM",
                found: c.tag,
                offset: c.offset,
            }),
        }
    }

    /// Decode the children of a form whose header was just read.
    pub fn read_form_content(&mut self, header: &FormHeader) -> Result<Form> {
        self.read_children(header, 0)
    }

    fn read_children(&mut self, header: &FormHeader, depth: usize) -> Result<Form> {
        if depth >= MAX_FORM_DEPTH {
            return Err(Error::ResourceLimitExceeded("form nesting too deep"));
        }
        let mut form = Form::new(header.tag);
        let end = header.end();
        while self.offset() < end {
            let record = self.read_header()?.ok_or(Error::TruncatedInput { offset: header.offset })?;
            match record {
                RawRecord::Form(child) => form.add_member(self.read_children(&child, depth + 1)?),
                RawRecord::Chunk(chunk) => form.add_member(chunk.into_chunk()),
            }
        }
        if self.offset() > end {
            return Err(Error::InvalidData("child record overruns its form"));
        }
        self.skip_pad(header.length)?;
        Ok(form)
    }

    /// Fill `buf` as far as the input allows; returns the byte count.
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.src.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    fn read_tag(&mut self) -> Result<Option<Tag>> {
        let offset = self.offset();
        let mut buf = [0u8; 4];
        match self.read_up_to(&mut buf)? {
            0 => Ok(None),
            4 => Ok(Some(Tag::from_bytes(buf))),
            _ => Err(Error::TruncatedInput { offset }),
        }
    }

    fn read_exact_at(&mut self, buf: &mut [u8], record: u64) -> Result<()> {
        self.src.read_exact(buf).map_err(|e| truncated(e, record))
    }

    fn be_u32(&mut self, record: u64) -> Result<u32> {
        self.src.read_u32::<BigEndian>().map_err(|e| truncated(e, record))
    }

    /// Skip a number of bytes that we don't care to parse.
    fn skip_bytes(&mut self, bytes: u64, record: u64) -> Result<()> {
        let copied = std::io::copy(&mut (&mut self.src).take(bytes), &mut std::io::sink())?;
        if copied != bytes {
            return Err(Error::TruncatedInput { offset: record });
        }
        Ok(())
    }

    /// Consume the alignment byte after an odd-sized record. A pad missing
    /// at the very end of the input is tolerated.
    fn skip_pad(&mut self, length: u32) -> Result<()> {
        if length % 2 == 1 {
            let mut pad = [0u8; 1];
            if self.read_up_to(&mut pad)? == 0 {
                trace!("no pad byte at end of input ({})", self.offset());
            }
        }
        Ok(())
    }
}

impl<T: Read + Seek> IffReader<T> {
    /// Save the cursor so it can be rewound with [`IffReader::restore`].
    pub fn snapshot(&mut self) -> Result<Snapshot> {
        let position = self.src.reader.stream_position()?;
        Ok(Snapshot { offset: self.offset(), position })
    }

    pub fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        self.src.reader.seek(SeekFrom::Start(snapshot.position))?;
        self.src.offset = snapshot.offset;
        self.fused = false;
        Ok(())
    }
}

impl<T: Read> Iterator for IffReader<T> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        let next = self.read_header().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.fused = true;
        }
        next
    }
}

fn truncated(err: std::io::Error, record: u64) -> Error {
    match err.kind() {
        std::io::ErrorKind::UnexpectedEof => Error::TruncatedInput { offset: record },
        _ => Error::Io(err),
    }
}

#[cfg(test)]
fn sample() -> std::vec::Vec<u8> {
    let tag = |name| Tag::new(name).unwrap();
    let mut root = Form::new(tag("TEST"));
    root.add_member(Chunk::with_members(tag("DESC"), ["Fibonacci sequence"]).unwrap());
    let mut fib = Form::new(tag("FIB"));
    fib.add_member(Chunk::with_members(tag("NUM"), [7]).unwrap());
    fib.add_member(Chunk::with_members(tag("FIB"), [1, 1, 2, 3, 5, 8, 13]).unwrap());
    root.add_member(fib);
    root.serialize().unwrap()
}

#[test]
fn skips_form_headers_and_odd_chunks() {
    let data = sample();
    let mut r = IffReader::from_bytes(&data);
    assert_eq!(r.offset(), 0);
    r.skip_data().unwrap();
    assert_eq!(r.offset(), 12);
    r.skip_data().unwrap();
    assert_eq!(r.offset(), 40);
}

#[test]
fn iterates_in_file_order() {
    let data = sample();
    let records: std::vec::Vec<_> = IffReader::from_bytes(&data).map(Result::unwrap).collect();
    let tags: std::vec::Vec<_> = records.iter().map(|r| (r.is_form(), r.tag().to_string())).collect();
    assert_eq!(tags, [
        (true, "TEST".to_string()),
        (false, "DESC".to_string()),
        (true, "FIB ".to_string()),
        (false, "NUM ".to_string()),
        (false, "FIB ".to_string()),
    ]);
    match &records[1] {
        RawRecord::Chunk(c) => {
            assert_eq!(c.length, 19);
            assert_eq!(c.values().read_cstring().unwrap(), "Fibonacci sequence");
        },
        other => panic!("unexpected {other:?}"),
    }
    match &records[2] {
        RawRecord::Form(h) => {
            assert_eq!(h.offset, 40);
            assert_eq!(h.end(), data.len() as u64);
        },
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn skip_whole_form() {
    let data = sample();
    let mut r = IffReader::from_bytes(&data);
    let Some(RawRecord::Form(root)) = r.read_header().unwrap() else { panic!("no root") };
    r.skip_data().unwrap();
    let Some(RawRecord::Form(fib)) = r.read_header().unwrap() else { panic!("no FIB form") };
    assert_eq!(fib.content_len(), 12 + 36);
    r.skip_form_content(&fib).unwrap();
    assert_eq!(r.offset(), root.end());
    assert!(r.read_header().unwrap().is_none());
}

#[test]
fn read_form_rebuilds_tree() {
    let data = sample();
    let form = IffReader::from_bytes(&data).read_form().unwrap().unwrap();
    assert_eq!(form.member_count(), 2);
    let fib = form.find_form(Tag::new("FIB").unwrap()).unwrap();
    let num = fib.find_chunk(Tag::new("NUM").unwrap()).unwrap();
    assert_eq!(num.members(), &[crate::Value::Bytes(vec![7, 0, 0, 0])]);
    // Raw members serialize to the same bytes as the typed originals.
    assert_eq!(form.serialize().unwrap(), data);
}

#[test]
fn truncated_chunk_reports_record_offset() {
    let data = sample();
    let mut r = IffReader::from_bytes(&data[..30]);
    r.skip_data().unwrap();
    match r.read_header() {
        Err(Error::TruncatedInput { offset }) => assert_eq!(offset, 12),
        other => panic!("unexpected {other:?}"),
    }
    let mut r = IffReader::from_bytes(&data[..2]);
    assert!(matches!(r.read_header(), Err(Error::TruncatedInput { offset: 0 })));
    assert!(matches!(IffReader::from_bytes(&data[..14]).skip_data(), Ok(())));
    let mut r = IffReader::from_bytes(&data[..14]);
    r.skip_data().unwrap();
    assert!(matches!(r.skip_data(), Err(Error::TruncatedInput { offset: 12 })));
}

#[test]
fn missing_final_pad_is_tolerated() {
    let chunk = Chunk::with_members(Tag::new("ODD").unwrap(), ["ab"]).unwrap().serialize().unwrap();
    let mut r = IffReader::from_bytes(&chunk);
    let Some(RawRecord::Chunk(c)) = r.read_header().unwrap() else { panic!("no chunk") };
    assert_eq!(c.data(), b"ab\0");
    assert!(r.read_header().unwrap().is_none());
}

#[test]
fn short_form_length_is_invalid() {
    let data = b"FORM\x00\x00\x00\x02AB";
    assert!(matches!(IffReader::from_bytes(data).read_header(), Err(Error::InvalidData(_))));
    assert!(matches!(IffReader::from_bytes(data).skip_data(), Err(Error::InvalidData(_))));
}

#[test]
fn chunk_limit_checked_before_allocation() {
    let data = b"HUGE\x7f\xff\xff\xff";
    let config = DecodeConfig::default().with_peak_memory_limit(1024);
    let mut r = IffReader::with_config(&data[..], &config);
    assert!(matches!(r.read_header(), Err(Error::ResourceLimitExceeded(_))));
}

#[test]
fn snapshot_rewinds() {
    let data = sample();
    let mut r = IffReader::from_bytes(&data);
    r.skip_data().unwrap();
    let snap = r.snapshot().unwrap();
    let first = r.read_header().unwrap().unwrap();
    r.restore(snap).unwrap();
    assert_eq!(r.offset(), 12);
    let again = r.read_header().unwrap().unwrap();
    assert_eq!(first.tag(), again.tag());
    assert_eq!(first.offset(), again.offset());
}

#[test]
fn iterator_stops_after_error() {
    let data = b"ABCD\x00\x00\x00\x10abc";
    let mut r = IffReader::from_bytes(data);
    assert!(matches!(r.next(), Some(Err(Error::TruncatedInput { offset: 0 }))));
    assert!(r.next().is_none());
}
