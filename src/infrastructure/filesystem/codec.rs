//! Binary layout of the index and keyword files.
//!
//! Both files share one frame:
//!
//! ```text
//! magic   [u8; 4]
//! version u16
//! count   u32
//! records ...
//! ```
//!
//! Integers are little-endian, strings are a `u32` byte length followed by
//! UTF-8 bytes. An index record is `path, name, remote, access_count (u64),
//! last_access (i64)`, with an empty `path` for default-location
//! repositories. A keyword record is `keyword, timestamp (i64)`.

use std::collections::BTreeMap;
use thiserror::Error;

pub const INDEX_MAGIC: [u8; 4] = *b"GRVI";
pub const KEYWORD_MAGIC: [u8; 4] = *b"GRVK";
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 4;
/// 最小レコード長（空文字列3つ + u64 + i64）
const MIN_INDEX_RECORD_LEN: usize = 4 * 3 + 8 + 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of data at byte {offset}, expected {wanted} more byte(s)")]
    UnexpectedEof { offset: usize, wanted: usize },

    #[error("unrecognized file header {found:?}")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),

    #[error("field {field} at byte {offset} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str, offset: usize },

    #[error("{0} unexpected trailing byte(s)")]
    TrailingBytes(usize),
}

/// One repository as it is laid out on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub path: String,
    pub name: String,
    pub remote: String,
    pub access_count: u64,
    pub last_access: i64,
}

struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    fn new(magic: [u8; 4], count: usize) -> Self {
        let mut encoder = Self {
            buf: Vec::with_capacity(HEADER_LEN + count * 64),
        };
        encoder.buf.extend_from_slice(&magic);
        encoder.buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        encoder.put_len(count);
        encoder
    }

    fn put_len(&mut self, len: usize) {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        self.buf.extend_from_slice(&len.to_le_bytes());
    }

    fn put_str(&mut self, value: &str) {
        self.put_len(value.len());
        self.buf.extend_from_slice(value.as_bytes());
    }

    fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }
}

struct Decoder<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.data.len() - self.offset;
        if remaining < len {
            return Err(DecodeError::UnexpectedEof {
                offset: self.offset,
                wanted: len - remaining,
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// ヘッダを検証し、レコード数を返す
    fn header(&mut self, magic: [u8; 4]) -> Result<u32, DecodeError> {
        let found = self.array::<4>()?;
        if found != magic {
            return Err(DecodeError::BadMagic { found });
        }
        let version = u16::from_le_bytes(self.array()?);
        if version != FORMAT_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn str(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let len = u32::from_le_bytes(self.array()?) as usize;
        let offset = self.offset;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { field, offset })
    }

    fn u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// 宣言されたレコード数を信用しすぎないための事前確保量
    fn capacity_for(&self, count: u32, min_record: usize) -> usize {
        (count as usize).min(self.remaining() / min_record)
    }

    fn finish(self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }
}

pub fn encode_index(records: &[IndexRecord]) -> Vec<u8> {
    let mut encoder = Encoder::new(INDEX_MAGIC, records.len());
    for record in records {
        encoder.put_str(&record.path);
        encoder.put_str(&record.name);
        encoder.put_str(&record.remote);
        encoder.put_u64(record.access_count);
        encoder.put_i64(record.last_access);
    }
    encoder.buf
}

pub fn decode_index(data: &[u8]) -> Result<Vec<IndexRecord>, DecodeError> {
    let mut decoder = Decoder::new(data);
    let count = decoder.header(INDEX_MAGIC)?;
    let mut records = Vec::with_capacity(decoder.capacity_for(count, MIN_INDEX_RECORD_LEN));
    for _ in 0..count {
        records.push(IndexRecord {
            path: decoder.str("path")?,
            name: decoder.str("name")?,
            remote: decoder.str("remote")?,
            access_count: decoder.u64()?,
            last_access: decoder.i64()?,
        });
    }
    decoder.finish()?;
    Ok(records)
}

pub fn encode_keywords(keywords: &BTreeMap<String, i64>) -> Vec<u8> {
    let mut encoder = Encoder::new(KEYWORD_MAGIC, keywords.len());
    for (keyword, timestamp) in keywords {
        encoder.put_str(keyword);
        encoder.put_i64(*timestamp);
    }
    encoder.buf
}

pub fn decode_keywords(data: &[u8]) -> Result<BTreeMap<String, i64>, DecodeError> {
    let mut decoder = Decoder::new(data);
    let count = decoder.header(KEYWORD_MAGIC)?;
    let mut keywords = BTreeMap::new();
    for _ in 0..count {
        let keyword = decoder.str("keyword")?;
        let timestamp = decoder.i64()?;
        keywords.insert(keyword, timestamp);
    }
    decoder.finish()?;
    Ok(keywords)
}
