//! Partial reading of remote zip archives.
//!
//! Installer jars run to tens of megabytes but the files we need out of
//! them are tiny. Instead of downloading the whole archive this module
//! fetches the end-of-central-directory record, the central directory
//! and finally just the compressed bytes of the wanted entries, each via
//! a byte-range request.

pub mod remote;

use std::io::Read;

use metagen_core::Error;

pub use remote::{HttpRangeSource, RangeSource};

const LOCAL_SIG: &[u8; 4] = b"PK\x03\x04";
const CENTRAL_SIG: &[u8; 4] = b"PK\x01\x02";
const EOCD_SIG: &[u8; 4] = b"PK\x05\x06";
const ZIP64_EOCD_SIG: &[u8; 4] = b"PK\x06\x06";
const ZIP64_LOCATOR_SIG: &[u8; 4] = b"PK\x06\x07";

const LOCAL_HEADER_LEN: u64 = 30;
const EOCD_LEN: usize = 22;
const ZIP64_LOCATOR_LEN: usize = 20;
const ZIP64_EOCD_LEN: u64 = 56;

/// Longest possible archive tail: EOCD with a maximal comment plus the
/// zip64 locator in front of it.
const TAIL_LEN: u64 = EOCD_LEN as u64 + u16::MAX as u64 + ZIP64_LOCATOR_LEN as u64;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

/// One entry of a remote archive's central directory.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    method: u16,
    compressed_size: u64,
    uncompressed_size: u64,
    header_offset: u64,
}

/// A remote zip archive read piecemeal through a [`RangeSource`].
pub struct RemoteArchive<S: RangeSource> {
    source: S,
}

impl<S: RangeSource> RemoteArchive<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    fn malformed(&self, reason: String) -> Error {
        Error::Archive { url: self.source.describe().to_string(), reason }
    }

    /// Fetch and parse the archive's central directory.
    pub async fn entries(&self) -> Result<Vec<ArchiveEntry>, Error> {
        let (tail, total) = self.source.read_suffix(TAIL_LEN).await?;
        let tail_offset = total.checked_sub(tail.len() as u64).ok_or_else(|| {
            self.malformed("reported total size smaller than the returned tail".into())
        })?;

        let eocd_at = find_eocd(&tail).ok_or_else(|| {
            self.malformed("no end-of-central-directory record found".into())
        })?;
        let mut count = le16(&tail, eocd_at + 10).map_err(|r| self.malformed(r))? as u64;
        let mut cd_size = le32(&tail, eocd_at + 12).map_err(|r| self.malformed(r))? as u64;
        let mut cd_offset = le32(&tail, eocd_at + 16).map_err(|r| self.malformed(r))? as u64;

        // Saturated fields mean the real values live in a zip64 record.
        if count == u16::MAX as u64 || cd_size == u32::MAX as u64 || cd_offset == u32::MAX as u64 {
            let locator_at = eocd_at.checked_sub(ZIP64_LOCATOR_LEN).ok_or_else(|| {
                self.malformed("zip64 archive without a zip64 locator".into())
            })?;
            if &tail[locator_at..locator_at + 4] != ZIP64_LOCATOR_SIG {
                return Err(self.malformed("zip64 locator signature mismatch".into()));
            }
            let record_offset = le64(&tail, locator_at + 8).map_err(|r| self.malformed(r))?;

            let record = if record_offset >= tail_offset {
                tail.slice((record_offset - tail_offset) as usize..)
            } else {
                self.source.read_range(record_offset, ZIP64_EOCD_LEN).await?
            };
            if record.len() < 4 || &record[..4] != ZIP64_EOCD_SIG {
                return Err(self.malformed("zip64 end-of-central-directory signature mismatch".into()));
            }
            count = le64(&record, 32).map_err(|r| self.malformed(r))?;
            cd_size = le64(&record, 40).map_err(|r| self.malformed(r))?;
            cd_offset = le64(&record, 48).map_err(|r| self.malformed(r))?;
        }

        let directory = if cd_offset >= tail_offset {
            let start = (cd_offset - tail_offset) as usize;
            let end = start + cd_size as usize;
            if end > tail.len() {
                return Err(self.malformed("central directory extends past the end of the file".into()));
            }
            tail.slice(start..end)
        } else {
            self.source.read_range(cd_offset, cd_size).await?
        };

        parse_central_directory(&directory, count).map_err(|r| self.malformed(r))
    }

    /// Download and decode a single entry as UTF-8 text.
    pub async fn read_entry(&self, entry: &ArchiveEntry) -> Result<String, Error> {
        let header = self.source.read_range(entry.header_offset, LOCAL_HEADER_LEN).await?;
        if header.len() < LOCAL_HEADER_LEN as usize || &header[..4] != LOCAL_SIG {
            return Err(self.malformed(format!("local header signature mismatch for '{}'", entry.name)));
        }
        let name_len = le16(&header, 26).map_err(|r| self.malformed(r))? as u64;
        let extra_len = le16(&header, 28).map_err(|r| self.malformed(r))? as u64;

        let data_offset = entry.header_offset + LOCAL_HEADER_LEN + name_len + extra_len;
        let data = if entry.compressed_size == 0 {
            bytes::Bytes::new()
        } else {
            self.source.read_range(data_offset, entry.compressed_size).await?
        };

        let raw = match entry.method {
            METHOD_STORED => data.to_vec(),
            METHOD_DEFLATED => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                flate2::read::DeflateDecoder::new(&data[..])
                    .read_to_end(&mut out)
                    .map_err(|err| self.malformed(format!("failed to inflate '{}': {err}", entry.name)))?;
                out
            }
            method => {
                return Err(self.malformed(format!(
                    "unsupported compression method {method} for '{}'",
                    entry.name
                )));
            }
        };

        String::from_utf8(raw)
            .map_err(|_| self.malformed(format!("entry '{}' is not valid UTF-8", entry.name)))
    }
}

/// Locate the EOCD record by scanning backwards for its signature. The
/// comment length must place the record flush with the end of the data,
/// which rules out a signature occurring inside the comment itself.
fn find_eocd(tail: &[u8]) -> Option<usize> {
    let last = tail.len().checked_sub(EOCD_LEN)?;
    (0..=last).rev().find(|&at| {
        &tail[at..at + 4] == EOCD_SIG
            && le16(tail, at + 20).is_ok_and(|comment| at + EOCD_LEN + comment as usize == tail.len())
    })
}

fn parse_central_directory(data: &[u8], count: u64) -> Result<Vec<ArchiveEntry>, String> {
    let mut entries = Vec::with_capacity(count as usize);
    let mut at = 0usize;

    for _ in 0..count {
        if data.get(at..at + 4) != Some(CENTRAL_SIG) {
            return Err(format!("central directory signature mismatch at offset {at}"));
        }
        let method = le16(data, at + 10)?;
        let mut compressed_size = le32(data, at + 20)? as u64;
        let mut uncompressed_size = le32(data, at + 24)? as u64;
        let name_len = le16(data, at + 28)? as usize;
        let extra_len = le16(data, at + 30)? as usize;
        let comment_len = le16(data, at + 32)? as usize;
        let mut header_offset = le32(data, at + 42)? as u64;

        let name = data
            .get(at + 46..at + 46 + name_len)
            .ok_or_else(|| format!("truncated entry name at offset {at}"))?;
        let name = std::str::from_utf8(name)
            .map_err(|_| format!("non-UTF-8 entry name at offset {at}"))?
            .to_string();

        // zip64 extended information overrides any saturated 32-bit field,
        // in the fixed order uncompressed, compressed, offset.
        let extra = data
            .get(at + 46 + name_len..at + 46 + name_len + extra_len)
            .ok_or_else(|| format!("truncated extra field at offset {at}"))?;
        let mut cursor = 0usize;
        while cursor + 4 <= extra.len() {
            let id = le16(extra, cursor)?;
            let size = le16(extra, cursor + 2)? as usize;
            if id == 0x0001 {
                let mut field = cursor + 4;
                for target in [&mut uncompressed_size, &mut compressed_size, &mut header_offset] {
                    if *target == u32::MAX as u64 {
                        *target = le64(extra, field)?;
                        field += 8;
                    }
                }
            }
            cursor += 4 + size;
        }

        entries.push(ArchiveEntry { name, method, compressed_size, uncompressed_size, header_offset });
        at += 46 + name_len + extra_len + comment_len;
    }

    Ok(entries)
}

fn le16(data: &[u8], at: usize) -> Result<u16, String> {
    data.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| format!("truncated record at offset {at}"))
}

fn le32(data: &[u8], at: usize) -> Result<u32, String> {
    data.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| format!("truncated record at offset {at}"))
}

fn le64(data: &[u8], at: usize) -> Result<u64, String> {
    data.get(at..at + 8)
        .map(|b| u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .ok_or_else(|| format!("truncated record at offset {at}"))
}
