//! Archive reader: one scan loop shared by every reading operation.
//!
//! [`BaleReader::scan_members`] walks the member groups front to back and
//! hands each one to a [`MemberVisitor`]. Unpack, list, and verify are
//! visitors over that walk, so the framing rules are interpreted in
//! exactly one place. The input may be a real file, which seeks over data
//! it does not need, or any byte stream, which is drained instead; both
//! shapes fail identically on a truncated archive because a skip that
//! runs out of bytes is caught by the next record read.
//!
//! # End-of-stream rules
//!
//! | where the stream ends            | outcome                      |
//! |----------------------------------|------------------------------|
//! | exactly before a header          | clean end of archive         |
//! | inside a header record           | `TruncatedHeader`            |
//! | inside data, padding, or footer  | `MissingFooter` for that member |

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::digest::{finish_hex, hex_of, Digest, Md4, DIGEST_HEX_LEN};
use crate::error::{ChecksumError, FormatError, IoError, Result};
use crate::meta;
use crate::record::{MemberFooter, MemberHeader, FOOTER_LEN, HEADER_LEN, TAG};

// ── Input ────────────────────────────────────────────────────────────────────

/// Where archive bytes come from.
///
/// The two variants make the skip capability explicit: a file seeks past
/// data regions, a stream (stdin, a pipe) reads and discards them.
pub enum Input {
    Seekable(File),
    Stream(Box<dyn Read>),
}

impl Input {
    /// Open an archive file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|source| IoError::Open { path: path.to_path_buf(), source })?;
        Ok(Self::Seekable(file))
    }

    /// Advance past `n` bytes of member data without materializing them.
    ///
    /// Running out of bytes is not reported here. A seek lands past end
    /// of file and a drain stops early, and in both cases the next record
    /// read observes the truncation, so the two input shapes surface the
    /// same error.
    fn skip(&mut self, n: u64) -> Result<()> {
        match self {
            Self::Seekable(file) => {
                file.seek(SeekFrom::Current(n as i64))
                    .map_err(|source| IoError::Read { what: "archive seek".into(), source })?;
            }
            Self::Stream(reader) => {
                io::copy(&mut reader.by_ref().take(n), &mut io::sink())
                    .map_err(|source| IoError::Read { what: "archive data".into(), source })?;
            }
        }
        Ok(())
    }
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Seekable(file) => file.read(buf),
            Self::Stream(reader) => reader.read(buf),
        }
    }
}

// ── Data region ──────────────────────────────────────────────────────────────

/// Bounded view of one member's data region.
///
/// Reads stop at the member boundary; whatever the visitor leaves
/// unconsumed, the scan loop skips before touching the footer.
pub struct DataRegion<'a> {
    input: &'a mut Input,
    left:  u64,
}

impl DataRegion<'_> {
    /// Bytes of this member not yet consumed.
    pub fn remaining(&self) -> u64 {
        self.left
    }
}

impl Read for DataRegion<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.left == 0 {
            return Ok(0);
        }
        let want = (buf.len() as u64).min(self.left) as usize;
        let got = self.input.read(&mut buf[..want])?;
        self.left -= got as u64;
        Ok(got)
    }
}

// ── Visitor ──────────────────────────────────────────────────────────────────

/// One member group as the scan encounters it.
///
/// `data` runs while the member's bytes are still pending on the input;
/// `footer` runs once the group is fully framed. A trait rather than a
/// pair of closures because unpack and verify carry state from the data
/// phase into the footer phase.
pub trait MemberVisitor {
    /// Called with the decoded header, its raw record bytes, and the data
    /// region. The raw bytes let verify recompute the header digest
    /// without re-encoding.
    fn data(
        &mut self,
        header: &MemberHeader,
        raw: &[u8; HEADER_LEN],
        region: &mut DataRegion<'_>,
    ) -> Result<()>;

    /// Called with the member's footer after data and padding are consumed.
    fn footer(&mut self, header: &MemberHeader, footer: &MemberFooter) -> Result<()>;
}

// ── Reader ───────────────────────────────────────────────────────────────────

pub struct BaleReader {
    input: Input,
}

impl BaleReader {
    /// Wrap an input, validating the archive tag before anything else.
    pub fn new(mut input: Input) -> Result<Self> {
        let mut tag = [0u8; TAG.len()];
        let got = read_full(&mut input, &mut tag)?;
        if got != tag.len() || tag != *TAG {
            return Err(FormatError::BadTag.into());
        }
        Ok(Self { input })
    }

    /// Open and validate an archive file.
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(Input::open(path)?)
    }

    /// Walk every member group in order, handing each to `visitor`.
    /// Returns the number of members visited.
    pub fn scan_members(&mut self, visitor: &mut dyn MemberVisitor) -> Result<u64> {
        let mut members = 0;
        loop {
            // A clean end of archive is zero bytes exactly where a header
            // would start; anything between one byte and a full record is
            // a truncation.
            let mut raw = [0u8; HEADER_LEN];
            let got = read_full(&mut self.input, &mut raw)?;
            if got == 0 {
                return Ok(members);
            }
            if got < HEADER_LEN {
                return Err(FormatError::TruncatedHeader { got, expected: HEADER_LEN }.into());
            }
            let header = MemberHeader::decode(&raw)?;

            let mut region = DataRegion { input: &mut self.input, left: header.size };
            visitor.data(&header, &raw, &mut region)?;
            let leftover = region.left + u64::from(header.padded());
            if leftover > 0 {
                self.input.skip(leftover)?;
            }

            let mut raw_footer = [0u8; FOOTER_LEN];
            let got = read_full(&mut self.input, &mut raw_footer)?;
            if got < FOOTER_LEN {
                return Err(FormatError::MissingFooter { name: header.name }.into());
            }
            let footer = MemberFooter::decode(&raw_footer)?;
            visitor.footer(&header, &footer)?;
            members += 1;
        }
    }

    /// Extract every member below `dest`, restoring mode and mtime once
    /// the member's footer has been seen. Digests are not checked here;
    /// that is what [`BaleReader::verify`] is for.
    pub fn unpack<F>(&mut self, dest: &Path, progress: Option<&mut F>) -> Result<u64>
    where
        F: FnMut(&MemberHeader),
    {
        let mut visitor = Unpacker { dest, progress, pending: None };
        self.scan_members(&mut visitor)
    }

    /// Write member names to `out`, one per line. With `verbose`, each
    /// line instead carries the decoded metadata and both stored digest
    /// strings exactly as they appear in the footer.
    pub fn list(&mut self, verbose: bool, out: &mut dyn Write) -> Result<u64> {
        let mut visitor = Lister { out, verbose };
        self.scan_members(&mut visitor)
    }

    /// Recompute both digests for every member and compare them against
    /// the stored footer. The first mismatch aborts the whole scan.
    pub fn verify<F>(&mut self, progress: Option<&mut F>) -> Result<u64>
    where
        F: FnMut(&MemberHeader),
    {
        let mut visitor = Verifier { progress, pending: None };
        self.scan_members(&mut visitor)
    }
}

/// Fill `buf` as far as the input allows; a short count means the stream
/// ended. Interrupted reads are retried, other failures surface as is.
fn read_full(input: &mut Input, buf: &mut [u8]) -> Result<usize> {
    let mut got = 0;
    while got < buf.len() {
        match input.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(IoError::Read { what: "archive record".into(), source }.into())
            }
        }
    }
    Ok(got)
}

// ── Operation visitors ───────────────────────────────────────────────────────

struct Unpacker<'a, F: FnMut(&MemberHeader)> {
    dest:     &'a Path,
    progress: Option<&'a mut F>,
    /// Extracted file awaiting metadata restore at the footer step.
    pending:  Option<(PathBuf, File)>,
}

impl<F: FnMut(&MemberHeader)> MemberVisitor for Unpacker<'_, F> {
    fn data(
        &mut self,
        header: &MemberHeader,
        _raw: &[u8; HEADER_LEN],
        region: &mut DataRegion<'_>,
    ) -> Result<()> {
        let path = self.dest.join(&header.name);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| IoError::Write {
                    what: format!("directory {}", parent.display()),
                    source,
                })?;
            }
        }
        let mut file = File::create(&path)
            .map_err(|source| IoError::Open { path: path.clone(), source })?;
        io::copy(region, &mut file).map_err(|source| IoError::Write {
            what: format!("extracted file {}", path.display()),
            source,
        })?;
        self.pending = Some((path, file));
        Ok(())
    }

    fn footer(&mut self, header: &MemberHeader, _footer: &MemberFooter) -> Result<()> {
        // The scan delivers data before footer for every member.
        let Some((path, file)) = self.pending.take() else {
            return Ok(());
        };
        meta::apply_mtime(&file, header.mtime, &header.name)?;
        drop(file);
        meta::apply_mode(&path, header.mode)?;
        if let Some(cb) = self.progress.as_mut() {
            cb(header);
        }
        Ok(())
    }
}

struct Lister<'a> {
    out:     &'a mut dyn Write,
    verbose: bool,
}

impl MemberVisitor for Lister<'_> {
    fn data(
        &mut self,
        header: &MemberHeader,
        _raw: &[u8; HEADER_LEN],
        _region: &mut DataRegion<'_>,
    ) -> Result<()> {
        // Data stays untouched; the scan loop skips it. The plain listing
        // needs nothing from the footer, so the name goes out here.
        if !self.verbose {
            writeln!(self.out, "{}", header.name)
                .map_err(|source| IoError::Write { what: "listing".into(), source })?;
        }
        Ok(())
    }

    fn footer(&mut self, header: &MemberHeader, footer: &MemberFooter) -> Result<()> {
        if self.verbose {
            writeln!(
                self.out,
                "{} {}/{} {:>10} {} {} {} {}",
                meta::mode_string(header.mode),
                meta::user_name(header.uid),
                meta::group_name(header.gid),
                header.size,
                meta::timestamp(header.mtime),
                String::from_utf8_lossy(&footer.header_digest),
                String::from_utf8_lossy(&footer.data_digest),
                header.name,
            )
            .map_err(|source| IoError::Write { what: "listing".into(), source })?;
        }
        Ok(())
    }
}

struct Verifier<'a, F: FnMut(&MemberHeader)> {
    progress: Option<&'a mut F>,
    /// Digests recomputed during the data phase, consumed at the footer.
    pending:  Option<([u8; DIGEST_HEX_LEN], [u8; DIGEST_HEX_LEN])>,
}

impl<F: FnMut(&MemberHeader)> MemberVisitor for Verifier<'_, F> {
    fn data(
        &mut self,
        header: &MemberHeader,
        raw: &[u8; HEADER_LEN],
        region: &mut DataRegion<'_>,
    ) -> Result<()> {
        let header_hex = hex_of(raw);
        let mut data_md = Md4::new();
        let mut buf = [0u8; 8 * 1024];
        loop {
            let got = region.read(&mut buf).map_err(|source| IoError::Read {
                what: format!("member data of {}", header.name),
                source,
            })?;
            if got == 0 {
                break;
            }
            data_md.update(&buf[..got]);
        }
        self.pending = Some((header_hex, finish_hex(data_md)));
        Ok(())
    }

    fn footer(&mut self, header: &MemberHeader, footer: &MemberFooter) -> Result<()> {
        let Some((header_hex, data_hex)) = self.pending.take() else {
            return Ok(());
        };
        if footer.header_digest != header_hex {
            return Err(ChecksumError::HeaderMismatch {
                name:     header.name.clone(),
                stored:   hex_text(&footer.header_digest),
                computed: hex_text(&header_hex),
            }
            .into());
        }
        if footer.data_digest != data_hex {
            return Err(ChecksumError::DataMismatch {
                name:     header.name.clone(),
                stored:   hex_text(&footer.data_digest),
                computed: hex_text(&data_hex),
            }
            .into());
        }
        if let Some(cb) = self.progress.as_mut() {
            cb(header);
        }
        Ok(())
    }
}

fn hex_text(digest: &[u8; DIGEST_HEX_LEN]) -> String {
    String::from_utf8_lossy(digest).into_owned()
}
