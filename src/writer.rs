//! Archive writer: the build path.
//!
//! [`BaleWriter`] wraps any `Write` sink, emits the tag on construction,
//! and appends one complete member group per call. Member data streams
//! through a fixed chunk buffer while both digests accumulate, so a file
//! larger than memory costs no more than the buffer.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::digest::{finish_hex, hex_of, Digest, Md4};
use crate::error::{IoError, Result};
use crate::meta;
use crate::record::{MemberFooter, MemberHeader, NAME_TERM, PAD_BYTE, TAG};

/// Chunk size for streaming member data.
const COPY_BUF: usize = 8 * 1024;

pub struct BaleWriter<W: Write> {
    out:     W,
    members: u64,
}

impl<W: Write> BaleWriter<W> {
    /// Start a new archive on `out`, writing the tag immediately.
    pub fn new(mut out: W) -> Result<Self> {
        out.write_all(TAG)
            .map_err(|source| IoError::Write { what: "archive tag".into(), source })?;
        Ok(Self { out, members: 0 })
    }

    /// Append the regular file at `path`, capturing its metadata.
    pub fn append_path(&mut self, path: &Path) -> Result<MemberHeader> {
        let header = meta::capture(path)?;
        let mut file = File::open(path)
            .map_err(|source| IoError::Open { path: path.to_path_buf(), source })?;
        self.append(&header, &mut file)?;
        Ok(header)
    }

    /// Append one member from an open reader.
    ///
    /// Exactly `header.size` bytes are consumed from `data`. A source
    /// that runs short fails the build here rather than producing a
    /// member whose framing lies about its length.
    pub fn append(&mut self, header: &MemberHeader, data: &mut impl Read) -> Result<()> {
        if header.name.as_bytes().contains(&NAME_TERM) {
            return Err(IoError::UnstorableName { path: PathBuf::from(&header.name) }.into());
        }
        let raw = header.encode();
        self.write("member header", &raw)?;

        // The header digest covers all sixty raw bytes, terminator included.
        let header_hex = hex_of(&raw);
        let mut data_md = Md4::new();

        let mut buf = [0u8; COPY_BUF];
        let mut left = header.size;
        while left > 0 {
            let want = left.min(COPY_BUF as u64) as usize;
            let got = match data.read(&mut buf[..want]) {
                Ok(0) => {
                    let source = io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("source ended {left} bytes early"),
                    );
                    return Err(IoError::Read {
                        what: format!("member data of {}", header.name),
                        source,
                    }
                    .into());
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(IoError::Read {
                        what: format!("member data of {}", header.name),
                        source,
                    }
                    .into());
                }
            };
            data_md.update(&buf[..got]);
            self.write("member data", &buf[..got])?;
            left -= got as u64;
        }
        if header.padded() {
            self.write("padding", &[PAD_BYTE])?;
        }

        let footer = MemberFooter {
            header_digest: header_hex,
            data_digest:   finish_hex(data_md),
        };
        self.write("member footer", &footer.encode())?;
        self.members += 1;
        Ok(())
    }

    /// Members appended so far.
    pub fn members(&self) -> u64 {
        self.members
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.out
            .flush()
            .map_err(|source| IoError::Write { what: "archive flush".into(), source })?;
        Ok(self.out)
    }

    fn write(&mut self, what: &str, bytes: &[u8]) -> Result<()> {
        self.out
            .write_all(bytes)
            .map_err(|source| IoError::Write { what: what.into(), source })?;
        Ok(())
    }
}
