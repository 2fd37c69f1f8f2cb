//! Record codec: the fixed-width layouts of the tag, member header, and
//! member footer.
//!
//! Byte layout of a complete archive:
//!
//! ```text
//! tag      "!<bale>\n"                                        8 bytes, offset 0
//! header   name[16] date[12] uid[6] gid[6] mode[8] size[10] term[2]
//! data     exactly `size` bytes, verbatim
//! padding  one "\n" byte, only when size is odd
//! footer   header_digest[32] data_digest[32] term[2]
//! ```
//!
//! Member groups repeat until end of stream; there is no trailer and no
//! index. All header fields are ASCII text at fixed offsets: decimal for
//! date, uid, gid, and size, octal for mode, each padded with spaces on
//! the right, never the left. A name shorter than its field ends at the
//! reserved terminator byte; a 16-byte name fills the field exactly with
//! no terminator. Writer and reader share the constants below; they are
//! the whole format contract.

use crate::digest::DIGEST_HEX_LEN;
use crate::error::FormatError;

/// Identifies the stream as a bale archive; present exactly once, at offset 0.
pub const TAG: &[u8; 8] = b"!<bale>\n";

/// Ends every header and footer record; checked on decode as the
/// structural integrity test for the record.
pub const RECORD_TERM: &[u8; 2] = b"`\n";

/// Reserved byte marking the end of a stored name within its field.
/// Member names must not contain it.
pub const NAME_TERM: u8 = b'\n';

/// Alignment byte written after odd-length member data. Not counted in
/// the size field and not part of the data digest.
pub const PAD_BYTE: u8 = b'\n';

pub const NAME_LEN: usize = 16;
pub const DATE_LEN: usize = 12;
pub const UID_LEN: usize = 6;
pub const GID_LEN: usize = 6;
pub const MODE_LEN: usize = 8;
pub const SIZE_LEN: usize = 10;

/// Total size of one encoded member header.
pub const HEADER_LEN: usize =
    NAME_LEN + DATE_LEN + UID_LEN + GID_LEN + MODE_LEN + SIZE_LEN + RECORD_TERM.len();

/// Total size of one encoded member footer.
pub const FOOTER_LEN: usize = 2 * DIGEST_HEX_LEN + RECORD_TERM.len();

// Field offsets within the header record.
const NAME_OFF: usize = 0;
const DATE_OFF: usize = NAME_OFF + NAME_LEN;
const UID_OFF: usize = DATE_OFF + DATE_LEN;
const GID_OFF: usize = UID_OFF + UID_LEN;
const MODE_OFF: usize = GID_OFF + GID_LEN;
const SIZE_OFF: usize = MODE_OFF + MODE_LEN;
const TERM_OFF: usize = SIZE_OFF + SIZE_LEN;

// ── Member header ────────────────────────────────────────────────────────────

/// Decoded form of the fixed-width member header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHeader {
    /// Path as provided at build time.
    pub name: String,
    /// Modification time, whole seconds since the epoch.
    pub mtime: i64,
    pub uid: u32,
    pub gid: u32,
    /// Raw `st_mode` bits (file type and permissions).
    pub mode: u32,
    /// Byte count of the member's data region, padding byte excluded.
    pub size: u64,
}

impl MemberHeader {
    /// Encode into the exact on-disk byte layout.
    ///
    /// A numeric value wider than its field keeps only its low-order
    /// digits, so a size over ten decimal digits cannot be stored
    /// faithfully. The truncation is kept bit-compatible rather than
    /// widened or rejected; it is a known limitation of the field widths.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut raw = [b' '; HEADER_LEN];
        put_name(&mut raw[NAME_OFF..NAME_OFF + NAME_LEN], self.name.as_bytes());
        put_field(&mut raw[DATE_OFF..DATE_OFF + DATE_LEN], &self.mtime.to_string());
        put_field(&mut raw[UID_OFF..UID_OFF + UID_LEN], &self.uid.to_string());
        put_field(&mut raw[GID_OFF..GID_OFF + GID_LEN], &self.gid.to_string());
        put_field(&mut raw[MODE_OFF..MODE_OFF + MODE_LEN], &format!("{:o}", self.mode));
        put_field(&mut raw[SIZE_OFF..SIZE_OFF + SIZE_LEN], &self.size.to_string());
        raw[TERM_OFF..].copy_from_slice(RECORD_TERM);
        raw
    }

    /// Decode one raw header record.
    ///
    /// The record terminator is the structural integrity check. After it
    /// passes, only `size` is parsed strictly, because the framing of the
    /// rest of the archive depends on it; date, uid, gid, and mode are
    /// advisory and decode as 0 when garbled.
    pub fn decode(raw: &[u8; HEADER_LEN]) -> Result<Self, FormatError> {
        if raw[TERM_OFF..] != *RECORD_TERM {
            return Err(FormatError::BadTerminator { record: "header" });
        }
        let name = take_name(&raw[NAME_OFF..NAME_OFF + NAME_LEN]);
        let size_text = field_text(&raw[SIZE_OFF..SIZE_OFF + SIZE_LEN]);
        let size = size_text.parse::<u64>().map_err(|_| FormatError::BadSize {
            name: name.clone(),
            field: size_text.clone(),
        })?;
        Ok(Self {
            name,
            mtime: field_text(&raw[DATE_OFF..DATE_OFF + DATE_LEN]).parse().unwrap_or(0),
            uid: field_text(&raw[UID_OFF..UID_OFF + UID_LEN]).parse().unwrap_or(0),
            gid: field_text(&raw[GID_OFF..GID_OFF + GID_LEN]).parse().unwrap_or(0),
            mode: u32::from_str_radix(&field_text(&raw[MODE_OFF..MODE_OFF + MODE_LEN]), 8)
                .unwrap_or(0),
            size,
        })
    }

    /// Whether a padding byte follows this member's data region.
    pub fn padded(&self) -> bool {
        self.size % 2 == 1
    }
}

// ── Member footer ────────────────────────────────────────────────────────────

/// Decoded form of the fixed-width member footer.
///
/// Digest fields stay in their on-disk lowercase-hex form; verify compares
/// them byte-for-byte against recomputed hex, never as parsed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFooter {
    pub header_digest: [u8; DIGEST_HEX_LEN],
    pub data_digest: [u8; DIGEST_HEX_LEN],
}

impl MemberFooter {
    pub fn encode(&self) -> [u8; FOOTER_LEN] {
        let mut raw = [0u8; FOOTER_LEN];
        raw[..DIGEST_HEX_LEN].copy_from_slice(&self.header_digest);
        raw[DIGEST_HEX_LEN..2 * DIGEST_HEX_LEN].copy_from_slice(&self.data_digest);
        raw[2 * DIGEST_HEX_LEN..].copy_from_slice(RECORD_TERM);
        raw
    }

    pub fn decode(raw: &[u8; FOOTER_LEN]) -> Result<Self, FormatError> {
        if raw[2 * DIGEST_HEX_LEN..] != *RECORD_TERM {
            return Err(FormatError::BadTerminator { record: "footer" });
        }
        let mut header_digest = [0u8; DIGEST_HEX_LEN];
        header_digest.copy_from_slice(&raw[..DIGEST_HEX_LEN]);
        let mut data_digest = [0u8; DIGEST_HEX_LEN];
        data_digest.copy_from_slice(&raw[DIGEST_HEX_LEN..2 * DIGEST_HEX_LEN]);
        Ok(Self { header_digest, data_digest })
    }
}

// ── Field helpers ────────────────────────────────────────────────────────────

/// Place a name in its field: terminator appended when the name is
/// shorter than the field, omitted when it fills the field exactly,
/// forced into the last byte (dropping the tail) when it is longer.
fn put_name(field: &mut [u8], name: &[u8]) {
    if name.len() < field.len() {
        field[..name.len()].copy_from_slice(name);
        field[name.len()] = NAME_TERM;
    } else if name.len() == field.len() {
        field.copy_from_slice(name);
    } else {
        let keep = field.len() - 1;
        field[..keep].copy_from_slice(&name[..keep]);
        field[keep] = NAME_TERM;
    }
}

/// Left-align `text` in `field`; the caller pre-fills the pad spaces.
/// Overflow keeps the rightmost characters (the low-order digits).
fn put_field(field: &mut [u8], text: &str) {
    let bytes = text.as_bytes();
    if bytes.len() > field.len() {
        field.copy_from_slice(&bytes[bytes.len() - field.len()..]);
    } else {
        field[..bytes.len()].copy_from_slice(bytes);
    }
}

/// A stored name ends at its terminator, or occupies the whole field.
fn take_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == NAME_TERM).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Text of a numeric field: everything before the first pad space.
fn field_text(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == b' ').unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}
