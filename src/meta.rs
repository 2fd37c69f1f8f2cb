//! Filesystem metadata capture and restore.
//!
//! Build captures each source file's attributes into its member header;
//! unpack applies the stored mode and mtime back onto the extracted file.
//! Owner and group ids are recorded but never restored, since chown needs
//! privileges; the verbose listing resolves them to names best-effort and
//! prints an unresolved id as blank rather than failing the listing.

use std::fs::{self, File, Permissions};
use std::io;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use chrono::{LocalResult, TimeZone, Utc};
use nix::unistd::{Gid, Group, Uid, User};

use crate::error::IoError;
use crate::record::MemberHeader;

/// Capture a source file's attributes as a member header.
///
/// Only regular files can be archived; directories, symlinks, and device
/// nodes are refused here rather than silently followed or flattened.
pub fn capture(path: &Path) -> Result<MemberHeader, IoError> {
    let meta = fs::symlink_metadata(path).map_err(|source| IoError::MetadataUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    if !meta.is_file() {
        return Err(IoError::MetadataUnavailable {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }
    Ok(MemberHeader {
        name: path.to_string_lossy().into_owned(),
        mtime: meta.mtime(),
        uid: meta.uid(),
        gid: meta.gid(),
        mode: meta.mode(),
        size: meta.len(),
    })
}

/// Restore stored permission bits onto an extracted file. File-type bits
/// are masked off; only the permission and setuid/setgid/sticky bits apply.
pub fn apply_mode(path: &Path, mode: u32) -> Result<(), IoError> {
    fs::set_permissions(path, Permissions::from_mode(mode & 0o7777)).map_err(|source| {
        IoError::Write { what: format!("permissions of {}", path.display()), source }
    })
}

/// Restore the stored modification time onto an extracted file.
pub fn apply_mtime(file: &File, mtime: i64, name: &str) -> Result<(), IoError> {
    let when = if mtime >= 0 {
        UNIX_EPOCH + Duration::from_secs(mtime as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(mtime.unsigned_abs())
    };
    file.set_modified(when)
        .map_err(|source| IoError::Write { what: format!("mtime of {name}"), source })
}

// ── Listing presentation ─────────────────────────────────────────────────────

/// `ls -l` style permission string.
pub fn mode_string(mode: u32) -> String {
    let kind = match mode & 0o170000 {
        0o040000 => 'd',
        0o120000 => 'l',
        0o140000 => 's',
        0o060000 => 'b',
        0o020000 => 'c',
        0o010000 => 'p',
        _ => '-',
    };
    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

/// Login name for a uid; blank when no passwd entry exists.
pub fn user_name(uid: u32) -> String {
    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => user.name,
        _ => String::new(),
    }
}

/// Group name for a gid; blank when no group entry exists.
pub fn group_name(gid: u32) -> String {
    match Group::from_gid(Gid::from_raw(gid)) {
        Ok(Some(group)) => group.name,
        _ => String::new(),
    }
}

/// Epoch timestamp formatted for the verbose listing. UTC keeps the
/// output stable across machines; out-of-range values print raw.
pub fn timestamp(mtime: i64) -> String {
    match Utc.timestamp_opt(mtime, 0) {
        LocalResult::Single(when) => when.format("%Y-%m-%d %H:%M").to_string(),
        _ => mtime.to_string(),
    }
}
