// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Error type shared by every layer of the transfer stack

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Any link-level failure is fatal to the whole session; file-level conflicts
/// abort only the current operation and the caller decides how far to unwind.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("port I/O error: {0}")]
    Port(#[from] std::io::Error),

    #[error("timed out after {0:?} waiting for the device clock line")]
    ClockTimeout(Duration),

    #[error("Portfolio did not enter server mode (no sync byte seen)")]
    NotReady,

    #[error("Portfolio not ready to receive (got 0x{got:02X} instead of 'Z')")]
    NotReadyToken { got: u8 },

    #[error("bad block acknowledgement (got 0x{got:02X} instead of 0xA5)")]
    BadAck { got: u8 },

    #[error("checksum mismatch (expected 0x{expected:02X}, got 0x{got:02X})")]
    ChecksumMismatch { expected: u8, got: u8 },

    #[error("name or pattern too long ({len} of at most {max} bytes): {name}")]
    NameTooLong { name: String, len: usize, max: usize },

    #[error("invalid destination on the Portfolio: {dest}")]
    DestinationInvalid { dest: String },

    #[error("file exists: {} (use --force to overwrite)", .path.display())]
    FileExists { path: PathBuf },

    #[error("device requested an unusable block size of {size} bytes")]
    BadBlockSize { size: usize },

    #[error("no files found on the Portfolio matching {pattern}")]
    NoMatches { pattern: String },

    #[error("unexpected control status 0x{status:02X} from the Portfolio")]
    UnexpectedControl { status: u8 },

    #[error("listing reported {reported} files but contained {parsed} names")]
    CountMismatch { reported: usize, parsed: usize },

    #[error("device sent an empty data block mid-transfer")]
    EmptyBlock,

    #[error("transmission rejected with status 0x{status:02X} (disk full or bad path?)")]
    TransmissionFailed { status: u8 },

    #[error("{}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        source: std::io::Error,
    },
}
