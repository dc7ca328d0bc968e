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

//! Portfolio server-mode protocol constants and block layouts

use crate::error::TransferError;

/// Sync byte emitted by the Portfolio once it has entered server mode
pub const SYNC: u8 = 0x50;

/// Ready token exchanged at the start of every block
pub const READY: u8 = b'Z';

/// Block acknowledgement byte
pub const ACK: u8 = 0xA5;

/// Clock line, sampled from the status register
pub const CLOCK_MASK: u8 = 0x20;

/// Data line, sampled from the status register
pub const DATA_MASK: u8 = 0x10;

/// Strobe bit driven on the output register alongside each data bit
pub const STROBE: u8 = 0x02;

/// Idle output pattern (strobe high, data low)
pub const IDLE: u8 = STROBE;

/// Control status: destination invalid
pub const STATUS_INVALID: u8 = 0x10;

/// Control status: ok, or "file exists" in reply to a transmit request
pub const STATUS_OK: u8 = 0x20;

/// Find/list request opcode
pub const OP_FIND: u8 = 0x06;

/// Per-file fetch opcode
pub const OP_FETCH: u8 = 0x02;

/// Transmit request opcode
pub const OP_TRANSMIT: u8 = 0x03;

/// Channel tag carried in every init block
pub const CHANNEL: u8 = 0x70;

/// Control responses fit well under this
pub const CONTROL_BUFSIZE: usize = 100;

/// Directory response during a file receive
pub const LIST_BUFSIZE: usize = 2000;

/// Largest data block either side will move in one piece
pub const PAYLOAD_BUFSIZE: usize = 60000;

/// Longest path or pattern the Portfolio accepts
pub const MAX_NAME_LEN: usize = 79;

/// Uploads beyond this are skipped outright
pub const MAX_TRANSMIT_SIZE: u64 = 32 * 1024 * 1024;

pub const TRANSMIT_INIT_LEN: usize = 90;
pub const RECEIVE_INIT_LEN: usize = 82;

/// Trailer asking the device to overwrite the existing destination
pub const OVERWRITE: [u8; 3] = [0x05, 0x00, CHANNEL];

/// Trailer cancelling the pending transmit
pub const CANCEL: [u8; 3] = [0x00, 0x00, 0x00];

/// Trailer closing a completed file fetch
pub const FINISH: [u8; 3] = [0x20, 0x00, 0x03];

fn check_name(name: &str) -> Result<(), TransferError> {
    if name.len() > MAX_NAME_LEN {
        return Err(TransferError::NameTooLong {
            name: name.to_string(),
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Builds the 90-byte transmit request: opcode, channel tag, a fixed magic
/// sequence, the file length little-endian at 7..11 and the NUL-padded
/// destination name from byte 11 on.
pub fn transmit_init(length: u32, dest: &str) -> Result<[u8; TRANSMIT_INIT_LEN], TransferError> {
    check_name(dest)?;
    let mut block = [0u8; TRANSMIT_INIT_LEN];
    block[0] = OP_TRANSMIT;
    block[2] = CHANNEL;
    block[3] = 0x0C;
    block[4] = 0x7A;
    block[5] = 0x21;
    block[6] = 0x32;
    block[7..11].copy_from_slice(&length.to_le_bytes());
    block[11..11 + dest.len()].copy_from_slice(dest.as_bytes());
    Ok(block)
}

/// Builds the 82-byte find/fetch request: opcode, channel tag, NUL-padded
/// name or pattern from byte 3 on.
pub fn receive_init(opcode: u8, name: &str) -> Result<[u8; RECEIVE_INIT_LEN], TransferError> {
    check_name(name)?;
    let mut block = [0u8; RECEIVE_INIT_LEN];
    block[0] = opcode;
    block[2] = CHANNEL;
    block[3..3 + name.len()].copy_from_slice(name.as_bytes());
    Ok(block)
}

pub fn control_status(control: &[u8]) -> u8 {
    control[0]
}

/// Block-size hint, little-endian at bytes 1..3
pub fn control_block_size(control: &[u8]) -> usize {
    usize::from(control[1]) | usize::from(control[2]) << 8
}

/// Total file size of a pending fetch, 3 bytes little-endian at 7..10
pub fn control_total_size(control: &[u8]) -> usize {
    usize::from(control[7]) | usize::from(control[8]) << 8 | usize::from(control[9]) << 16
}

/// Splits a directory response into its reported entry count and name table.
/// The count occupies the first two bytes little-endian; the rest is a
/// NUL-separated name list.
pub fn parse_listing(buf: &[u8]) -> (usize, Vec<String>) {
    if buf.len() < 2 {
        return (0, Vec::new());
    }
    let count = usize::from(buf[0]) | usize::from(buf[1]) << 8;
    let names = buf[2..]
        .split(|&b| b == 0)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect();
    (count, names)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transmit_init_layout() {
        let block = transmit_init(150000, "C:\\DATA.BIN").unwrap();
        assert_eq!(block.len(), 90);
        assert_eq!(&block[..7], &[0x03, 0x00, 0x70, 0x0C, 0x7A, 0x21, 0x32]);
        assert_eq!(&block[7..11], &150000u32.to_le_bytes());
        assert_eq!(&block[11..22], b"C:\\DATA.BIN");
        assert!(block[22..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_receive_init_layout() {
        let block = receive_init(OP_FIND, "C:\\*.*").unwrap();
        assert_eq!(block.len(), 82);
        assert_eq!(&block[..3], &[0x06, 0x00, 0x70]);
        assert_eq!(&block[3..9], b"C:\\*.*");
        assert!(block[9..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_init_rejects_long_names() {
        let long = "X".repeat(80);
        assert!(transmit_init(0, &long).is_err());
        assert!(receive_init(OP_FETCH, &long).is_err());

        let longest = "X".repeat(79);
        assert!(receive_init(OP_FIND, &longest).is_ok());
    }

    #[test]
    fn test_parse_listing() {
        let (count, names) = parse_listing(&[2, 0, b'A', 0, b'B', b'C', 0]);
        assert_eq!(count, 2);
        assert_eq!(names, vec!["A", "BC"]);
    }

    #[test]
    fn test_parse_listing_empty() {
        let (count, names) = parse_listing(&[0, 0]);
        assert_eq!(count, 0);
        assert!(names.is_empty());

        let (count, names) = parse_listing(&[]);
        assert_eq!(count, 0);
        assert!(names.is_empty());
    }

    #[test]
    fn test_control_accessors() {
        let mut control = [0u8; CONTROL_BUFSIZE];
        control[0] = STATUS_OK;
        control[1] = 0x60;
        control[2] = 0xEA;
        control[7] = 0x01;
        control[8] = 0x02;
        control[9] = 0x03;
        assert_eq!(control_status(&control), STATUS_OK);
        assert_eq!(control_block_size(&control), 60000);
        assert_eq!(control_total_size(&control), 0x030201);
    }
}
