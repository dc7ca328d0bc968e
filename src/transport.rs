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

//! Block transport: length-prefixed, checksummed frames over the byte link.
//!
//! The sender accumulates its checksum by subtraction and the receiver by
//! addition; the two must cancel modulo 256. There is no retransmission, a
//! failed checksum ends the session.

use crate::error::TransferError;
use crate::link::ByteLink;
use crate::protocol::{ACK, READY};

/// Frames `payload` as one block and sends it.
///
/// An empty payload sends nothing at all; callers use this for optional
/// trailer blocks.
pub fn send_block(link: &mut dyn ByteLink, payload: &[u8]) -> Result<(), TransferError> {
    if payload.is_empty() {
        return Ok(());
    }
    debug_assert!(payload.len() <= 0xFFFF);

    let ready = link.receive_byte()?;
    if ready != READY {
        return Err(TransferError::NotReadyToken { got: ready });
    }
    link.send_byte(ACK)?;

    let mut checksum = 0u8;
    let len_lo = (payload.len() & 0xFF) as u8;
    let len_hi = (payload.len() >> 8) as u8;
    link.send_byte(len_lo)?;
    checksum = checksum.wrapping_sub(len_lo);
    link.send_byte(len_hi)?;
    checksum = checksum.wrapping_sub(len_hi);
    for &byte in payload {
        link.send_byte(byte)?;
        checksum = checksum.wrapping_sub(byte);
    }
    link.send_byte(checksum)?;

    let echo = link.receive_byte()?;
    if echo != checksum {
        return Err(TransferError::ChecksumMismatch {
            expected: checksum,
            got: echo,
        });
    }
    Ok(())
}

/// Receives one block into `buf`, returning the payload length.
///
/// A block longer than `buf` is abandoned unread and reported as a
/// zero-length result; the caller decides whether that is acceptable.
pub fn receive_block(link: &mut dyn ByteLink, buf: &mut [u8]) -> Result<usize, TransferError> {
    link.send_byte(READY)?;
    let ack = link.receive_byte()?;
    if ack != ACK {
        return Err(TransferError::BadAck { got: ack });
    }

    let len_lo = link.receive_byte()?;
    let len_hi = link.receive_byte()?;
    let mut checksum = len_lo.wrapping_add(len_hi);
    let length = usize::from(len_lo) | usize::from(len_hi) << 8;
    if length > buf.len() {
        return Ok(0);
    }

    for slot in buf[..length].iter_mut() {
        let byte = link.receive_byte()?;
        checksum = checksum.wrapping_add(byte);
        *slot = byte;
    }

    let trailer = link.receive_byte()?;
    if trailer.wrapping_neg() != checksum {
        return Err(TransferError::ChecksumMismatch {
            expected: checksum.wrapping_neg(),
            got: trailer,
        });
    }
    link.send_byte(checksum.wrapping_neg())?;
    Ok(length)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::testing::DeviceEmulator;

    #[test]
    fn test_send_block_empty_is_noop() {
        let mut emu = DeviceEmulator::new();
        send_block(&mut emu, &[]).unwrap();
        assert!(emu.host_log.is_empty());
        assert!(emu.incoming.is_empty());
    }

    #[test]
    fn test_send_block_wire_format() {
        let mut emu = DeviceEmulator::new();
        send_block(&mut emu, &[0x01, 0x02, 0x03]).unwrap();
        // ack, length low/high, payload, then the subtractive checksum
        assert_eq!(emu.host_log, vec![0xA5, 0x03, 0x00, 0x01, 0x02, 0x03, 0xF7]);
        assert_eq!(emu.incoming, vec![vec![0x01, 0x02, 0x03]]);
    }

    #[test]
    fn test_block_roundtrip() {
        for size in [1usize, 2, 127, 512, 1000] {
            let payload: Vec<u8> = (0..size).map(|i| (i * 7 % 256) as u8).collect();

            let mut emu = DeviceEmulator::new();
            send_block(&mut emu, &payload).unwrap();
            let landed = emu.incoming[0].clone();
            assert_eq!(landed, payload);

            // feed the received block straight back
            emu.queue_block(&landed);
            let mut buf = vec![0u8; size];
            let got = receive_block(&mut emu, &mut buf).unwrap();
            assert_eq!(got, size);
            assert_eq!(buf, payload);
        }
    }

    #[test]
    fn test_send_block_device_not_ready() {
        let mut emu = DeviceEmulator::new();
        emu.ready = b'Q';
        match send_block(&mut emu, &[1]) {
            Err(TransferError::NotReadyToken { got: b'Q' }) => {}
            other => panic!("expected not-ready error, got {:?}", other),
        }
    }

    #[test]
    fn test_send_block_echo_mismatch_is_fatal() {
        let mut emu = DeviceEmulator::new();
        emu.corrupt_echo = true;
        match send_block(&mut emu, &[1, 2]) {
            Err(TransferError::ChecksumMismatch { .. }) => {}
            other => panic!("expected checksum error, got {:?}", other),
        }
    }

    #[test]
    fn test_receive_block_bad_ack() {
        let mut emu = DeviceEmulator::new();
        emu.ack = 0x5A;
        emu.queue_block(&[1]);
        let mut buf = [0u8; 8];
        match receive_block(&mut emu, &mut buf) {
            Err(TransferError::BadAck { got: 0x5A }) => {}
            other => panic!("expected bad-ack error, got {:?}", other),
        }
    }

    #[test]
    fn test_receive_block_detects_corruption() {
        let mut emu = DeviceEmulator::new();
        emu.corrupt_data = true;
        emu.queue_block(&[0x10, 0x20, 0x30]);
        let mut buf = [0u8; 8];
        match receive_block(&mut emu, &mut buf) {
            Err(TransferError::ChecksumMismatch { .. }) => {}
            other => panic!("expected checksum error, got {:?}", other),
        }
    }

    #[test]
    fn test_receive_block_too_large_for_buffer() {
        let mut emu = DeviceEmulator::new();
        emu.queue_block(&[0xAA; 200]);
        let mut buf = [0u8; 100];
        let got = receive_block(&mut emu, &mut buf).unwrap();
        assert_eq!(got, 0);
        assert!(buf.iter().all(|&b| b == 0));
    }
}
