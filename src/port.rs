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

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;

use nix::libc::c_uchar;
use nix::{ioctl_none, ioctl_read, ioctl_write_ptr};

// ============================================================================
// ParallelPort Trait
// ============================================================================

/// Trait for the parallel port register operations needed by the link layer
pub trait ParallelPort: Send {
    /// Drives the data output register (data bit and strobe bit).
    fn write_data(&mut self, value: u8) -> io::Result<()>;

    /// Reads the status register (clock and data-in lines).
    fn read_status(&mut self) -> io::Result<u8>;

    /// Reads the control register.
    fn read_control(&mut self) -> io::Result<u8>;
}

// ============================================================================
// Real ppdev Port Implementation
// ============================================================================

// ioctl numbers from <linux/ppdev.h>
const PP_IOC_MAGIC: u8 = b'p';
ioctl_read!(pp_read_status, PP_IOC_MAGIC, 0x81, c_uchar);
ioctl_read!(pp_read_control, PP_IOC_MAGIC, 0x83, c_uchar);
ioctl_write_ptr!(pp_write_data, PP_IOC_MAGIC, 0x86, c_uchar);
ioctl_none!(pp_claim, PP_IOC_MAGIC, 0x8B);
ioctl_none!(pp_release, PP_IOC_MAGIC, 0x8C);

/// Devices tried during autodetection, in order
pub const CANDIDATE_DEVICES: [&str; 4] = [
    "/dev/parport0",
    "/dev/parport1",
    "/dev/parport2",
    "/dev/parport3",
];

/// Parallel port driven through the Linux ppdev interface
pub struct PpdevPort {
    file: File,
}

impl PpdevPort {
    /// Opens and claims a ppdev device node, then probes it with a control
    /// register read to confirm it answers register access at all.
    pub fn open(path: &str) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        unsafe { pp_claim(file.as_raw_fd()) }.map_err(io::Error::from)?;
        let mut port = PpdevPort { file };
        port.read_control()?;
        Ok(port)
    }

    /// Tries each candidate device in order and returns the first usable one.
    ///
    /// A missing node is skipped silently. A node that exists but cannot be
    /// claimed or probed is reported, since that usually means a permission
    /// problem or another process holding the port.
    pub fn autodetect(verbose: bool) -> io::Result<Self> {
        for dev in CANDIDATE_DEVICES {
            if verbose {
                println!("Trying {}", dev);
            }
            match Self::open(dev) {
                Ok(port) => {
                    println!("Using parallel port device {}", dev);
                    return Ok(port);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => eprintln!("{}: present but not usable: {}", dev, e),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            "no usable parallel port device found",
        ))
    }
}

impl ParallelPort for PpdevPort {
    fn write_data(&mut self, value: u8) -> io::Result<()> {
        let value: c_uchar = value;
        unsafe { pp_write_data(self.file.as_raw_fd(), &value) }.map_err(io::Error::from)?;
        Ok(())
    }

    fn read_status(&mut self) -> io::Result<u8> {
        let mut value: c_uchar = 0;
        unsafe { pp_read_status(self.file.as_raw_fd(), &mut value) }.map_err(io::Error::from)?;
        Ok(value)
    }

    fn read_control(&mut self) -> io::Result<u8> {
        let mut value: c_uchar = 0;
        unsafe { pp_read_control(self.file.as_raw_fd(), &mut value) }.map_err(io::Error::from)?;
        Ok(value)
    }
}

impl Drop for PpdevPort {
    fn drop(&mut self) {
        unsafe { pp_release(self.file.as_raw_fd()) }.ok();
    }
}

// ============================================================================
// Mock Port for Testing
// ============================================================================

#[cfg(test)]
pub struct MockPort {
    // Status register values returned in order; when exhausted, `stuck`
    // takes over if set
    statuses: Vec<u8>,
    pos: usize,
    stuck: Option<u8>,
    // Track what was driven onto the data register
    write_log: Vec<u8>,
    // Expected writes for verification
    expected_writes: Option<Vec<u8>>,
}

#[cfg(test)]
impl MockPort {
    pub fn new(statuses: Vec<u8>, expected_writes: Vec<u8>) -> Self {
        MockPort {
            statuses,
            pos: 0,
            stuck: None,
            write_log: Vec::new(),
            expected_writes: Some(expected_writes),
        }
    }

    /// A port whose status register never changes, for timeout tests
    pub fn stuck_at(status: u8) -> Self {
        MockPort {
            statuses: Vec::new(),
            pos: 0,
            stuck: Some(status),
            write_log: Vec::new(),
            expected_writes: None,
        }
    }
}

#[cfg(test)]
impl ParallelPort for MockPort {
    fn write_data(&mut self, value: u8) -> io::Result<()> {
        self.write_log.push(value);
        Ok(())
    }

    fn read_status(&mut self) -> io::Result<u8> {
        if self.pos < self.statuses.len() {
            let value = self.statuses[self.pos];
            self.pos += 1;
            return Ok(value);
        }
        match self.stuck {
            Some(value) => Ok(value),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "mock status script exhausted",
            )),
        }
    }

    fn read_control(&mut self) -> io::Result<u8> {
        Ok(0)
    }
}

#[cfg(test)]
impl Drop for MockPort {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        if let Some(expected) = &self.expected_writes {
            assert_eq!(
                self.pos,
                self.statuses.len(),
                "MockPort dropped with {} unconsumed status values",
                self.statuses.len() - self.pos
            );
            assert_eq!(
                &self.write_log, expected,
                "MockPort write log mismatch!\nExpected {} bytes:\n{:02X?}\nGot {} bytes:\n{:02X?}",
                expected.len(),
                expected,
                self.write_log.len(),
                self.write_log
            );
        }
    }
}
