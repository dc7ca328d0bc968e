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

//! Session layer: transmit, receive and list operations over the block
//! transport, one handshake per invocation.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::TransferError;
use crate::link::ByteLink;
use crate::names::split_device_path;
use crate::protocol::*;
use crate::transport::{receive_block, send_block};

fn local_io(path: &Path, source: std::io::Error) -> TransferError {
    TransferError::LocalIo {
        path: path.to_path_buf(),
        source,
    }
}

/// One transfer session against a Portfolio in server mode.
pub struct Session<L: ByteLink> {
    link: L,
    force: bool,
    verbose: u8,
    received: usize,
}

impl<L: ByteLink> Session<L> {
    pub fn new(link: L, force: bool, verbose: u8) -> Self {
        Session {
            link,
            force,
            verbose,
            received: 0,
        }
    }

    /// Total number of files fetched from the device so far.
    pub fn files_received(&self) -> usize {
        self.received
    }

    /// Waits for the device to enter server mode.
    pub fn connect(&mut self) -> Result<(), TransferError> {
        self.link.handshake()
    }

    /// Sends one local file to the device under the given destination name.
    ///
    /// An existing destination is skipped (with a cancel block) unless the
    /// force flag was set; skipping is not an error, so a multi-file batch
    /// carries on with the remaining files.
    pub fn transmit_file(&mut self, source: &Path, dest: &str) -> Result<(), TransferError> {
        let mut file = File::open(source).map_err(|e| local_io(source, e))?;
        let length = file.metadata().map_err(|e| local_io(source, e))?.len();
        if length > MAX_TRANSMIT_SIZE {
            println!("Skipping {} (larger than 32 MiB)", source.display());
            return Ok(());
        }

        let init = transmit_init(length as u32, dest)?;
        send_block(&mut self.link, &init)?;
        let mut control = [0u8; CONTROL_BUFSIZE];
        receive_block(&mut self.link, &mut control)?;

        match control_status(&control) {
            STATUS_INVALID => {
                return Err(TransferError::DestinationInvalid {
                    dest: dest.to_string(),
                });
            }
            STATUS_OK => {
                // the device answers "ok" here when the destination exists
                if self.force {
                    println!("File exists on the Portfolio and is being overwritten!");
                    send_block(&mut self.link, &OVERWRITE)?;
                } else {
                    println!("File exists on the Portfolio! Use --force to overwrite.");
                    send_block(&mut self.link, &CANCEL)?;
                    return Ok(());
                }
            }
            _ => {}
        }

        let block_size = control_block_size(&control);
        if block_size == 0 || block_size > PAYLOAD_BUFSIZE {
            return Err(TransferError::BadBlockSize { size: block_size });
        }

        let mut remaining = length as usize;
        let blocks = remaining.div_ceil(block_size);
        if blocks > 1 {
            println!("Transmission consists of {} blocks of payload.", blocks);
        }
        let mut payload = vec![0u8; block_size];
        let mut sent = 0usize;
        while remaining > block_size {
            file.read_exact(&mut payload).map_err(|e| local_io(source, e))?;
            send_block(&mut self.link, &payload)?;
            remaining -= block_size;
            sent += 1;
            if self.verbose > 0 {
                println!("Transmitted block {} of {}", sent, blocks);
            }
        }
        if remaining > 0 {
            file.read_exact(&mut payload[..remaining])
                .map_err(|e| local_io(source, e))?;
            send_block(&mut self.link, &payload[..remaining])?;
        }

        receive_block(&mut self.link, &mut control)?;
        if control_status(&control) != STATUS_OK {
            return Err(TransferError::TransmissionFailed {
                status: control_status(&control),
            });
        }
        Ok(())
    }

    /// Fetches every device file matching `source` into `dest`, which may be
    /// a directory or, for a single match, an explicit local filename.
    ///
    /// An existing local file without the force flag aborts the whole
    /// remaining batch; partial batches are reported, not silently resumed.
    pub fn receive_files(
        &mut self,
        source: &str,
        dest: &Path,
        single_source: bool,
    ) -> Result<usize, TransferError> {
        let init = receive_init(OP_FIND, source)?;
        send_block(&mut self.link, &init)?;
        let mut listing = [0u8; LIST_BUFSIZE];
        let got = receive_block(&mut self.link, &mut listing)?;

        let (count, names) = parse_listing(&listing[..got]);
        if count == 0 {
            return Err(TransferError::NoMatches {
                pattern: source.to_string(),
            });
        }
        if names.len() != count {
            return Err(TransferError::CountMismatch {
                reported: count,
                parsed: names.len(),
            });
        }

        let dest_is_dir = dest.is_dir();
        let (dir_part, _) = split_device_path(source);

        for (idx, name) in names.iter().enumerate() {
            print!("Transferring file {}", self.received + 1);
            if single_source {
                print!(" of {}", count);
            }
            println!(": {}", name);

            let local = if dest_is_dir {
                dest.join(name)
            } else {
                dest.to_path_buf()
            };
            if local.exists() && !self.force {
                if idx + 1 < count {
                    println!("Remaining files are not copied!");
                }
                return Err(TransferError::FileExists { path: local });
            }
            let mut file = File::create(&local).map_err(|e| local_io(&local, e))?;

            let fetch = receive_init(OP_FETCH, &format!("{}{}", dir_part, name))?;
            send_block(&mut self.link, &fetch)?;
            let mut control = [0u8; CONTROL_BUFSIZE];
            receive_block(&mut self.link, &mut control)?;
            if control_status(&control) != STATUS_OK {
                return Err(TransferError::UnexpectedControl {
                    status: control_status(&control),
                });
            }

            let mut total = control_total_size(&control);
            if self.verbose > 0 {
                println!("Fetching {} bytes", total);
            }
            let mut payload = vec![0u8; PAYLOAD_BUFSIZE];
            while total > 0 {
                let length = receive_block(&mut self.link, &mut payload)?;
                if length == 0 {
                    return Err(TransferError::EmptyBlock);
                }
                file.write_all(&payload[..length])
                    .map_err(|e| local_io(&local, e))?;
                total = total.saturating_sub(length);
            }

            send_block(&mut self.link, &FINISH)?;
            self.received += 1;
        }
        Ok(count)
    }

    /// Asks the device for all filenames matching `pattern`. An empty match
    /// list is a normal outcome, not an error.
    pub fn list_files(&mut self, pattern: &str) -> Result<Vec<String>, TransferError> {
        let init = receive_init(OP_FIND, pattern)?;
        if self.verbose > 0 {
            println!("Sending list request for pattern {}", pattern);
        }
        send_block(&mut self.link, &init)?;
        let mut payload = vec![0u8; PAYLOAD_BUFSIZE];
        let got = receive_block(&mut self.link, &mut payload)?;

        let (count, names) = parse_listing(&payload[..got]);
        if count == 0 {
            return Ok(Vec::new());
        }
        if names.len() != count {
            return Err(TransferError::CountMismatch {
                reported: count,
                parsed: names.len(),
            });
        }
        Ok(names)
    }
}

// ============================================================================
// Tests
// ============================================================================
