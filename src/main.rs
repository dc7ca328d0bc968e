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

// Portfolio parallel-port transfer protocol implementation
mod error;
mod link;
mod names;
mod port;
mod protocol;
mod session;
mod transport;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};

use error::TransferError;
use link::PhysicalLink;
use names::compose_device_name;
use port::{ParallelPort, PpdevPort};
use session::Session;

#[derive(Parser)]
#[command(name = "pofolink")]
#[command(about = "File transfer to an Atari Portfolio over a parallel port adapter", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Parallel port device (e.g. /dev/parport0)
    #[arg(short, long, default_value = "autodetect")]
    device: String,

    /// Force overwriting existing files on either side
    #[arg(short, long)]
    force: bool,

    /// Insert settle delays between bytes for marginal cables
    #[arg(long)]
    slow: bool,

    /// Seconds to wait for the Portfolio to drive the clock line
    #[arg(long, default_value = "60", value_name = "SECS")]
    timeout: u64,

    /// Verbose output (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send file(s) to the Portfolio
    Transmit {
        /// Source file(s) followed by the destination path on the Portfolio
        #[arg(required = true, num_args = 2..)]
        paths: Vec<String>,
    },
    /// Fetch file(s) from the Portfolio
    Receive {
        /// Portfolio pattern(s) followed by the local destination
        #[arg(required = true, num_args = 2..)]
        paths: Vec<String>,
    },
    /// List Portfolio files matching a pattern
    List {
        /// Search pattern, e.g. 'C:\*.*'
        pattern: String,
    },
}

fn open_port(device: &str, verbose: bool) -> std::io::Result<Box<dyn ParallelPort>> {
    if device == "autodetect" {
        Ok(Box::new(PpdevPort::autodetect(verbose)?))
    } else {
        println!("Opening parallel port device {}", device);
        Ok(Box::new(PpdevPort::open(device)?))
    }
}

fn main() {
    let cli = Cli::parse();

    let port = match open_port(&cli.device, cli.verbose > 0) {
        Ok(port) => port,
        Err(e) => {
            eprintln!("Failed to open parallel port: {}", e);
            std::process::exit(1);
        }
    };

    let link = PhysicalLink::new(port, Duration::from_secs(cli.timeout), cli.slow);
    let mut session = Session::new(link, cli.force, cli.verbose);

    println!("Waiting for Portfolio...");
    if let Err(e) = session.connect() {
        eprintln!("Handshake failed: {}", e);
        eprintln!("Is the Portfolio in server mode?");
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Transmit { paths } => run_transmit(&mut session, paths),
        Commands::Receive { paths } => run_receive(&mut session, paths),
        Commands::List { pattern } => run_list(&mut session, pattern),
    };

    match result {
        Ok(()) => println!("\nDone."),
        Err(e) => {
            eprintln!("Transfer failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_transmit(
    session: &mut Session<PhysicalLink>,
    mut paths: Vec<String>,
) -> Result<(), TransferError> {
    let dest = paths.pop().unwrap_or_default();
    let count = paths.len();
    for (i, source) in paths.iter().enumerate() {
        let name = compose_device_name(source, &dest, count);
        println!(
            "Transmitting file {} of {}: {} -> {}",
            i + 1,
            count,
            source,
            name
        );
        session.transmit_file(Path::new(source), &name)?;
    }
    Ok(())
}

fn run_receive(
    session: &mut Session<PhysicalLink>,
    mut paths: Vec<String>,
) -> Result<(), TransferError> {
    let dest = PathBuf::from(paths.pop().unwrap_or_default());
    let single = paths.len() == 1;
    for source in &paths {
        session.receive_files(source, &dest, single)?;
    }
    println!("Received {} file(s).", session.files_received());
    Ok(())
}

fn run_list(session: &mut Session<PhysicalLink>, pattern: String) -> Result<(), TransferError> {
    let names = session.list_files(&pattern)?;
    if names.is_empty() {
        println!("No files found");
    } else {
        println!("Found {} files.", names.len());
        for name in &names {
            println!("{}", name);
        }
    }
    Ok(())
}
