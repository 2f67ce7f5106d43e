//! Mentalis CLI binary.

use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use mentalis::cli::args::*;
use mentalis::cli::commands::*;

fn main() {
    let args = MentalisArgs::parse();

    let log_level = match args.verbosity() {
        0 => LevelFilter::Error, // Quiet mode
        1 => LevelFilter::Warn,  // Default
        2 => LevelFilter::Info,  // Verbose
        _ => LevelFilter::Debug, // Very verbose (3+)
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
