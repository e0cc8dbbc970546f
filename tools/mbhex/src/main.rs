use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::util::SubscriberInitExt;

use mbhex::combine::combine;
use mbhex::elfcheck::check_elf;
use mbhex::ihex::{HexFile, render};
use mbhex::script::hexlify_script;
use mbhex::uicr::add_uicr;
use mbhex::{parse_address, parse_hex_address};

#[derive(Parser)]
#[command(name = "mbhex")]
#[command(version, about = "micro:bit MicroPython firmware tool", long_about = None)]
struct Cli {
    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a script as hex records for the script region
    Hexlify {
        /// Script to encode (stdin if omitted or "-")
        script: Option<PathBuf>,

        /// Flash address of the script region
        #[arg(long, default_value = "0x3e000", value_parser = parse_address)]
        address: u32,
    },

    /// Merge a script into the firmware, ready to copy onto the board
    Combine {
        /// MicroPython firmware (.hex)
        firmware: PathBuf,

        /// Python script to embed
        script: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Flash address of the script region
        #[arg(long, default_value = "0x3e000", value_parser = parse_address)]
        address: u32,
    },

    /// Add the UICR region describing the firmware layout
    Uicr {
        /// MicroPython firmware (.hex)
        firmware: PathBuf,

        /// Address in flash of the version string
        #[arg(value_parser = parse_address)]
        address: u32,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that a linked firmware ELF stops short of the script region
    Check {
        /// Linked firmware (.elf)
        elf: PathBuf,

        /// Script region address, in hex
        #[arg(default_value = "3e000", value_parser = parse_hex_address)]
        address: u32,
    },
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .compact()
        .finish()
        .init();
}

fn read_firmware(path: &Path) -> anyhow::Result<HexFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read firmware {}", path.display()))?;
    HexFile::parse(&text).with_context(|| format!("invalid hex file {}", path.display()))
}

/// Output is written in one go, only once it is complete.
fn write_output(output: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn do_hexlify(script: Option<&Path>, address: u32) -> anyhow::Result<()> {
    let bytes = match script {
        Some(path) if path != Path::new("-") => std::fs::read(path)
            .with_context(|| format!("failed to read script {}", path.display()))?,
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read script from stdin")?;
            buf
        }
    };
    let records = hexlify_script(&bytes, address)?;
    write_output(None, &format!("{}\n", render(&records, "\n")))
}

fn do_combine(
    firmware: &Path,
    script: &Path,
    output: Option<&Path>,
    address: u32,
) -> anyhow::Result<()> {
    let firmware = read_firmware(firmware)?;
    let script = std::fs::read(script)
        .with_context(|| format!("failed to read script {}", script.display()))?;
    let combined = combine(&firmware, &script, address)?;
    write_output(output, &combined)
}

fn do_uicr(firmware: &Path, address: u32, output: Option<&Path>) -> anyhow::Result<()> {
    let firmware = read_firmware(firmware)?;
    let patched = add_uicr(&firmware, address)?;
    write_output(output, &patched)
}

/// Returns whether the firmware fits.
fn do_check(elf: &Path, address: u32) -> anyhow::Result<bool> {
    let bytes =
        std::fs::read(elf).with_context(|| format!("failed to read ELF {}", elf.display()))?;
    let report = check_elf(&bytes, address)?;
    println!("{}", report);
    Ok(report.fits())
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Hexlify { script, address } => do_hexlify(script.as_deref(), address),

        Commands::Combine {
            firmware,
            script,
            output,
            address,
        } => do_combine(&firmware, &script, output.as_deref(), address),

        Commands::Uicr {
            firmware,
            address,
            output,
        } => do_uicr(&firmware, address, output.as_deref()),

        Commands::Check { elf, address } => match do_check(&elf, address) {
            Ok(true) => Ok(()),
            Ok(false) => std::process::exit(2),
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
