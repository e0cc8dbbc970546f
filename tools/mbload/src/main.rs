use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use anyhow::Context;
use dialoguer::Select;
use dialoguer::console::style;
use serialport::{SerialPort, SerialPortInfo, SerialPortType, available_ports};
use structopt::StructOpt;
use tracing::{Level, info, warn};
use tracing_subscriber::util::SubscriberInitExt;

use mbload::{RawRepl, upload};

/// USB vendor id of the micro:bit's interface chip.
const MICROBIT_VID: u16 = 0x0D28;

#[derive(Debug, StructOpt)]
#[structopt(name = "mbload", about = "Load files onto the micro:bit without flashing it")]
struct Opt {
    /// Serial device of the board (found automatically if omitted)
    #[structopt(short, long)]
    port: Option<String>,

    /// Baud rate of the serial device
    #[structopt(short, long, default_value = "115200")]
    baudrate: u32,

    /// Seconds to wait for the board to become available
    #[structopt(short, long, default_value = "0")]
    wait: u64,

    /// Name to save the file as, if different from the file name
    #[structopt(long)]
    name: Option<String>,

    /// More log output (repeat for more)
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    /// File to load
    #[structopt(parse(from_os_str))]
    file: PathBuf,
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

fn is_microbit(port: &SerialPortInfo) -> bool {
    matches!(&port.port_type, SerialPortType::UsbPort(usb) if usb.vid == MICROBIT_VID)
}

fn select_port() -> anyhow::Result<String> {
    let ports = available_ports().context("failed to list serial ports")?;

    // a micro:bit if there is one, otherwise any USB serial port on linux/windows/macos
    let mut candidates: Vec<&SerialPortInfo> = ports.iter().filter(|p| is_microbit(p)).collect();
    if candidates.is_empty() {
        candidates = ports
            .iter()
            .filter(|port| {
                port.port_name.contains("USB")
                    || port.port_name.contains("ACM")
                    || port.port_name.contains("COM")
                    || port.port_name.contains("usb")
            })
            .collect();
    }

    match candidates.as_slice() {
        [] => Err(anyhow::anyhow!(
            "no USB serial ports found, is the board plugged in (and are you in the dialout group)?"
        )),
        [p] => {
            println!("{}", style(format!("Using {}", p.port_name)).dim());
            Ok(p.port_name.clone())
        }
        ports => {
            let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();
            let selected = Select::new()
                .with_prompt("Multiple USB serial ports found, select your micro:bit")
                .default(0)
                .items(&port_names)
                .interact()?;
            Ok(port_names[selected].clone())
        }
    }
}

/// Open the port, retrying once a second for up to `wait` seconds.
fn open_port(name: &str, baudrate: u32, wait: u64) -> anyhow::Result<Box<dyn SerialPort>> {
    let mut attempt = 0;
    loop {
        match serialport::new(name, baudrate)
            .timeout(Duration::from_millis(100))
            .open()
        {
            Ok(port) => return Ok(port),
            Err(e) if attempt < wait => {
                if attempt == 0 {
                    warn!("waiting {} seconds for {}: {}", wait, name, e);
                }
                attempt += 1;
                sleep(Duration::from_secs(1));
            }
            Err(e) => return Err(e).with_context(|| format!("failed to access {}", name)),
        }
    }
}

fn run(opt: Opt) -> anyhow::Result<()> {
    let contents = std::fs::read(&opt.file)
        .with_context(|| format!("failed to read {}", opt.file.display()))?;
    let name = match opt.name {
        Some(name) => name,
        None => opt
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name, use --name", opt.file.display()))?,
    };

    let port_name = match opt.port {
        Some(port) => port,
        None => select_port()?,
    };
    let port = open_port(&port_name, opt.baudrate, opt.wait)?;

    info!("saving {} bytes as {}", contents.len(), name);
    let mut repl = RawRepl::new(port);
    upload(&mut repl, &contents, &name, |output| {
        if !output.is_empty() {
            print!("{}", style(String::from_utf8_lossy(output)).dim());
        }
    })?;

    println!("{}", style(format!("Saved {}", name)).green());
    Ok(())
}

fn main() {
    let opt = Opt::from_args();
    setup_logging(opt.verbose);

    if let Err(e) = run(opt) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
