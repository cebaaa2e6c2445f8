//! Unattended ramp/soak profile runner for a GC89800 temperature controller.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use gc89800_tc::channel::Channel;
use gc89800_tc::controller::Gc89800;
use gc89800_tc::csvlog::CsvSink;
use gc89800_tc::profile::{ProfileConfig, ProfileRunner};
use gc89800_tc::transport::{self, HardwareId};

/// Run a ramp/soak thermal profile on a GC89800 temperature controller.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Final temperature in engineering units.
    final_temp: f64,
    /// Ramp rate in units per minute.
    ramp_rate: f64,
    /// Soak duration in minutes once the final temperature is reached.
    soak_limit: u64,
    /// Sample log path; truncated at run start.
    #[arg(long, default_value = "temperature.csv")]
    csv: PathBuf,
    /// Open this port directly instead of discovering by USB identity.
    #[arg(long)]
    port: Option<String>,
    /// Setpoint written once the profile completes.
    #[arg(long, default_value_t = 100.0)]
    idle_temp: f64,
    /// USB vendor id (hex) to discover the controller by.
    #[arg(long, value_parser = parse_hex_u16, default_value = "0403")]
    vid: u16,
    /// USB product id (hex) to discover the controller by.
    #[arg(long, value_parser = parse_hex_u16, default_value = "6001")]
    pid: u16,
    /// USB serial number to discover the controller by.
    #[arg(long, default_value = "AI02KU1BA")]
    usb_serial: String,
}

fn parse_hex_u16(text: &str) -> Result<u16, String> {
    let digits = text.trim_start_matches("0x");
    u16::from_str_radix(digits, 16).map_err(|e| e.to_string())
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let transport = match &args.port {
        Some(name) => transport::open_named(name)?,
        None => transport::open(&HardwareId {
            vid: args.vid,
            pid: args.pid,
            serial_number: args.usb_serial.clone(),
        })?,
    };

    let mut device = Gc89800::new(Channel::new(transport));
    let mut sink = CsvSink::create(&args.csv)?;
    let config = ProfileConfig {
        final_temp: args.final_temp,
        ramp_rate: args.ramp_rate,
        soak_limit: args.soak_limit,
    };

    ProfileRunner::new(&mut device, &mut sink, config).run();

    // Park the controller somewhere safe once the soak is over.
    device.write_setpoint(args.idle_temp)?;
    info!("controller parked at {:.2}", args.idle_temp);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
