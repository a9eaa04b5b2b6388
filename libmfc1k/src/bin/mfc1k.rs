// libmfc1k/src/bin/mfc1k.rs

use std::io::{self, BufReader};
use std::time::Duration;

use clap::Parser;
use libmfc1k::prelude::*;
use termion::color;

/// MIFARE Classic 1K reader/writer driven by line commands on stdin
#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// Disable colors in output
    #[arg(long = "no-color", short = 'n', env = "NO_CLI_COLOR")]
    no_color: bool,
    /// Debug logging on stderr (RUST_LOG still wins when set)
    #[arg(long, short = 'v')]
    verbose: bool,
    /// How long READ/WRITE wait for a card, in milliseconds
    #[arg(long = "forget-time-ms", default_value_t = libmfc1k::constants::FORGET_TIME_MS)]
    forget_time_ms: u64,
    /// Delay between two detection polls, in milliseconds
    #[arg(long = "poll-interval-ms", default_value_t = libmfc1k::constants::POLL_INTERVAL_MS)]
    poll_interval_ms: u64,
    /// Cut payloads into consecutive 16-byte windows instead of fields
    #[arg(long, conflicts_with = "delimiter")]
    stride: bool,
    /// Field separator of WRITE payloads
    #[arg(long, default_value_t = libmfc1k::constants::DEFAULT_DELIMITER)]
    delimiter: char,
    /// Dump the card after every successful WRITE
    #[arg(long = "dump-after-write")]
    dump_after_write: bool,
    /// Dump every newly presented card instead of serving commands
    #[arg(long)]
    watch: bool,
    /// Use an in-memory card instead of reader hardware
    #[arg(long)]
    simulate: bool,
    /// BCM pin wired to the MFRC522 reset line
    #[cfg(feature = "rpi")]
    #[arg(long = "reset", short = 'r')]
    reset_pin: Option<u8>,
    /// SPI clock in Hz
    #[cfg(feature = "rpi")]
    #[arg(long = "spi-clock-hz", default_value_t = libmfc1k::reader::mfrc522::DEFAULT_SPI_CLOCK_HZ)]
    spi_clock_hz: u32,
}

impl Cli {
    fn config(&self) -> AppConfig {
        let policy = if self.stride {
            SegmentPolicy::FixedStride
        } else {
            SegmentPolicy::Delimiter(self.delimiter)
        };
        AppConfig::default()
            .with_forget_time(ms(self.forget_time_ms))
            .with_poll_interval(ms(self.poll_interval_ms))
            .with_segment_policy(policy)
            .with_dump_after_write(self.dump_after_write)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(env_logger::Target::Stderr)
        .init();
}

fn serve<R: CardReader>(reader: R, cli: &Cli, token: CancellationToken) -> Result<()> {
    let mut app = CommandLoop::new(reader, SystemClock, cli.config(), token);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.watch {
        return app.watch(&mut out);
    }
    let mut lines = ChannelLines::spawn(BufReader::new(io::stdin()), Duration::from_millis(100));
    app.run(&mut lines, &mut out)
}

#[cfg(feature = "rpi")]
fn hardware(cli: &Cli, token: CancellationToken) -> Result<()> {
    let mut reader = libmfc1k::reader::Mfrc522Reader::open(cli.spi_clock_hz)?;
    if let Some(pin) = cli.reset_pin {
        reader = reader.with_reset_pin(pin)?;
    }
    reader.init()?;
    log::info!("reader version {:#04x}", reader.version()?);
    serve(reader, cli, token)
}

#[cfg(not(feature = "rpi"))]
fn hardware(_cli: &Cli, _token: CancellationToken) -> Result<()> {
    Err(Error::Reader(
        "built without reader hardware support; use --simulate or enable the `rpi` feature".into(),
    ))
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        log::info!("interrupt received, stopping");
        handler_token.cancel();
    })
    .map_err(|err| Error::Reader(format!("cannot install interrupt handler: {}", err)))?;

    if cli.simulate {
        serve(MockReader::with_card(MockCard::simulated()), &cli, token)
    } else {
        hardware(&cli, token)
    }
}

fn main() {
    let cli = Cli::parse();
    let no_color = cli.no_color;

    if let Err(error) = run(cli) {
        if no_color {
            eprintln!("error: {}", error);
        } else {
            eprintln!(
                "{}error: {}{}",
                color::Fg(color::Red),
                error,
                color::Fg(color::Reset)
            );
        }
        std::process::exit(1);
    }
}
