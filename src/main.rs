use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use log::error;

use rm8_serial::descriptions::DescriptionStore;
use rm8_serial::descriptions::DEFAULT_DESCRIPTIONS_FILE;
use rm8_serial::port_resolver::list_ports;
use rm8_serial::port_resolver::DEFAULT_MARKER;
use rm8_serial::rm8::Rm8Board;
use rm8_serial::rm8_ctl::Rm8Control;
use rm8_serial::rm8_types::RelayId;
use rm8_serial::rm8_types::RelayState;
use rm8_serial::state_store::StateStore;
use rm8_serial::state_store::DEFAULT_STATE_FILE;

/// Switches the relays of an 8-channel serial relay board
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Text contained in the description of the board's serial adapter
    #[arg(long, default_value = DEFAULT_MARKER)]
    marker: String,

    /// File holding the last commanded relay states
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    state_file: PathBuf,

    /// File holding the relay descriptions
    #[arg(long, default_value = DEFAULT_DESCRIPTIONS_FILE)]
    descriptions_file: PathBuf,

    /// Increase message verbosity
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Switch one relay on or off
    Set {
        #[arg(value_parser = parse_relay)]
        relay: RelayId,
        /// on, off, high or low
        state: RelayState,
    },
    /// Switch one relay to the opposite of its remembered state
    Toggle {
        #[arg(value_parser = parse_relay)]
        relay: RelayId,
    },
    /// Switch all relays, one after another
    All {
        /// on, off, high or low
        state: RelayState,
    },
    /// Show remembered states and descriptions
    Status,
    /// Save the description of one relay
    Describe {
        #[arg(value_parser = parse_relay)]
        relay: RelayId,
        text: String,
    },
    /// Clear the description of one relay
    Clear {
        #[arg(value_parser = parse_relay)]
        relay: RelayId,
    },
    /// List serial ports and the one the marker selects
    Ports,
}

fn parse_relay(arg: &str) -> Result<RelayId> {
    let number = arg
        .parse::<u8>()
        .with_context(|| format!("Invalid relay number '{}'", arg))?;
    Ok(RelayId::try_from(number)?)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let logger = stderrlog::new()
        .module(module_path!())
        .quiet(args.quiet)
        .verbosity(args.verbose as usize + 1)
        .init();
    if let Err(e) = logger {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let control = Rm8Control::open(args.marker);
    let state_store = StateStore::new(args.state_file);
    let description_store = DescriptionStore::new(args.descriptions_file);
    let mut board = Rm8Board::open(control, state_store, description_store);

    match args.command {
        Command::Set { relay, state } => {
            board
                .switch(&relay, state)
                .with_context(|| format!("Failed to switch '{}' {}", relay, state))?;
            println!("{}: {}", relay, state);
        }
        Command::Toggle { relay } => {
            let state = board
                .toggle(&relay)
                .with_context(|| format!("Failed to toggle '{}'", relay))?;
            println!("{}: {}", relay, state);
        }
        Command::All { state } => {
            let mut failed = 0;
            for (relay, result) in board.switch_all(state) {
                match result {
                    Ok(()) => println!("{}: {}", relay, state),
                    Err(e) => {
                        failed += 1;
                        let e = anyhow::Error::new(e);
                        error!("Failed to switch '{}' {}: {:#}", relay, state, e);
                    }
                }
            }
            if failed > 0 {
                bail!("{} of 8 relays were not switched {}", failed, state);
            }
        }
        Command::Status => {
            for relay in RelayId::ALL {
                println!(
                    "{}: {:<3} {}",
                    relay,
                    board.state(&relay).to_string(),
                    board.description(&relay)
                );
            }
        }
        Command::Describe { relay, text } => {
            board
                .set_description(&relay, &text)
                .with_context(|| format!("Failed to save description of '{}'", relay))?;
        }
        Command::Clear { relay } => {
            board
                .clear_description(&relay)
                .with_context(|| format!("Failed to clear description of '{}'", relay))?;
        }
        Command::Ports => {
            let marker = board.control().marker();
            let mut selected = false;
            for port in list_ports(board.control().enumerator()) {
                let matches = !selected && port.description.contains(marker);
                selected |= matches;
                let flag = if matches { "*" } else { " " };
                println!("{} {:<20} {}", flag, port.port_name, port.description);
            }
            if !selected {
                bail!("No serial port description contains '{}'", marker);
            }
        }
    }
    Ok(())
}
