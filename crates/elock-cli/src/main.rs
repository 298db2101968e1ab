//! Electric lock simulator
//!
//! Runs the emulated lock on mock peripherals and drives it from stdin.
//!
//! ```bash
//! # Default settings, password 1234
//! elock
//!
//! # Load settings from a file and override the password
//! elock --config lock.toml --password 4321 --verbose
//! ```
//!
//! Commands, one per line:
//!
//! | Command        | Effect                                   |
//! |----------------|------------------------------------------|
//! | `pot <0-4095>` | set the raw potentiometer reading        |
//! | `dial <0-9>`   | turn the knob to a digit                 |
//! | `press`        | click the button                         |
//! | `bounce`       | a short spike that should be debounced   |
//! | `status`       | print the lock snapshot as JSON          |
//! | `quit`         | stop the lock and print its counters     |

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use elock_core::Password;
use elock_emulator::{ElectricLock, LockConfig, LockSnapshot, SimulatedControls};

/// How long `press` holds the button down.
const CLICK_HOLD: Duration = Duration::from_millis(50);

/// Electric lock simulator
#[derive(Parser)]
#[command(name = "elock")]
#[command(version)]
#[command(about = "Interactive simulator for the potentiometer-keyed electric lock")]
struct Cli {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the unlock code (four digits)
    #[arg(short, long)]
    password: Option<Password>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Pot(u16),
    Dial(u8),
    Press,
    Bounce,
    Status,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();

        let command = match (name, arg) {
            ("pot", Some(raw)) => Command::Pot(
                raw.parse()
                    .with_context(|| format!("invalid reading '{raw}'"))?,
            ),
            ("dial", Some(digit)) => Command::Dial(
                digit
                    .parse()
                    .with_context(|| format!("invalid digit '{digit}'"))?,
            ),
            ("press", None) => Command::Press,
            ("bounce", None) => Command::Bounce,
            ("status", None) => Command::Status,
            ("quit" | "exit", None) => Command::Quit,
            ("pot" | "dial", None) => bail!("'{name}' needs a value"),
            _ => bail!("unknown command '{}'", line.trim()),
        };
        Ok(Some(command))
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "elock=debug,elock_emulator=debug,elock_hardware=debug"
    } else {
        "elock=info,elock_emulator=info,elock_hardware=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<LockConfig> {
    let mut config = match &cli.config {
        Some(path) => LockConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => LockConfig::default(),
    };
    if let Some(password) = cli.password {
        config = config.with_password(password);
    }
    Ok(config)
}

fn render(snapshot: &LockSnapshot, controls: &SimulatedControls) {
    let led = |on: bool| if on { '*' } else { '.' };
    println!("+{}+", "-".repeat(snapshot.display.first().map_or(0, String::len)));
    for line in &snapshot.display {
        println!("|{line}|");
    }
    println!(
        "{} {}  {} {}  {} {}  [{:?}]",
        controls.success.name(),
        led(snapshot.success_led),
        controls.failure.name(),
        led(snapshot.failure_led),
        controls.activity.name(),
        led(snapshot.activity_led),
        snapshot.phase,
    );
}

/// Print the display whenever its text or the indicators change.
async fn watch_display(
    mut snapshots: watch::Receiver<LockSnapshot>,
    controls: SimulatedControls,
) {
    let mut shown: Option<(Vec<String>, bool, bool)> = None;
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        let key = (
            snapshot.display.clone(),
            snapshot.success_led,
            snapshot.failure_led,
        );
        if shown.as_ref() != Some(&key) {
            render(&snapshot, &controls);
            shown = Some(key);
        }
    }
}

async fn execute(
    command: &Command,
    controls: &SimulatedControls,
    snapshots: &watch::Receiver<LockSnapshot>,
) -> Result<()> {
    match command {
        Command::Pot(raw) => controls.knob.set(*raw).context("knob rejected the reading")?,
        Command::Dial(digit) => controls.knob.dial(*digit).context("knob rejected the digit")?,
        Command::Press => controls
            .button
            .click(CLICK_HOLD)
            .await
            .with_context(|| format!("cannot press {}", controls.button.name()))?,
        Command::Bounce => controls
            .button
            .bounce()
            .await
            .with_context(|| format!("cannot bounce {}", controls.button.name()))?,
        Command::Status => {
            let snapshot = snapshots.borrow().clone();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Quit => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    info!(
        sample_period_ms = config.sample_period_ms,
        hold_ticks = config.hold_ticks,
        "Starting electric lock"
    );

    let (lock, controls) = ElectricLock::simulated(config).context("invalid lock settings")?;
    let snapshots = lock.subscribe();
    render(&snapshots.borrow(), &controls);

    let (stop, stopped) = oneshot::channel::<()>();
    let runtime = tokio::spawn(lock.run(async move {
        let _ = stopped.await;
    }));
    let display = tokio::spawn(watch_display(snapshots.clone(), controls.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("error: {e:#}");
                continue;
            }
        };
        debug!(?command, "Executing command");

        if command == Command::Quit {
            break;
        }
        if let Err(e) = execute(&command, &controls, &snapshots).await {
            eprintln!("error: {e:#}");
        }
    }

    let _ = stop.send(());
    let stats = runtime.await.context("lock task failed")?;
    display.abort();

    println!("{}", serde_json::to_string_pretty(&stats)?);
    info!("Electric lock stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("pot 4095").unwrap(), Some(Command::Pot(4095)));
        assert_eq!(Command::parse("  dial 7 ").unwrap(), Some(Command::Dial(7)));
        assert_eq!(Command::parse("press").unwrap(), Some(Command::Press));
        assert_eq!(Command::parse("bounce").unwrap(), Some(Command::Bounce));
        assert_eq!(Command::parse("status").unwrap(), Some(Command::Status));
        assert_eq!(Command::parse("quit").unwrap(), Some(Command::Quit));
        assert_eq!(Command::parse("").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Command::parse("pot").is_err());
        assert!(Command::parse("pot loud").is_err());
        assert!(Command::parse("dial 300").is_err());
        assert!(Command::parse("open sesame").is_err());
    }

    #[test]
    fn test_password_override() {
        let cli = Cli::parse_from(["elock", "--password", "4321"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.password.to_string(), "4321");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_rejects_bad_password_flag() {
        assert!(Cli::try_parse_from(["elock", "--password", "12x4"]).is_err());
    }
}
