//! Loiterwatch CLI
//!
//! Usage:
//!   loiterwatch                              # Built-in walk-up demo (bench timing)
//!   loiterwatch --script readings.txt        # Replay readings, one per line
//!   loiterwatch --script - < readings.txt    # Readings from stdin
//!   loiterwatch --preset production --fast   # Production timing, no real sleeping
//!   loiterwatch --config alarm.json --debug  # JSON config + serial output

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loiterwatch::core::{
    json_formatter, lcd_formatter, verbose_colored_formatter, verbose_formatter, ActionDispatcher,
    Formatter, LoiteringAlarm, LoiteringMonitor, RunSummary, Writer,
};
use loiterwatch::hw::{
    max_range_cm, ActiveDrive, AlarmOutput, Buzzer, CharacterLcd, DistanceSensor, EchoRanger,
    LedController, LineSensor, Pacer, PassiveDrive, SerialConsole, SimEchoTimer, SimPin, SimPwm,
    ThreadPacer, VirtualPacer,
};
use loiterwatch::types::{AlarmConfig, ConfigError, ConfigResult, Pulse};
use loiterwatch::VERSION;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// 75-145 cm, alarm after 5 minutes, 30 s grace
    Production,
    /// 75-145 cm, alarm after 10 s, 5 s grace, serial output on
    Bench,
}

#[derive(Parser, Debug)]
#[command(
    name = "loiterwatch",
    version = VERSION,
    about = "Loiterwatch - raise an alarm when someone lingers in front of the sensor",
    long_about = "Loiterwatch samples a distance sensor, classifies presence against a\n\
                  distance band and drives an LED and buzzer through an alarm state machine.\n\n\
                  States:\n  \
                  IDLE     - Nothing in range\n  \
                  DETECTED - Target in range, timing toward the alert\n  \
                  OCCLUDED - Target lost, waiting out the grace period\n  \
                  ALARM    - Target stayed past the alert time\n  \
                  ARMED    - Target left during an alarm\n\n\
                  Script lines: `42.3`, `42.3 cm`, `echo 2466` (µs), `-` (no reading), `# comment`"
)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in configuration (ignored when --config is given)
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Closest in-range distance (cm)
    #[arg(long, env = "LOITER_MIN_DISTANCE_CM")]
    min_distance: Option<f64>,

    /// Farthest in-range distance (cm)
    #[arg(long, env = "LOITER_MAX_DISTANCE_CM")]
    max_distance: Option<f64>,

    /// Seconds of presence before the alarm
    #[arg(long, env = "LOITER_ALERT_AFTER_SECONDS")]
    alert_after: Option<f64>,

    /// Seconds of absence before resetting to idle
    #[arg(long, env = "LOITER_TIMEOUT_SECONDS")]
    timeout: Option<f64>,

    /// Tick duration (seconds)
    #[arg(long, env = "LOITER_RESOLUTION")]
    resolution: Option<f64>,

    /// Print verbose status on the serial console
    #[arg(short, long, env = "LOITER_DEBUG")]
    debug: bool,

    /// Readings file, or `-` for stdin (default: built-in demo)
    #[arg(short, long)]
    script: Option<String>,

    /// Use virtual time instead of sleeping
    #[arg(long)]
    fast: bool,

    /// Serial output as JSON lines
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Run without the character display
    #[arg(long)]
    no_display: bool,

    /// Play a short buzzer pattern at startup
    #[arg(long)]
    chirp: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .without_time(),
        )
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    match run(&args) {
        Ok(summary) => {
            print_summary(&summary, &args);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Base config (file, preset or default), then CLI/env overrides, then validation
fn load_config(args: &Args) -> ConfigResult<AlarmConfig> {
    let mut config = match (&args.config, args.preset) {
        (Some(path), _) => AlarmConfig::from_json_file(path)?,
        (None, Some(Preset::Production)) => AlarmConfig::production(),
        (None, Some(Preset::Bench)) => AlarmConfig::bench(),
        // The demo is only watchable with short timers
        (None, None) if args.script.is_none() => AlarmConfig::bench(),
        (None, None) => AlarmConfig::default(),
    };

    if let Some(v) = args.min_distance {
        config.min_distance_cm = v;
    }
    if let Some(v) = args.max_distance {
        config.max_distance_cm = v;
    }
    if let Some(v) = args.alert_after {
        config.alert_after_seconds = v;
    }
    if let Some(v) = args.timeout {
        config.timeout_seconds = v;
    }
    if let Some(v) = args.resolution {
        config.resolution = v;
    }
    if args.debug {
        config.debug = true;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> ConfigResult<RunSummary> {
    let config = load_config(args)?;

    let pacer = || -> Box<dyn Pacer> {
        if args.fast {
            Box::new(VirtualPacer::new())
        } else {
            Box::new(ThreadPacer)
        }
    };

    let led = LedController::new(SimPin::new("led"), config.led, pacer())?;
    let buzzer = build_buzzer(&config, args.chirp, pacer())?;
    let dispatcher = ActionDispatcher::new(led, buzzer, pacer());

    let monitor = LoiteringMonitor::new(config.monitor_settings())?;
    let band = config.presence_band()?;

    let mut alarm = LoiteringAlarm::new(open_sensor(args, &config)?, band, monitor, dispatcher);

    if config.debug {
        let formatter: Formatter = if args.json {
            json_formatter
        } else if args.no_color {
            verbose_formatter
        } else {
            verbose_colored_formatter
        };
        alarm.add_writer(Writer::new("serial", Box::new(SerialConsole), formatter));
    }

    let lcd = if args.no_display {
        CharacterLcd::disconnected()
    } else {
        CharacterLcd::new().with_mirror(!args.json)
    };
    if let Some(writer) = Writer::if_available("lcd", Box::new(lcd), lcd_formatter) {
        alarm.add_writer(writer);
    }

    Ok(alarm.run())
}

fn build_buzzer(
    config: &AlarmConfig,
    chirp: bool,
    pacer: Box<dyn Pacer>,
) -> ConfigResult<Box<dyn AlarmOutput>> {
    let pattern = if chirp { startup_chirp()? } else { Vec::new() };

    if config.buzzer.active {
        let mut buzzer = Buzzer::new(ActiveDrive::new(SimPin::new("buzzer")), pacer);
        buzzer.play(&pattern);
        Ok(Box::new(buzzer))
    } else {
        let drive = PassiveDrive::new(SimPwm::new(), &config.buzzer)?;
        let mut buzzer = Buzzer::new(drive, pacer);
        buzzer.play(&pattern);
        Ok(Box::new(buzzer))
    }
}

/// Rising two-tone beep
fn startup_chirp() -> ConfigResult<Vec<Pulse>> {
    Ok(vec![
        Pulse::new(80, 40, Some(2000), None)?,
        Pulse::new(80, 0, Some(3000), None)?,
    ])
}

fn open_sensor(args: &Args, config: &AlarmConfig) -> ConfigResult<Box<dyn DistanceSensor>> {
    let sensor: Box<dyn DistanceSensor> = match args.script.as_deref() {
        Some("-") => {
            info!("reading distances from stdin");
            Box::new(LineSensor::new(io::stdin().lock()))
        }
        Some(path) => {
            let file = File::open(path).map_err(ConfigError::Io)?;
            info!(path, "replaying distance script");
            Box::new(LineSensor::new(BufReader::new(file)))
        }
        None => {
            info!(
                echo_timeout_us = config.echo_timeout_us,
                "running built-in demo scenario"
            );
            let timer = SimEchoTimer::new(demo_scenario(config));
            Box::new(EchoRanger::with_timeout(timer, config.echo_timeout_us))
        }
    };
    Ok(sensor)
}

/// Walk-up scenario scaled to the configured timers: a passer-by, someone who
/// lingers until the alarm, steps away, returns, and finally leaves.
/// "Away" stays within ranging distance when the echo timeout allows it.
fn demo_scenario(config: &AlarmConfig) -> Vec<Option<f64>> {
    let ticks = |seconds: f64| (seconds / config.resolution).ceil() as usize;
    let inside = (config.min_distance_cm + config.max_distance_cm) / 2.0;
    let range = max_range_cm(config.echo_timeout_us);
    let outside = if range > config.max_distance_cm {
        (config.max_distance_cm + range) / 2.0
    } else {
        config.max_distance_cm + 100.0
    };

    let mut readings = Vec::new();
    readings.extend(std::iter::repeat(Some(outside)).take(4));
    // passer-by
    readings.push(Some(inside));
    readings.extend(std::iter::repeat(Some(outside)).take(ticks(config.timeout_seconds) + 2));
    // lingerer, with the occasional missed echo
    for i in 0..ticks(config.alert_after_seconds) + 8 {
        readings.push(if i % 7 == 6 { None } else { Some(inside) });
    }
    readings.extend(std::iter::repeat(Some(outside)).take(ticks(config.timeout_seconds) / 2));
    readings.extend(std::iter::repeat(Some(inside)).take(3));
    readings.extend(std::iter::repeat(Some(outside)).take(ticks(config.timeout_seconds) + 4));
    readings
}

fn print_summary(summary: &RunSummary, args: &Args) {
    if args.json {
        match serde_json::to_string(summary) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{} {}", "error:".red().bold(), e),
        }
        return;
    }
    println!();
    println!(
        "Run finished. Ticks: {} processed, {} skipped. Final state: {}",
        summary.processed,
        summary.skipped,
        summary.final_state.name().color(summary.final_state.color()).bold()
    );
}
