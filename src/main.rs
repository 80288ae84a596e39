//! `catpoint` command line front end for the alarm controller.
//!
//! Usage:
//!   catpoint status
//!   catpoint sensor add "Front Door" --type door
//!   catpoint arm home
//!   catpoint scan frame.jpg
//!   catpoint shell

use catpoint_alarm::config::{ClassifierKind, Config};
use catpoint_alarm::image::{CameraImage, classifier_from_config};
use catpoint_alarm::simulation::run_sensor_simulation;
use catpoint_alarm::store::{JsonFileStateStore, StoreLock};
use catpoint_alarm::{
    AlarmController, AlarmError, ArmingStatus, LogListener, Result, Sensor, SensorType,
};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::time::Duration;

#[derive(Parser)]
#[command(name = "catpoint")]
#[command(about = "Home security alarm controller")]
struct Cli {
    /// JSON file holding the alarm state
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Image classifier used by `scan`
    #[arg(long, global = true)]
    classifier: Option<ClassifierKind>,

    #[command(subcommand)]
    command: Commands,
}

/// A single line typed into `catpoint shell`.
#[derive(Parser)]
#[command(name = "catpoint", no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Show arming mode, alarm status and sensors
    Status,
    /// Arm the system
    Arm {
        #[arg(value_enum)]
        mode: ArmMode,
    },
    /// Disarm the system and clear the alarm
    Disarm,
    /// Manage sensors
    Sensor {
        #[command(subcommand)]
        action: SensorCommand,
    },
    /// Classify camera images and apply the cat-detection rules
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Interactive session keeping cat detection between commands
    Shell,
    /// Randomly toggle sensors until Ctrl+C
    Simulate {
        /// Seconds between sensor toggles
        #[arg(long, env = "CATPOINT_SIM_INTERVAL_SECS", default_value_t = 5)]
        interval_secs: u64,

        /// Stop after this many toggles
        #[arg(long)]
        ticks: Option<u64>,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
enum SensorCommand {
    /// List all sensors
    List,
    /// Register a new sensor
    Add(SensorArgs),
    /// Remove a sensor
    Remove(SensorArgs),
    /// Mark a sensor as active
    Activate(SensorArgs),
    /// Mark a sensor as inactive
    Deactivate(SensorArgs),
}

#[derive(clap::Args, Debug, PartialEq)]
struct SensorArgs {
    /// Sensor name
    name: String,

    /// Sensor type (door, window, motion)
    #[arg(long = "type", short = 't')]
    sensor_type: SensorType,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum ArmMode {
    Home,
    Away,
}

impl From<ArmMode> for ArmingStatus {
    fn from(mode: ArmMode) -> Self {
        match mode {
            ArmMode::Home => ArmingStatus::ArmedHome,
            ArmMode::Away => ArmingStatus::ArmedAway,
        }
    }
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn find_sensor(controller: &AlarmController, args: &SensorArgs) -> Result<Sensor> {
    controller
        .sensors()
        .into_iter()
        .find(|s| s.name() == args.name && s.sensor_type() == args.sensor_type)
        .ok_or_else(|| AlarmError::UnknownSensor {
            name: args.name.clone(),
            sensor_type: args.sensor_type,
        })
}

fn print_status(controller: &AlarmController) {
    let arming = controller.arming_status();
    let alarm = controller.alarm_status();
    println!("Arming: {} ({})", arming, arming.description());
    println!("Alarm:  {} ({})", alarm, alarm.description());
    println!(
        "Cat:    {}",
        if controller.is_cat_detected() {
            "detected"
        } else {
            "not detected"
        }
    );
    print_sensors(controller);
}

fn print_sensors(controller: &AlarmController) {
    let sensors = controller.sensors();
    if sensors.is_empty() {
        println!("No sensors");
        return;
    }
    for sensor in sensors {
        println!(
            "  {:<20} {:<8} {}",
            sensor.name(),
            sensor.sensor_type(),
            if sensor.is_active() { "active" } else { "inactive" }
        );
    }
}

fn run_sensor_command(controller: &AlarmController, action: SensorCommand) -> Result<()> {
    match action {
        SensorCommand::List => print_sensors(controller),
        SensorCommand::Add(args) => {
            if find_sensor(controller, &args).is_ok() {
                return Err(AlarmError::DuplicateSensor {
                    name: args.name,
                    sensor_type: args.sensor_type,
                });
            }
            controller.add_sensor(Sensor::new(args.name, args.sensor_type));
        }
        SensorCommand::Remove(args) => {
            let sensor = find_sensor(controller, &args)?;
            controller.remove_sensor(&sensor);
        }
        SensorCommand::Activate(args) => {
            let mut sensor = find_sensor(controller, &args)?;
            controller.change_sensor_activation(&mut sensor, true);
        }
        SensorCommand::Deactivate(args) => {
            let mut sensor = find_sensor(controller, &args)?;
            controller.change_sensor_activation(&mut sensor, false);
        }
    }
    Ok(())
}

/// Classify each image on a blocking worker so slow backends do not stall
/// the runtime.
async fn scan_images(controller: &Arc<AlarmController>, images: Vec<PathBuf>) -> Result<()> {
    for path in images {
        let image = CameraImage::load(&path)?;
        let worker = controller.clone();
        let cat = tokio::task::spawn_blocking(move || worker.process_image(&image)).await?;
        println!(
            "{}: {}",
            path.display(),
            if cat { "cat detected" } else { "clear" }
        );
    }
    Ok(())
}

async fn simulate(
    controller: &Arc<AlarmController>,
    interval_secs: u64,
    ticks: Option<u64>,
) -> Result<()> {
    let period = Duration::from_secs(interval_secs.max(1));
    info!("Simulating sensor activity every {:?}", period);
    let mut task = run_sensor_simulation(controller.clone(), period, ticks);

    tokio::select! {
        result = &mut task => result?,
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => error!("Failed to listen for shutdown signal: {}", e),
            }
            task.abort();
        }
    }
    Ok(())
}

/// Parse one shell line. Help and usage errors are printed by clap and
/// yield `None`.
fn parse_shell_line(words: &[&str]) -> Option<Commands> {
    match ShellLine::try_parse_from(words.iter().copied()) {
        Ok(parsed) => Some(parsed.command),
        Err(e) => {
            if let Err(print_err) = e.print() {
                debug!("Failed to print usage: {}", print_err);
            }
            None
        }
    }
}

async fn shell(controller: &Arc<AlarmController>) -> Result<()> {
    println!("catpoint shell - type 'help' for commands, 'exit' to quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["exit"] | ["quit"] => break,
            _ => {}
        }

        let Some(command) = parse_shell_line(&words) else {
            continue;
        };
        if command == Commands::Shell {
            println!("Already in a shell");
            continue;
        }
        if let Err(e) = Box::pin(run_command(controller, command)).await {
            error!("{}", e);
        }
    }
    Ok(())
}

async fn run_command(controller: &Arc<AlarmController>, command: Commands) -> Result<()> {
    match command {
        Commands::Status => print_status(controller),
        Commands::Arm { mode } => controller.set_arming_status(mode.into()),
        Commands::Disarm => controller.set_arming_status(ArmingStatus::Disarmed),
        Commands::Sensor { action } => run_sensor_command(controller, action)?,
        Commands::Scan { images } => scan_images(controller, images).await?,
        Commands::Shell => shell(controller).await?,
        Commands::Simulate {
            interval_secs,
            ticks,
        } => simulate(controller, interval_secs, ticks).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file before anything else
    catpoint_alarm::config::load_dotenv();
    init_logger();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(path) = cli.store {
        config.store.path = path;
    }
    if let Some(kind) = cli.classifier {
        config.camera.classifier = kind;
    }

    let _lock = match StoreLock::acquire(&config.store.path) {
        Ok(lock) => lock,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Using alarm state at {:?}", config.store.path);
    let controller = Arc::new(AlarmController::new(
        Box::new(JsonFileStateStore::open(&config.store.path)),
        classifier_from_config(&config.camera),
    ));
    controller.add_status_listener(Arc::new(LogListener));

    match run_command(&controller, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
