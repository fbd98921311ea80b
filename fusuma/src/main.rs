#[cfg(target_os = "macos")]
mod app;
mod ipc;
#[cfg(target_os = "macos")]
mod macos;
mod summary;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use fusuma_core::config::TEMPLATE;
use fusuma_core::Config;
use fusuma_ipc::{Command, Response};
use ipc::IpcClient;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fusuma - automatic tiling window manager for macOS
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    InitConfig(InitConfigCmd),
    CheckConfig(CheckConfigCmd),
    Reflow(ReflowCmd),
    Reload(ReloadCmd),
    ListApps(ListAppsCmd),
    ListBindings(ListBindingsCmd),
    Quit(QuitCmd),
    Shadows(ShadowsCmd),
    Version(VersionCmd),
}

/// Start the fusuma daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {
    /// configuration file (default: ~/.config/fusuma/config.toml)
    #[argh(option)]
    config: Option<PathBuf>,
    /// log filter, e.g. "debug" or "fusuma_core=trace" (default: $RUST_LOG or info)
    #[argh(option)]
    log_level: Option<String>,
    /// file that receives a copy of the log (default: $TMPDIR/fusuma.log)
    #[argh(option)]
    log_file: Option<PathBuf>,
}

/// Write a commented configuration template
#[derive(FromArgs)]
#[argh(subcommand, name = "init-config")]
struct InitConfigCmd {
    /// destination file (default: ~/.config/fusuma/config.toml)
    #[argh(option)]
    config: Option<PathBuf>,
    /// overwrite an existing file
    #[argh(switch)]
    force: bool,
}

/// Validate a configuration file and print what it sets up
#[derive(FromArgs)]
#[argh(subcommand, name = "check-config")]
struct CheckConfigCmd {
    /// configuration file (default: ~/.config/fusuma/config.toml)
    #[argh(option)]
    config: Option<PathBuf>,
}

/// Re-apply the layout to all managed windows
#[derive(FromArgs)]
#[argh(subcommand, name = "reflow")]
struct ReflowCmd {}

/// Re-read the configuration file
#[derive(FromArgs)]
#[argh(subcommand, name = "reload")]
struct ReloadCmd {}

/// List registered applications
#[derive(FromArgs)]
#[argh(subcommand, name = "list-apps")]
struct ListAppsCmd {}

/// List hotkey bindings
#[derive(FromArgs)]
#[argh(subcommand, name = "list-bindings")]
struct ListBindingsCmd {}

/// Quit the fusuma daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

/// Turn window shadows on or off for the current session
#[derive(FromArgs)]
#[argh(subcommand, name = "shadows")]
struct ShadowsCmd {}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["fusuma", "--help"];
            if let Err(e) = Cli::from_args(&args[..1], &args[1..]) {
                println!("{}", e.output);
            }
            Ok(())
        }
        Some(SubCommand::Start(cmd)) => {
            let filter = match cmd.log_level {
                Some(level) => EnvFilter::try_new(&level)
                    .with_context(|| format!("Invalid log level {:?}", level))?,
                None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            };
            init_logging(filter, &cmd.log_file.unwrap_or_else(default_log_path));

            tracing::info!("fusuma {} starting", VERSION);
            start(resolve_config_path(cmd.config)?)
        }
        Some(SubCommand::InitConfig(cmd)) => init_config(&resolve_config_path(cmd.config)?, cmd.force),
        Some(SubCommand::CheckConfig(cmd)) => check_config(&resolve_config_path(cmd.config)?),
        Some(SubCommand::Shadows(_)) => shadows(),
        Some(SubCommand::Version(_)) => {
            println!("fusuma {}", VERSION);
            Ok(())
        }
        Some(subcmd) => run_cli(subcmd),
    }
}

#[cfg(target_os = "macos")]
fn start(config_path: PathBuf) -> Result<()> {
    app::App::run(config_path)
}

#[cfg(not(target_os = "macos"))]
fn start(_config_path: PathBuf) -> Result<()> {
    bail!("The fusuma daemon only runs on macOS")
}

#[cfg(target_os = "macos")]
fn shadows() -> Result<()> {
    if macos::toggle_shadows() {
        println!("Window shadows disabled");
    } else {
        println!("Window shadows enabled");
    }
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn shadows() -> Result<()> {
    bail!("Window shadows can only be toggled on macOS")
}

fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("fusuma.log")
}

/// Log to the console and append a plain copy to `log_file`. An unwritable
/// log file leaves the console alone.
fn init_logging(filter: EnvFilter, log_file: &Path) {
    let file_layer = open_log(log_file)
        .map(|writer| fmt::layer().with_ansi(false).with_writer(writer));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
}

fn open_log(log_file: &Path) -> Option<Mutex<File>> {
    match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => Some(Mutex::new(file)),
        Err(e) => {
            eprintln!("fusuma: failed to open log file {}: {}", log_file.display(), e);
            None
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fusuma").join("config.toml"))
}

fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => default_config_path().context("Could not determine the configuration directory"),
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{:?} already exists (use --force to overwrite)", path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    std::fs::write(path, TEMPLATE).with_context(|| format!("Failed to write {:?}", path))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    if !path.exists() {
        println!("{} not found, defaults apply", path.display());
    }
    let config = Config::load(path).with_context(|| format!("Invalid configuration {:?}", path))?;
    println!("{}", summary::describe_config(&config));
    Ok(())
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd)?;
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::Applications { applications } => {
            for app in applications {
                println!(
                    "{}: {} ({}) [{}/{} windows managed]{}",
                    app.pid,
                    app.title.as_deref().unwrap_or("?"),
                    app.bundle_id,
                    app.managed_count,
                    app.window_count,
                    if app.hidden == Some(true) { " hidden" } else { "" }
                );
            }
        }
        Response::Bindings { bindings } => {
            for b in bindings {
                println!("{} -> {}", b.key, b.action);
            }
        }
    }

    Ok(())
}

fn to_command(subcmd: SubCommand) -> Result<Command> {
    match subcmd {
        SubCommand::Reflow(_) => Ok(Command::Reflow),
        SubCommand::Reload(_) => Ok(Command::Reload),
        SubCommand::ListApps(_) => Ok(Command::ListApplications),
        SubCommand::ListBindings(_) => Ok(Command::ListBindings),
        SubCommand::Quit(_) => Ok(Command::Quit),
        SubCommand::Start(_)
        | SubCommand::InitConfig(_)
        | SubCommand::CheckConfig(_)
        | SubCommand::Shadows(_)
        | SubCommand::Version(_) => bail!("not a daemon command"),
    }
}
