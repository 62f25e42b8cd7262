//! dcnview - terminal front end for d2dcn device services
//!
//! Binary entry point: parses flags, loads settings, subscribes, and hands
//! the engine to the TUI. Devices come from the in-process simulated network.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{info, warn};

use dcnview_app::config::{self, AppConfig, Settings, SubscriptionSettings};
use dcnview_app::Engine;
use dcnview_core::logging;
use dcnview_transport::{spawn_demo_device, DemoDevice, SimulatedNetwork};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// dcnview - browse d2dcn devices, watch live info, and call commands
#[derive(Parser, Debug)]
#[command(name = "dcnview", version)]
#[command(about = "Browse and drive d2dcn device services", long_about = None)]
struct Args {
    /// Lay devices out side by side
    #[arg(long)]
    device_hlayout: bool,

    /// Lay each service's categories out side by side
    #[arg(long)]
    category_hlayout: bool,

    /// Lay a category's fields and commands out on one row
    #[arg(long)]
    object_hlayout: bool,

    /// Do not subscribe to commands
    #[arg(long)]
    ignore_command: bool,

    #[arg(long, value_name = "REGEX")]
    command_mac_pattern: Option<String>,

    #[arg(long, value_name = "REGEX")]
    command_service_pattern: Option<String>,

    #[arg(long, value_name = "REGEX")]
    command_category_pattern: Option<String>,

    #[arg(long, value_name = "REGEX")]
    command_name_pattern: Option<String>,

    /// Do not subscribe to info fields
    #[arg(long)]
    ignore_info: bool,

    #[arg(long, value_name = "REGEX")]
    info_mac_pattern: Option<String>,

    #[arg(long, value_name = "REGEX")]
    info_service_pattern: Option<String>,

    #[arg(long, value_name = "REGEX")]
    info_category_pattern: Option<String>,

    #[arg(long, value_name = "REGEX")]
    info_name_pattern: Option<String>,

    /// Settings file (defaults to `<config dir>/dcnview/config.toml`)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of simulated devices to publish
    #[arg(long, value_name = "N", default_value_t = 4)]
    simulate: usize,
}

impl Args {
    /// Flags win over the settings file
    fn apply(&self, settings: &mut Settings) {
        let layout = &mut settings.ui.layout;
        layout.device_horizontal |= self.device_hlayout;
        layout.category_horizontal |= self.category_hlayout;
        layout.object_horizontal |= self.object_hlayout;

        override_subscription(
            &mut settings.commands,
            self.ignore_command,
            [
                &self.command_mac_pattern,
                &self.command_service_pattern,
                &self.command_category_pattern,
                &self.command_name_pattern,
            ],
        );
        override_subscription(
            &mut settings.info,
            self.ignore_info,
            [
                &self.info_mac_pattern,
                &self.info_service_pattern,
                &self.info_category_pattern,
                &self.info_name_pattern,
            ],
        );
    }
}

fn override_subscription(
    target: &mut SubscriptionSettings,
    ignore: bool,
    [mac, service, category, name]: [&Option<String>; 4],
) {
    target.ignore |= ignore;
    for (slot, value) in [
        (&mut target.mac, mac),
        (&mut target.service, service),
        (&mut target.category, category),
        (&mut target.name, name),
    ] {
        if let Some(value) = value {
            slot.clone_from(value);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    logging::init(VERSION).wrap_err("failed to initialize logging")?;

    // An explicit --config must exist; the default location is optional
    let mut settings = match (&args.config, config::default_config_path()) {
        (Some(path), _) => config::read_settings(path)?,
        (None, Some(path)) => config::load_settings(&path),
        (None, None) => Settings::default(),
    };
    args.apply(&mut settings);

    let network = Arc::new(SimulatedNetwork::new());
    let engine = Engine::new(network.clone(), AppConfig::from_settings(VERSION, &settings))?;

    if settings.commands.ignore {
        info!("Command subscription skipped");
    } else {
        engine
            .subscribe_commands(&settings.commands.pattern())
            .await
            .wrap_err("invalid command pattern")?;
    }
    if settings.info.ignore {
        info!("Info subscription skipped");
    } else {
        engine
            .subscribe_info(&settings.info.pattern())
            .await
            .wrap_err("invalid info pattern")?;
    }

    let devices = spawn_devices(&network, args.simulate);
    if devices.is_empty() {
        warn!("No simulated devices requested");
    }

    let result = dcnview_tui::run(engine).await;
    drop(devices);
    result?;
    Ok(())
}

fn spawn_devices(network: &SimulatedNetwork, count: usize) -> Vec<DemoDevice> {
    (1..=count)
        .map(|n| {
            let mac = format!("02:00:00:00:00:{:02x}", n);
            spawn_demo_device(network, &mac, "test", "command", "info", "values")
        })
        .collect()
}
