use anyhow::Context;
use clap::{ArgAction, Parser};

mod capture;
mod config;
mod daemon;
mod geometry;
mod hotkeys;
mod notification;
mod selection;
mod singleton;
mod startup;
mod util;

#[derive(Parser, Debug)]
#[command(name = "traysnap")]
#[command(version, about = "Tray-resident screenshot tool with global hotkeys")]
struct Cli {
    /// Run the tray daemon (global hotkeys + tray menu)
    #[arg(long, short = 't', action = ArgAction::SetTrue, conflicts_with_all = ["fullscreen", "region", "image"])]
    tray: bool,

    /// Capture the full virtual desktop once and exit
    #[arg(long, short = 'f', action = ArgAction::SetTrue, conflicts_with = "region")]
    fullscreen: bool,

    /// Drag-select a region, capture it, and exit
    #[arg(long, short = 'r', action = ArgAction::SetTrue)]
    region: bool,

    /// Force clipboard image delivery for a one-shot capture
    #[arg(long, short = 'i', action = ArgAction::SetTrue)]
    image: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.tray {
        log::info!(
            "traysnap {} ({})",
            env!("CARGO_PKG_VERSION"),
            env!("TRAYSNAP_GIT_HASH")
        );

        let lock = singleton::InstanceLock::acquire()
            .context("Failed to check for a running instance")?;
        let Some(_lock) = lock else {
            log::info!("Another traysnap instance is already running; exiting");
            return Ok(());
        };

        let config = config::Config::load_or_default();
        let mut daemon = daemon::Daemon::new(config)?;
        daemon.run()?;
    } else if cli.fullscreen || cli.region {
        run_one_shot(&cli)?;
    } else {
        // No flags: show usage
        println!("traysnap: tray-resident screenshot tool with global hotkeys");
        println!();
        println!("Usage:");
        println!("  traysnap --tray          Run the tray daemon (hotkeys + menu)");
        println!("  traysnap --fullscreen    Capture the full desktop once and exit");
        println!("  traysnap --region        Drag-select a region, capture, exit");
        println!("  traysnap --image         With a capture flag: force clipboard image");
        println!("  traysnap --help          Show help");
        println!();
        println!("Daemon hotkeys:");
        println!("  Ctrl+Alt+S  Full screen, PNG file path to clipboard");
        println!("  Alt+S       Drag-select region, PNG file path to clipboard");
        println!("  Ctrl+Alt+Q  Full screen, image to clipboard");
        println!("  Alt+Q       Drag-select region, image to clipboard");
        println!();
        println!("PNG-flavoured hotkeys copy an image instead unless");
        println!("'Save as PNG Path' is enabled in the tray menu.");
    }

    Ok(())
}

/// Capture once from the command line, mirroring the daemon's pipeline.
fn run_one_shot(cli: &Cli) -> anyhow::Result<()> {
    let config = config::Config::load_or_default();
    let deps = capture::CaptureDependencies::default();
    let mode = capture::DeliveryMode::resolve(cli.image, config.capture.save_as_path);
    let metrics = geometry::XcapMetrics;

    let region = if cli.region {
        log::info!("Starting selection overlay...");
        match selection::select_region(&metrics, deps.capturer.as_ref())? {
            Some(region) => region,
            None => {
                log::info!("Selection cancelled");
                return Ok(());
            }
        }
    } else {
        geometry::virtual_desktop_bounds(&metrics)?
    };

    let request = capture::CaptureRequest { region, mode };
    let receipt = capture::dispatch(&request, &config.capture.screenshot_folder, &deps)
        .context("Capture failed")?;

    // The saved path goes to stdout so shell pipelines can pick it up.
    match &receipt.saved_path {
        Some(path) => println!("{}", path.display()),
        None => println!("Copied to clipboard ({}x{})", receipt.width, receipt.height),
    }

    Ok(())
}
