//! Tray daemon: background service driving hotkeys, tray menu, and captures.

use anyhow::{Context, Result, anyhow};
use ksni::TrayMethods;
use log::{debug, info, warn};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::capture::{self, CaptureDependencies, CaptureRequest, DeliveryMode, file};
use crate::config::Config;
use crate::geometry::{self, DisplayMetricsProvider, XcapMetrics};
use crate::hotkeys::{GlobalHotkeyBackend, HotkeyAction, HotkeyRouter, RegistrationReport};
use crate::notification;
use crate::selection::{self, SelectionError, SessionGuard};
use crate::startup;
use crate::util::Rect;

const TRAY_START_TIMEOUT: Duration = Duration::from_secs(5);
const LOOP_TICK: Duration = Duration::from_millis(100);

/// Runs a selection overlay session, yielding the chosen desktop rect.
type RegionSelector = dyn Fn() -> Result<Option<Rect>, SelectionError> + Send + Sync;

/// Delivers a desktop notification (summary, body, expire milliseconds).
type Notifier = dyn Fn(&str, &str, i32) + Send + Sync;

/// Commands the tray menu sends to the daemon loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrayCommand {
    Capture(HotkeyAction),
    ToggleSaveAsPath,
    ToggleRunAtStartup,
    ChangeFolder,
    ReregisterHotkeys,
}

pub struct Daemon {
    config: Config,
    deps: CaptureDependencies,
    metrics: Arc<dyn DisplayMetricsProvider>,
    region_selector: Arc<RegionSelector>,
    notifier: Arc<Notifier>,
    router: Option<HotkeyRouter<GlobalHotkeyBackend>>,
    should_quit: Arc<AtomicBool>,
    session_active: Arc<AtomicBool>,
    tray_thread: Option<JoinHandle<()>>,
    runtime: Option<tokio::runtime::Runtime>,
}

impl Daemon {
    pub fn new(config: Config) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new()
            .context("Failed to create Tokio runtime for notifications")?;
        let handle = runtime.handle().clone();
        let notifier: Arc<Notifier> = Arc::new(move |summary: &str, body: &str, expire_ms| {
            notification::send_notification_async(
                &handle,
                summary.to_string(),
                body.to_string(),
                None,
                expire_ms,
            );
        });

        let deps = CaptureDependencies::default();
        let selector_capturer = Arc::clone(&deps.capturer);
        let region_selector: Arc<RegionSelector> =
            Arc::new(move || selection::select_region(&XcapMetrics, selector_capturer.as_ref()));

        Ok(Self {
            config,
            deps,
            metrics: Arc::new(XcapMetrics),
            region_selector,
            notifier,
            router: None,
            should_quit: Arc::new(AtomicBool::new(false)),
            session_active: Arc::new(AtomicBool::new(false)),
            tray_thread: None,
            runtime: Some(runtime),
        })
    }

    #[cfg(test)]
    fn with_parts(
        config: Config,
        deps: CaptureDependencies,
        metrics: Arc<dyn DisplayMetricsProvider>,
        region_selector: Arc<RegionSelector>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            config,
            deps,
            metrics,
            region_selector,
            notifier,
            router: None,
            should_quit: Arc::new(AtomicBool::new(false)),
            session_active: Arc::new(AtomicBool::new(false)),
            tray_thread: None,
            runtime: None,
        }
    }

    /// Run the daemon until a quit signal arrives.
    pub fn run(&mut self) -> Result<()> {
        info!("Starting traysnap daemon");

        let folder = self.config.capture.screenshot_folder.clone();
        if let Err(err) = file::ensure_directory_exists(&folder) {
            warn!(
                "Could not create screenshot folder {}: {}",
                folder.display(),
                err
            );
        }

        if let Err(err) = startup::apply(self.config.startup.run_at_startup) {
            warn!("Could not update autostart entry: {err:#}");
        }

        // Signal handler thread. It runs until process termination; the
        // signal_hook iterator has no clean shutdown with forever(), which is
        // acceptable as the thread holds no resources needing cleanup.
        let mut signals =
            Signals::new([SIGTERM, SIGINT]).context("Failed to register signal handler")?;
        let quit_flag = self.should_quit.clone();
        thread::spawn(move || {
            for sig in signals.forever() {
                match sig {
                    SIGTERM | SIGINT => {
                        info!(
                            "Received {} - initiating graceful shutdown",
                            if sig == SIGTERM { "SIGTERM" } else { "SIGINT" }
                        );
                        quit_flag.store(true, Ordering::Release);
                    }
                    _ => {
                        warn!("Received unexpected signal: {}", sig);
                    }
                }
            }
        });

        match GlobalHotkeyBackend::new() {
            Ok(backend) => {
                let mut router = HotkeyRouter::new(backend);
                let report = router.register_all();
                self.router = Some(router);
                self.notify_registration(&report);
            }
            Err(err) => {
                // Degraded but functional: the tray menu still triggers
                // every action.
                warn!("Global hotkeys unavailable: {}", err);
                self.notify(
                    "traysnap Warning",
                    &format!("Global hotkeys unavailable: {}. Use tray menu.", err),
                    5000,
                );
            }
        }

        let (command_tx, command_rx) = mpsc::channel();
        let tray_handle = start_system_tray(
            command_tx,
            self.should_quit.clone(),
            self.config.capture.save_as_path,
            self.config.startup.run_at_startup,
        )
        .context("Failed to start system tray")?;
        self.tray_thread = Some(tray_handle);

        info!("Daemon ready - waiting for hotkeys and tray commands");

        loop {
            if self.should_quit.load(Ordering::Acquire) {
                info!("Quit signal received - exiting daemon");
                break;
            }

            loop {
                let action = match self.router.as_mut() {
                    Some(router) => router.poll_action(),
                    None => None,
                };
                let Some(action) = action else { break };
                self.run_action(action);
            }

            while let Ok(command) = command_rx.try_recv() {
                self.handle_command(command);
            }

            thread::sleep(LOOP_TICK);
        }

        info!("Daemon shutting down");
        self.should_quit.store(true, Ordering::Release);
        if let Some(handle) = self.tray_thread.take() {
            match handle.join() {
                Ok(()) => info!("System tray thread joined"),
                Err(err) => warn!("System tray thread panicked: {:?}", err),
            }
        }
        if let Some(runtime) = self.runtime.take() {
            // Give in-flight notification tasks a moment to finish.
            runtime.shutdown_timeout(Duration::from_secs(1));
        }
        Ok(())
    }

    /// Execute one capture action, from a hotkey or the tray menu.
    fn run_action(&mut self, action: HotkeyAction) {
        let mode = DeliveryMode::resolve(
            action.forces_clipboard_image(),
            self.config.capture.save_as_path,
        );
        debug!("Running {:?} in {:?} mode", action, mode);

        if action.is_region() {
            self.run_region_capture(mode);
        } else {
            self.run_fullscreen_capture(mode);
        }
    }

    fn run_fullscreen_capture(&mut self, mode: DeliveryMode) {
        let region = match geometry::virtual_desktop_bounds(self.metrics.as_ref()) {
            Ok(bounds) => bounds,
            Err(err) => {
                warn!("Cannot determine desktop bounds: {}", err);
                self.notify("Screenshot Error", &err.to_string(), 3000);
                return;
            }
        };
        self.dispatch_capture(region, mode, "Screenshot Error");
    }

    fn run_region_capture(&mut self, mode: DeliveryMode) {
        let Some(session) = SessionGuard::try_acquire(&self.session_active) else {
            debug!("Selection session already active; dropping trigger");
            return;
        };

        match (self.region_selector)() {
            Ok(Some(region)) => self.dispatch_capture(region, mode, "Snip Error"),
            Ok(None) => debug!("Selection cancelled"),
            Err(err) => {
                warn!("Selection session failed: {}", err);
                self.notify("Snip Error", &err.to_string(), 3000);
            }
        }

        drop(session);
        // Hotkey presses queued while the overlay was up are stale.
        if let Some(router) = self.router.as_mut() {
            router.drain();
        }
    }

    fn dispatch_capture(&mut self, region: Rect, mode: DeliveryMode, error_summary: &str) {
        let request = CaptureRequest { region, mode };
        match capture::dispatch(
            &request,
            &self.config.capture.screenshot_folder,
            &self.deps,
        ) {
            Ok(receipt) => {
                info!(
                    "{} ({}x{})",
                    receipt.summary(),
                    receipt.width,
                    receipt.height
                );
                self.notify(receipt.summary(), &receipt.body(), receipt.expire_ms());
            }
            Err(err) => {
                warn!("Capture failed: {}", err);
                self.notify(error_summary, &err.to_string(), 3000);
            }
        }
    }

    fn handle_command(&mut self, command: TrayCommand) {
        debug!("Tray command: {:?}", command);
        match command {
            TrayCommand::Capture(action) => self.run_action(action),
            TrayCommand::ToggleSaveAsPath => self.toggle_save_as_path(),
            TrayCommand::ToggleRunAtStartup => self.toggle_run_at_startup(),
            TrayCommand::ChangeFolder => self.change_folder(),
            TrayCommand::ReregisterHotkeys => self.reregister_hotkeys(),
        }
    }

    fn toggle_save_as_path(&mut self) {
        self.config.capture.save_as_path = !self.config.capture.save_as_path;
        self.persist_config();

        let mode = if self.config.capture.save_as_path {
            "PNG file path (for AI CLI)"
        } else {
            "Clipboard image"
        };
        info!("Delivery mode changed: {}", mode);
        self.notify(
            "Mode Changed",
            &format!("Screenshots saved as: {}", mode),
            2000,
        );
    }

    fn toggle_run_at_startup(&mut self) {
        self.config.startup.run_at_startup = !self.config.startup.run_at_startup;
        self.persist_config();

        if let Err(err) = startup::apply(self.config.startup.run_at_startup) {
            warn!("Could not update autostart entry: {err:#}");
            self.notify(
                "Startup Changed",
                &format!("Autostart update failed: {err}"),
                3000,
            );
            return;
        }

        let body = if self.config.startup.run_at_startup {
            "Will run at login"
        } else {
            "Removed from startup"
        };
        self.notify("Startup Changed", body, 2000);
    }

    fn change_folder(&mut self) {
        match pick_folder(&self.config.capture.screenshot_folder) {
            Ok(Some(folder)) => {
                info!("Screenshot folder changed to {}", folder.display());
                self.config.capture.screenshot_folder = folder.clone();
                self.persist_config();
                self.notify("Folder Changed", &folder.display().to_string(), 2000);
            }
            Ok(None) => debug!("Folder selection cancelled"),
            Err(err) => {
                warn!("Folder selection failed: {err:#}");
                let hint = Config::get_config_path()
                    .map(|p| format!("Edit capture.screenshot_folder in {}", p.display()))
                    .unwrap_or_else(|_| {
                        "Edit capture.screenshot_folder in the config file".to_string()
                    });
                self.notify("Folder Unchanged", &hint, 3000);
            }
        }
    }

    fn reregister_hotkeys(&mut self) {
        if self.router.is_none() {
            match GlobalHotkeyBackend::new() {
                Ok(backend) => self.router = Some(HotkeyRouter::new(backend)),
                Err(err) => {
                    warn!("Global hotkeys unavailable: {}", err);
                    self.notify(
                        "traysnap Warning",
                        &format!("Global hotkeys unavailable: {}. Use tray menu.", err),
                        5000,
                    );
                    return;
                }
            }
        }

        let report = self.router.as_mut().map(|router| router.reregister());
        if let Some(report) = report {
            self.notify_registration(&report);
        }
    }

    fn notify_registration(&self, report: &RegistrationReport) {
        if report.all_ok() {
            info!("All hotkeys registered");
            self.notify("traysnap Ready!", &RegistrationReport::ready_body(), 3000);
        } else {
            warn!(
                "{} hotkey combo(s) failed to register",
                report.failures().len()
            );
            self.notify("traysnap Warning", &report.failure_body(), 5000);
        }
    }

    fn persist_config(&self) {
        if let Err(err) = self.config.save() {
            warn!("Failed to save settings: {err:#}");
        }
    }

    fn notify(&self, summary: &str, body: &str, expire_ms: i32) {
        (self.notifier)(summary, body, expire_ms);
    }
}

/// Ask the user for a folder via `zenity`. `Ok(None)` means cancelled.
fn pick_folder(current: &Path) -> Result<Option<PathBuf>> {
    let output = Command::new("zenity")
        .arg("--file-selection")
        .arg("--directory")
        .arg("--title=Select Screenshot Folder")
        .arg(format!("--filename={}/", current.display()))
        .output()
        .context("Failed to launch zenity")?;

    if !output.status.success() {
        debug!("zenity exited with {}; treating as cancel", output.status);
        return Ok(None);
    }

    let selected = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if selected.is_empty() {
        return Ok(None);
    }
    Ok(Some(PathBuf::from(selected)))
}

// =============================================================================
// System tray
// =============================================================================

pub(crate) struct TraysnapTray {
    commands: Sender<TrayCommand>,
    quit_flag: Arc<AtomicBool>,
    save_as_path: bool,
    run_at_startup: bool,
}

impl TraysnapTray {
    fn new(
        commands: Sender<TrayCommand>,
        quit_flag: Arc<AtomicBool>,
        save_as_path: bool,
        run_at_startup: bool,
    ) -> Self {
        Self {
            commands,
            quit_flag,
            save_as_path,
            run_at_startup,
        }
    }

    fn send(&self, command: TrayCommand) {
        if let Err(err) = self.commands.send(command) {
            warn!("Tray command dropped: {}", err);
        }
    }
}

impl ksni::Tray for TraysnapTray {
    fn id(&self) -> String {
        "traysnap".into()
    }

    fn title(&self) -> String {
        "traysnap Screenshot Capture".into()
    }

    fn icon_name(&self) -> String {
        "camera-photo".into()
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            icon_name: "camera-photo".into(),
            icon_pixmap: vec![],
            title: format!("traysnap {}", env!("CARGO_PKG_VERSION")),
            description: "Alt+S / Ctrl+Alt+S: PNG file • Alt+Q / Ctrl+Alt+Q: clipboard".into(),
        }
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        // A little camera: dark body, viewfinder hump, ringed lens.
        let size = 22;
        let mut data = Vec::with_capacity(size * size * 4);

        for y in 0..size {
            for x in 0..size {
                let dx = x as i32 - 11;
                let dy = y as i32 - 12;
                let lens = dx * dx + dy * dy;
                let (a, r, g, b) = if lens <= 9 {
                    (255, 70, 130, 180)
                } else if lens <= 16 {
                    (255, 210, 210, 210)
                } else if (5..=7).contains(&y) && (8..=13).contains(&x) {
                    (255, 60, 60, 60)
                } else if (7..=17).contains(&y) && (2..=19).contains(&x) {
                    (255, 60, 60, 60)
                } else {
                    (0, 0, 0, 0)
                };

                data.push(a);
                data.push(r);
                data.push(g);
                data.push(b);
            }
        }

        vec![ksni::Icon {
            width: size as i32,
            height: size as i32,
            data,
        }]
    }

    fn category(&self) -> ksni::Category {
        ksni::Category::ApplicationStatus
    }

    fn status(&self) -> ksni::Status {
        ksni::Status::Active
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        debug!("Tray activated - full screen capture");
        self.send(TrayCommand::Capture(HotkeyAction::FullScreenPng));
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        use ksni::menu::*;

        vec![
            StandardItem {
                label: "--- PNG Mode (saves file) ---".to_string(),
                enabled: false,
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Full Screen PNG (Ctrl+Alt+S)".to_string(),
                icon_name: "camera-photo".into(),
                activate: Box::new(|this: &mut Self| {
                    this.send(TrayCommand::Capture(HotkeyAction::FullScreenPng));
                }),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Free Snip PNG (Alt+S)".to_string(),
                icon_name: "edit-cut".into(),
                activate: Box::new(|this: &mut Self| {
                    this.send(TrayCommand::Capture(HotkeyAction::RegionPng));
                }),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            StandardItem {
                label: "--- Image Mode (clipboard) ---".to_string(),
                enabled: false,
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Full Screen Image (Ctrl+Alt+Q)".to_string(),
                icon_name: "camera-photo".into(),
                activate: Box::new(|this: &mut Self| {
                    this.send(TrayCommand::Capture(HotkeyAction::FullScreenImage));
                }),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Free Snip Image (Alt+Q)".to_string(),
                icon_name: "edit-cut".into(),
                activate: Box::new(|this: &mut Self| {
                    this.send(TrayCommand::Capture(HotkeyAction::RegionImage));
                }),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            CheckmarkItem {
                label: "Save as PNG Path (for AI CLI)".to_string(),
                checked: self.save_as_path,
                activate: Box::new(|this: &mut Self| {
                    this.save_as_path = !this.save_as_path;
                    this.send(TrayCommand::ToggleSaveAsPath);
                }),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Change Screenshot Folder...".to_string(),
                icon_name: "folder".into(),
                activate: Box::new(|this: &mut Self| {
                    this.send(TrayCommand::ChangeFolder);
                }),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            CheckmarkItem {
                label: "Run at Startup".to_string(),
                checked: self.run_at_startup,
                activate: Box::new(|this: &mut Self| {
                    this.run_at_startup = !this.run_at_startup;
                    this.send(TrayCommand::ToggleRunAtStartup);
                }),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            StandardItem {
                label: "Re-register Hotkeys".to_string(),
                icon_name: "view-refresh".into(),
                activate: Box::new(|this: &mut Self| {
                    this.send(TrayCommand::ReregisterHotkeys);
                }),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Quit".to_string(),
                icon_name: "window-close".into(),
                activate: Box::new(|this: &mut Self| {
                    this.quit_flag.store(true, Ordering::Release);
                }),
                ..Default::default()
            }
            .into(),
        ]
    }
}

fn start_system_tray(
    commands: Sender<TrayCommand>,
    quit_flag: Arc<AtomicBool>,
    save_as_path: bool,
    run_at_startup: bool,
) -> Result<JoinHandle<()>> {
    let tray_quit_flag = quit_flag.clone();
    let tray = TraysnapTray::new(
        commands,
        tray_quit_flag.clone(),
        save_as_path,
        run_at_startup,
    );
    let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

    info!("Spawning system tray runtime thread...");

    let ready_thread_tx = ready_tx.clone();
    let tray_thread = thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Failed to create Tokio runtime for system tray: {}", e);
                report_tray_readiness(
                    &ready_thread_tx,
                    Err(anyhow!(
                        "Failed to create Tokio runtime for system tray: {e}"
                    )),
                );
                return;
            }
        };

        rt.block_on(async {
            match tray.spawn().await {
                Ok(handle) => {
                    info!("System tray spawned successfully");
                    report_tray_readiness(&ready_thread_tx, Ok(()));

                    // Monitor quit flag and shut down gracefully
                    loop {
                        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                        if tray_quit_flag.load(Ordering::Acquire) {
                            info!("Quit signal received - shutting down system tray");
                            let _ = handle.shutdown().await;
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!("System tray error: {}", e);
                    report_tray_readiness(&ready_thread_tx, Err(anyhow!("System tray error: {e}")));
                }
            }
        });
    });

    drop(ready_tx);

    match ready_rx.recv_timeout(TRAY_START_TIMEOUT) {
        Ok(result) => {
            result?;
            info!("System tray thread started");
            Ok(tray_thread)
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!("Timed out waiting for system tray to start");
            quit_flag.store(true, Ordering::Release);
            let _ = tray_thread.join();
            Err(anyhow!("Timed out waiting for system tray to start"))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let _ = tray_thread.join();
            Err(anyhow!(
                "System tray thread exited before signaling readiness"
            ))
        }
    }
}

fn report_tray_readiness(tx: &mpsc::Sender<Result<()>>, result: Result<()>) {
    if let Err(err) = tx.send(result) {
        debug!(
            "System tray readiness receiver dropped before signal could be delivered: {}",
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::{CaptureError, DeliveryError};
    use crate::capture::{ClipboardSink, PixelSnapshot, ScreenCapturer, SnapshotSaver};
    use crate::geometry::{GeometryError, MonitorGeometry};
    use image::{Rgba, RgbaImage};
    use ksni::{Tray, menu::MenuItem};
    use std::sync::Mutex;
    use std::sync::mpsc::Receiver;

    type NotificationLog = Arc<Mutex<Vec<(String, String, i32)>>>;

    struct FixedMetrics(Rect);

    impl DisplayMetricsProvider for FixedMetrics {
        fn monitors(&self) -> Result<Vec<MonitorGeometry>, GeometryError> {
            Ok(vec![MonitorGeometry {
                bounds: self.0,
                is_primary: true,
                scale_factor: 1.0,
                name: "test-output".into(),
            }])
        }
    }

    struct RecordingCapturer {
        regions: Arc<Mutex<Vec<Rect>>>,
    }

    impl ScreenCapturer for RecordingCapturer {
        fn capture(&self, region: Rect) -> Result<PixelSnapshot, CaptureError> {
            self.regions.lock().unwrap().push(region);
            let image = RgbaImage::from_pixel(
                region.width as u32,
                region.height as u32,
                Rgba([9, 9, 9, 255]),
            );
            Ok(PixelSnapshot::new(image, region))
        }
    }

    struct FailingCapturer;

    impl ScreenCapturer for FailingCapturer {
        fn capture(&self, _region: Rect) -> Result<PixelSnapshot, CaptureError> {
            Err(CaptureError::Backend("screen grab denied".into()))
        }
    }

    struct StubSaver {
        saves: Arc<Mutex<usize>>,
    }

    impl SnapshotSaver for StubSaver {
        fn save(&self, _png_bytes: &[u8], folder: &Path) -> Result<PathBuf, DeliveryError> {
            *self.saves.lock().unwrap() += 1;
            Ok(folder.join("screenshot_20250101_120000.png"))
        }
    }

    struct RecordingClipboard {
        images: Arc<Mutex<usize>>,
        texts: Arc<Mutex<Vec<String>>>,
    }

    impl ClipboardSink for RecordingClipboard {
        fn set_image(&self, _snapshot: &PixelSnapshot) -> Result<(), DeliveryError> {
            *self.images.lock().unwrap() += 1;
            Ok(())
        }

        fn set_text(&self, text: &str) -> Result<(), DeliveryError> {
            self.texts.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Harness {
        daemon: Daemon,
        regions: Arc<Mutex<Vec<Rect>>>,
        saves: Arc<Mutex<usize>>,
        images: Arc<Mutex<usize>>,
        texts: Arc<Mutex<Vec<String>>>,
        notifications: NotificationLog,
    }

    fn harness(config: Config, selected: Option<Rect>) -> Harness {
        let regions = Arc::new(Mutex::new(Vec::new()));
        let saves = Arc::new(Mutex::new(0));
        let images = Arc::new(Mutex::new(0));
        let texts = Arc::new(Mutex::new(Vec::new()));
        let notifications: NotificationLog = Arc::new(Mutex::new(Vec::new()));

        let deps = CaptureDependencies {
            capturer: Arc::new(RecordingCapturer {
                regions: regions.clone(),
            }),
            saver: Arc::new(StubSaver {
                saves: saves.clone(),
            }),
            clipboard: Arc::new(RecordingClipboard {
                images: images.clone(),
                texts: texts.clone(),
            }),
        };

        let log = notifications.clone();
        let notifier: Arc<Notifier> = Arc::new(move |summary: &str, body: &str, expire_ms| {
            log.lock()
                .unwrap()
                .push((summary.to_string(), body.to_string(), expire_ms));
        });

        let daemon = Daemon::with_parts(
            config,
            deps,
            Arc::new(FixedMetrics(Rect {
                x: -1920,
                y: 0,
                width: 3840,
                height: 1080,
            })),
            Arc::new(move || Ok(selected)),
            notifier,
        );

        Harness {
            daemon,
            regions,
            saves,
            images,
            texts,
            notifications,
        }
    }

    #[test]
    fn region_image_action_copies_to_clipboard() {
        let region = Rect {
            x: 10,
            y: 20,
            width: 300,
            height: 200,
        };
        let mut h = harness(Config::default(), Some(region));

        h.daemon.run_action(HotkeyAction::RegionImage);

        assert_eq!(h.regions.lock().unwrap().as_slice(), &[region]);
        assert_eq!(*h.images.lock().unwrap(), 1);
        assert_eq!(*h.saves.lock().unwrap(), 0);
        assert!(h.texts.lock().unwrap().is_empty());

        let notes = h.notifications.lock().unwrap();
        assert_eq!(
            notes.as_slice(),
            &[(
                "Screenshot Captured!".to_string(),
                "Copied to clipboard (300x200)".to_string(),
                1500,
            )]
        );
    }

    #[test]
    fn region_png_action_saves_and_copies_path() {
        let mut config = Config::default();
        config.capture.save_as_path = true;
        config.capture.screenshot_folder = PathBuf::from("/tmp/shots");

        let region = Rect {
            x: 0,
            y: 0,
            width: 64,
            height: 48,
        };
        let mut h = harness(config, Some(region));

        h.daemon.run_action(HotkeyAction::RegionPng);

        assert_eq!(*h.saves.lock().unwrap(), 1);
        assert_eq!(*h.images.lock().unwrap(), 0);
        assert_eq!(
            h.texts.lock().unwrap().as_slice(),
            &["/tmp/shots/screenshot_20250101_120000.png".to_string()]
        );

        let notes = h.notifications.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].0, "Screenshot Saved!");
        assert_eq!(notes[0].2, 2000);
    }

    #[test]
    fn image_action_ignores_save_as_path_setting() {
        let mut config = Config::default();
        config.capture.save_as_path = true;

        let mut h = harness(
            config,
            Some(Rect {
                x: 0,
                y: 0,
                width: 10,
                height: 10,
            }),
        );

        h.daemon.run_action(HotkeyAction::RegionImage);

        assert_eq!(*h.saves.lock().unwrap(), 0);
        assert_eq!(*h.images.lock().unwrap(), 1);
    }

    #[test]
    fn cancelled_selection_captures_nothing() {
        let mut h = harness(Config::default(), None);

        h.daemon.run_action(HotkeyAction::RegionPng);

        assert!(h.regions.lock().unwrap().is_empty());
        assert!(h.notifications.lock().unwrap().is_empty());
    }

    #[test]
    fn fullscreen_action_captures_virtual_desktop() {
        let mut h = harness(Config::default(), None);

        h.daemon.run_action(HotkeyAction::FullScreenImage);

        let regions = h.regions.lock().unwrap();
        assert_eq!(
            regions.as_slice(),
            &[Rect {
                x: -1920,
                y: 0,
                width: 3840,
                height: 1080,
            }]
        );

        let notes = h.notifications.lock().unwrap();
        assert_eq!(notes[0].0, "Screenshot Captured!");
        assert_eq!(notes[0].1, "Copied to clipboard (3840x1080)");
    }

    #[test]
    fn capture_failure_notifies_snip_error() {
        let mut h = harness(
            Config::default(),
            Some(Rect {
                x: 0,
                y: 0,
                width: 10,
                height: 10,
            }),
        );
        h.daemon.deps.capturer = Arc::new(FailingCapturer);

        h.daemon.run_action(HotkeyAction::RegionImage);

        let notes = h.notifications.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].0, "Snip Error");
        assert!(notes[0].1.contains("screen grab denied"));
        assert_eq!(notes[0].2, 3000);
    }

    #[test]
    fn fullscreen_failure_notifies_screenshot_error() {
        let mut h = harness(Config::default(), None);
        h.daemon.deps.capturer = Arc::new(FailingCapturer);

        h.daemon.run_action(HotkeyAction::FullScreenPng);

        let notes = h.notifications.lock().unwrap();
        assert_eq!(notes[0].0, "Screenshot Error");
    }

    #[test]
    fn selection_error_is_reported() {
        let mut h = harness(Config::default(), None);
        h.daemon.region_selector =
            Arc::new(|| Err(SelectionError::Geometry(GeometryError::NoMonitors)));

        h.daemon.run_action(HotkeyAction::RegionImage);

        let notes = h.notifications.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].0, "Snip Error");
        assert_eq!(notes[0].2, 3000);
    }

    // =========================================================================
    // Tray menu
    // =========================================================================

    fn test_tray() -> (TraysnapTray, Receiver<TrayCommand>, Arc<AtomicBool>) {
        let (tx, rx) = mpsc::channel();
        let quit = Arc::new(AtomicBool::new(false));
        let tray = TraysnapTray::new(tx, quit.clone(), false, true);
        (tray, rx, quit)
    }

    fn activate_menu_item(tray: &mut TraysnapTray, label: &str) {
        for item in tray.menu() {
            match item {
                MenuItem::Standard(standard) if standard.label.contains(label) => {
                    let activate = standard.activate;
                    activate(tray);
                    return;
                }
                MenuItem::Checkmark(checkmark) if checkmark.label.contains(label) => {
                    let activate = checkmark.activate;
                    activate(tray);
                    return;
                }
                _ => {}
            }
        }
        panic!("Menu item '{label}' not found");
    }

    #[test]
    fn tray_menu_routes_capture_commands() {
        let (mut tray, rx, _quit) = test_tray();

        activate_menu_item(&mut tray, "Full Screen PNG");
        activate_menu_item(&mut tray, "Free Snip PNG");
        activate_menu_item(&mut tray, "Full Screen Image");
        activate_menu_item(&mut tray, "Free Snip Image");

        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![
                TrayCommand::Capture(HotkeyAction::FullScreenPng),
                TrayCommand::Capture(HotkeyAction::RegionPng),
                TrayCommand::Capture(HotkeyAction::FullScreenImage),
                TrayCommand::Capture(HotkeyAction::RegionImage),
            ]
        );
    }

    #[test]
    fn tray_toggles_flip_local_state() {
        let (mut tray, rx, _quit) = test_tray();

        activate_menu_item(&mut tray, "Save as PNG Path");
        assert!(tray.save_as_path);
        assert_eq!(rx.try_recv().unwrap(), TrayCommand::ToggleSaveAsPath);

        activate_menu_item(&mut tray, "Run at Startup");
        assert!(!tray.run_at_startup);
        assert_eq!(rx.try_recv().unwrap(), TrayCommand::ToggleRunAtStartup);
    }

    #[test]
    fn tray_checkmarks_mirror_settings() {
        let (tray, _rx, _quit) = test_tray();

        for item in tray.menu() {
            if let MenuItem::Checkmark(checkmark) = item {
                if checkmark.label.contains("Save as PNG Path") {
                    assert!(!checkmark.checked);
                } else if checkmark.label.contains("Run at Startup") {
                    assert!(checkmark.checked);
                }
            }
        }
    }

    #[test]
    fn tray_section_headers_are_disabled() {
        let (tray, _rx, _quit) = test_tray();

        let mut headers = 0;
        for item in tray.menu() {
            if let MenuItem::Standard(standard) = item {
                if standard.label.starts_with("---") {
                    assert!(!standard.enabled);
                    headers += 1;
                }
            }
        }
        assert_eq!(headers, 2);
    }

    #[test]
    fn tray_utility_items_send_commands() {
        let (mut tray, rx, _quit) = test_tray();

        activate_menu_item(&mut tray, "Change Screenshot Folder");
        activate_menu_item(&mut tray, "Re-register Hotkeys");

        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![TrayCommand::ChangeFolder, TrayCommand::ReregisterHotkeys]
        );
    }

    #[test]
    fn tray_quit_sets_quit_flag() {
        let (mut tray, rx, quit) = test_tray();

        activate_menu_item(&mut tray, "Quit");

        assert!(quit.load(Ordering::SeqCst));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn tray_activate_triggers_fullscreen_capture() {
        let (mut tray, rx, _quit) = test_tray();

        tray.activate(0, 0);

        assert_eq!(
            rx.try_recv().unwrap(),
            TrayCommand::Capture(HotkeyAction::FullScreenPng)
        );
    }
}
