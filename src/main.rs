//! Entry point for the **scalegrid** daemon.
//!
//! Seeds a [`HeadlessHost`](scalegrid::headless::host::HeadlessHost) from
//! the configuration, spawns the Unix-socket
//! [`CommandSource`](scalegrid::traits::CommandSource) on a background
//! thread and runs the overview on the main thread, pacing frames at
//! roughly 60 Hz while anything animates.

use log::{error, info};
use scalegrid::command::Command;
use scalegrid::config::Config;
use scalegrid::headless::driver::Driver;
use scalegrid::headless::host::HeadlessHost;
use scalegrid::ipc::listener::{default_socket_path, UnixSocketListener};
use scalegrid::session::ScaleSession;
use scalegrid::traits::CommandSource;
use std::sync::mpsc;
use std::time::Duration;

/// Frame interval while animating.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// How long to block for a command when idle.
const IDLE_INTERVAL: Duration = Duration::from_secs(1);

/// Resolve the config directory (`$XDG_CONFIG_HOME/scalegrid`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("scalegrid")
}

/// Try to load the config from `$XDG_CONFIG_HOME/scalegrid/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();

    let mut host = HeadlessHost::new(&config.headless).with_system_clock();
    let seeded = host.seed(&config.headless.windows);
    info!(
        "headless output {}x{} with {} window(s)",
        config.headless.width,
        config.headless.height,
        seeded.len()
    );

    let mut driver = Driver::new(ScaleSession::new(host, config.scale));
    driver.tick();

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    spawn_command_sources(cmd_tx);

    run_event_loop(&mut driver, cmd_rx);
}

//  Event loop

fn run_event_loop(driver: &mut Driver, cmd_rx: mpsc::Receiver<Command>) {
    info!("scalegrid running");
    loop {
        let wait = if driver.wants_frames() {
            FRAME_INTERVAL
        } else {
            IDLE_INTERVAL
        };
        match cmd_rx.recv_timeout(wait) {
            Ok(cmd) => {
                driver.handle(cmd);
                // Drain the backlog before the next frame.
                for cmd in cmd_rx.try_iter() {
                    driver.handle(cmd);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        driver.tick();
    }
    driver.session_mut().finalize();
    info!("all command sources closed, exiting");
}

//  Helpers

fn spawn_command_sources(tx: mpsc::Sender<Command>) {
    let path = default_socket_path();
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}
