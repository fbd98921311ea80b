use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;

use anyhow::{Context, Result};
use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use objc2_foundation::MainThreadMarker;
use tokio::sync::mpsc;

use fusuma_core::{
    handle_event, run_action, AccessibilityProvider, Action, Config, ConfigError, Event, Flow,
    WindowManager,
};
use fusuma_ipc::{socket_path, Command, Response};

use crate::ipc::IpcServer;
use crate::macos::{self, KeyTap, MacAccessibility, MacEvent, WorkspaceWatcher};
use crate::summary;

type IpcCommandWithResponse = (Command, mpsc::Sender<Response>);

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn request_shutdown(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

struct RunLoopContext {
    ipc_cmd_rx: std_mpsc::Receiver<IpcCommandWithResponse>,
    event_rx: std_mpsc::Receiver<MacEvent>,
    manager: RefCell<WindowManager<MacAccessibility>>,
    config_path: PathBuf,
    mtm: MainThreadMarker,
}

impl RunLoopContext {
    /// Re-read the configuration file. The running configuration is kept when
    /// the file is invalid.
    fn reload(&self) -> Result<(), ConfigError> {
        let config = Config::load(&self.config_path)?;
        let mut manager = self.manager.borrow_mut();
        manager.initialize(config);
        let placed = manager.reflow();
        tracing::info!(
            "Configuration reloaded from {:?}, {} windows placed",
            self.config_path,
            placed
        );
        Ok(())
    }

    fn refresh_target(&self) {
        match macos::main_screen_target(self.mtm) {
            Some(target) => self.manager.borrow_mut().set_target(target),
            None => tracing::warn!("No main screen, keeping previous target"),
        }
    }
}

pub struct App {}

impl App {
    pub fn run(config_path: PathBuf) -> Result<()> {
        let config = Config::load(&config_path)
            .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

        let mtm = MainThreadMarker::new().context("fusuma must be started on the main thread")?;

        // Channel: observers, workspace and key tap -> main thread
        let (event_tx, event_rx) = std_mpsc::channel::<MacEvent>();
        let provider = MacAccessibility::new(event_tx.clone());
        if !provider.is_trusted() {
            tracing::warn!("Accessibility permission not granted, requesting...");
            macos::is_trusted_with_prompt();
            anyhow::bail!("Please grant Accessibility permission and restart");
        }

        install_signal_handlers()?;

        // Channel: IPC commands (tokio -> main thread)
        let (ipc_cmd_tx, ipc_cmd_rx) = std_mpsc::channel::<IpcCommandWithResponse>();
        // Channel for IPC server (tokio internal)
        let (ipc_tx, ipc_rx) = mpsc::channel::<IpcCommandWithResponse>(32);

        let rt = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
        let socket_path = socket_path();
        let server = rt.block_on(IpcServer::bind(socket_path.clone(), ipc_tx))?;
        std::thread::spawn(move || rt.block_on(Self::run_async(server, ipc_cmd_tx, ipc_rx)));

        let target = macos::main_screen_target(mtm).context("No main screen available")?;
        let mut manager = WindowManager::new(provider, target);
        manager.initialize(config);
        let placed = manager.reflow();
        tracing::info!(
            "Managing {} applications, {} windows placed",
            manager.applications().count(),
            placed
        );

        let _workspace_watcher = WorkspaceWatcher::new(event_tx.clone(), mtm);
        let _key_tap = KeyTap::start(event_tx)?;

        let context = RunLoopContext {
            ipc_cmd_rx,
            event_rx,
            manager: RefCell::new(manager),
            config_path,
            mtm,
        };
        Self::run_main_loop(context);

        let _ = std::fs::remove_file(&socket_path);
        tracing::info!("fusuma stopped");
        Ok(())
    }

    async fn run_async(
        server: IpcServer,
        ipc_cmd_tx: std_mpsc::Sender<IpcCommandWithResponse>,
        mut ipc_rx: mpsc::Receiver<IpcCommandWithResponse>,
    ) {
        tracing::info!("Tokio runtime started");
        tokio::spawn(server.serve());

        // Forward IPC commands to main thread
        while let Some((cmd, resp_tx)) = ipc_rx.recv().await {
            if ipc_cmd_tx.send((cmd, resp_tx)).is_err() {
                tracing::error!("Failed to forward IPC command to main thread");
                break;
            }
        }

        tracing::info!("Tokio runtime exiting");
    }

    fn run_main_loop(context: RunLoopContext) {
        tracing::info!("Starting main loop");

        let info = Box::into_raw(Box::new(context));
        let mut timer_context = core_foundation::runloop::CFRunLoopTimerContext {
            version: 0,
            info: info as *mut _,
            retain: None,
            release: None,
            copyDescription: None,
        };

        extern "C" fn timer_callback(
            _timer: core_foundation::runloop::CFRunLoopTimerRef,
            info: *mut std::ffi::c_void,
        ) {
            let ctx = unsafe { &*(info as *const RunLoopContext) };
            if !drain(ctx) {
                CFRunLoop::get_current().stop();
            }
        }

        let timer = unsafe {
            core_foundation::runloop::CFRunLoopTimer::new(
                core_foundation::date::CFAbsoluteTimeGetCurrent(),
                0.05, // 50ms interval
                0,
                0,
                timer_callback,
                &mut timer_context,
            )
        };

        let run_loop = CFRunLoop::get_current();
        run_loop.add_timer(&timer, unsafe { kCFRunLoopDefaultMode });

        tracing::info!("Entering CFRunLoop");
        CFRunLoop::run_current();
        tracing::info!("CFRunLoop exited");

        run_loop.remove_timer(&timer, unsafe { kCFRunLoopDefaultMode });
        // The timer is gone, nothing else holds the context.
        drop(unsafe { Box::from_raw(info) });
    }
}

fn install_signal_handlers() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(request_shutdown),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        unsafe { sigaction(signal, &action) }
            .with_context(|| format!("Failed to install {} handler", signal))?;
    }
    Ok(())
}

/// Process everything queued since the last tick. Returns false once the
/// daemon should stop.
fn drain(ctx: &RunLoopContext) -> bool {
    if SHUTDOWN.load(Ordering::SeqCst) {
        tracing::info!("Shutdown signal received");
        return false;
    }

    while let Ok((cmd, resp_tx)) = ctx.ipc_cmd_rx.try_recv() {
        tracing::debug!("Received IPC command: {:?}", cmd);
        let (response, flow) = handle_ipc_command(ctx, &cmd);
        let _ = resp_tx.blocking_send(response);

        // Quit only after the client got its response
        if flow == Flow::Quit {
            tracing::info!("Quit command received");
            return false;
        }
    }

    while let Ok(event) = ctx.event_rx.try_recv() {
        if matches!(event, Event::SpaceChanged) {
            ctx.refresh_target();
        }

        let result = handle_event(&mut ctx.manager.borrow_mut(), event);
        match result {
            Ok(Flow::Continue) => {}
            Ok(Flow::Reload) => {
                if let Err(e) = ctx.reload() {
                    tracing::error!("Failed to reload configuration: {}", e);
                }
            }
            Ok(Flow::Quit) => {
                tracing::info!("Quit hotkey pressed");
                return false;
            }
            Err(e) => tracing::error!("State desync: {}", e),
        }
    }

    true
}

fn handle_ipc_command(ctx: &RunLoopContext, cmd: &Command) -> (Response, Flow) {
    let action = match cmd {
        Command::Reflow => Action::Reflow,
        Command::Reload => Action::Reload,
        Command::Quit => Action::Quit,
        Command::ListApplications => {
            let applications = summary::application_infos(&ctx.manager.borrow());
            return (Response::Applications { applications }, Flow::Continue);
        }
        Command::ListBindings => {
            let bindings = summary::binding_infos(&ctx.manager.borrow().config().hotkeys);
            return (Response::Bindings { bindings }, Flow::Continue);
        }
    };

    let flow = run_action(&ctx.manager.borrow(), action);
    if flow != Flow::Reload {
        return (Response::Ok, flow);
    }

    match ctx.reload() {
        Ok(()) => (Response::Ok, Flow::Continue),
        Err(e) => {
            tracing::error!("Failed to reload configuration: {}", e);
            (
                Response::Error {
                    message: format!("Failed to reload configuration: {}", e),
                },
                Flow::Continue,
            )
        }
    }
}
