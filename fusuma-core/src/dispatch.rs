use tracing::debug;

use crate::error::DesyncError;
use crate::event::{Action, Event};
use crate::manager::WindowManager;
use crate::platform::AccessibilityProvider;

/// What the run loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Re-read the configuration and rebuild state.
    Reload,
    Quit,
}

/// Apply one inbound event to the manager, including any reflow it triggers.
pub fn handle_event<P: AccessibilityProvider>(
    manager: &mut WindowManager<P>,
    event: Event<P::Element>,
) -> Result<Flow, DesyncError> {
    match event {
        Event::AppLaunched { pid, bundle_id } => {
            manager.add_application(pid, bundle_id.as_deref());
        }
        Event::AppTerminated { pid } => manager.remove_application(pid)?,
        Event::AppHidden { pid } | Event::AppUnhidden { pid } => {
            debug!("Visibility of pid {} changed", pid);
            manager.reflow();
        }
        Event::SpaceChanged => {
            manager.reflow();
        }
        Event::WindowCreated { pid, window } => {
            manager.window_created(pid, window)?;
        }
        Event::WindowMiniaturized { pid } | Event::WindowDeminiaturized { pid } => {
            debug!("Window of pid {} (de)miniaturized", pid);
            manager.reflow();
        }
        Event::KeyDown { flags, key_code } => {
            let actions = manager.config().hotkeys.resolve(flags, key_code);
            let mut flow = Flow::Continue;
            for action in actions {
                match run_action(manager, action) {
                    Flow::Quit => return Ok(Flow::Quit),
                    Flow::Reload => flow = Flow::Reload,
                    Flow::Continue => {}
                }
            }
            return Ok(flow);
        }
    }
    Ok(Flow::Continue)
}

/// Run a bound action. Reload and quit are left to the caller.
pub fn run_action<P: AccessibilityProvider>(manager: &WindowManager<P>, action: Action) -> Flow {
    debug!("Running action {}", action.name());
    match action {
        Action::Reflow => {
            manager.reflow();
            Flow::Continue
        }
        Action::Reload => Flow::Reload,
        Action::Quit => Flow::Quit,
    }
}
