mod accessibility;
mod display;
mod hotkey;
mod observer;
mod provider;
mod shadows;
mod workspace;

pub use accessibility::{is_trusted_with_prompt, AXUIElement};
pub use display::main_screen_target;
pub use hotkey::KeyTap;
pub use provider::MacAccessibility;
pub use shadows::toggle_shadows;
pub use workspace::WorkspaceWatcher;

/// Event as produced by the macOS adapters.
pub type MacEvent = fusuma_core::Event<AXUIElement>;
