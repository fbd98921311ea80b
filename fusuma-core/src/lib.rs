pub mod config;
pub mod dispatch;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod hotkey;
pub mod layout;
pub mod manager;
pub mod platform;

pub use config::Config;
pub use dispatch::{handle_event, run_action, Flow};
pub use element::{Application, Window};
pub use error::{AxError, ConfigError, DesyncError};
pub use event::{Action, Event};
pub use geometry::{Point, Rect, Size};
pub use hotkey::{format_hotkey, parse_hotkey, Binding, Hotkey, HotkeyMap, MatchPolicy};
pub use layout::{CenterStage, Layout, LayoutConfig, Panel, VerticalSplit, MENU_BAR_HEIGHT};
pub use manager::{Target, WindowManager};
pub use platform::{
    AccessibilityProvider, AttrValue, Attribute, Notification, Pid, ProcessInfo, SpaceId,
    APPLICATION_ROLE,
};
