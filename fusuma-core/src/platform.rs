use std::fmt;

use crate::error::AxError;
use crate::geometry::{Point, Size};
use crate::manager::Target;

pub type Pid = i32;
pub type SpaceId = u64;

/// Role reported by elements that represent a whole application.
pub const APPLICATION_ROLE: &str = "AXApplication";

/// Accessibility attributes the window manager reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Role,
    Title,
    Position,
    Size,
    Hidden,
    Minimized,
    Windows,
}

impl Attribute {
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Role => "AXRole",
            Attribute::Title => "AXTitle",
            Attribute::Position => "AXPosition",
            Attribute::Size => "AXSize",
            Attribute::Hidden => "AXHidden",
            Attribute::Minimized => "AXMinimized",
            Attribute::Windows => "AXWindows",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Point(Point),
    Size(Size),
    Bool(bool),
}

impl AttrValue {
    pub fn into_text(self) -> Option<String> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            AttrValue::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<Size> {
        match self {
            AttrValue::Size(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Structural notifications an application can be observed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    WindowCreated,
    WindowMiniaturized,
    WindowDeminiaturized,
}

impl Notification {
    pub const WINDOW_EVENTS: [Notification; 3] = [
        Notification::WindowCreated,
        Notification::WindowMiniaturized,
        Notification::WindowDeminiaturized,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Notification::WindowCreated => "AXWindowCreated",
            Notification::WindowMiniaturized => "AXWindowMiniaturized",
            Notification::WindowDeminiaturized => "AXWindowDeminiaturized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub bundle_id: Option<String>,
}

/// Access to the system accessibility API.
/// This abstraction allows mocking in tests.
///
/// Every call is synchronous and may block on the target process. Callers
/// never retry.
pub trait AccessibilityProvider {
    type Element: Clone + PartialEq + fmt::Debug;

    fn is_trusted(&self) -> bool;

    fn running_processes(&self) -> Vec<ProcessInfo>;

    /// Fails with `PermissionDenied` when accessibility access is disabled.
    fn create_application_ref(&self, pid: Pid) -> Result<Self::Element, AxError>;

    fn get(&self, element: &Self::Element, attribute: Attribute) -> Result<AttrValue, AxError>;

    fn set(
        &self,
        element: &Self::Element,
        attribute: Attribute,
        value: AttrValue,
    ) -> Result<(), AxError>;

    fn can_set(&self, element: &Self::Element, attribute: Attribute) -> bool;

    fn count(&self, element: &Self::Element, attribute: Attribute) -> Result<usize, AxError>;

    fn children(
        &self,
        element: &Self::Element,
        attribute: Attribute,
    ) -> Result<Vec<Self::Element>, AxError>;

    fn observe(
        &self,
        pid: Pid,
        application: &Self::Element,
        notifications: &[Notification],
    ) -> Result<(), AxError>;

    fn unobserve(&self, pid: Pid);

    /// Whether the window can currently be shown on the target screen/space.
    fn presentable(&self, window: &Self::Element, target: &Target) -> bool {
        let _ = (window, target);
        true
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names() {
        assert_eq!(Attribute::Position.name(), "AXPosition");
        assert_eq!(Attribute::Minimized.to_string(), "AXMinimized");
        assert_eq!(Notification::WindowCreated.name(), "AXWindowCreated");
    }

    #[test]
    fn test_attr_value_accessors() {
        assert_eq!(
            AttrValue::Text("Safari".into()).into_text(),
            Some("Safari".to_string())
        );
        assert_eq!(AttrValue::Bool(true).into_text(), None);
        assert_eq!(AttrValue::Bool(true).as_bool(), Some(true));
        assert_eq!(
            AttrValue::Point(Point::new(1, 2)).as_point(),
            Some(Point::new(1, 2))
        );
        assert_eq!(AttrValue::Point(Point::new(1, 2)).as_size(), None);
    }
}
