use std::cell::OnceCell;

use tracing::debug;

use crate::error::AxError;
use crate::geometry::{Point, Rect, Size};
use crate::platform::{AccessibilityProvider, AttrValue, Attribute, Pid, APPLICATION_ROLE};

/// A running application exposed through the accessibility API.
#[derive(Debug)]
pub struct Application<E> {
    pid: Pid,
    bundle_id: String,
    element: E,
    title: OnceCell<String>,
    windows: Vec<E>,
}

impl<E: Clone + PartialEq> Application<E> {
    /// Resolve `pid` to an application element and snapshot its windows.
    /// Processes whose role is not `AXApplication` are `NotAccessible`.
    pub fn resolve<P>(provider: &P, pid: Pid, bundle_id: &str) -> Result<Self, AxError>
    where
        P: AccessibilityProvider<Element = E>,
    {
        let element = provider.create_application_ref(pid)?;
        let role = provider
            .get(&element, Attribute::Role)
            .ok()
            .and_then(AttrValue::into_text);
        if role.as_deref() != Some(APPLICATION_ROLE) {
            return Err(AxError::NotAccessible);
        }

        let windows = match provider.count(&element, Attribute::Windows) {
            Ok(0) => Vec::new(),
            Ok(_) => provider
                .children(&element, Attribute::Windows)
                .unwrap_or_else(|e| {
                    debug!("No windows for {} (pid {}): {}", bundle_id, pid, e);
                    Vec::new()
                }),
            Err(e) => {
                debug!("Cannot count windows of {} (pid {}): {}", bundle_id, pid, e);
                Vec::new()
            }
        };

        Ok(Self {
            pid,
            bundle_id: bundle_id.to_string(),
            element,
            title: OnceCell::new(),
            windows,
        })
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn windows(&self) -> &[E] {
        &self.windows
    }

    /// Returns false if the handle was already known.
    pub fn push_window(&mut self, window: E) -> bool {
        if self.windows.contains(&window) {
            return false;
        }
        self.windows.push(window);
        true
    }

    /// Display title. Fetched once; a failed fetch is retried next time.
    pub fn title<P>(&self, provider: &P) -> Option<&str>
    where
        P: AccessibilityProvider<Element = E>,
    {
        if let Some(title) = self.title.get() {
            return Some(title);
        }
        let title = provider
            .get(&self.element, Attribute::Title)
            .ok()?
            .into_text()?;
        Some(self.title.get_or_init(|| title))
    }

    /// Cached title without touching the provider.
    pub fn cached_title(&self) -> Option<&str> {
        self.title.get().map(String::as_str)
    }

    pub fn hidden<P>(&self, provider: &P) -> Option<bool>
    where
        P: AccessibilityProvider<Element = E>,
    {
        provider
            .get(&self.element, Attribute::Hidden)
            .ok()?
            .as_bool()
    }

    pub fn set_hidden<P>(&self, provider: &P, hidden: bool) -> Result<(), AxError>
    where
        P: AccessibilityProvider<Element = E>,
    {
        provider.set(&self.element, Attribute::Hidden, AttrValue::Bool(hidden))
    }
}

/// A single window owned by an application.
#[derive(Debug, Clone, PartialEq)]
pub struct Window<E> {
    element: E,
    owner: Pid,
    resizable: bool,
}

impl<E: Clone + PartialEq> Window<E> {
    /// Resizability is checked once and never re-checked.
    pub fn new<P>(provider: &P, element: E, owner: Pid) -> Self
    where
        P: AccessibilityProvider<Element = E>,
    {
        let resizable = provider.can_set(&element, Attribute::Size)
            && provider.can_set(&element, Attribute::Position);
        Self {
            element,
            owner,
            resizable,
        }
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn owner(&self) -> Pid {
        self.owner
    }

    pub fn resizable(&self) -> bool {
        self.resizable
    }

    pub fn position<P>(&self, provider: &P) -> Option<Point>
    where
        P: AccessibilityProvider<Element = E>,
    {
        provider
            .get(&self.element, Attribute::Position)
            .ok()?
            .as_point()
    }

    pub fn size<P>(&self, provider: &P) -> Option<Size>
    where
        P: AccessibilityProvider<Element = E>,
    {
        provider.get(&self.element, Attribute::Size).ok()?.as_size()
    }

    pub fn frame<P>(&self, provider: &P) -> Option<Rect>
    where
        P: AccessibilityProvider<Element = E>,
    {
        Some(Rect::from_parts(
            self.position(provider)?,
            self.size(provider)?,
        ))
    }

    pub fn minimized<P>(&self, provider: &P) -> Option<bool>
    where
        P: AccessibilityProvider<Element = E>,
    {
        provider
            .get(&self.element, Attribute::Minimized)
            .ok()?
            .as_bool()
    }

    /// Position first, then size.
    pub fn set_frame<P>(&self, provider: &P, frame: Rect) -> Result<(), AxError>
    where
        P: AccessibilityProvider<Element = E>,
    {
        provider.set(
            &self.element,
            Attribute::Position,
            AttrValue::Point(frame.origin()),
        )?;
        provider.set(&self.element, Attribute::Size, AttrValue::Size(frame.size()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockProvider;

    #[test]
    fn test_resolve_application() {
        let provider = MockProvider::new();
        provider.add_app(100, "com.apple.Safari", "Safari");
        provider.add_window(100, true);
        provider.add_window(100, false);

        let app = Application::resolve(&provider, 100, "com.apple.Safari").unwrap();
        assert_eq!(app.pid(), 100);
        assert_eq!(app.bundle_id(), "com.apple.Safari");
        assert_eq!(app.windows().len(), 2);
        assert_eq!(app.hidden(&provider), Some(false));
    }

    #[test]
    fn test_resolve_without_windows_skips_enumeration() {
        let provider = MockProvider::new();
        provider.add_app(100, "com.apple.Safari", "Safari");

        let app = Application::resolve(&provider, 100, "com.apple.Safari").unwrap();
        assert!(app.windows().is_empty());
        assert_eq!(provider.children_calls(), 0);

        provider.add_window(100, true);
        Application::resolve(&provider, 100, "com.apple.Safari").unwrap();
        assert_eq!(provider.children_calls(), 1);
    }

    #[test]
    fn test_resolve_wrong_role() {
        let provider = MockProvider::new();
        provider.add_process(200, Some("com.apple.dock"), "AXUnknown");

        let err = Application::resolve(&provider, 200, "com.apple.dock").unwrap_err();
        assert_eq!(err, AxError::NotAccessible);
    }

    #[test]
    fn test_resolve_permission_denied() {
        let provider = MockProvider::new();
        provider.add_app(100, "com.apple.Safari", "Safari");
        provider.set_trusted(false);

        let err = Application::resolve(&provider, 100, "com.apple.Safari").unwrap_err();
        assert_eq!(err, AxError::PermissionDenied);
    }

    #[test]
    fn test_resolve_with_broken_window_list() {
        let provider = MockProvider::new();
        let element = provider.add_app(100, "com.example.app", "Example");
        provider.break_element(element);

        let app = Application::resolve(&provider, 100, "com.example.app").unwrap();
        assert!(app.windows().is_empty());
    }

    #[test]
    fn test_title_memoized() {
        let provider = MockProvider::new();
        let element = provider.add_app(100, "com.apple.Terminal", "Terminal");
        let app = Application::resolve(&provider, 100, "com.apple.Terminal").unwrap();

        assert_eq!(app.cached_title(), None);
        assert_eq!(app.title(&provider), Some("Terminal"));

        provider.set_attr(element, Attribute::Title, AttrValue::Text("Other".into()));
        assert_eq!(app.title(&provider), Some("Terminal"));
        assert_eq!(app.cached_title(), Some("Terminal"));
    }

    #[test]
    fn test_title_retried_after_failure() {
        let provider = MockProvider::new();
        let element = provider.add_app(100, "com.apple.Terminal", "Terminal");
        provider.remove_attr(element, Attribute::Title);
        let app = Application::resolve(&provider, 100, "com.apple.Terminal").unwrap();

        assert_eq!(app.title(&provider), None);
        provider.set_attr(element, Attribute::Title, AttrValue::Text("Terminal".into()));
        assert_eq!(app.title(&provider), Some("Terminal"));
    }

    #[test]
    fn test_set_hidden() {
        let provider = MockProvider::new();
        provider.add_app(100, "com.apple.Notes", "Notes");
        let app = Application::resolve(&provider, 100, "com.apple.Notes").unwrap();

        app.set_hidden(&provider, true).unwrap();
        assert_eq!(app.hidden(&provider), Some(true));
    }

    #[test]
    fn test_push_window_dedup() {
        let provider = MockProvider::new();
        provider.add_app(100, "com.apple.Notes", "Notes");
        let mut app = Application::resolve(&provider, 100, "com.apple.Notes").unwrap();

        let w = provider.add_window(100, true);
        assert!(app.push_window(w));
        assert!(!app.push_window(w));
        assert_eq!(app.windows().len(), 1);
    }

    #[test]
    fn test_window_resizable_checked_once() {
        let provider = MockProvider::new();
        provider.add_app(100, "com.apple.Notes", "Notes");
        let fixed = provider.add_window(100, false);
        let free = provider.add_window(100, true);

        assert!(!Window::new(&provider, fixed, 100).resizable());
        assert!(Window::new(&provider, free, 100).resizable());
    }

    #[test]
    fn test_window_frame_roundtrip() {
        let provider = MockProvider::new();
        provider.add_app(100, "com.apple.Notes", "Notes");
        let element = provider.add_window(100, true);
        let window = Window::new(&provider, element, 100);

        assert_eq!(window.frame(&provider), Some(Rect::new(0, 0, 100, 100)));
        window
            .set_frame(&provider, Rect::new(40, 40, 920, 720))
            .unwrap();
        assert_eq!(window.frame(&provider), Some(Rect::new(40, 40, 920, 720)));

        let writes = provider.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].1, Attribute::Position);
        assert_eq!(writes[1].1, Attribute::Size);
    }

    #[test]
    fn test_set_frame_unwritable() {
        let provider = MockProvider::new();
        provider.add_app(100, "com.apple.Notes", "Notes");
        let element = provider.add_window(100, false);
        let window = Window::new(&provider, element, 100);

        let err = window
            .set_frame(&provider, Rect::new(0, 0, 10, 10))
            .unwrap_err();
        assert_eq!(err, AxError::Unwritable(Attribute::Position));
        assert!(provider.writes().is_empty());
    }

    #[test]
    fn test_minimized_absent() {
        let provider = MockProvider::new();
        provider.add_app(100, "com.apple.Notes", "Notes");
        let element = provider.add_window(100, true);
        let window = Window::new(&provider, element, 100);

        assert_eq!(window.minimized(&provider), Some(false));
        provider.remove_attr(element, Attribute::Minimized);
        assert_eq!(window.minimized(&provider), None);
    }
}
