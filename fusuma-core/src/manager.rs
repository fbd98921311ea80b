use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::element::{Application, Window};
use crate::error::{AxError, DesyncError};
use crate::geometry::{Rect, Size};
use crate::platform::{AccessibilityProvider, Notification, Pid, SpaceId};

/// Screen rectangle (top-left origin) and space that layouts target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub screen: Rect,
    pub space: Option<SpaceId>,
}

impl Target {
    pub fn new(screen: Rect) -> Self {
        Self {
            screen,
            space: None,
        }
    }
}

/// Authoritative view of managed applications and their windows.
///
/// Every mutation runs to completion, including the reflow it triggers,
/// before the caller hands in the next event.
pub struct WindowManager<P: AccessibilityProvider> {
    provider: P,
    config: Config,
    target: Target,
    applications: BTreeMap<Pid, Application<P::Element>>,
    /// Tiling order.
    windows: Vec<Window<P::Element>>,
    /// Pids seen but deliberately left unmanaged.
    declined: HashSet<Pid>,
}

impl<P: AccessibilityProvider> WindowManager<P> {
    pub fn new(provider: P, target: Target) -> Self {
        Self {
            provider,
            config: Config::default(),
            target,
            applications: BTreeMap::new(),
            windows: Vec::new(),
            declined: HashSet::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn set_target(&mut self, target: Target) {
        self.target = target;
    }

    pub fn applications(&self) -> impl Iterator<Item = &Application<P::Element>> {
        self.applications.values()
    }

    pub fn application(&self, pid: Pid) -> Option<&Application<P::Element>> {
        self.applications.get(&pid)
    }

    pub fn windows(&self) -> &[Window<P::Element>] {
        &self.windows
    }

    pub fn is_declined(&self, pid: Pid) -> bool {
        self.declined.contains(&pid)
    }

    /// Titles of registered applications, in pid order.
    pub fn app_names(&self) -> Vec<String> {
        self.applications
            .values()
            .filter_map(|app| app.title(&self.provider).map(str::to_string))
            .collect()
    }

    /// Rebuild all state from the running processes. Does not reflow.
    pub fn initialize(&mut self, config: Config) {
        for pid in self.applications.keys() {
            self.provider.unobserve(*pid);
        }
        self.applications.clear();
        self.windows.clear();
        self.declined.clear();
        self.config = config;

        if !self.provider.is_trusted() {
            warn!("Accessibility access is not granted, no application will be managed");
        }

        for process in self.provider.running_processes() {
            let pid = process.pid;
            let Some(bundle_id) = process.bundle_id else {
                self.declined.insert(pid);
                continue;
            };
            if self.config.is_ignored(&bundle_id) {
                debug!("Ignoring {} (pid {})", bundle_id, pid);
                self.declined.insert(pid);
                continue;
            }
            match self.register(pid, &bundle_id) {
                Ok(added) => debug!("Registered {} (pid {}) with {} windows", bundle_id, pid, added),
                Err(AxError::PermissionDenied | AxError::NotAccessible) => {
                    self.declined.insert(pid);
                }
                Err(e) => {
                    warn!("Skipping {} (pid {}): {}", bundle_id, pid, e);
                    self.declined.insert(pid);
                }
            }
        }

        info!(
            "Tracking {} applications with {} windows",
            self.applications.len(),
            self.windows.len()
        );
    }

    /// Resolve, subscribe and track the windows of one application.
    fn register(&mut self, pid: Pid, bundle_id: &str) -> Result<usize, AxError> {
        let app = Application::resolve(&self.provider, pid, bundle_id)?;
        if let Err(e) = self
            .provider
            .observe(pid, app.element(), &Notification::WINDOW_EVENTS)
        {
            warn!("Failed to observe {} (pid {}): {}", bundle_id, pid, e);
        }

        let mut added = 0;
        for element in app.windows() {
            let window = Window::new(&self.provider, element.clone(), pid);
            if self.add_window(window) {
                added += 1;
            }
        }
        self.declined.remove(&pid);
        self.applications.insert(pid, app);
        Ok(added)
    }

    /// Start managing a launched application. Returns whether it was registered.
    pub fn add_application(&mut self, pid: Pid, bundle_id: Option<&str>) -> bool {
        if self.applications.contains_key(&pid) {
            debug!("pid {} is already registered", pid);
            return false;
        }
        let Some(bundle_id) = bundle_id else {
            debug!("pid {} has no bundle identifier", pid);
            self.declined.insert(pid);
            return false;
        };
        if self.config.is_ignored(bundle_id) {
            debug!("Ignoring {} (pid {})", bundle_id, pid);
            self.declined.insert(pid);
            return false;
        }

        match self.register(pid, bundle_id) {
            Ok(added) => {
                info!("Added {} (pid {}) with {} windows", bundle_id, pid, added);
                self.reflow();
                true
            }
            Err(e @ (AxError::PermissionDenied | AxError::NotAccessible)) => {
                debug!("Not managing {} (pid {}): {}", bundle_id, pid, e);
                self.declined.insert(pid);
                false
            }
            Err(e) => {
                warn!("Failed to add {} (pid {}): {}", bundle_id, pid, e);
                self.declined.insert(pid);
                false
            }
        }
    }

    /// Forget a terminated application and every window it owns.
    pub fn remove_application(&mut self, pid: Pid) -> Result<(), DesyncError> {
        if self.declined.remove(&pid) {
            debug!("Forgetting unmanaged pid {}", pid);
            return Ok(());
        }
        let app = self
            .applications
            .remove(&pid)
            .ok_or(DesyncError::UnknownApplication(pid))?;

        self.windows.retain(|w| w.owner() != pid);
        self.provider.unobserve(pid);
        info!("Removed {} (pid {})", app.bundle_id(), pid);

        self.reflow();
        Ok(())
    }

    /// Remove the lowest-pid application whose title is `title`.
    pub fn remove_application_by_title(&mut self, title: &str) -> Result<(), DesyncError> {
        let pid = self
            .applications
            .values()
            .find(|app| app.title(&self.provider) == Some(title))
            .map(Application::pid)
            .ok_or_else(|| DesyncError::UnknownTitle(title.to_string()))?;
        self.remove_application(pid)
    }

    /// Track a window if it is resizable. Excluded windows are never re-checked.
    pub fn add_window(&mut self, window: Window<P::Element>) -> bool {
        if !window.resizable() {
            debug!("Window of pid {} is not resizable", window.owner());
            return false;
        }
        self.windows.push(window);
        true
    }

    /// Handle a window-created notification for a registered application.
    pub fn window_created(&mut self, pid: Pid, element: P::Element) -> Result<bool, DesyncError> {
        if self.windows.iter().any(|w| w.element() == &element) {
            debug!("Window {:?} of pid {} is already tracked", element, pid);
            return Ok(false);
        }
        let Some(app) = self.applications.get_mut(&pid) else {
            if self.declined.contains(&pid) {
                return Ok(false);
            }
            return Err(DesyncError::UnknownApplication(pid));
        };
        if !app.push_window(element.clone()) {
            // Checked when the application was registered. Never re-checked.
            debug!("Window {:?} of pid {} was already checked", element, pid);
            return Ok(false);
        }

        let window = Window::new(&self.provider, element, pid);
        let added = self.add_window(window);
        if added {
            self.reflow();
        }
        Ok(added)
    }

    fn is_eligible(&self, window: &Window<P::Element>, target: &Target) -> bool {
        if !window.resizable() {
            return false;
        }
        let Some(app) = self.applications.get(&window.owner()) else {
            return false;
        };
        // Absent values count as hidden/minimized for this cycle.
        if app.hidden(&self.provider) != Some(false) {
            return false;
        }
        if window.minimized(&self.provider) != Some(false) {
            return false;
        }
        self.provider.presentable(window.element(), target)
    }

    /// Tracked windows that are currently eligible for layout, in tracked order.
    pub fn get_managed_windows(&self, target: &Target) -> Vec<&Window<P::Element>> {
        self.windows
            .iter()
            .filter(|w| self.is_eligible(w, target))
            .collect()
    }

    pub fn min_size_for(&self, window: &Window<P::Element>) -> Option<Size> {
        if self.config.min_sizes.is_empty() {
            return None;
        }
        let app = self.applications.get(&window.owner())?;
        self.config.min_size_for(app.title(&self.provider)?)
    }

    /// Recompute and write every managed frame. Returns the number written.
    pub fn reflow(&self) -> usize {
        self.config.layout.reflow(self, &self.target)
    }
}
