use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::mpsc as std_mpsc;

use objc2_app_kit::NSWorkspace;

use fusuma_core::{
    AccessibilityProvider, AttrValue, Attribute, AxError, Notification, Pid, ProcessInfo,
};

use super::accessibility::{self, AXUIElement};
use super::observer::ObserverHandle;
use super::MacEvent;

/// Accessibility provider backed by the system AX API. Observer callbacks
/// feed the shared event channel.
pub struct MacAccessibility {
    event_tx: std_mpsc::Sender<MacEvent>,
    observers: RefCell<HashMap<Pid, ObserverHandle>>,
}

impl MacAccessibility {
    pub fn new(event_tx: std_mpsc::Sender<MacEvent>) -> Self {
        Self {
            event_tx,
            observers: RefCell::new(HashMap::new()),
        }
    }
}

impl AccessibilityProvider for MacAccessibility {
    type Element = AXUIElement;

    fn is_trusted(&self) -> bool {
        accessibility::is_trusted()
    }

    fn running_processes(&self) -> Vec<ProcessInfo> {
        let workspace = NSWorkspace::sharedWorkspace();
        let mut processes = Vec::new();
        for app in workspace.runningApplications() {
            processes.push(ProcessInfo {
                pid: app.processIdentifier(),
                bundle_id: app.bundleIdentifier().map(|id| id.to_string()),
            });
        }
        processes
    }

    fn create_application_ref(&self, pid: Pid) -> Result<AXUIElement, AxError> {
        if !accessibility::is_trusted() {
            return Err(AxError::PermissionDenied);
        }
        Ok(AXUIElement::application(pid))
    }

    fn get(&self, element: &AXUIElement, attribute: Attribute) -> Result<AttrValue, AxError> {
        element.get(attribute)
    }

    fn set(
        &self,
        element: &AXUIElement,
        attribute: Attribute,
        value: AttrValue,
    ) -> Result<(), AxError> {
        element.set(attribute, value)
    }

    fn can_set(&self, element: &AXUIElement, attribute: Attribute) -> bool {
        element.is_settable(attribute)
    }

    fn count(&self, element: &AXUIElement, attribute: Attribute) -> Result<usize, AxError> {
        element.count(attribute)
    }

    fn children(
        &self,
        element: &AXUIElement,
        attribute: Attribute,
    ) -> Result<Vec<AXUIElement>, AxError> {
        element.children(attribute)
    }

    fn observe(
        &self,
        pid: Pid,
        application: &AXUIElement,
        notifications: &[Notification],
    ) -> Result<(), AxError> {
        let handle =
            ObserverHandle::register(pid, application, notifications, self.event_tx.clone())?;
        self.observers.borrow_mut().insert(pid, handle);
        tracing::debug!("Added observer for pid {}", pid);
        Ok(())
    }

    fn unobserve(&self, pid: Pid) {
        if self.observers.borrow_mut().remove(&pid).is_some() {
            tracing::debug!("Removed observer for pid {}", pid);
        }
    }
}
