use std::ffi::c_void;
use std::sync::mpsc as std_mpsc;

use core_foundation::base::TCFType;
use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop};
use core_foundation::string::{CFString, CFStringRef};

use fusuma_core::{AxError, Event, Notification, Pid};

use super::accessibility::{AXObserver, AXObserverRef, AXUIElement, AXUIElementRef};
use super::MacEvent;

struct CallbackContext {
    pid: Pid,
    event_tx: std_mpsc::Sender<MacEvent>,
}

/// A live observer registration for one application. Dropping it detaches
/// every notification and the run loop source.
pub struct ObserverHandle {
    observer: AXObserver,
    application: AXUIElement,
    notifications: Vec<Notification>,
    context: *mut CallbackContext,
}

impl ObserverHandle {
    pub fn register(
        pid: Pid,
        application: &AXUIElement,
        notifications: &[Notification],
        event_tx: std_mpsc::Sender<MacEvent>,
    ) -> Result<Self, AxError> {
        let observer = AXObserver::new(pid, observer_callback)?;
        let context = Box::into_raw(Box::new(CallbackContext { pid, event_tx }));

        let mut registered = Vec::with_capacity(notifications.len());
        for notification in notifications {
            match observer.add_notification(application, notification.name(), context as *mut c_void)
            {
                Ok(()) => registered.push(*notification),
                Err(code) => tracing::debug!(
                    "Failed to add notification {} for pid {}: {}",
                    notification.name(),
                    pid,
                    code
                ),
            }
        }

        let source = observer.run_loop_source();
        CFRunLoop::get_current().add_source(&source, unsafe { kCFRunLoopDefaultMode });

        Ok(Self {
            observer,
            application: application.clone(),
            notifications: registered,
            context,
        })
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        for notification in &self.notifications {
            self.observer
                .remove_notification(&self.application, notification.name());
        }
        let source = self.observer.run_loop_source();
        CFRunLoop::get_current().remove_source(&source, unsafe { kCFRunLoopDefaultMode });
        // No callback can reach the context once the source is gone.
        drop(unsafe { Box::from_raw(self.context) });
    }
}

extern "C" fn observer_callback(
    _observer: AXObserverRef,
    element: AXUIElementRef,
    notification: CFStringRef,
    refcon: *mut c_void,
) {
    if refcon.is_null() {
        return;
    }

    let context = unsafe { &*(refcon as *const CallbackContext) };
    let name = unsafe { CFString::wrap_under_get_rule(notification) }.to_string();
    let pid = context.pid;

    let event = if name == Notification::WindowCreated.name() {
        if element.is_null() {
            return;
        }
        let window = unsafe { AXUIElement::wrap_under_get_rule(element) };
        Event::WindowCreated { pid, window }
    } else if name == Notification::WindowMiniaturized.name() {
        Event::WindowMiniaturized { pid }
    } else if name == Notification::WindowDeminiaturized.name() {
        Event::WindowDeminiaturized { pid }
    } else {
        tracing::debug!("Unknown notification: {}", name);
        return;
    };

    tracing::debug!("Observer event: {:?}", event);
    if let Err(e) = context.event_tx.send(event) {
        tracing::error!("Failed to send event: {}", e);
    }
}
