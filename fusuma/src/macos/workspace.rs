use objc2::rc::Retained;
use objc2::runtime::{AnyObject, Sel};
use objc2::{define_class, msg_send, sel, DefinedClass};
use objc2_app_kit::{NSRunningApplication, NSWorkspace};
use objc2_foundation::{MainThreadMarker, NSNotification, NSObject, NSObjectProtocol, NSString};
use std::cell::RefCell;
use std::sync::mpsc as std_mpsc;

use fusuma_core::Event;

use super::MacEvent;

struct Ivars {
    event_tx: RefCell<Option<std_mpsc::Sender<MacEvent>>>,
}

define_class!(
    #[unsafe(super(NSObject))]
    #[ivars = Ivars]
    struct WorkspaceObserver;

    unsafe impl NSObjectProtocol for WorkspaceObserver {}

    impl WorkspaceObserver {
        #[unsafe(method(appLaunched:))]
        fn app_launched(&self, notification: &NSNotification) {
            if let Some(app) = running_application(notification) {
                let pid = app.processIdentifier();
                let bundle_id = app.bundleIdentifier().map(|id| id.to_string());
                tracing::debug!("App launched: pid {} ({:?})", pid, bundle_id);
                self.send(Event::AppLaunched { pid, bundle_id });
            }
        }

        #[unsafe(method(appTerminated:))]
        fn app_terminated(&self, notification: &NSNotification) {
            if let Some(app) = running_application(notification) {
                let pid = app.processIdentifier();
                tracing::debug!("App terminated: pid {}", pid);
                self.send(Event::AppTerminated { pid });
            }
        }

        #[unsafe(method(appHidden:))]
        fn app_hidden(&self, notification: &NSNotification) {
            if let Some(app) = running_application(notification) {
                self.send(Event::AppHidden { pid: app.processIdentifier() });
            }
        }

        #[unsafe(method(appUnhidden:))]
        fn app_unhidden(&self, notification: &NSNotification) {
            if let Some(app) = running_application(notification) {
                self.send(Event::AppUnhidden { pid: app.processIdentifier() });
            }
        }

        #[unsafe(method(spaceChanged:))]
        fn space_changed(&self, _notification: &NSNotification) {
            tracing::debug!("Active space changed");
            self.send(Event::SpaceChanged);
        }
    }
);

fn running_application(notification: &NSNotification) -> Option<Retained<NSRunningApplication>> {
    unsafe {
        let user_info = notification.userInfo()?;
        let key = NSString::from_str("NSWorkspaceApplicationKey");
        msg_send![&user_info, objectForKey: &*key]
    }
}

impl WorkspaceObserver {
    fn new(event_tx: std_mpsc::Sender<MacEvent>, mtm: MainThreadMarker) -> Retained<Self> {
        let this = mtm.alloc::<Self>();
        let this = this.set_ivars(Ivars {
            event_tx: RefCell::new(Some(event_tx)),
        });
        unsafe { msg_send![super(this), init] }
    }

    fn send(&self, event: MacEvent) {
        let tx = self.ivars().event_tx.borrow();
        if let Some(sender) = tx.as_ref() {
            let _: Result<(), _> = sender.send(event);
        }
    }
}

fn subscriptions() -> [(&'static str, Sel); 5] {
    [
        ("NSWorkspaceDidLaunchApplicationNotification", sel!(appLaunched:)),
        ("NSWorkspaceDidTerminateApplicationNotification", sel!(appTerminated:)),
        ("NSWorkspaceDidHideApplicationNotification", sel!(appHidden:)),
        ("NSWorkspaceDidUnhideApplicationNotification", sel!(appUnhidden:)),
        ("NSWorkspaceActiveSpaceDidChangeNotification", sel!(spaceChanged:)),
    ]
}

/// Forwards application lifecycle and space changes from `NSWorkspace`.
pub struct WorkspaceWatcher {
    observer: Retained<WorkspaceObserver>,
}

impl WorkspaceWatcher {
    pub fn new(event_tx: std_mpsc::Sender<MacEvent>, mtm: MainThreadMarker) -> Self {
        let observer = WorkspaceObserver::new(event_tx, mtm);

        unsafe {
            let center = NSWorkspace::sharedWorkspace().notificationCenter();
            let observer_obj: &AnyObject =
                std::mem::transmute::<&WorkspaceObserver, &AnyObject>(&*observer);

            for (name, selector) in subscriptions() {
                let name = NSString::from_str(name);
                center.addObserver_selector_name_object(observer_obj, selector, Some(&name), None);
            }
        }

        tracing::info!("Workspace watcher started");

        Self { observer }
    }
}

impl Drop for WorkspaceWatcher {
    fn drop(&mut self) {
        self.observer.ivars().event_tx.borrow_mut().take();
        unsafe {
            let center = NSWorkspace::sharedWorkspace().notificationCenter();
            let observer_obj: &AnyObject =
                std::mem::transmute::<&WorkspaceObserver, &AnyObject>(&*self.observer);
            center.removeObserver(observer_obj);
        }
    }
}
