use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop, CFRunLoopSource};
use core_graphics::event::{
    CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    CallbackResult, EventField,
};
use std::sync::mpsc as std_mpsc;

use anyhow::{anyhow, Result};
use fusuma_core::Event;

use super::MacEvent;

/// Listen-only key-down tap. Keystrokes always pass through; binding
/// resolution happens on the main thread against the current configuration.
pub struct KeyTap {
    _tap: CGEventTap<'static>,
    _source: CFRunLoopSource,
}

impl KeyTap {
    pub fn start(event_tx: std_mpsc::Sender<MacEvent>) -> Result<Self> {
        let tap = CGEventTap::new(
            CGEventTapLocation::Session,
            CGEventTapPlacement::HeadInsertEventTap,
            CGEventTapOptions::ListenOnly,
            vec![CGEventType::KeyDown],
            move |_proxy, _event_type, event| {
                let key_code =
                    event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
                let flags = event.get_flags().bits();

                if event_tx.send(Event::KeyDown { flags, key_code }).is_err() {
                    tracing::error!("Failed to send key event");
                }
                CallbackResult::Keep
            },
        )
        .map_err(|_| {
            anyhow!("Failed to create event tap. Make sure Accessibility permission is granted.")
        })?;

        tap.enable();

        let source = tap
            .mach_port()
            .create_runloop_source(0)
            .map_err(|_| anyhow!("Failed to create run loop source"))?;

        CFRunLoop::get_current().add_source(&source, unsafe { kCFRunLoopCommonModes });
        tracing::info!("Key tap started");

        Ok(Self {
            _tap: tap,
            _source: source,
        })
    }
}
