use objc2::MainThreadMarker;
use objc2_app_kit::NSScreen;
use objc2_foundation::NSRect;

use fusuma_core::{Rect, Target};

fn to_rect(frame: NSRect) -> Rect {
    Rect::new(
        frame.origin.x.round() as i32,
        frame.origin.y.round() as i32,
        frame.size.width.max(0.0).round() as u32,
        frame.size.height.max(0.0).round() as u32,
    )
}

/// Layout target for the main screen, in accessibility coordinates.
pub fn main_screen_target(mtm: MainThreadMarker) -> Option<Target> {
    let main = NSScreen::mainScreen(mtm)?;
    // The first screen holds the global origin.
    let primary = NSScreen::screens(mtm).firstObject()?;
    let primary_height = to_rect(primary.frame()).height;

    let screen = to_rect(main.frame()).flipped(primary_height);
    tracing::debug!("Main screen frame: {:?}", screen);
    Some(Target::new(screen))
}
