/// Debug option that suppresses window shadows for the whole login session.
const NO_SHADOWS: u32 = 16384;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGSGetDebugOptions(options: *mut u32);
    fn CGSSetDebugOptions(options: u32);
}

fn toggled(options: u32) -> u32 {
    options ^ NO_SHADOWS
}

fn shadows_disabled(options: u32) -> bool {
    options & NO_SHADOWS != 0
}

/// Flip window shadows on or off. Returns true when shadows are now off.
pub fn toggle_shadows() -> bool {
    let mut options = 0;
    unsafe { CGSGetDebugOptions(&mut options) };
    let options = toggled(options);
    unsafe { CGSSetDebugOptions(options) };
    tracing::debug!("Window server debug options now {:#x}", options);
    shadows_disabled(options)
}
