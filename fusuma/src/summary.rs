use fusuma_core::{format_hotkey, AccessibilityProvider, Config, HotkeyMap, WindowManager};
use fusuma_ipc::{ApplicationInfo, BindingInfo};

pub fn binding_infos(hotkeys: &HotkeyMap) -> Vec<BindingInfo> {
    hotkeys
        .bindings()
        .iter()
        .map(|binding| BindingInfo {
            key: format_hotkey(&binding.hotkey),
            action: binding.action.name().to_string(),
        })
        .collect()
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub fn application_infos<P: AccessibilityProvider>(
    manager: &WindowManager<P>,
) -> Vec<ApplicationInfo> {
    let managed = manager.get_managed_windows(manager.target());
    manager
        .applications()
        .map(|app| ApplicationInfo {
            pid: app.pid(),
            bundle_id: app.bundle_id().to_string(),
            title: app.title(manager.provider()).map(str::to_string),
            window_count: app.windows().len(),
            managed_count: managed.iter().filter(|w| w.owner() == app.pid()).count(),
            hidden: app.hidden(manager.provider()),
        })
        .collect()
}

/// Human readable digest printed by `check-config`.
pub fn describe_config(config: &Config) -> String {
    let mut lines = vec![
        format!("layout: {}", config.layout.strategy.name()),
        format!("ignore menu: {}", config.layout.ignore_menu),
        format!("hotkey match: {}", config.hotkeys.policy().name()),
    ];
    if !config.ignored_bundles.is_empty() {
        lines.push(format!("ignored: {}", config.ignored_bundles.join(", ")));
    }

    let mut min_sizes: Vec<_> = config.min_sizes.iter().collect();
    min_sizes.sort_by(|a, b| a.0.cmp(b.0));
    for (title, size) in min_sizes {
        lines.push(format!("min size {}: {}x{}", title, size.width, size.height));
    }

    for binding in binding_infos(&config.hotkeys) {
        lines.push(format!("bind {} -> {}", binding.key, binding.action));
    }
    lines.join("\n")
}
