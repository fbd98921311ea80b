use crate::platform::Pid;

/// Inbound trigger delivered to the window manager, one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<E> {
    AppLaunched {
        pid: Pid,
        bundle_id: Option<String>,
    },
    AppTerminated {
        pid: Pid,
    },
    AppHidden {
        pid: Pid,
    },
    AppUnhidden {
        pid: Pid,
    },
    SpaceChanged,
    WindowCreated {
        pid: Pid,
        window: E,
    },
    WindowMiniaturized {
        pid: Pid,
    },
    WindowDeminiaturized {
        pid: Pid,
    },
    KeyDown {
        flags: u64,
        key_code: u16,
    },
}

/// Named operations a hotkey can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Reflow,
    Reload,
    Quit,
}

impl Action {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "reflow" => Some(Action::Reflow),
            "reload" => Some(Action::Reload),
            "quit" => Some(Action::Quit),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Reflow => "reflow",
            Action::Reload => "reload",
            Action::Quit => "quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        for action in [Action::Reflow, Action::Reload, Action::Quit] {
            assert_eq!(Action::from_name(action.name()), Some(action));
        }
        assert_eq!(Action::from_name("toggle"), None);
        assert_eq!(Action::from_name("Reflow"), None);
    }
}
