use tracing::{debug, warn};

use crate::geometry::{offset, Rect};
use crate::manager::{Target, WindowManager};
use crate::platform::AccessibilityProvider;

/// Height reserved for the menu bar unless the layout ignores it.
pub const MENU_BAR_HEIGHT: u32 = 22;

/// Every window gets the same centered region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterStage {
    pub border: u32,
}

/// Two equal columns, windows alternate left/right by index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    pub border: u32,
    pub gutter: u32,
}

/// One master column on the left, remaining windows stacked on the right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalSplit {
    pub border: u32,
    pub gutter: u32,
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layout {
    CenterStage(CenterStage),
    Panel(Panel),
    VerticalSplit(VerticalSplit),
}

impl Layout {
    pub fn name(&self) -> &'static str {
        match self {
            Layout::CenterStage(_) => "center_stage",
            Layout::Panel(_) => "panel",
            Layout::VerticalSplit(_) => "vertical_split",
        }
    }

    fn border(&self) -> u32 {
        match self {
            Layout::CenterStage(l) => l.border,
            Layout::Panel(l) => l.border,
            Layout::VerticalSplit(l) => l.border,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub strategy: Layout,
    pub ignore_menu: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            strategy: Layout::Panel(Panel {
                border: 40,
                gutter: 40,
            }),
            ignore_menu: true,
        }
    }
}

impl LayoutConfig {
    fn menu_offset(&self) -> u32 {
        if self.ignore_menu {
            0
        } else {
            MENU_BAR_HEIGHT
        }
    }

    /// Screen minus the border on every side and the menu bar on top.
    pub fn usable(&self, screen: Rect) -> Rect {
        let border = self.strategy.border();
        screen.inset(border.saturating_add(self.menu_offset()), border, border, border)
    }

    /// Frames for `count` windows in tracked order. Pure geometry.
    pub fn arrange(&self, screen: Rect, count: usize) -> Vec<Rect> {
        if count == 0 {
            return Vec::new();
        }
        let usable = self.usable(screen);

        match self.strategy {
            Layout::CenterStage(_) => vec![usable; count],
            Layout::Panel(Panel { border, gutter }) => {
                let split = screen.width.saturating_sub(gutter) / 2;
                let right_x = split.saturating_add(gutter);
                let left = Rect::new(
                    offset(screen.x, border),
                    usable.y,
                    split.saturating_sub(border),
                    usable.height,
                );
                let right = Rect::new(
                    offset(screen.x, right_x),
                    usable.y,
                    screen.width.saturating_sub(border).saturating_sub(right_x),
                    usable.height,
                );
                (0..count)
                    .map(|i| if i % 2 == 0 { left } else { right })
                    .collect()
            }
            Layout::VerticalSplit(VerticalSplit { gutter, ratio, .. }) => {
                if count == 1 {
                    return vec![usable];
                }

                let available = usable.width.saturating_sub(gutter);
                let master_width = (available as f64 * ratio) as u32;
                let slave_width = available.saturating_sub(master_width);
                let slave_x = offset(usable.x, master_width.saturating_add(gutter));

                // Total: n * height + (n-1) * gutter = usable height
                let slaves = (count - 1) as u32;
                let total_gutter = gutter.saturating_mul(slaves - 1);
                let slave_height = usable.height.saturating_sub(total_gutter) / slaves;

                let mut frames = Vec::with_capacity(count);
                frames.push(Rect::new(usable.x, usable.y, master_width, usable.height));
                for i in 0..slaves {
                    let step = slave_height.saturating_add(gutter);
                    let y = offset(usable.y, i.saturating_mul(step));
                    frames.push(Rect::new(slave_x, y, slave_width, slave_height));
                }
                frames
            }
        }
    }

    /// Write a frame to every managed window on `target`. Returns how many
    /// windows accepted their new frame.
    pub fn reflow<P: AccessibilityProvider>(
        &self,
        manager: &WindowManager<P>,
        target: &Target,
    ) -> usize {
        let windows = manager.get_managed_windows(target);
        let frames = self.arrange(target.screen, windows.len());
        debug!(
            "Reflowing {} windows with {} layout",
            windows.len(),
            self.strategy.name()
        );

        let mut written = 0;
        for (window, frame) in windows.into_iter().zip(frames) {
            let frame = match manager.min_size_for(window) {
                Some(min) => frame.at_least(min),
                None => frame,
            };
            match window.set_frame(manager.provider(), frame) {
                Ok(()) => written += 1,
                Err(e) => warn!(
                    "Failed to set frame for window of pid {}: {}",
                    window.owner(),
                    e
                ),
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        width: 1000,
        height: 800,
    };

    fn config(strategy: Layout) -> LayoutConfig {
        LayoutConfig {
            strategy,
            ignore_menu: true,
        }
    }

    #[test]
    fn test_center_stage_all_identical() {
        let layout = config(Layout::CenterStage(CenterStage { border: 40 }));
        let frames = layout.arrange(SCREEN, 3);
        assert_eq!(frames.len(), 3);
        for frame in frames {
            assert_eq!(frame, Rect::new(40, 40, 920, 720));
        }
    }

    #[test]
    fn test_center_stage_menu_offset() {
        let layout = LayoutConfig {
            strategy: Layout::CenterStage(CenterStage { border: 40 }),
            ignore_menu: false,
        };
        let frames = layout.arrange(SCREEN, 1);
        assert_eq!(frames[0], Rect::new(40, 62, 920, 698));
    }

    #[test]
    fn test_panel_parity() {
        let layout = config(Layout::Panel(Panel {
            border: 40,
            gutter: 40,
        }));
        let frames = layout.arrange(SCREEN, 4);
        assert_eq!(frames[0], frames[2]);
        assert_eq!(frames[1], frames[3]);
        assert_ne!(frames[0], frames[1]);

        // split = (1000 - 40) / 2 = 480
        assert_eq!(frames[0], Rect::new(40, 40, 440, 720));
        assert_eq!(frames[1], Rect::new(520, 40, 440, 720));
    }

    #[test]
    fn test_panel_width_identity() {
        let layout = config(Layout::Panel(Panel {
            border: 40,
            gutter: 40,
        }));
        let frames = layout.arrange(SCREEN, 2);
        assert_eq!(frames[0].width + 40 + frames[1].width, 1000 - 2 * 40);
        assert_eq!(frames[1].right(), 1000 - 40);
    }

    #[test]
    fn test_panel_offset_screen() {
        let layout = config(Layout::Panel(Panel {
            border: 10,
            gutter: 20,
        }));
        let screen = Rect::new(1440, 0, 1000, 800);
        let frames = layout.arrange(screen, 2);
        assert_eq!(frames[0].x, 1450);
        assert_eq!(frames[1].x, 1440 + 490 + 20);
    }

    #[test]
    fn test_vertical_split_single_window() {
        let layout = config(Layout::VerticalSplit(VerticalSplit {
            border: 40,
            gutter: 40,
            ratio: 0.5,
        }));
        let frames = layout.arrange(SCREEN, 1);
        assert_eq!(frames, vec![Rect::new(40, 40, 920, 720)]);
    }

    #[test]
    fn test_vertical_split_master_and_slaves() {
        let layout = config(Layout::VerticalSplit(VerticalSplit {
            border: 0,
            gutter: 10,
            ratio: 0.5,
        }));
        let frames = layout.arrange(SCREEN, 3);
        assert_eq!(frames.len(), 3);

        // available = 990, master = 495
        assert_eq!(frames[0], Rect::new(0, 0, 495, 800));
        // slaves: (800 - 10) / 2 = 395
        assert_eq!(frames[1], Rect::new(505, 0, 495, 395));
        assert_eq!(frames[2], Rect::new(505, 405, 495, 395));
    }

    #[test]
    fn test_vertical_split_ratio() {
        let layout = config(Layout::VerticalSplit(VerticalSplit {
            border: 0,
            gutter: 0,
            ratio: 0.75,
        }));
        let frames = layout.arrange(SCREEN, 2);
        assert_eq!(frames[0].width, 750);
        assert_eq!(frames[1], Rect::new(750, 0, 250, 800));
    }

    #[test]
    fn test_empty() {
        let layout = LayoutConfig::default();
        assert!(layout.arrange(SCREEN, 0).is_empty());
    }

    #[test]
    fn test_arrange_deterministic() {
        let layout = config(Layout::VerticalSplit(VerticalSplit {
            border: 40,
            gutter: 40,
            ratio: 0.6,
        }));
        assert_eq!(layout.arrange(SCREEN, 5), layout.arrange(SCREEN, 5));
    }

    #[test]
    fn test_tiny_screen_saturates() {
        let layout = config(Layout::VerticalSplit(VerticalSplit {
            border: 40,
            gutter: 40,
            ratio: 0.5,
        }));
        let frames = layout.arrange(Rect::new(0, 0, 50, 50), 4);
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.width == 0 && f.height == 0));
    }

    #[test]
    fn test_oversized_spacing_does_not_overflow() {
        let screen = Rect::new(0, 0, 1000, 800);
        let layouts = [
            Layout::CenterStage(CenterStage { border: 3_000_000_000 }),
            Layout::Panel(Panel {
                border: u32::MAX,
                gutter: u32::MAX,
            }),
            Layout::VerticalSplit(VerticalSplit {
                border: 0,
                gutter: u32::MAX,
                ratio: 0.5,
            }),
        ];
        for strategy in layouts {
            let layout = LayoutConfig {
                strategy,
                ignore_menu: false,
            };
            let frames = layout.arrange(screen, 3);
            assert_eq!(frames.len(), 3);
            assert!(frames.iter().all(|f| f.width == 0), "{:?}", strategy);
        }
    }
}
