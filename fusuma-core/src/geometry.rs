#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// `base + by`, clamped to the coordinate range.
pub fn offset(base: i32, by: u32) -> i32 {
    base.saturating_add(i32::try_from(by).unwrap_or(i32::MAX))
}

/// Rectangle in top-left-origin screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Shrink the rectangle by the given edge insets. Dimensions saturate at zero.
    pub fn inset(&self, top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            x: offset(self.x, left),
            y: offset(self.y, top),
            width: self.width.saturating_sub(left.saturating_add(right)),
            height: self.height.saturating_sub(top.saturating_add(bottom)),
        }
    }

    /// Grow width/height to at least `min`, keeping the origin fixed.
    pub fn at_least(&self, min: Size) -> Self {
        Self {
            width: self.width.max(min.width),
            height: self.height.max(min.height),
            ..*self
        }
    }

    /// Convert between bottom-left-origin (AppKit) and top-left-origin
    /// (accessibility) coordinates. `primary_height` is the height of the
    /// screen that holds the global origin. Applying it twice is the identity.
    pub fn flipped(&self, primary_height: u32) -> Self {
        Self {
            y: primary_height as i32 - self.y - self.height as i32,
            ..*self
        }
    }
}
