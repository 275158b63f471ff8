use haven_core::{Point2, Rectangle};

/// Maps world coordinates to screen coordinates.
///
/// The camera offset is the world point shown at the viewport center. It is
/// clamped to at least half the viewport on each axis so the world origin
/// never moves right of / below the screen's top-left corner. When the world
/// size is known the offset is also clamped so the far edge stays on screen;
/// the lower clamp wins for worlds smaller than the viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Camera {
    offset: Point2,
    viewport: (u32, u32),
    world_size: Option<(u32, u32)>,
}

impl Camera {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        let mut camera = Self {
            offset: Point2::ZERO,
            viewport: (viewport_width, viewport_height),
            world_size: None,
        };
        camera.set_position(Point2::ZERO);
        camera
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn offset(&self) -> Point2 {
        self.offset
    }

    /// Screen-space center of the viewport.
    pub fn center(&self) -> Point2 {
        Point2::new(self.viewport.0 as i32 / 2, self.viewport.1 as i32 / 2)
    }

    pub fn set_world_size(&mut self, width: u32, height: u32) {
        self.world_size = Some((width, height));
        self.set_position(self.offset);
    }

    pub fn resize(&mut self, viewport_width: u32, viewport_height: u32) {
        self.viewport = (viewport_width, viewport_height);
        self.set_position(self.offset);
    }

    /// Center the view on `position`, subject to the clamps.
    pub fn set_position(&mut self, position: Point2) {
        let center = self.center();
        let mut x = position.x;
        let mut y = position.y;
        if let Some((world_w, world_h)) = self.world_size {
            x = x.min(world_w as i32 - center.x);
            y = y.min(world_h as i32 - center.y);
        }
        self.offset = Point2::new(x.max(center.x), y.max(center.y));
    }

    /// World position to screen position.
    pub fn apply(&self, world: Point2) -> Point2 {
        self.center() + (world - self.offset)
    }

    /// Screen position to world position.
    pub fn unapply(&self, screen: Point2) -> Point2 {
        screen - self.center() + self.offset
    }

    /// The world-space rectangle currently covered by the viewport.
    pub fn visible_rect(&self) -> Rectangle {
        let origin = self.unapply(Point2::ZERO);
        Rectangle::new(
            origin.x,
            origin.y,
            self.viewport.0 as i32,
            self.viewport.1 as i32,
        )
    }

    /// True if any part of the world-space `bounds` lands on screen.
    pub fn is_visible(&self, bounds: &Rectangle) -> bool {
        let screen = self.apply(bounds.position());
        screen.x + bounds.width > 0
            && screen.x < self.viewport.0 as i32
            && screen.y + bounds.height > 0
            && screen.y < self.viewport.1 as i32
    }
}
