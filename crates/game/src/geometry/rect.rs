use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in world units. `y` grows downward, so `top < bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(
            center.x - size.x / 2.0,
            center.y - size.y / 2.0,
            size.x,
            size.y,
        )
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    pub fn at(&self, position: Vec2) -> Self {
        Self::new(position.x, position.y, self.width, self.height)
    }

    pub fn with_top(&self, top: f32) -> Self {
        Self::new(self.x, top, self.width, self.height)
    }

    pub fn with_bottom(&self, bottom: f32) -> Self {
        Self::new(self.x, bottom - self.height, self.width, self.height)
    }

    pub fn with_left(&self, left: f32) -> Self {
        Self::new(left, self.y, self.width, self.height)
    }

    pub fn with_right(&self, right: f32) -> Self {
        Self::new(right - self.width, self.y, self.width, self.height)
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}
