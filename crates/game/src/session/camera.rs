use glam::Vec2;

/// Shared view over the world: the mean of all live entity centers is kept at
/// the middle of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    focus: Vec2,
    viewport: Vec2,
}

impl Camera {
    /// Starts focused on the world origin.
    pub fn new(viewport: Vec2) -> Self {
        Self {
            focus: Vec2::ZERO,
            viewport,
        }
    }

    pub fn focus(&self) -> Vec2 {
        self.focus
    }

    /// World position of the screen's top-left corner.
    pub fn offset(&self) -> Vec2 {
        self.focus - self.viewport / 2.0
    }

    /// Re-centers on the mean of `centers`. An empty set keeps the last focus.
    pub fn update<I>(&mut self, centers: I)
    where
        I: IntoIterator<Item = Vec2>,
    {
        let (sum, count) = centers
            .into_iter()
            .fold((Vec2::ZERO, 0u32), |(sum, count), c| (sum + c, count + 1));

        if count > 0 {
            self.focus = sum / count as f32;
        }
    }

    pub fn world_to_screen(&self, point: Vec2) -> Vec2 {
        point - self.offset()
    }

    pub fn screen_to_world(&self, point: Vec2) -> Vec2 {
        point + self.offset()
    }
}
