use crate::geometry::Rect;

use super::{PlatformDef, StaticWorld, WorldError};

/// The stock level: a full-width ground strip along the bottom of the
/// viewport plus a handful of ledges.
pub struct DefaultLevel {
    defs: Vec<PlatformDef>,
}

impl DefaultLevel {
    pub const GROUND_HEIGHT: f32 = 100.0;

    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        let mut defs = vec![PlatformDef {
            width: viewport_width,
            height: Self::GROUND_HEIGHT,
            x: 0.0,
            y: viewport_height - Self::GROUND_HEIGHT,
        }];

        Self::add_ledges(&mut defs);

        Self { defs }
    }

    fn add_ledges(defs: &mut Vec<PlatformDef>) {
        let ledges = [
            (200.0, 20.0, 300.0, 500.0),
            (150.0, 20.0, 600.0, 400.0),
            (200.0, 20.0, 1200.0, 700.0),
            (200.0, 20.0, 800.0, 900.0),
            (200.0, 50.0, 700.0, 800.0),
            (200.0, 50.0, 600.0, 700.0),
        ];

        defs.extend(ledges.into_iter().map(|(width, height, x, y)| PlatformDef {
            width,
            height,
            x,
            y,
        }));
    }

    pub fn defs(&self) -> &[PlatformDef] {
        &self.defs
    }

    pub fn build(&self) -> Result<StaticWorld, WorldError> {
        StaticWorld::from_rects(self.defs.iter().copied().map(Rect::from))
    }
}
