use serde::{Deserialize, Serialize};

use crate::geometry::{collides, Rect};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WorldError {
    #[error("static world has no ground platform")]
    MissingGround,
    #[error("platform {index} has no area ({width}x{height})")]
    InvalidPlatform { index: usize, width: f32, height: f32 },
    #[error("no platform at index {0}")]
    UnknownPlatform(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformKind {
    Ground,
    Ledge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Platform {
    pub kind: PlatformKind,
    pub rect: Rect,
}

impl Platform {
    pub fn ground(rect: Rect) -> Self {
        Self {
            kind: PlatformKind::Ground,
            rect,
        }
    }

    pub fn ledge(rect: Rect) -> Self {
        Self {
            kind: PlatformKind::Ledge,
            rect,
        }
    }
}

/// One entry of a level file, in the `{width, height, x, y}` layout the map
/// files use. `x`/`y` are the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformDef {
    pub width: f32,
    pub height: f32,
    pub x: f32,
    pub y: f32,
}

impl From<PlatformDef> for Rect {
    fn from(def: PlatformDef) -> Self {
        Rect::new(def.x, def.y, def.width, def.height)
    }
}

impl From<Rect> for PlatformDef {
    fn from(rect: Rect) -> Self {
        Self {
            width: rect.width,
            height: rect.height,
            x: rect.x,
            y: rect.y,
        }
    }
}

/// Collidable terrain for one session. Index 0 is always the ground.
#[derive(Debug, Clone)]
pub struct StaticWorld {
    platforms: Vec<Platform>,
}

impl StaticWorld {
    /// Builds a world from an ordered platform list. The first entry becomes
    /// the ground; an empty list is rejected.
    pub fn from_rects<I>(rects: I) -> Result<Self, WorldError>
    where
        I: IntoIterator<Item = Rect>,
    {
        let mut platforms = Vec::new();
        for (index, rect) in rects.into_iter().enumerate() {
            validate(index, &rect)?;
            platforms.push(if index == 0 {
                Platform::ground(rect)
            } else {
                Platform::ledge(rect)
            });
        }

        if platforms.is_empty() {
            return Err(WorldError::MissingGround);
        }

        Ok(Self { platforms })
    }

    pub fn from_defs(defs: &[PlatformDef]) -> Result<Self, WorldError> {
        Self::from_rects(defs.iter().copied().map(Rect::from))
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn ground(&self) -> &Platform {
        &self.platforms[0]
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn rects(&self) -> impl Iterator<Item = &Rect> {
        self.platforms.iter().map(|p| &p.rect)
    }

    /// True when `rect` overlaps any platform.
    pub fn touches(&self, rect: &Rect) -> bool {
        self.rects().any(|platform| collides(rect, platform))
    }

    pub fn append_platform(&mut self, rect: Rect) -> Result<usize, WorldError> {
        let index = self.platforms.len();
        validate(index, &rect)?;
        self.platforms.push(Platform::ledge(rect));
        Ok(index)
    }

    pub fn reposition_platform(&mut self, index: usize, rect: Rect) -> Result<(), WorldError> {
        validate(index, &rect)?;
        let platform = self
            .platforms
            .get_mut(index)
            .ok_or(WorldError::UnknownPlatform(index))?;
        platform.rect = rect;
        Ok(())
    }

    pub fn to_defs(&self) -> Vec<PlatformDef> {
        self.rects().copied().map(PlatformDef::from).collect()
    }
}

fn validate(index: usize, rect: &Rect) -> Result<(), WorldError> {
    if rect.has_area() {
        Ok(())
    } else {
        Err(WorldError::InvalidPlatform {
            index,
            width: rect.width,
            height: rect.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground() -> Rect {
        Rect::new(0.0, 980.0, 1920.0, 100.0)
    }

    #[test]
    fn empty_world_is_rejected() {
        let err = StaticWorld::from_rects(Vec::new()).unwrap_err();
        assert_eq!(err, WorldError::MissingGround);
    }

    #[test]
    fn first_platform_is_ground() {
        let world =
            StaticWorld::from_rects([ground(), Rect::new(300.0, 500.0, 200.0, 20.0)]).unwrap();

        assert_eq!(world.ground().kind, PlatformKind::Ground);
        assert_eq!(world.platforms()[1].kind, PlatformKind::Ledge);
    }

    #[test]
    fn degenerate_platform_is_rejected() {
        let err = StaticWorld::from_rects([ground(), Rect::new(0.0, 0.0, 0.0, 20.0)]).unwrap_err();
        assert!(matches!(err, WorldError::InvalidPlatform { index: 1, .. }));
    }

    #[test]
    fn edit_operations() {
        let mut world = StaticWorld::from_rects([ground()]).unwrap();

        let index = world.append_platform(Rect::new(100.0, 100.0, 200.0, 20.0)).unwrap();
        assert_eq!(index, 1);

        world
            .reposition_platform(index, Rect::new(110.0, 90.0, 210.0, 20.0))
            .unwrap();
        assert_eq!(world.platforms()[1].rect.x, 110.0);
        assert_eq!(world.platforms()[1].kind, PlatformKind::Ledge);

        assert_eq!(
            world.reposition_platform(7, ground()),
            Err(WorldError::UnknownPlatform(7))
        );
    }

    #[test]
    fn touches_checks_every_platform() {
        let world =
            StaticWorld::from_rects([ground(), Rect::new(300.0, 500.0, 200.0, 20.0)]).unwrap();

        assert!(world.touches(&Rect::new(350.0, 410.0, 100.0, 100.0)));
        assert!(!world.touches(&Rect::new(350.0, 200.0, 100.0, 100.0)));
    }
}
