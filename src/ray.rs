use glam::DVec3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ray {
    orig: DVec3,
    dir: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            orig: origin,
            dir: direction,
        }
    }

    pub fn origin(&self) -> DVec3 {
        self.orig
    }

    pub fn direction(&self) -> DVec3 {
        self.dir
    }

    pub fn at(&self, t: f64) -> DVec3 {
        self.orig + self.dir * t
    }
}
