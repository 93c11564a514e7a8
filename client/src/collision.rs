use glam::Vec3;

/// Axis-aligned box. Overlap is strict: boxes that only share a face do
/// not collide, so the player can stand flush against walls and floors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Box standing on `feet`: centred in X/Z, extending upward in Y.
    pub fn from_feet(feet: Vec3, size: Vec3) -> Self {
        let half = Vec3::new(size.x * 0.5, 0.0, size.z * 0.5);
        Self {
            min: feet - half,
            max: feet + half + Vec3::new(0.0, size.y, 0.0),
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColliderKind {
    Ground,
    Wall,
    Brick,
    QuestionBlock,
    Pipe,
}

#[derive(Clone, Copy, Debug)]
pub struct Collider {
    pub bounds: Aabb,
    pub kind: ColliderKind,
}

/// Static world geometry. Queries scan the whole list in insertion order.
#[derive(Default)]
pub struct ColliderSet {
    colliders: Vec<Collider>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bounds: Aabb, kind: ColliderKind) -> usize {
        self.colliders.push(Collider { bounds, kind });
        self.colliders.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Collider> {
        self.colliders.get(index)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Collider> {
        self.colliders.iter()
    }

    pub fn first_overlap(&self, bounds: &Aabb) -> Option<usize> {
        self.colliders
            .iter()
            .position(|collider| collider.bounds.intersects(bounds))
    }

    pub fn overlaps_any(&self, bounds: &Aabb) -> bool {
        self.first_overlap(bounds).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_faces_do_not_overlap() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = a.translated(Vec3::X);
        assert!(!a.intersects(&b));
        let c = a.translated(Vec3::new(0.999, 0.0, 0.0));
        assert!(a.intersects(&c));
    }

    #[test]
    fn from_feet_anchors_at_base() {
        let b = Aabb::from_feet(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.8, 1.8, 0.8));
        assert!((b.min - Vec3::new(0.6, 2.0, 2.6)).length() < 1e-6);
        assert!((b.max - Vec3::new(1.4, 3.8, 3.4)).length() < 1e-6);
    }

    #[test]
    fn new_orders_corners() {
        let b = Aabb::new(Vec3::new(1.0, -1.0, 2.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(b.center(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(b.size(), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn first_overlap_returns_earliest_index() {
        let mut set = ColliderSet::new();
        set.push(Aabb::new(Vec3::splat(10.0), Vec3::splat(11.0)), ColliderKind::Wall);
        let ground = set.push(
            Aabb::new(Vec3::new(-5.0, -1.0, -5.0), Vec3::new(5.0, 0.0, 5.0)),
            ColliderKind::Ground,
        );
        set.push(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)), ColliderKind::Brick);

        let probe = Aabb::from_center_size(Vec3::new(0.0, -0.1, 0.0), Vec3::splat(0.5));
        assert_eq!(set.first_overlap(&probe), Some(ground));
        assert_eq!(set.get(ground).map(|c| c.kind), Some(ColliderKind::Ground));

        let clear = Aabb::from_center_size(Vec3::new(0.0, 5.0, 0.0), Vec3::splat(0.5));
        assert!(!set.overlaps_any(&clear));
    }
}
