use fastrand::Rng;
use log::debug;

use crate::{
    aabb::AABB,
    geometry::Primitive,
    hittable::{HitRecord, Hittable},
    interval::Interval,
    ray::Ray,
};

#[derive(Debug, Clone, PartialEq)]
pub enum BvhNode {
    Branch { left: Box<Bvh>, right: Box<Bvh> },
    Leaf(Primitive),
}

/// Owned binary bounding volume hierarchy.
///
/// Built once, then only read. Each branch owns both children outright.
#[derive(Debug, Clone, PartialEq)]
pub struct Bvh {
    tree: BvhNode,
    bbox: AABB,
    node_count: usize,
    leaf_count: usize,
}

impl Bvh {
    /// Builds a hierarchy over `objects`, reordering the slice in place.
    ///
    /// Split axes are drawn from `rng`, so a seeded `Rng` gives a
    /// reproducible tree.
    ///
    /// # Panics
    ///
    /// If `objects` is empty. Callers must reject empty scenes first.
    pub fn build(objects: &mut [Primitive], rng: &mut Rng) -> Self {
        assert!(
            !objects.is_empty(),
            "Cannot build a BVH over an empty primitive list"
        );
        let bvh = Self::build_range(objects, rng);
        debug!(
            "BVH over {} primitives: {} nodes, depth {}",
            objects.len(),
            bvh.node_count,
            bvh.depth()
        );
        bvh
    }

    /// [`Bvh::build`] with a fresh generator, seeded when `seed` is given.
    pub fn build_seeded(objects: &mut [Primitive], seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => Rng::with_seed(seed),
            None => Rng::new(),
        };
        Self::build(objects, &mut rng)
    }

    fn build_range(objects: &mut [Primitive], rng: &mut Rng) -> Self {
        match objects.len() {
            1 => Self::leaf(objects[0]),
            2 => Self::branch(Self::leaf(objects[0]), Self::leaf(objects[1])),
            len => {
                let axis = rng.usize(0..3);
                objects.sort_by(|a, b| {
                    let a_min = a.bounding_box().axis(axis).min;
                    let b_min = b.bounding_box().axis(axis).min;
                    a_min.total_cmp(&b_min)
                });

                // Left takes [0, mid], right takes [mid + 1, len).
                let mid = (len - 1) / 2;
                let (left_objects, right_objects) = objects.split_at_mut(mid + 1);
                let left = Self::build_range(left_objects, rng);
                let right = Self::build_range(right_objects, rng);
                Self::branch(left, right)
            }
        }
    }

    fn leaf(primitive: Primitive) -> Self {
        Self {
            bbox: *primitive.bounding_box(),
            tree: BvhNode::Leaf(primitive),
            node_count: 1,
            leaf_count: 1,
        }
    }

    fn branch(left: Bvh, right: Bvh) -> Self {
        Self {
            bbox: AABB::union(&left.bbox, &right.bbox),
            node_count: 1 + left.node_count + right.node_count,
            leaf_count: left.leaf_count + right.leaf_count,
            tree: BvhNode::Branch {
                left: Box::new(left),
                right: Box::new(right),
            },
        }
    }

    pub fn node(&self) -> &BvhNode {
        &self.tree
    }

    /// Total nodes in this subtree, branches and leaves.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn depth(&self) -> usize {
        match &self.tree {
            BvhNode::Leaf(_) => 1,
            BvhNode::Branch { left, right } => 1 + left.depth().max(right.depth()),
        }
    }
}

impl Hittable for Bvh {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        if !self.bbox.hit(ray, ray_t) {
            return None;
        }

        match &self.tree {
            BvhNode::Leaf(primitive) => primitive.hit(ray, ray_t),
            BvhNode::Branch { left, right } => {
                let hit_left = left.hit(ray, ray_t);
                let hit_right = right.hit(ray, ray_t);
                HitRecord::closest(hit_left, hit_right)
            }
        }
    }

    fn bounding_box(&self) -> &AABB {
        &self.bbox
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;
    use rayon::prelude::*;

    use super::*;
    use crate::geometry::{Sphere, Triangle};

    fn sphere_row(n: usize) -> Vec<Primitive> {
        (0..n)
            .map(|i| Sphere::new(DVec3::new(i as f64 * 2.0, 0.0, -5.0), 0.5, i as u32).into())
            .collect()
    }

    fn mixed_scene() -> Vec<Primitive> {
        let mut objects = sphere_row(6);
        objects.push(
            Triangle::new(
                [
                    DVec3::new(-10.0, -1.0, -10.0),
                    DVec3::new(10.0, -1.0, -10.0),
                    DVec3::new(0.0, -1.0, 10.0),
                ],
                9,
            )
            .into(),
        );
        objects.push(Sphere::new(DVec3::new(0.0, 3.0, -2.0), 1.0, 10).into());
        objects
    }

    fn primitives_in(bvh: &Bvh, out: &mut Vec<Primitive>) {
        match bvh.node() {
            BvhNode::Leaf(primitive) => out.push(*primitive),
            BvhNode::Branch { left, right } => {
                assert!(bvh.bounding_box().contains_box(left.bounding_box()));
                assert!(bvh.bounding_box().contains_box(right.bounding_box()));
                primitives_in(left, out);
                primitives_in(right, out);
            }
        }
    }

    #[test]
    fn test_single_primitive_is_leaf() {
        let mut objects = sphere_row(1);
        let bvh = Bvh::build_seeded(&mut objects, Some(1));
        assert!(matches!(bvh.node(), BvhNode::Leaf(_)));
        assert_eq!(bvh.node_count(), 1);
        assert_eq!(bvh.bounding_box(), objects[0].bounding_box());
    }

    #[test]
    fn test_two_primitives_one_per_child() {
        let mut objects = sphere_row(2);
        let bvh = Bvh::build_seeded(&mut objects, Some(1));
        match bvh.node() {
            BvhNode::Branch { left, right } => {
                assert!(matches!(left.node(), BvhNode::Leaf(p) if *p == objects[0]));
                assert!(matches!(right.node(), BvhNode::Leaf(p) if *p == objects[1]));
            }
            BvhNode::Leaf(_) => panic!("two primitives should produce a branch"),
        }
        assert_eq!(bvh.node_count(), 3);
    }

    #[test]
    fn test_every_primitive_lands_in_exactly_one_leaf() {
        let mut objects = mixed_scene();
        let bvh = Bvh::build_seeded(&mut objects, Some(42));

        let mut leaves = Vec::new();
        primitives_in(&bvh, &mut leaves);
        assert_eq!(leaves.len(), objects.len());
        assert_eq!(bvh.leaf_count(), objects.len());
        assert_eq!(bvh.node_count(), 2 * objects.len() - 1);
        for object in &objects {
            assert_eq!(leaves.iter().filter(|p| *p == object).count(), 1);
        }
    }

    #[test]
    fn test_root_box_contains_all_primitives() {
        for n in 1..12 {
            let mut objects = sphere_row(n);
            let bvh = Bvh::build_seeded(&mut objects, Some(n as u64));
            for object in &objects {
                assert!(bvh.bounding_box().contains_box(object.bounding_box()));
            }
        }
    }

    #[test]
    fn test_seeded_build_is_reproducible() {
        let mut a = mixed_scene();
        let mut b = mixed_scene();
        assert_eq!(
            Bvh::build_seeded(&mut a, Some(7)),
            Bvh::build_seeded(&mut b, Some(7))
        );
    }

    #[test]
    fn test_hit_returns_nearest() {
        let mut objects = mixed_scene();
        let bvh = Bvh::build_seeded(&mut objects, Some(3));
        let ray = Ray::new(DVec3::new(4.0, 0.0, 0.0), DVec3::new(0.0, 0.0, -1.0));
        let rec = bvh
            .hit(&ray, Interval::new(0.001, f64::INFINITY))
            .expect("ray should hit sphere 2");
        assert_eq!(rec.material_id, 2);
        assert!((rec.t - 4.5).abs() < 1e-9);

        let down = Ray::new(DVec3::new(0.0, 3.0, -2.0), DVec3::new(0.0, -1.0, 0.0));
        let rec = bvh.hit(&down, Interval::new(0.001, f64::INFINITY)).unwrap();
        // Starts inside sphere 10, exits at its far side before the floor.
        assert_eq!(rec.material_id, 10);
        assert!((rec.t - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_matches_linear_scan() {
        let mut objects = mixed_scene();
        let bvh = Bvh::build_seeded(&mut objects, Some(11));
        let t = Interval::new(0.001, f64::INFINITY);

        for i in 0..100 {
            let f = i as f64 / 10.0 - 5.0;
            let ray = Ray::new(DVec3::new(f, 1.0, 5.0), DVec3::new(0.05 * f, -0.2, -1.0));
            let linear = objects
                .iter()
                .fold(None, |best, p| HitRecord::closest(best, p.hit(&ray, t)));
            assert_eq!(bvh.hit(&ray, t).map(|r| r.t), linear.map(|r| r.t));
        }
    }

    #[test]
    fn test_concurrent_traversal_is_stable() {
        let mut objects = mixed_scene();
        let bvh = Bvh::build_seeded(&mut objects, Some(5));
        let t = Interval::new(0.001, f64::INFINITY);
        let rays: Vec<Ray> = (0..256)
            .map(|i| {
                let f = i as f64 / 32.0 - 4.0;
                Ray::new(DVec3::new(f, 0.5, 3.0), DVec3::new(0.0, -0.1, -1.0))
            })
            .collect();

        let sequential: Vec<_> = rays.iter().map(|r| bvh.hit(r, t)).collect();
        let parallel: Vec<_> = rays.par_iter().map(|r| bvh.hit(r, t)).collect();
        assert_eq!(sequential, parallel);
    }

    #[test]
    #[should_panic]
    fn test_empty_input_panics() {
        let mut objects: Vec<Primitive> = Vec::new();
        let _ = Bvh::build_seeded(&mut objects, None);
    }
}
