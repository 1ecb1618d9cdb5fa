use crate::{
    accelerators::bvh::{Bvh, BvhNode},
    error::{Error, Result},
    hittable::{HitRecord, Hittable},
    interval::Interval,
    ray::Ray,
    types::{GpuBvhNode, GpuPrimitive, NO_INDEX},
};

/// Subtrees smaller than this are written on the current thread.
const PARALLEL_GRAIN: usize = 256;

/// Index-addressed form of a [`Bvh`], root first, depth-first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatBvh {
    pub nodes: Vec<GpuBvhNode>,
    pub primitives: Vec<GpuPrimitive>,
}

/// Serializes `root` in pre-order.
///
/// A node's slot is reserved before its children are visited, so each
/// child index is the node array length at the moment the child is
/// entered. Leaves append their primitive and point at it.
pub fn flatten(root: &Bvh) -> FlatBvh {
    let mut flat = FlatBvh {
        nodes: Vec::with_capacity(root.node_count()),
        primitives: Vec::with_capacity(root.leaf_count()),
    };
    flatten_into(root, &mut flat.nodes, &mut flat.primitives);
    flat
}

fn flatten_into(bvh: &Bvh, nodes: &mut Vec<GpuBvhNode>, primitives: &mut Vec<GpuPrimitive>) {
    let current = nodes.len();
    nodes.push(GpuBvhNode::default());

    let node = match bvh.node() {
        BvhNode::Branch { left, right } => {
            let left_child = nodes.len() as i32;
            flatten_into(left, nodes, primitives);
            let right_child = nodes.len() as i32;
            flatten_into(right, nodes, primitives);
            GpuBvhNode::branch(bvh.bounding_box(), left_child, right_child)
        }
        BvhNode::Leaf(primitive) => {
            let primitive_index = primitives.len() as i32;
            primitives.push(GpuPrimitive::from(primitive));
            GpuBvhNode::leaf(bvh.bounding_box(), primitive_index)
        }
    };

    nodes[current] = node;
}

/// Same output as [`flatten`], with subtrees written concurrently.
///
/// Subtree sizes are known from the build, so the left and right halves of
/// every branch map to disjoint slices of the output arrays.
pub fn flatten_parallel(root: &Bvh) -> FlatBvh {
    let mut nodes = vec![GpuBvhNode::default(); root.node_count()];
    let mut primitives = vec![GpuPrimitive::default(); root.leaf_count()];
    write_subtree(root, 0, 0, &mut nodes, &mut primitives);
    FlatBvh { nodes, primitives }
}

fn write_subtree(
    bvh: &Bvh,
    node_base: usize,
    primitive_base: usize,
    nodes: &mut [GpuBvhNode],
    primitives: &mut [GpuPrimitive],
) {
    let Some((head, rest)) = nodes.split_first_mut() else {
        return;
    };

    match bvh.node() {
        BvhNode::Leaf(primitive) => {
            primitives[0] = GpuPrimitive::from(primitive);
            *head = GpuBvhNode::leaf(bvh.bounding_box(), primitive_base as i32);
        }
        BvhNode::Branch { left, right } => {
            let left_base = node_base + 1;
            let right_base = left_base + left.node_count();
            *head = GpuBvhNode::branch(bvh.bounding_box(), left_base as i32, right_base as i32);

            let (left_nodes, right_nodes) = rest.split_at_mut(left.node_count());
            let (left_prims, right_prims) = primitives.split_at_mut(left.leaf_count());
            let right_primitive_base = primitive_base + left.leaf_count();

            if bvh.node_count() < PARALLEL_GRAIN {
                write_subtree(left, left_base, primitive_base, left_nodes, left_prims);
                write_subtree(right, right_base, right_primitive_base, right_nodes, right_prims);
            } else {
                rayon::join(
                    || write_subtree(left, left_base, primitive_base, left_nodes, left_prims),
                    || {
                        write_subtree(
                            right,
                            right_base,
                            right_primitive_base,
                            right_nodes,
                            right_prims,
                        )
                    },
                );
            }
        }
    }
}

impl FlatBvh {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Checks the index invariants: leaves point at a primitive and have no
    /// children, branches have two in-range children and no primitive, and
    /// every primitive record is referenced by exactly one leaf.
    pub fn validate(&self) -> Result<()> {
        let invalid = |index: usize, reason: &'static str| Error::InvalidFlatBvh { index, reason };
        let node_range = 0..self.nodes.len() as i32;
        let primitive_range = 0..self.primitives.len() as i32;
        let mut referenced = vec![false; self.primitives.len()];

        for (index, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.left_child != NO_INDEX || node.right_child != NO_INDEX {
                    return Err(invalid(index, "leaf node has children"));
                }
                if !primitive_range.contains(&node.primitive_index) {
                    return Err(invalid(index, "primitive index out of range"));
                }
                let slot = node.primitive_index as usize;
                if referenced[slot] {
                    return Err(invalid(index, "primitive referenced by two leaves"));
                }
                referenced[slot] = true;
                if self.primitives[slot].kind().is_none() {
                    return Err(invalid(index, "unknown primitive kind"));
                }
            } else {
                if !node_range.contains(&node.left_child) || !node_range.contains(&node.right_child) {
                    return Err(invalid(index, "child index out of range"));
                }
                if node.left_child as usize <= index || node.right_child as usize <= index {
                    return Err(invalid(index, "child precedes its parent"));
                }
            }
        }

        if let Some(orphan) = referenced.iter().position(|seen| !seen) {
            return Err(Error::InvalidFlatBvh {
                index: orphan,
                reason: "primitive not referenced by any leaf",
            });
        }
        Ok(())
    }

    /// Stack-based traversal over the flat arrays, the way the GPU kernel
    /// walks them.
    ///
    /// # Panics
    ///
    /// On a primitive record with an unknown kind tag, or on a child or
    /// primitive index outside its array. Arrays that pass
    /// [`FlatBvh::validate`] never panic here.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        if self.is_empty() {
            return None;
        }

        let mut closest = None;
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bounding_box().hit(ray, ray_t) {
                continue;
            }

            if node.is_leaf() {
                let record = &self.primitives[node.primitive_index as usize];
                let primitive = record.to_primitive().unwrap_or_else(|| {
                    panic!(
                        "Unknown primitive kind {} at index {}",
                        record.kind, node.primitive_index
                    )
                });
                closest = HitRecord::closest(closest, primitive.hit(ray, ray_t));
            } else {
                stack.push(node.right_child as usize);
                stack.push(node.left_child as usize);
            }
        }
        closest
    }
}
