pub mod bvh;
pub mod flatten;

pub use bvh::{Bvh, BvhNode};
pub use flatten::{FlatBvh, flatten, flatten_parallel};
