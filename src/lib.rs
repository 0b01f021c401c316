//! Snap rounding and robust boolean operations on the unit sphere (S2).
//!
//! Geometry is a [`Region`] of points, polylines and polygons whose vertices
//! are unit vectors. The [`builder`] module snap rounds edges to a set of
//! well-separated sites without changing their topology, and the [`boolean`]
//! module computes unions, intersections and differences of regions on top
//! of it.
//!
//! # Example
//!
//! ```
//! use s2_boolean::boolean::{is_empty, OpType, Options};
//! use s2_boolean::text_format::parse_region;
//!
//! let a = parse_region("# # 0:0, 0:4, 2:4, 2:0").unwrap();
//! let b = parse_region("# 1:1, 1:6 #").unwrap();
//! let c = parse_region("# # 10:10, 10:11, 11:11").unwrap();
//!
//! let options = Options::default();
//! assert!(!is_empty(OpType::Intersection, &a, &b, &options)?);
//! assert!(is_empty(OpType::Intersection, &a, &c, &options)?);
//! # Ok::<(), s2_boolean::BuildError>(())
//! ```

pub mod boolean;
pub mod budget;
pub mod builder;
mod error;
pub mod geometry;
pub(crate) mod grid;
pub mod region;
pub mod text_format;
pub mod timing;
mod types;

pub use boolean::{BooleanOperation, OpType, PolygonModel, PolylineModel};
pub use budget::MemoryBudget;
pub use error::BuildError;
pub use region::{Dimension, Region, Shape};
pub use types::{degrees_to_radians, origin, LatLng, Point};
