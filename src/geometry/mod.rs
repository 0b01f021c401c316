//! Spherical geometry: exact arithmetic, robust predicates and edge
//! primitives.

pub mod chord_angle;
pub mod edge;
pub mod exact;
pub mod interval;
pub mod predicates;

pub use chord_angle::ChordAngle;
pub use interval::CircleInterval;
pub use predicates::{
    compare_distance, compare_distances, compare_edge_directions, compare_edge_distance,
    edge_circumcenter_sign, ordered_ccw, sign, voronoi_site_exclusion, Excluded,
};
