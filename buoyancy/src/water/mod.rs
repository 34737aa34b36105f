//! Water surfaces queried by floating bodies.
//!
//! ## Architecture
//!
//! ```text
//!   wave source ──heights──▶ WaterSurface ──refresh(transform)──▶ world triangles
//!                                                                     │
//!   floating body voxels ──────── water_level / surface_normal ◀──────┘
//! ```
//!
//! The grid topology is fixed when the surface is built. Only vertex heights
//! change between steps, and world-space data is rebuilt once per step.

pub mod grid;
pub mod surface;

pub use grid::GridConfig;
pub use surface::{SurfaceLookup, TriangleHint, VertexDisplacement, WaterSurface, WorldTriangle};
