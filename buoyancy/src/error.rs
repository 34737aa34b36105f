//! Error types for the buoyancy core.
//!
//! Configuration mistakes fail fast when a structure is built. Per-step
//! queries never return errors: out-of-grid lookups fall back to the
//! surface's reference values and bodies without voxels are skipped.

use thiserror::Error;

/// Errors that can occur while building or feeding the buoyancy structures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuoyancyError {
    /// `remove_min` or `peek` on an empty heap.
    #[error("The heap is empty")]
    EmptyQueue,

    /// Water grid dimensions that cannot produce a single triangle.
    #[error("Invalid water mesh configuration: {rows} rows, {columns} columns, cell size {cell_size}")]
    InvalidMeshConfiguration {
        rows: usize,
        columns: usize,
        cell_size: f32,
    },

    /// A height update that does not cover every vertex of the grid.
    #[error("Vertex count mismatch: expected {expected}, got {actual}")]
    VertexCountMismatch { expected: usize, actual: usize },

    /// Normalized voxel size outside of `(0, 1]`.
    #[error("Invalid normalized voxel size: {0} (must be in (0, 1])")]
    InvalidVoxelSize(f32),

    /// Density that is zero, negative or not finite.
    #[error("Invalid density: {0}")]
    InvalidDensity(f32),
}

/// Result type for buoyancy operations.
pub type Result<T> = std::result::Result<T, BuoyancyError>;
