//! Flat grid layout backing a water surface.
//!
//! The grid has `(rows + 1) * (columns + 1)` vertices laid out row-major in
//! the surface's local XZ plane. Each cell is split into two triangles. The
//! topology is fixed once built; only vertex heights change afterwards.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{BuoyancyError, Result};

/// Grid resolution of a water surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of cells along local Z
    pub rows: usize,
    /// Number of cells along local X
    pub columns: usize,
    /// Edge length of one cell in local units
    pub cell_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            columns: 10,
            cell_size: 1.0,
        }
    }
}

impl GridConfig {
    pub fn new(rows: usize, columns: usize, cell_size: f32) -> Result<Self> {
        let config = Self {
            rows,
            columns,
            cell_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects grids that cannot produce a single triangle.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0
            || self.columns == 0
            || !self.cell_size.is_finite()
            || self.cell_size <= 0.0
        {
            return Err(BuoyancyError::InvalidMeshConfiguration {
                rows: self.rows,
                columns: self.columns,
                cell_size: self.cell_size,
            });
        }
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        (self.rows + 1) * (self.columns + 1)
    }

    pub fn triangle_count(&self) -> usize {
        2 * self.rows * self.columns
    }

    /// Row-major index of vertex `(row, column)`.
    pub fn vertex_index(&self, row: usize, column: usize) -> usize {
        row * (self.columns + 1) + column
    }

    /// Local-space extent of the whole grid along X and Z.
    pub fn size(&self) -> Vec3 {
        Vec3::new(
            self.columns as f32 * self.cell_size,
            0.0,
            self.rows as f32 * self.cell_size,
        )
    }

    /// Vertex positions of the undisplaced grid, row-major.
    pub fn flat_vertices(&self) -> Vec<Vec3> {
        let mut vertices = Vec::with_capacity(self.vertex_count());
        for row in 0..=self.rows {
            for column in 0..=self.columns {
                vertices.push(Vec3::new(
                    column as f32 * self.cell_size,
                    0.0,
                    row as f32 * self.cell_size,
                ));
            }
        }
        vertices
    }

    /// Vertex index triples, two per cell, cells in row-major order.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        let mut triangles = Vec::with_capacity(self.triangle_count());
        for row in 0..self.rows {
            for column in 0..self.columns {
                let here = self.vertex_index(row, column);
                let next_row = self.vertex_index(row + 1, column);
                let next_column = self.vertex_index(row, column + 1);
                let diagonal = self.vertex_index(row + 1, column + 1);

                triangles.push([here, next_row, next_column]);
                triangles.push([next_row, diagonal, next_column]);
            }
        }
        triangles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_degenerate_grids() {
        assert!(GridConfig::new(0, 4, 1.0).is_err());
        assert!(GridConfig::new(4, 0, 1.0).is_err());
        assert!(GridConfig::new(4, 4, 0.0).is_err());
        assert!(GridConfig::new(4, 4, -1.0).is_err());
        assert!(GridConfig::new(4, 4, f32::NAN).is_err());
        assert!(GridConfig::new(1, 1, 0.1).is_ok());
    }

    #[test]
    fn test_counts_and_indices() {
        let grid = GridConfig::new(3, 5, 2.0).unwrap();
        assert_eq!(grid.vertex_count(), 24);
        assert_eq!(grid.triangle_count(), 30);

        let triangles = grid.triangles();
        assert_eq!(triangles.len(), grid.triangle_count());
        assert!(triangles
            .iter()
            .flatten()
            .all(|&index| index < grid.vertex_count()));
    }

    #[test]
    fn test_vertex_layout() {
        let grid = GridConfig::new(2, 3, 0.5).unwrap();
        let vertices = grid.flat_vertices();

        assert_eq!(vertices[0], Vec3::ZERO);
        assert_eq!(vertices[grid.vertex_index(0, 3)], Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(vertices[grid.vertex_index(2, 1)], Vec3::new(0.5, 0.0, 1.0));
        assert_eq!(grid.size(), Vec3::new(1.5, 0.0, 1.0));
    }

    #[test]
    fn test_first_cell_split() {
        let grid = GridConfig::new(1, 1, 1.0).unwrap();
        assert_eq!(grid.triangles(), vec![[0, 2, 1], [2, 3, 1]]);
    }
}
