//! Deforming triangulated water surface.
//!
//! A [`WaterSurface`] owns a flat grid whose vertex heights are rewritten by an
//! external source every step. After [`WaterSurface::refresh`] it answers:
//! - which triangle lies under a world point ([`WaterSurface::locate_triangle`])
//! - the water height at that point ([`WaterSurface::water_level`])
//! - the upward surface normal ([`WaterSurface::surface_normal`])
//!
//! ## Temporal coherence
//! Bodies query many nearby points in a row, so the last matching triangle is
//! remembered and tested first. The shared hint is a relaxed atomic so the
//! surface can live in an ECS component; a stale hint only costs a rescan.
//! Callers that want their own hint use [`WaterSurface::locate_triangle_with`].
//!
//! ## Out-of-grid queries
//! Points outside the grid's horizontal footprint are not errors: the height
//! falls back to the surface origin and the normal to the surface up vector.

use std::cmp::Ordering;
use std::sync::atomic::{self, AtomicUsize};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::grid::GridConfig;
use crate::collections::{by_horizontal_distance, MinHeap};
use crate::constants::COLLINEAR_SINE_SQUARED;
use crate::error::{BuoyancyError, Result};
use crate::math::{plane_height_at, projected_triangle_contains, upward_normal};

const NO_MATCH: usize = usize::MAX;

/// Source of per-vertex heights, typically a wave generator.
pub trait VertexDisplacement {
    /// New local height of the vertex resting at `rest` (local space, y = 0).
    fn height(&self, rest: Vec3, time: f32) -> f32;
}

/// Strategy used to answer height and normal queries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceLookup {
    /// Locate the triangle under the point and solve its plane.
    #[default]
    Triangles,
    /// Fit a plane through the horizontally nearest vertices.
    NearestVertices,
}

/// Caller-owned coherence cache for triangle lookups.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TriangleHint(Option<usize>);

impl TriangleHint {
    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn index(&self) -> Option<usize> {
        self.0
    }
}

/// A surface triangle in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTriangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl WorldTriangle {
    /// Whether the horizontal projection of the triangle contains `point`.
    pub fn contains(&self, point: Vec3) -> bool {
        projected_triangle_contains(self.a, self.b, self.c, point)
    }

    /// Plane normal, not normalized, never pointing down.
    pub fn upward_normal(&self) -> Vec3 {
        upward_normal(self.a, self.b, self.c)
    }

    /// Height of the triangle's plane at the horizontal position of `point`.
    pub fn height_at(&self, point: Vec3) -> Option<f32> {
        plane_height_at(self.a, self.upward_normal(), point)
    }
}

/// Triangulated height field queried by floating bodies.
#[derive(Debug)]
pub struct WaterSurface {
    grid: GridConfig,
    lookup: SurfaceLookup,
    local_vertices: Vec<Vec3>,
    triangles: Vec<[usize; 3]>,
    world_vertices: Vec<Vec3>,
    world_triangles: Vec<WorldTriangle>,
    origin: Vec3,
    up: Vec3,
    last_match: AtomicUsize,
}

impl WaterSurface {
    /// Builds a flat surface. World data starts out equal to local data until
    /// the first [`WaterSurface::refresh`].
    pub fn new(grid: GridConfig) -> Result<Self> {
        grid.validate()?;

        let mut surface = Self {
            grid,
            lookup: SurfaceLookup::default(),
            local_vertices: grid.flat_vertices(),
            triangles: grid.triangles(),
            world_vertices: Vec::with_capacity(grid.vertex_count()),
            world_triangles: Vec::with_capacity(grid.triangle_count()),
            origin: Vec3::ZERO,
            up: Vec3::Y,
            last_match: AtomicUsize::new(NO_MATCH),
        };
        surface.refresh(&GlobalTransform::IDENTITY);
        Ok(surface)
    }

    pub fn with_lookup(mut self, lookup: SurfaceLookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn set_lookup(&mut self, lookup: SurfaceLookup) {
        self.lookup = lookup;
    }

    pub fn lookup(&self) -> SurfaceLookup {
        self.lookup
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    pub fn local_vertices(&self) -> &[Vec3] {
        &self.local_vertices
    }

    pub fn world_vertices(&self) -> &[Vec3] {
        &self.world_vertices
    }

    pub fn world_triangles(&self) -> &[WorldTriangle] {
        &self.world_triangles
    }

    /// Fixed vertex index triples backing the world triangles.
    pub fn triangle_indices(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// World position of the surface transform at the last refresh.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// World up direction of the surface transform at the last refresh.
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Replaces every local vertex height. Takes effect on the next refresh.
    pub fn set_vertex_heights(&mut self, heights: &[f32]) -> Result<()> {
        if heights.len() != self.local_vertices.len() {
            return Err(BuoyancyError::VertexCountMismatch {
                expected: self.local_vertices.len(),
                actual: heights.len(),
            });
        }
        for (vertex, height) in self.local_vertices.iter_mut().zip(heights) {
            vertex.y = *height;
        }
        Ok(())
    }

    /// Asks `source` for the height of every vertex. Takes effect on the next
    /// refresh.
    pub fn apply_displacement(&mut self, source: &impl VertexDisplacement, time: f32) {
        for vertex in &mut self.local_vertices {
            vertex.y = source.height(Vec3::new(vertex.x, 0.0, vertex.z), time);
        }
    }

    /// Rebuilds world vertices and triangles from the current heights and
    /// `transform`, and forgets the cached triangle.
    pub fn refresh(&mut self, transform: &GlobalTransform) {
        self.origin = transform.translation();
        self.up = transform.up().as_vec3();

        self.world_vertices.clear();
        self.world_vertices.extend(
            self.local_vertices
                .iter()
                .map(|vertex| transform.transform_point(*vertex)),
        );

        let world_vertices = &self.world_vertices;
        self.world_triangles.clear();
        self.world_triangles
            .extend(self.triangles.iter().map(|[a, b, c]| WorldTriangle {
                a: world_vertices[*a],
                b: world_vertices[*b],
                c: world_vertices[*c],
            }));

        *self.last_match.get_mut() = NO_MATCH;
    }

    /// Triangle whose horizontal projection contains `point`, checking the
    /// shared hint first.
    pub fn locate_triangle(&self, point: Vec3) -> Option<&WorldTriangle> {
        let cached = self.last_match.load(atomic::Ordering::Relaxed);
        if let Some(triangle) = self.world_triangles.get(cached) {
            if triangle.contains(point) {
                return Some(triangle);
            }
        }

        let (index, triangle) = self.scan(point)?;
        self.last_match.store(index, atomic::Ordering::Relaxed);
        Some(triangle)
    }

    /// Same as [`WaterSurface::locate_triangle`] with a caller-owned hint.
    ///
    /// The hint is not cleared by refresh; it stays valid because the topology
    /// never changes, only the cost of a wrong guess is paid.
    pub fn locate_triangle_with(
        &self,
        point: Vec3,
        hint: &mut TriangleHint,
    ) -> Option<&WorldTriangle> {
        if let Some(triangle) = hint.0.and_then(|index| self.world_triangles.get(index)) {
            if triangle.contains(point) {
                return Some(triangle);
            }
        }

        let (index, triangle) = self.scan(point)?;
        hint.0 = Some(index);
        Some(triangle)
    }

    /// Full scan without reading or writing any hint.
    pub fn locate_triangle_uncached(&self, point: Vec3) -> Option<&WorldTriangle> {
        self.scan(point).map(|(_, triangle)| triangle)
    }

    fn scan(&self, point: Vec3) -> Option<(usize, &WorldTriangle)> {
        self.world_triangles
            .iter()
            .enumerate()
            .find(|(_, triangle)| triangle.contains(point))
    }

    /// Water height under `point`, or the surface origin height when the point
    /// is outside the grid.
    pub fn water_level(&self, point: Vec3) -> f32 {
        let height = match self.lookup {
            SurfaceLookup::Triangles => self
                .locate_triangle(point)
                .and_then(|triangle| triangle.height_at(point)),
            SurfaceLookup::NearestVertices => self
                .nearest_plane(point)
                .and_then(|(on_plane, normal)| plane_height_at(on_plane, normal, point)),
        };
        height.unwrap_or(self.origin.y)
    }

    /// Unit upward normal under `point`, or the surface up vector when the
    /// point is outside the grid or the local geometry is degenerate.
    pub fn surface_normal(&self, point: Vec3) -> Vec3 {
        let normal = match self.lookup {
            SurfaceLookup::Triangles => self
                .locate_triangle(point)
                .map(WorldTriangle::upward_normal),
            SurfaceLookup::NearestVertices => self.nearest_plane(point).map(|(_, normal)| normal),
        };
        normal
            .and_then(Vec3::try_normalize)
            .unwrap_or(self.up)
    }

    pub fn is_underwater(&self, point: Vec3) -> bool {
        self.water_level(point) - point.y > 0.0
    }

    /// The `count` world vertices closest to `point` on the horizontal plane,
    /// nearest first.
    pub fn closest_vertices(&self, point: Vec3, count: usize) -> Vec<Vec3> {
        let mut heap = self.vertices_by_distance(point);
        let count = count.min(heap.len());
        let mut closest = Vec::with_capacity(count);
        while closest.len() < count {
            match heap.remove_min() {
                Ok(vertex) => closest.push(vertex),
                Err(_) => break,
            }
        }
        closest
    }

    fn vertices_by_distance(&self, point: Vec3) -> MinHeap<Vec3, impl Fn(&Vec3, &Vec3) -> Ordering> {
        let mut heap = MinHeap::with_capacity_and_comparator(
            self.world_vertices.len(),
            by_horizontal_distance(point),
        );
        for vertex in &self.world_vertices {
            heap.add(*vertex);
        }
        heap
    }

    /// Plane through the two horizontally nearest vertices and the next
    /// nearest one not collinear with them, provided the point lies within
    /// the grid footprint.
    fn nearest_plane(&self, point: Vec3) -> Option<(Vec3, Vec3)> {
        self.locate_triangle(point)?;

        let mut heap = self.vertices_by_distance(point);
        let a = heap.remove_min().ok()?;
        let b = heap.remove_min().ok()?;
        while let Ok(c) = heap.remove_min() {
            let normal = upward_normal(a, b, c);
            let span = (b - a).length_squared() * (c - a).length_squared();
            if normal.length_squared() > span * COLLINEAR_SINE_SQUARED {
                return Some((a, normal));
            }
        }
        None
    }
}
