//! A mesh of an interval: an ordered sequence of contiguous cells.
//!
//! Vertices are stored sorted by coordinate. Cell `i` spans the vertices
//! `i` and `i+1`, so cells never overlap and their union is the whole interval.

use crate::{CellIdx, VertexIdx};

use itertools::Itertools;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MeshError {
  #[error("invalid interval [{min}, {max}]")]
  InvalidInterval { min: f64, max: f64 },
  #[error("a mesh needs at least one cell")]
  NoCells,
  #[error("vertex coordinates must be finite and strictly increasing (at vertex {0})")]
  UnsortedVertices(VertexIdx),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
  min: f64,
  max: f64,
}
impl Interval {
  pub fn new(min: f64, max: f64) -> Result<Self, MeshError> {
    if !(min.is_finite() && max.is_finite() && min < max) {
      return Err(MeshError::InvalidInterval { min, max });
    }
    Ok(Self { min, max })
  }
  pub fn unit() -> Self {
    Self { min: 0.0, max: 1.0 }
  }

  pub fn min(&self) -> f64 {
    self.min
  }
  pub fn max(&self) -> f64 {
    self.max
  }
  pub fn length(&self) -> f64 {
    self.max - self.min
  }
  pub fn contains(&self, x: f64) -> bool {
    self.min <= x && x <= self.max
  }
}

/// Coordinates of the two endpoints of a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellCoords {
  pub left: f64,
  pub right: f64,
}
impl CellCoords {
  pub fn length(&self) -> f64 {
    self.right - self.left
  }
  /// Maps a reference coordinate `xi` in [0,1] into the cell.
  pub fn ref2global(&self, xi: f64) -> f64 {
    self.left + xi * self.length()
  }
  pub fn global2ref(&self, x: f64) -> f64 {
    (x - self.left) / self.length()
  }
}

#[derive(Debug, Clone)]
pub struct Mesh1D {
  vertices: Vec<f64>,
  cells: Vec<[VertexIdx; 2]>,
}

// constructors
impl Mesh1D {
  /// Uniform partition of `interval` into `ncells` cells.
  pub fn uniform(interval: Interval, ncells: usize) -> Result<Self, MeshError> {
    if ncells == 0 {
      return Err(MeshError::NoCells);
    }
    let h = interval.length() / ncells as f64;
    let mut vertices: Vec<f64> = (0..=ncells)
      .map(|i| interval.min() + i as f64 * h)
      .collect();
    // avoid round-off on the last vertex
    vertices[ncells] = interval.max();
    Self::from_vertices(vertices)
  }

  /// Mesh from (possibly non-uniform) vertex coordinates.
  pub fn from_vertices(vertices: Vec<f64>) -> Result<Self, MeshError> {
    if vertices.len() < 2 {
      return Err(MeshError::NoCells);
    }
    if let Some(ivertex) = vertices.iter().position(|x| !x.is_finite()) {
      return Err(MeshError::UnsortedVertices(ivertex));
    }
    if let Some((ivertex, _)) = vertices
      .iter()
      .tuple_windows()
      .enumerate()
      .find(|(_, (a, b))| a >= b)
    {
      return Err(MeshError::UnsortedVertices(ivertex + 1));
    }

    let cells = (0..vertices.len()).tuple_windows().map(|(a, b)| [a, b]).collect();
    Ok(Self { vertices, cells })
  }
}

// getters
impl Mesh1D {
  pub fn vertices(&self) -> &[f64] {
    &self.vertices
  }
  pub fn vertex(&self, ivertex: VertexIdx) -> f64 {
    self.vertices[ivertex]
  }
  pub fn nvertices(&self) -> usize {
    self.vertices.len()
  }
  pub fn cells(&self) -> &[[VertexIdx; 2]] {
    &self.cells
  }
  pub fn ncells(&self) -> usize {
    self.cells.len()
  }
  pub fn cell_coords(&self, icell: CellIdx) -> CellCoords {
    let [l, r] = self.cells[icell];
    CellCoords {
      left: self.vertices[l],
      right: self.vertices[r],
    }
  }
  pub fn cell_coords_iter(&self) -> impl Iterator<Item = CellCoords> + '_ {
    (0..self.ncells()).map(|icell| self.cell_coords(icell))
  }
  pub fn domain(&self) -> Interval {
    Interval {
      min: self.vertices[0],
      max: self.vertices[self.nvertices() - 1],
    }
  }

  /// The mesh width $h$, which is the largest length of all cells.
  pub fn mesh_width(&self) -> f64 {
    self
      .cell_coords_iter()
      .map(|c| c.length())
      .fold(0.0, f64::max)
  }

  /// The two endpoint vertices of the domain.
  pub fn boundary_vertices(&self) -> [VertexIdx; 2] {
    [0, self.nvertices() - 1]
  }

  /// The cell containing `x`, if `x` lies in the domain.
  /// Points on an interior vertex are attributed to the cell on their left.
  pub fn locate(&self, x: f64) -> Option<CellIdx> {
    if !self.domain().contains(x) {
      return None;
    }
    let ivertex = self.vertices.partition_point(|&v| v < x);
    Some(ivertex.saturating_sub(1).min(self.ncells() - 1))
  }
}
