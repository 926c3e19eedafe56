use faer::solvers::SpSolver;

use std::collections::BTreeMap;

/// Sparse matrix in triplet (coordinate) form.
///
/// Duplicate entries are allowed and get summed on conversion,
/// which is exactly what Galerkin assembly needs.
#[derive(Default, Debug, Clone)]
pub struct SparseMatrix {
  nrows: usize,
  ncols: usize,
  triplets: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
  pub fn zeros(nrows: usize, ncols: usize) -> Self {
    Self::new(nrows, ncols, Vec::new())
  }
  pub fn new(nrows: usize, ncols: usize, triplets: Vec<(usize, usize, f64)>) -> Self {
    Self {
      nrows,
      ncols,
      triplets,
    }
  }

  pub fn nrows(&self) -> usize {
    self.nrows
  }
  pub fn ncols(&self) -> usize {
    self.ncols
  }
  pub fn triplets(&self) -> &[(usize, usize, f64)] {
    &self.triplets
  }

  pub fn push(&mut self, r: usize, c: usize, v: f64) {
    assert!(r < self.nrows() && c < self.ncols());
    if v != 0.0 {
      self.triplets.push((r, c, v));
    }
  }

  pub fn set_zero<F>(&mut self, predicate: F)
  where
    F: Fn(usize, usize) -> bool,
  {
    self.triplets.retain(|&(r, c, _)| !predicate(r, c));
  }

  pub fn to_nalgebra_coo(&self) -> nas::CooMatrix<f64> {
    let mut coo = nas::CooMatrix::new(self.nrows, self.ncols);
    for &(r, c, v) in &self.triplets {
      coo.push(r, c, v);
    }
    coo
  }

  pub fn to_nalgebra_csc(&self) -> nas::CscMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_dense(&self) -> na::DMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn mul_vec(&self, x: &na::DVector<f64>) -> na::DVector<f64> {
    assert!(x.len() == self.ncols);
    let mut y = na::DVector::zeros(self.nrows);
    for &(r, c, v) in &self.triplets {
      y[r] += v * x[c];
    }
    y
  }
}

type SparseMatrixFaer = faer::sparse::SparseColMat<usize, f64>;

pub fn nalgebra2faer(m: nas::CscMatrix<f64>) -> SparseMatrixFaer {
  let nrows = m.nrows();
  let ncols = m.ncols();
  let (col_ptrs, row_indices, values) = m.disassemble();

  let symbolic =
    faer::sparse::SymbolicSparseColMat::new_checked(nrows, ncols, col_ptrs, None, row_indices);
  faer::sparse::SparseColMat::new(symbolic, values)
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FactorizationError {
  #[error("matrix of size {nrows}x{ncols} is not square")]
  NotSquare { nrows: usize, ncols: usize },
  #[error("vanishing pivot in column {0}")]
  VanishingPivot(usize),
  #[error("solution has non-finite entries")]
  NonFiniteSolution,
  #[error("sparse factorization failed: {0}")]
  Faer(String),
}

/// Column of the first vanishing pivot of Gaussian elimination with partial
/// pivoting, or `None` if the matrix is numerically regular.
///
/// Elimination only runs within the band of the matrix,
/// so this is linear in the size for galerkin matrices on 1D meshes.
pub fn vanishing_pivot(a: &nas::CscMatrix<f64>) -> Option<usize> {
  let n = a.nrows();
  let mut rows = vec![BTreeMap::<usize, f64>::new(); n];
  let mut lower_bandwidth = 0;
  let mut max_abs = 0f64;
  for (r, c, &v) in a.triplet_iter() {
    if v != 0.0 {
      *rows[r].entry(c).or_insert(0.0) += v;
      lower_bandwidth = lower_bandwidth.max(r.saturating_sub(c));
      max_abs = max_abs.max(v.abs());
    }
  }
  let tol = max_abs * f64::EPSILON * n as f64;

  for k in 0..n {
    let last = (k + lower_bandwidth).min(n - 1);
    let (mut ipivot, mut pivot_abs) = (k, 0.0);
    for (i, row) in rows.iter().enumerate().take(last + 1).skip(k) {
      let v = row.get(&k).map_or(0.0, |v| v.abs());
      if v > pivot_abs {
        (ipivot, pivot_abs) = (i, v);
      }
    }
    if pivot_abs <= tol {
      return Some(k);
    }
    rows.swap(k, ipivot);

    let pivot = rows[k][&k];
    let pivot_row: Vec<(usize, f64)> = rows[k].range(k + 1..).map(|(&c, &v)| (c, v)).collect();
    for row in &mut rows[k + 1..=last] {
      let Some(v) = row.remove(&k) else {
        continue;
      };
      let factor = v / pivot;
      for &(c, p) in &pivot_row {
        *row.entry(c).or_insert(0.0) -= factor * p;
      }
    }
  }
  None
}

/// Sparse LU decomposition.
///
/// Numerically singular matrices are rejected before factorization,
/// since faer only reports structural singularity.
pub struct FaerLu {
  raw: faer::sparse::linalg::solvers::Lu<usize, f64>,
}
impl FaerLu {
  pub fn new(a: nas::CscMatrix<f64>) -> Result<Self, FactorizationError> {
    let (nrows, ncols) = (a.nrows(), a.ncols());
    if nrows != ncols {
      return Err(FactorizationError::NotSquare { nrows, ncols });
    }
    if let Some(icol) = vanishing_pivot(&a) {
      return Err(FactorizationError::VanishingPivot(icol));
    }
    let raw = nalgebra2faer(a)
      .sp_lu()
      .map_err(|e| FactorizationError::Faer(format!("{e:?}")))?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &na::DVector<f64>) -> na::DVector<f64> {
    let b = faer::col::from_slice(b.as_slice());
    na::DVector::from_vec(self.raw.solve(b).as_slice().to_vec())
  }
}
