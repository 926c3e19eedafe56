use crate::mesh::CellCoords;

/// A quadrature rule defined on the reference cell $[0,1]$.
#[derive(Debug, Clone)]
pub struct QuadRule {
  nodes: Vec<f64>,
  weights: Vec<f64>,
}
impl QuadRule {
  /// Gauss-Legendre rule with `npoints` points, exact for polynomials of
  /// degree `2 npoints - 1`.
  ///
  /// Tabulated for 1 to 3 points, `None` otherwise.
  pub fn gauss_legendre(npoints: usize) -> Option<Self> {
    let rule = match npoints {
      1 => Self::from_biunit(vec![0.0], vec![2.0]),
      2 => {
        let a = 1.0 / 3f64.sqrt();
        Self::from_biunit(vec![-a, a], vec![1.0, 1.0])
      }
      3 => Self::gauss_legendre3(),
      _ => return None,
    };
    Some(rule)
  }

  fn gauss_legendre3() -> Self {
    let a = (3.0 / 5f64).sqrt();
    Self::from_biunit(vec![-a, 0.0, a], vec![5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0])
  }

  /// Maps a rule tabulated on $[-1,1]$ to $[0,1]$.
  fn from_biunit(nodes: Vec<f64>, weights: Vec<f64>) -> Self {
    let nodes = nodes.into_iter().map(|x| 0.5 * (x + 1.0)).collect();
    let weights = weights.into_iter().map(|w| 0.5 * w).collect();
    Self { nodes, weights }
  }

  pub fn npoints(&self) -> usize {
    self.nodes.len()
  }
  pub fn nodes(&self) -> &[f64] {
    &self.nodes
  }
  pub fn weights(&self) -> &[f64] {
    &self.weights
  }

  pub fn apply_ref<F>(&self, f: F) -> f64
  where
    F: Fn(f64) -> f64,
  {
    self
      .nodes
      .iter()
      .zip(self.weights.iter())
      .map(|(&n, w)| w * f(n))
      .sum()
  }

  /// Integrates `f` over the cell, with `f` given in global coordinates.
  pub fn apply<F>(&self, f: F, cell: &CellCoords) -> f64
  where
    F: Fn(f64) -> f64,
  {
    cell.length() * self.apply_ref(|xi| f(cell.ref2global(xi)))
  }
}

impl Default for QuadRule {
  /// Exact for the product of two linear functions times a quadratic coefficient.
  fn default() -> Self {
    Self::gauss_legendre3()
  }
}
