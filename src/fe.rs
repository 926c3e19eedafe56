use crate::{
  form::{BilinearForm, Expr, LinearForm, Measure, PointValues},
  mesh::CellCoords,
  quadrature::QuadRule,
  space::{FeSpace, ReferenceElement},
};

use std::rc::Rc;

pub type ElMat = na::DMatrix<f64>;
pub trait ElmatProvider {
  fn eval(&self, cell: &CellCoords) -> ElMat;
}
impl<F> ElmatProvider for F
where
  F: Fn(&CellCoords) -> ElMat,
{
  fn eval(&self, cell: &CellCoords) -> ElMat {
    self(cell)
  }
}

pub type ElVec = na::DVector<f64>;
pub trait ElvecProvider {
  fn eval(&self, cell: &CellCoords) -> ElVec;
}
impl<F> ElvecProvider for F
where
  F: Fn(&CellCoords) -> ElVec,
{
  fn eval(&self, cell: &CellCoords) -> ElVec {
    self(cell)
  }
}

/// Values and derivatives of all local basis functions at `xi` of `cell`.
fn local_basis(elem: &ReferenceElement, cell: &CellCoords, xi: f64) -> Vec<(f64, f64)> {
  (0..elem.nlocal_dofs())
    .map(|i| (elem.basis(i, xi), elem.basis_ref_deriv(i) / cell.length()))
    .collect()
}

/// Element matrix of a symbolic integrand at the reference points `xis` with
/// weights `weights`, which already carry the cell length.
fn integrand_elmat(
  integrand: &Expr,
  elem: &ReferenceElement,
  cell: &CellCoords,
  xis: &[f64],
  weights: &[f64],
) -> ElMat {
  let n = elem.nlocal_dofs();
  let mut elmat = na::DMatrix::zeros(n, n);
  for (&xi, &w) in xis.iter().zip(weights) {
    let x = cell.ref2global(xi);
    let basis = local_basis(elem, cell, xi);
    for (itest, &(test, test_dx)) in basis.iter().enumerate() {
      for (itrial, &(trial, trial_dx)) in basis.iter().enumerate() {
        let p = PointValues {
          x,
          trial,
          trial_dx,
          test,
          test_dx,
        };
        elmat[(itest, itrial)] += w * integrand.eval(&p);
      }
    }
  }
  elmat
}

fn integrand_elvec(
  integrand: &Expr,
  elem: &ReferenceElement,
  cell: &CellCoords,
  xis: &[f64],
  weights: &[f64],
) -> ElVec {
  let n = elem.nlocal_dofs();
  let mut elvec = na::DVector::zeros(n);
  for (&xi, &w) in xis.iter().zip(weights) {
    let x = cell.ref2global(xi);
    let basis = local_basis(elem, cell, xi);
    for (itest, &(test, test_dx)) in basis.iter().enumerate() {
      let p = PointValues {
        x,
        test,
        test_dx,
        ..Default::default()
      };
      elvec[itest] += w * integrand.eval(&p);
    }
  }
  elvec
}

/// Element Matrix Provider for the cell integrals of a symbolic bilinear form.
///
/// Computed with Gauss-Legendre quadrature.
/// Exact for piecewise polynomial coefficients up to degree 4 with the default rule.
pub struct FormElmat<'a> {
  form: &'a BilinearForm,
  element: ReferenceElement,
  quad: QuadRule,
}
impl<'a> FormElmat<'a> {
  pub fn new(form: &'a BilinearForm, element: ReferenceElement) -> Self {
    Self {
      form,
      element,
      quad: QuadRule::default(),
    }
  }
}
impl ElmatProvider for FormElmat<'_> {
  fn eval(&self, cell: &CellCoords) -> ElMat {
    let weights: Vec<f64> = self.quad.weights().iter().map(|w| w * cell.length()).collect();
    let n = self.element.nlocal_dofs();
    self
      .form
      .integrals()
      .iter()
      .filter(|i| i.measure() == Measure::Cells)
      .fold(na::DMatrix::zeros(n, n), |acc, i| {
        acc + integrand_elmat(i.integrand(), &self.element, cell, self.quad.nodes(), &weights)
      })
  }
}

/// Element Vector Provider for the cell integrals of a symbolic linear form.
pub struct FormElvec<'a> {
  form: &'a LinearForm,
  element: ReferenceElement,
  quad: QuadRule,
}
impl<'a> FormElvec<'a> {
  pub fn new(form: &'a LinearForm, element: ReferenceElement) -> Self {
    Self {
      form,
      element,
      quad: QuadRule::default(),
    }
  }
}
impl ElvecProvider for FormElvec<'_> {
  fn eval(&self, cell: &CellCoords) -> ElVec {
    let weights: Vec<f64> = self.quad.weights().iter().map(|w| w * cell.length()).collect();
    let n = self.element.nlocal_dofs();
    self
      .form
      .integrals()
      .iter()
      .filter(|i| i.measure() == Measure::Cells)
      .fold(na::DVector::zeros(n), |acc, i| {
        acc + integrand_elvec(i.integrand(), &self.element, cell, self.quad.nodes(), &weights)
      })
  }
}

/// Local matrix of a point integrand evaluated at the reference point `xi` of `cell`.
pub fn point_elmat(integrand: &Expr, elem: &ReferenceElement, cell: &CellCoords, xi: f64) -> ElMat {
  integrand_elmat(integrand, elem, cell, &[xi], &[1.0])
}

/// Local vector of a point integrand evaluated at the reference point `xi` of `cell`.
pub fn point_elvec(integrand: &Expr, elem: &ReferenceElement, cell: &CellCoords, xi: f64) -> ElVec {
  integrand_elvec(integrand, elem, cell, &[xi], &[1.0])
}

/// Exact Element Matrix Provider for the Laplace operator.
///
/// $A = [integral_K lambda'_j lambda'_i dif x]_(i,j)$
pub fn laplace_elmat(cell: &CellCoords) -> ElMat {
  let h = cell.length();
  na::DMatrix::from_row_slice(2, 2, &[1.0, -1.0, -1.0, 1.0]) / h
}

/// Exact Element Matrix Provider for mass bilinear form.
pub fn mass_elmat(cell: &CellCoords) -> ElMat {
  let v = cell.length() / 6.0;
  let mut elmat = na::DMatrix::from_element(2, 2, v);
  elmat.fill_diagonal(2.0 * v);
  elmat
}

/// Approximated Element Matrix Provider for mass bilinear form,
/// obtained through trapezoidal quadrature rule.
pub fn lumped_mass_elmat(cell: &CellCoords) -> ElMat {
  na::DMatrix::from_diagonal_element(2, 2, cell.length() / 2.0)
}

/// Element Vector Provider for a scalar source function.
///
/// Computed using trapezoidal quadrature rule.
/// Exact for constant source.
pub struct SourceElvec<F> {
  source: F,
}
impl<F: Fn(f64) -> f64> SourceElvec<F> {
  pub fn new(source: F) -> Self {
    Self { source }
  }
}
impl<F: Fn(f64) -> f64> ElvecProvider for SourceElvec<F> {
  fn eval(&self, cell: &CellCoords) -> ElVec {
    cell.length() / 2.0 * na::DVector::from_vec(vec![(self.source)(cell.left), (self.source)(cell.right)])
  }
}

/// A function of the finite element space, given by its coefficients
/// with respect to the nodal basis.
#[derive(Debug, Clone)]
pub struct FeFunction {
  space: Rc<FeSpace>,
  coeffs: na::DVector<f64>,
}
impl FeFunction {
  pub fn new(space: Rc<FeSpace>, coeffs: na::DVector<f64>) -> Self {
    assert_eq!(space.ndofs(), coeffs.len());
    Self { space, coeffs }
  }
  pub fn zero(space: Rc<FeSpace>) -> Self {
    let coeffs = na::DVector::zeros(space.ndofs());
    Self { space, coeffs }
  }

  pub fn space(&self) -> &Rc<FeSpace> {
    &self.space
  }
  pub fn coeffs(&self) -> &na::DVector<f64> {
    &self.coeffs
  }
  pub fn into_coeffs(self) -> na::DVector<f64> {
    self.coeffs
  }

  /// Pairs of node coordinate and value.
  pub fn nodal_values(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
    self
      .space
      .dof_coords()
      .iter()
      .copied()
      .zip(self.coeffs.iter().copied())
  }

  /// Point evaluation. `None` outside of the domain.
  pub fn eval(&self, x: f64) -> Option<f64> {
    let mesh = self.space.mesh();
    let icell = mesh.locate(x)?;
    let cell = mesh.cell_coords(icell);
    let xi = cell.global2ref(x);
    Some(self.eval_cell(icell, xi))
  }

  fn eval_cell(&self, icell: usize, xi: f64) -> f64 {
    let elem = self.space.element();
    self
      .space
      .dof_handler()
      .local2global(icell)
      .iter()
      .enumerate()
      .map(|(ilocal, &iglobal)| self.coeffs[iglobal] * elem.basis(ilocal, xi))
      .sum()
  }

  /// $norm(u - u_h)_(L^2)$ computed with Gauss-Legendre quadrature.
  pub fn l2_error<F>(&self, exact: F) -> f64
  where
    F: Fn(f64) -> f64,
  {
    let quad = QuadRule::default();
    let mesh = self.space.mesh();
    mesh
      .cell_coords_iter()
      .enumerate()
      .map(|(icell, cell)| {
        cell.length()
          * quad.apply_ref(|xi| (exact(cell.ref2global(xi)) - self.eval_cell(icell, xi)).powi(2))
      })
      .sum::<f64>()
      .sqrt()
  }

  pub fn l2_norm(&self) -> f64 {
    self.l2_error(|_| 0.0)
  }

  /// Largest deviation from `exact` over all nodes.
  pub fn max_nodal_error<F>(&self, exact: F) -> f64
  where
    F: Fn(f64) -> f64,
  {
    self
      .nodal_values()
      .map(|(x, u)| (exact(x) - u).abs())
      .fold(0.0, f64::max)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    form::{coeff, constant, test, trial, Integral},
    mesh::{Interval, Mesh1D},
  };

  use approx::assert_relative_eq;

  fn cell() -> CellCoords {
    CellCoords {
      left: 0.5,
      right: 0.75,
    }
  }

  #[test]
  fn form_elmat_matches_exact_elmats() {
    let elem = ReferenceElement::lagrange_p1();
    let laplace = BilinearForm::new(vec![Integral::dx(trial().dx().times(test().dx()))]).unwrap();
    let mass = BilinearForm::new(vec![Integral::dx(trial().times(test()))]).unwrap();

    let computed = FormElmat::new(&laplace, elem).eval(&cell());
    assert_relative_eq!(computed, laplace_elmat(&cell()), epsilon = 1e-12);
    let computed = FormElmat::new(&mass, elem).eval(&cell());
    assert_relative_eq!(computed, mass_elmat(&cell()), epsilon = 1e-12);
  }

  #[test]
  fn point_terms_ignore_quadrature() {
    let elem = ReferenceElement::lagrange_p1();
    let robin = BilinearForm::new(vec![Integral::ds(
      crate::form::Side::Right,
      trial().times(test()),
    )])
    .unwrap();
    let elmat = FormElmat::new(&robin, elem).eval(&cell());
    assert_eq!(elmat, na::DMatrix::zeros(2, 2));

    let elmat = point_elmat(&trial().times(test()), &elem, &cell(), 1.0);
    assert_eq!(elmat, na::DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 1.0]));
  }

  #[test]
  fn form_elvec_matches_source_elvec_for_linear_source() {
    let elem = ReferenceElement::lagrange_p1();
    let form = LinearForm::new(vec![Integral::dx(constant(3.0).times(test()))]).unwrap();
    let computed = FormElvec::new(&form, elem).eval(&cell());
    let expected = SourceElvec::new(|_| 3.0).eval(&cell());
    assert_relative_eq!(computed, expected, epsilon = 1e-12);

    // $integral_0^1 x lambda_1 dif x = 1/3$, $integral_0^1 x lambda_0 dif x = 1/6$
    let form = LinearForm::new(vec![Integral::dx(coeff(|x| x).times(test()))]).unwrap();
    let unit = CellCoords {
      left: 0.0,
      right: 1.0,
    };
    let computed = FormElvec::new(&form, elem).eval(&unit);
    assert_relative_eq!(computed, na::DVector::from_vec(vec![1.0 / 6.0, 1.0 / 3.0]), epsilon = 1e-12);
  }

  #[test]
  fn lumped_mass_preserves_total() {
    let lumped = lumped_mass_elmat(&cell());
    let exact = mass_elmat(&cell());
    assert_relative_eq!(lumped.sum(), exact.sum(), epsilon = 1e-14);
  }

  #[test]
  fn fe_function_interpolates_linearly() {
    let mesh = Rc::new(Mesh1D::uniform(Interval::unit(), 4).unwrap());
    let space = Rc::new(FeSpace::new(mesh));
    let coeffs = na::DVector::from_vec(vec![0.0, 1.0, 4.0, 9.0, 16.0]);
    let fe = FeFunction::new(space, coeffs);

    assert_relative_eq!(fe.eval(0.25).unwrap(), 1.0);
    assert_relative_eq!(fe.eval(0.375).unwrap(), 2.5);
    assert_relative_eq!(fe.eval(1.0).unwrap(), 16.0);
    assert!(fe.eval(1.1).is_none());
    assert_eq!(fe.max_nodal_error(|x| 16.0 * x * x), 0.0);
  }

  #[test]
  fn l2_error_of_interpolant() {
    let mesh = Rc::new(Mesh1D::uniform(Interval::unit(), 1).unwrap());
    let space = Rc::new(FeSpace::new(mesh));
    let fe = FeFunction::new(space.clone(), na::DVector::from_vec(vec![0.0, 1.0]));
    // $integral_0^1 (x^2 - x)^2 dif x = 1/30$
    assert_relative_eq!(fe.l2_error(|x| x * x), (1.0f64 / 30.0).sqrt(), epsilon = 1e-12);
    // $integral_0^1 x^2 dif x = 1/3$
    assert_relative_eq!(fe.l2_norm(), (1.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    assert_eq!(FeFunction::zero(space).l2_norm(), 0.0);
  }
}
