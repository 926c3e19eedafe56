use crate::{
  fe::{self, ElmatProvider, ElvecProvider, FormElmat, FormElvec},
  form::{BilinearForm, Integral, LinearForm, Measure, Side},
  sparse::SparseMatrix,
  space::{DofIdx, FeSpace},
  util,
};

use itertools::Itertools;

pub type GalMat = SparseMatrix;
pub type GalVec = na::DVector<f64>;

/// Assembly algorithm for the Galerkin Matrix.
pub fn assemble_galmat(space: &FeSpace, elmat: impl ElmatProvider) -> GalMat {
  let mesh = space.mesh();
  let dofh = space.dof_handler();

  let mut galmat = SparseMatrix::zeros(space.ndofs(), space.ndofs());
  for icell in 0..mesh.ncells() {
    let elmat = elmat.eval(&mesh.cell_coords(icell));
    scatter_elmat(dofh.local2global(icell), &elmat, &mut galmat);
  }
  galmat
}

/// Assembly algorithm for the Galerkin Vector.
pub fn assemble_galvec(space: &FeSpace, elvec: impl ElvecProvider) -> GalVec {
  let mesh = space.mesh();
  let dofh = space.dof_handler();

  let mut galvec = na::DVector::zeros(space.ndofs());
  for icell in 0..mesh.ncells() {
    let elvec = elvec.eval(&mesh.cell_coords(icell));
    for (ilocal, &iglobal) in dofh.local2global(icell).iter().enumerate() {
      galvec[iglobal] += elvec[ilocal];
    }
  }
  galvec
}

fn scatter_elmat(dofs: &[DofIdx], elmat: &na::DMatrix<f64>, galmat: &mut GalMat) {
  for (ilocal, &iglobal) in dofs.iter().enumerate() {
    for (jlocal, &jglobal) in dofs.iter().enumerate() {
      galmat.push(iglobal, jglobal, elmat[(ilocal, jlocal)]);
    }
  }
}

/// The boundary cell at `side` and the reference coordinate of the endpoint.
fn endpoint_cell(space: &FeSpace, side: Side) -> (usize, f64) {
  match side {
    Side::Left => (0, 0.0),
    Side::Right => (space.mesh().ncells() - 1, 1.0),
  }
}

fn point_integrals(integrals: &[Integral]) -> impl Iterator<Item = (Side, &Integral)> {
  integrals.iter().filter_map(|i| match i.measure() {
    Measure::Point(side) => Some((side, i)),
    Measure::Cells => None,
  })
}

/// Assembles all integrals of a bilinear form, cell and point integrals.
pub fn assemble_bilinear_form(space: &FeSpace, form: &BilinearForm) -> GalMat {
  let mut galmat = assemble_galmat(space, FormElmat::new(form, *space.element()));

  let mesh = space.mesh();
  for (side, integral) in point_integrals(form.integrals()) {
    let (icell, xi) = endpoint_cell(space, side);
    let elmat = fe::point_elmat(integral.integrand(), space.element(), &mesh.cell_coords(icell), xi);
    scatter_elmat(space.dof_handler().local2global(icell), &elmat, &mut galmat);
  }

  tracing::debug!(
    "assembled galmat {}x{} with {} triplets",
    galmat.nrows(),
    galmat.ncols(),
    galmat.triplets().len()
  );
  galmat
}

/// Assembles all integrals of a linear form, cell and point integrals.
pub fn assemble_linear_form(space: &FeSpace, form: &LinearForm) -> GalVec {
  let mut galvec = assemble_galvec(space, FormElvec::new(form, *space.element()));

  let mesh = space.mesh();
  for (side, integral) in point_integrals(form.integrals()) {
    let (icell, xi) = endpoint_cell(space, side);
    let elvec = fe::point_elvec(integral.integrand(), space.element(), &mesh.cell_coords(icell), xi);
    for (ilocal, &iglobal) in space.dof_handler().local2global(icell).iter().enumerate() {
      galvec[iglobal] += elvec[ilocal];
    }
  }
  galvec
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BcError {
  #[error("boundary condition with value {0} selects no degree of freedom")]
  NoDofsSelected(f64),
  #[error("dof {dof} is out of range for a system with {ndofs} dofs")]
  DofOutOfRange { dof: DofIdx, ndofs: usize },
}

/// How constrained dofs are imposed on the LSE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BcStrategy {
  /// Replace constrained rows by unit rows. All other rows stay untouched.
  #[default]
  RowSubstitution,
  /// Additionally eliminate the constrained columns, moving them to the RHS.
  /// Keeps a symmetric galerkin matrix symmetric.
  SymmetricElimination,
}

/// Essential boundary condition fixing the solution to `value`
/// on all dofs whose node satisfies the predicate.
#[derive(Debug, Clone)]
pub struct DirichletBc {
  dofs: Vec<DofIdx>,
  value: f64,
}
impl DirichletBc {
  pub fn new<P>(space: &FeSpace, value: f64, predicate: P) -> Result<Self, BcError>
  where
    P: Fn(f64) -> bool,
  {
    let dofs = space
      .dof_coords()
      .iter()
      .positions(|&x| predicate(x))
      .collect_vec();
    if dofs.is_empty() {
      return Err(BcError::NoDofsSelected(value));
    }
    Ok(Self { dofs, value })
  }

  /// Fixes the dof at the node closest to `x`, within a small tolerance.
  pub fn at(space: &FeSpace, x: f64, value: f64) -> Result<Self, BcError> {
    let tol = 1e-10 * space.mesh().domain().length();
    Self::new(space, value, |y| (y - x).abs() <= tol)
  }

  /// Fixes the dof at one endpoint of the domain.
  pub fn at_side(space: &FeSpace, side: Side, value: f64) -> Self {
    let [left, right] = space.mesh().boundary_vertices();
    let dof = match side {
      Side::Left => left,
      Side::Right => right,
    };
    Self {
      dofs: vec![dof],
      value,
    }
  }

  pub fn dofs(&self) -> &[DofIdx] {
    &self.dofs
  }
  pub fn value(&self) -> f64 {
    self.value
  }

  /// Fails if the condition was built on a space with more dofs than the system.
  pub fn apply(
    &self,
    strategy: BcStrategy,
    galmat: &mut GalMat,
    galvec: &mut GalVec,
  ) -> Result<(), BcError> {
    let ndofs = galmat.nrows().min(galmat.ncols()).min(galvec.len());
    if let Some(&dof) = self.dofs.iter().find(|&&dof| dof >= ndofs) {
      return Err(BcError::DofOutOfRange { dof, ndofs });
    }
    let dof_coeffs = self.dofs.iter().map(|&idof| (idof, self.value)).collect_vec();
    match strategy {
      BcStrategy::RowSubstitution => fix_dofs_rows(&dof_coeffs, galmat, galvec),
      BcStrategy::SymmetricElimination => fix_dofs_coeff(&dof_coeffs, galmat, galvec),
    }
    Ok(())
  }
}

/// Fix DOFs of FE solution by row substitution.
///
/// Every row of a fixed dof becomes the corresponding unit row and its RHS
/// entry the prescribed coefficient.
/// $mat(A_0, A_(0 diff); 0, I) vec(mu_0, mu_diff) = vec(phi, gamma)$
pub fn fix_dofs_rows(dof_coeffs: &[(DofIdx, f64)], galmat: &mut GalMat, galvec: &mut GalVec) {
  let ndofs = galmat.nrows();
  let dof_flags = util::indicies_to_flags(&dof_coeffs.iter().map(|&(i, _)| i).collect_vec(), ndofs);

  // Set entries zero that share a row index with a fixed dof.
  galmat.set_zero(|r, _| dof_flags[r]);

  for &(i, v) in dof_coeffs {
    galmat.push(i, i, 1.0);
    galvec[i] = v;
  }
}

/// Fix DOFs of FE solution by symmetric elimination.
///
/// Modifies supplied galerkin matrix and galerkin vector,
/// such that the FE solution has the given coefficents on the dofs.
/// $mat(A_0, 0; 0, I) vec(mu_0, mu_diff) = vec(phi - A_(0 diff) gamma, gamma)$
pub fn fix_dofs_coeff(dof_coeffs: &[(DofIdx, f64)], galmat: &mut GalMat, galvec: &mut GalVec) {
  let ndofs = galmat.nrows();

  let dof_coeffs_opt = util::sparse_to_dense_data(dof_coeffs.to_vec(), ndofs);
  let dof_coeffs_zeroed =
    na::DVector::from_iterator(ndofs, dof_coeffs_opt.iter().map(|v| v.unwrap_or(0.0)));

  // Modify galvec.
  *galvec -= galmat.mul_vec(&dof_coeffs_zeroed);

  // Set galvec to prescribed coefficents.
  dof_coeffs.iter().for_each(|&(i, v)| galvec[i] = v);

  // Set entires zero that share a (row or column) index with a fixed dof.
  galmat.set_zero(|r, c| dof_coeffs_opt[r].is_some() || dof_coeffs_opt[c].is_some());

  // Set galmat diagonal for dofs to one.
  for &(i, _) in dof_coeffs {
    galmat.push(i, i, 1.0);
  }
}
