//! Solving the variational problem $a(u,v) = L(v)$ subject to Dirichlet conditions.

use crate::{
  assemble::{self, BcError, BcStrategy, DirichletBc},
  fe::FeFunction,
  form::{BilinearForm, FormError, LinearForm},
  mesh::MeshError,
  space::FeSpace,
  sparse::{FactorizationError, FaerLu},
};

use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
  #[error(transparent)]
  Mesh(#[from] MeshError),
  #[error(transparent)]
  Form(#[from] FormError),
  #[error(transparent)]
  BoundaryCondition(#[from] BcError),
  #[error("galerkin system is singular: {0}")]
  Singular(#[from] FactorizationError),
  #[error("invalid problem parameter: {0}")]
  InvalidParameter(&'static str),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolverConfig {
  pub bc_strategy: BcStrategy,
}

/// Assembles the LSE, applies the boundary conditions in the given order
/// and solves with a sparse LU decomposition.
pub fn solve(
  space: &Rc<FeSpace>,
  bilinear: &BilinearForm,
  linear: &LinearForm,
  bcs: &[DirichletBc],
  config: &SolverConfig,
) -> Result<FeFunction, SolveError> {
  let _span = tracing::info_span!("solve", ndofs = space.ndofs()).entered();

  let mut galmat = assemble::assemble_bilinear_form(space, bilinear);
  let mut galvec = assemble::assemble_linear_form(space, linear);

  for bc in bcs {
    tracing::debug!("fixing dofs {:?} to {}", bc.dofs(), bc.value());
    bc.apply(config.bc_strategy, &mut galmat, &mut galvec)?;
  }

  let lu = FaerLu::new(galmat.to_nalgebra_csc()).inspect_err(|err| tracing::warn!("{err}"))?;
  let galsol = lu.solve(&galvec);
  if galsol.iter().any(|v| !v.is_finite()) {
    return Err(FactorizationError::NonFiniteSolution.into());
  }

  tracing::info!("solved galerkin system with {} dofs", space.ndofs());
  Ok(FeFunction::new(Rc::clone(space), galsol))
}
