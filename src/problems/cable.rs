//! Module for the steady-state Cable Equation of a passive neurite.
//!
//! $lambda^2 u'' - u = g$ on $[x_0, x_1]$
//!
//! Multiplying by a test function and integrating by parts gives
//! $-integral (u v + lambda^2 u' v') dif x + [lambda^2 u' v]_(x_0)^(x_1) = integral g v dif x$.
//! The boundary term vanishes at ends carrying a fixed potential, since
//! the test functions are zero there. At ends with a prescribed current it
//! is kept as a point term of the forms.

use crate::{
  assemble::DirichletBc,
  fe::FeFunction,
  form::{test, trial, BilinearForm, CoeffFn, Expr, FormError, Integral, LinearForm, Side},
  mesh::{Interval, Mesh1D},
  solve::{self, SolveError, SolverConfig},
  space::FeSpace,
};

use std::rc::Rc;

/// Condition at one end of the cable.
///
/// The currents are given in terms of the outward normal derivative $partial_n u$.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndCondition {
  /// Clamped potential $u = u_0$.
  Potential(f64),
  /// Injected current $lambda^2 partial_n u = q$. A sealed end has $q = 0$.
  Current(f64),
  /// Leaky end $lambda^2 partial_n u + alpha u = q$.
  Leaky { alpha: f64, q: f64 },
}

#[derive(Clone)]
pub struct CableEquation {
  pub domain: Interval,
  /// Length constant $lambda$.
  pub length_constant: f64,
  pub left: EndCondition,
  pub right: EndCondition,
  /// Right hand side $g$. `None` is the homogeneous equation.
  pub source: Option<CoeffFn>,
}

impl Default for CableEquation {
  /// Unit cable with $lambda = 1$ clamped to 2 on the left and to 1 on the right.
  fn default() -> Self {
    Self {
      domain: Interval::unit(),
      length_constant: 1.0,
      left: EndCondition::Potential(2.0),
      right: EndCondition::Potential(1.0),
      source: None,
    }
  }
}

impl CableEquation {
  pub fn with_ends(mut self, left: EndCondition, right: EndCondition) -> Self {
    self.left = left;
    self.right = right;
    self
  }
  pub fn with_length_constant(mut self, length_constant: f64) -> Self {
    self.length_constant = length_constant;
    self
  }
  pub fn with_source(mut self, source: impl Fn(f64) -> f64 + 'static) -> Self {
    self.source = Some(Rc::new(source));
    self
  }

  fn ends(&self) -> [(Side, EndCondition); 2] {
    [(Side::Left, self.left), (Side::Right, self.right)]
  }

  /// $a(u,v) = -integral (u v + lambda^2 u' v') dif x - sum_("leaky ends") alpha u v$
  pub fn bilinear_form(&self) -> Result<BilinearForm, FormError> {
    let lambda_sq = self.length_constant.powi(2);
    let integrand = trial()
      .times(test())
      .plus(trial().dx().times(test().dx()).scaled(lambda_sq))
      .negate();

    let mut form = BilinearForm::new(vec![Integral::dx(integrand)])?;
    for (side, end) in self.ends() {
      if let EndCondition::Leaky { alpha, .. } = end {
        form = form.with(Integral::ds(side, trial().times(test()).scaled(-alpha)))?;
      }
    }
    Ok(form)
  }

  /// $L(v) = integral g v dif x - sum_("current ends") q v$
  pub fn linear_form(&self) -> Result<LinearForm, FormError> {
    let mut form = LinearForm::zero();
    if let Some(source) = &self.source {
      let source = Expr::Coeff(Rc::clone(source));
      form = form.with(Integral::dx(source.times(test())))?;
    }
    for (side, end) in self.ends() {
      match end {
        EndCondition::Current(q) | EndCondition::Leaky { q, .. } if q != 0.0 => {
          form = form.with(Integral::ds(side, test().scaled(-q)))?;
        }
        _ => {}
      }
    }
    Ok(form)
  }

  pub fn dirichlet_bcs(&self, space: &FeSpace) -> Vec<DirichletBc> {
    self
      .ends()
      .into_iter()
      .filter_map(|(side, end)| match end {
        EndCondition::Potential(value) => Some(DirichletBc::at_side(space, side, value)),
        _ => None,
      })
      .collect()
  }

  fn check(&self) -> Result<(), SolveError> {
    if !(self.length_constant.is_finite() && self.length_constant > 0.0) {
      return Err(SolveError::InvalidParameter("length constant must be positive"));
    }
    Ok(())
  }

  /// Solves on a uniform mesh with `ncells` cells.
  pub fn solve(&self, ncells: usize) -> Result<FeFunction, SolveError> {
    let mesh = Rc::new(Mesh1D::uniform(self.domain, ncells)?);
    let space = Rc::new(FeSpace::new(mesh));
    self.solve_on(&space, &SolverConfig::default())
  }

  pub fn solve_on(&self, space: &Rc<FeSpace>, config: &SolverConfig) -> Result<FeFunction, SolveError> {
    self.check()?;
    if space.mesh().domain() != self.domain {
      return Err(SolveError::InvalidParameter("mesh does not cover the cable"));
    }
    let bilinear = self.bilinear_form()?;
    let linear = self.linear_form()?;
    let bcs = self.dirichlet_bcs(space);
    tracing::info!(
      "solving cable equation with lambda={} on [{}, {}]",
      self.length_constant,
      self.domain.min(),
      self.domain.max()
    );
    solve::solve(space, &bilinear, &linear, &bcs, config)
  }

  /// The analytical solution of the homogeneous equation.
  ///
  /// `None` if there is a source term or the end conditions don't determine
  /// a unique solution.
  pub fn exact_solution(&self) -> Option<ExactSolution> {
    if self.source.is_some() || self.check().is_err() {
      return None;
    }
    let lambda = self.length_constant;
    let x0 = self.domain.min();
    let len = self.domain.length() / lambda;

    // $u = A cosh((x - x_0)/lambda) + B sinh((x - x_0)/lambda)$
    // Each end gives one row of $c_u u + c_n lambda^2 partial_n u = r$.
    let mut mat = na::Matrix2::<f64>::zeros();
    let mut rhs = na::Vector2::<f64>::zeros();
    for (irow, (side, end)) in self.ends().into_iter().enumerate() {
      let t = match side {
        Side::Left => 0.0,
        Side::Right => len,
      };
      let (c_u, c_n, r) = match end {
        EndCondition::Potential(u0) => (1.0, 0.0, u0),
        EndCondition::Current(q) => (0.0, 1.0, q),
        EndCondition::Leaky { alpha, q } => (alpha, 1.0, q),
      };
      // $lambda^2 partial_n u = lambda n (A sinh t + B cosh t)$
      let n = side.outward_normal();
      mat[(irow, 0)] = c_u * t.cosh() + c_n * lambda * n * t.sinh();
      mat[(irow, 1)] = c_u * t.sinh() + c_n * lambda * n * t.cosh();
      rhs[irow] = r;
    }
    let coeffs = mat.lu().solve(&rhs)?;
    Some(ExactSolution {
      x0,
      lambda,
      a: coeffs[0],
      b: coeffs[1],
    })
  }
}

/// $u(x) = a cosh((x - x_0)/lambda) + b sinh((x - x_0)/lambda)$
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExactSolution {
  x0: f64,
  lambda: f64,
  a: f64,
  b: f64,
}
impl ExactSolution {
  pub fn eval(&self, x: f64) -> f64 {
    let t = (x - self.x0) / self.lambda;
    self.a * t.cosh() + self.b * t.sinh()
  }
  pub fn eval_dx(&self, x: f64) -> f64 {
    let t = (x - self.x0) / self.lambda;
    (self.a * t.sinh() + self.b * t.cosh()) / self.lambda
  }
}

#[cfg(test)]
mod test {
  use super::{CableEquation, EndCondition};
  use crate::{
    assemble::BcStrategy,
    mesh::{Interval, Mesh1D},
    solve::{SolveError, SolverConfig},
    space::FeSpace,
  };

  use approx::assert_relative_eq;
  use std::rc::Rc;

  #[test]
  fn exact_solution_matches_closed_form() {
    let cable = CableEquation::default();
    let exact = cable.exact_solution().unwrap();
    let closed = |x: f64| (2.0 * (1.0 - x).sinh() + x.sinh()) / 1f64.sinh();
    for x in [0.0, 0.2, 0.5, 0.9, 1.0] {
      assert_relative_eq!(exact.eval(x), closed(x), epsilon = 1e-12);
    }
  }

  #[test]
  fn exact_solution_satisfies_ode() {
    let cable = CableEquation::default().with_length_constant(0.3);
    let exact = cable.exact_solution().unwrap();
    let h = 1e-4;
    for x in [0.1, 0.5, 0.8] {
      let uxx = (exact.eval(x + h) - 2.0 * exact.eval(x) + exact.eval(x - h)) / (h * h);
      assert_relative_eq!(0.09 * uxx, exact.eval(x), epsilon = 1e-5);
    }
    assert_relative_eq!(exact.eval(0.0), 2.0, epsilon = 1e-12);
    assert_relative_eq!(exact.eval(1.0), 1.0, epsilon = 1e-10);
  }

  #[test]
  fn pure_current_ends_are_well_posed() {
    // Unlike the Laplacian, the cable operator is definite even without clamped ends.
    let cable = CableEquation::default().with_ends(EndCondition::Current(1.0), EndCondition::Current(0.0));
    let exact = cable.exact_solution().unwrap();
    // $lambda^2 partial_n u(0) = -u'(0) = 1$
    assert_relative_eq!(exact.eval_dx(0.0), -1.0, epsilon = 1e-12);
    assert_relative_eq!(exact.eval_dx(1.0), 0.0, epsilon = 1e-12);

    let sol = cable.solve(64).unwrap();
    assert!(sol.max_nodal_error(|x| exact.eval(x)) < 1e-3);
  }

  #[test]
  fn symmetric_elimination_gives_same_solution() {
    let cable = CableEquation::default();
    let mesh = Rc::new(Mesh1D::uniform(Interval::unit(), 20).unwrap());
    let space = Rc::new(FeSpace::new(mesh));
    let rows = cable.solve_on(&space, &SolverConfig::default()).unwrap();
    let config = SolverConfig {
      bc_strategy: BcStrategy::SymmetricElimination,
    };
    let sym = cable.solve_on(&space, &config).unwrap();
    assert!((rows.coeffs() - sym.coeffs()).norm() < 1e-12);
  }

  #[test]
  fn invalid_parameters() {
    let cable = CableEquation::default().with_length_constant(0.0);
    assert!(matches!(cable.solve(4), Err(SolveError::InvalidParameter(_))));
    assert!(cable.exact_solution().is_none());
    assert!(matches!(
      CableEquation::default().solve(0),
      Err(SolveError::Mesh(_))
    ));
    let with_source = CableEquation::default().with_source(|x| x);
    assert!(with_source.exact_solution().is_none());

    let mesh = Rc::new(Mesh1D::uniform(Interval::new(0.0, 2.0).unwrap(), 4).unwrap());
    let space = Rc::new(FeSpace::new(mesh));
    assert!(matches!(
      CableEquation::default().solve_on(&space, &SolverConfig::default()),
      Err(SolveError::InvalidParameter(_))
    ));
  }
}
