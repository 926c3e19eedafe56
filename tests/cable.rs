//! Properties of the FE solution of the steady-state cable equation.

extern crate nalgebra as na;

use cablefem::{
  assemble::DirichletBc,
  form::{test, trial, BilinearForm, Integral, LinearForm, Side},
  mesh::{Interval, Mesh1D},
  problems::cable::{CableEquation, EndCondition},
  solve::{solve, SolveError, SolverConfig},
  space::FeSpace,
};

use approx::assert_relative_eq;
use std::rc::Rc;

fn clamped(left: f64, right: f64) -> CableEquation {
  CableEquation::default().with_ends(EndCondition::Potential(left), EndCondition::Potential(right))
}

#[test]
fn boundary_values_are_exact() {
  for ncells in 1..=40 {
    for (left, right) in [(2.0, 1.0), (1.0, 2.0), (-3.0, 0.5)] {
      let u = clamped(left, right).solve(ncells).unwrap();
      let coeffs = u.coeffs();
      assert_relative_eq!(coeffs[0], left, epsilon = 1e-12);
      assert_relative_eq!(coeffs[ncells], right, epsilon = 1e-12);
    }
  }
}

#[test]
fn default_scenario() {
  let cable = CableEquation::default();
  let u = cable.solve(20).unwrap();
  assert_eq!(u.coeffs().len(), 21);

  let coeffs = u.coeffs();
  assert!(coeffs.iter().zip(coeffs.iter().skip(1)).all(|(a, b)| a > b));

  let mid = u.eval(0.5).unwrap();
  assert!(1.0 < mid && mid < 2.0);

  // $u(1/2) = 3 sinh(1/2) / sinh(1)$
  let exact = 3.0 * 0.5f64.sinh() / 1f64.sinh();
  assert_relative_eq!(mid, exact, epsilon = 1e-3);
  // The solution sags below the straight line between the boundary values.
  assert!(mid < 1.5);
}

#[test]
fn swapped_boundary_values_increase() {
  let u = clamped(1.0, 2.0).solve(20).unwrap();
  let coeffs = u.coeffs();
  assert!(coeffs.iter().zip(coeffs.iter().skip(1)).all(|(a, b)| a < b));
  let mid = u.eval(0.5).unwrap();
  assert!(1.0 < mid && mid < 2.0);
}

#[test]
fn converges_quadratically_in_l2() {
  let cable = CableEquation::default().with_length_constant(0.4);
  let exact = cable.exact_solution().unwrap();

  let errors: Vec<f64> = (3..=7)
    .map(|k| {
      let u = cable.solve(1 << k).unwrap();
      u.l2_error(|x| exact.eval(x))
    })
    .collect();

  for pair in errors.windows(2) {
    let rate = (pair[0] / pair[1]).log2();
    assert!(rate > 1.8, "rate {rate} for errors {errors:?}");
  }
  assert!(errors.last().unwrap() < &1e-3);
}

#[test]
fn equal_boundary_values() {
  let u = clamped(0.0, 0.0).solve(10).unwrap();
  assert!(u.coeffs().iter().all(|&v| v == 0.0));

  // The reaction term makes the solution sag symmetrically instead of staying constant.
  let c = 1.5;
  let u = clamped(c, c).solve(32).unwrap();
  let coeffs = u.coeffs();
  for i in 0..=32 {
    assert_relative_eq!(coeffs[i], coeffs[32 - i], epsilon = 1e-12);
  }
  let exact = |x: f64| c * (x - 0.5).cosh() / 0.5f64.cosh();
  assert!(u.max_nodal_error(exact) < 1e-4);
  assert!(coeffs.iter().all(|&v| v <= c + 1e-12));

  // Without the reaction term equal boundary values give a constant.
  let mesh = Rc::new(Mesh1D::uniform(Interval::unit(), 16).unwrap());
  let space = Rc::new(FeSpace::new(mesh));
  let a = BilinearForm::new(vec![Integral::dx(trial().dx().times(test().dx()).negate())]).unwrap();
  let bcs = [
    DirichletBc::at_side(&space, Side::Left, c),
    DirichletBc::at_side(&space, Side::Right, c),
  ];
  let u = solve(&space, &a, &LinearForm::zero(), &bcs, &SolverConfig::default()).unwrap();
  assert!(u.coeffs().iter().all(|&v| (v - c).abs() < 1e-12));
}

#[test]
fn current_and_leaky_ends() {
  let cables = [
    CableEquation::default().with_ends(EndCondition::Potential(2.0), EndCondition::Current(0.0)),
    CableEquation::default().with_ends(EndCondition::Current(-0.5), EndCondition::Potential(1.0)),
    CableEquation::default()
      .with_length_constant(0.5)
      .with_ends(EndCondition::Potential(2.0), EndCondition::Leaky { alpha: 1.0, q: 0.2 }),
    CableEquation::default().with_ends(
      EndCondition::Leaky { alpha: 2.0, q: 1.0 },
      EndCondition::Leaky { alpha: 0.5, q: 0.0 },
    ),
  ];
  for cable in cables {
    let exact = cable.exact_solution().unwrap();
    let u = cable.solve(128).unwrap();
    assert!(u.l2_error(|x| exact.eval(x)) < 1e-3);
  }
}

#[test]
fn sealed_end_has_zero_slope() {
  let cable =
    CableEquation::default().with_ends(EndCondition::Potential(2.0), EndCondition::Current(0.0));
  let exact = cable.exact_solution().unwrap();
  assert_relative_eq!(exact.eval_dx(1.0), 0.0, epsilon = 1e-12);

  let u = cable.solve(200).unwrap();
  let n = u.coeffs().len();
  let slope = (u.coeffs()[n - 1] - u.coeffs()[n - 2]) * 200.0;
  assert!(slope.abs() < 1e-2);
}

#[test]
fn manufactured_source() {
  // $u = x^2$ solves $u'' - u = 2 - x^2$.
  let cable = CableEquation::default()
    .with_ends(EndCondition::Potential(0.0), EndCondition::Potential(1.0))
    .with_source(|x| 2.0 - x * x);
  assert!(cable.exact_solution().is_none());

  let u = cable.solve(64).unwrap();
  assert!(u.l2_error(|x| x * x) < 1e-3);
}

#[test]
fn graded_mesh_on_shifted_domain() {
  let domain = Interval::new(1.0, 4.0).unwrap();
  let mut cable = clamped(-1.0, 3.0).with_length_constant(0.7);
  cable.domain = domain;
  let exact = cable.exact_solution().unwrap();

  let vertices = (0..=100)
    .map(|i| {
      let t = i as f64 / 100.0;
      domain.min() + domain.length() * t * t
    })
    .collect();
  let mesh = Rc::new(Mesh1D::from_vertices(vertices).unwrap());
  let space = Rc::new(FeSpace::new(mesh));
  let u = cable.solve_on(&space, &SolverConfig::default()).unwrap();

  assert_relative_eq!(u.eval(1.0).unwrap(), -1.0, epsilon = 1e-12);
  assert_relative_eq!(u.eval(4.0).unwrap(), 3.0, epsilon = 1e-12);
  assert!(u.max_nodal_error(|x| exact.eval(x)) < 1e-2);
}

#[test]
fn current_ends_without_reaction_are_singular() {
  // Without the $u v$ term only the derivative is determined,
  // so constants are in the kernel once no end is clamped.
  let cable = CableEquation::default().with_ends(EndCondition::Current(1.0), EndCondition::Current(-1.0));
  let mesh = Rc::new(Mesh1D::uniform(cable.domain, 8).unwrap());
  let space = Rc::new(FeSpace::new(mesh));
  let diffusion_only =
    BilinearForm::new(vec![Integral::dx(trial().dx().times(test().dx()).negate())]).unwrap();
  let bcs = cable.dirichlet_bcs(&space);
  assert!(bcs.is_empty());

  let result = solve(
    &space,
    &diffusion_only,
    &cable.linear_form().unwrap(),
    &bcs,
    &SolverConfig::default(),
  );
  assert!(matches!(result, Err(SolveError::Singular(_))));

  // The cable operator itself stays regular with the same ends.
  assert!(cable.solve_on(&space, &SolverConfig::default()).is_ok());
}
