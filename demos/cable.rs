//! Steady-state cable equation $u'' - u = 0$ on $[0,1]$,
//! with the potential clamped to 2 on the left and to 1 on the right.
//!
//! Usage: `cargo run --example cable [ncells]`

use cablefem::{
  assemble::DirichletBc,
  form::{test, trial, BilinearForm, Integral, LinearForm, Side},
  io,
  mesh::{Interval, Mesh1D},
  problems::cable::CableEquation,
  solve::{solve, SolverConfig},
  space::FeSpace,
};

use std::{error::Error, rc::Rc};

fn main() -> Result<(), Box<dyn Error>> {
  tracing_subscriber::fmt::init();

  let ncells = match std::env::args().nth(1) {
    Some(arg) => arg.parse()?,
    None => 20,
  };

  // Partition the unit interval.
  let mesh = Rc::new(Mesh1D::uniform(Interval::unit(), ncells)?);
  io::save_mesh_svg(&mesh, "mesh.svg")?;

  // Continuous piecewise-linear functions on the mesh.
  let space = Rc::new(FeSpace::new(mesh));

  // Weak form after integration by parts. The boundary terms are dropped,
  // since both ends carry a Dirichlet condition.
  let a = BilinearForm::new(vec![Integral::dx(
    trial()
      .times(test())
      .plus(trial().dx().times(test().dx()))
      .negate(),
  )])?;
  let l = LinearForm::zero();

  let bc_l = DirichletBc::at_side(&space, Side::Left, 2.0);
  let bc_r = DirichletBc::at_side(&space, Side::Right, 1.0);

  let u = solve(&space, &a, &l, &[bc_l, bc_r], &SolverConfig::default())?;

  let exact = CableEquation::default()
    .exact_solution()
    .ok_or("no analytical solution")?;
  println!("u(0.5) = {:.6}", u.eval(0.5).ok_or("0.5 outside of domain")?);
  println!("exact  = {:.6}", exact.eval(0.5));
  println!("L2 error = {:e}", u.l2_error(|x| exact.eval(x)));

  io::save_function_svg(&u, Some(&|x: f64| exact.eval(x)), "solution.svg")?;
  io::save_nodal_values(&u, "solution.dat")?;
  println!("wrote mesh.svg, solution.svg and solution.dat");

  Ok(())
}
