//! Convergence of the FE solution of the cable equation
//! towards the analytical $cosh$/$sinh$ solution under mesh refinement.

use cablefem::problems::cable::{CableEquation, EndCondition};

use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
  tracing_subscriber::fmt::init();

  let cables = [
    ("clamped", CableEquation::default()),
    (
      "sealed right end",
      CableEquation::default().with_ends(EndCondition::Potential(2.0), EndCondition::Current(0.0)),
    ),
    (
      "leaky right end",
      CableEquation::default()
        .with_length_constant(0.5)
        .with_ends(EndCondition::Potential(2.0), EndCondition::Leaky { alpha: 1.0, q: 0.0 }),
    ),
  ];

  for (name, cable) in cables {
    let exact = cable.exact_solution().ok_or("no analytical solution")?;
    println!("{name}");
    println!("{:>6} {:>12} {:>8}", "ncells", "L2 error", "rate");

    let mut prev_error: Option<f64> = None;
    for k in 1..=10 {
      let ncells = 1 << k;
      let u = cable.solve(ncells)?;
      let error = u.l2_error(|x| exact.eval(x));
      let rate = prev_error.map(|prev| (prev / error).log2());
      match rate {
        Some(rate) => println!("{ncells:>6} {error:>12.3e} {rate:>8.2}"),
        None => println!("{ncells:>6} {error:>12.3e} {:>8}", "-"),
      }
      prev_error = Some(error);
    }
    println!();
  }

  Ok(())
}
