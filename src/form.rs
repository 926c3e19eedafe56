//! Symbolic weak forms.
//!
//! Trial and test functions are placeholders without a value. Combining them
//! builds an expression tree, which is only evaluated later by the assembly
//! against concrete basis functions of a [`FeSpace`](crate::space::FeSpace).
//!
//! ```
//! use cablefem::form::{trial, test, BilinearForm, Integral};
//!
//! // $a(u,v) = -integral (u v + u' v') dif x$
//! let integrand = trial().times(test()).plus(trial().dx().times(test().dx())).negate();
//! let a = BilinearForm::new(vec![Integral::dx(integrand)]).unwrap();
//! assert_eq!(a.integrals().len(), 1);
//! ```

use std::{fmt, rc::Rc};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FormError {
  #[error("term `{0}` is not linear in both the trial and the test function")]
  NotBilinear(String),
  #[error("term `{0}` is not linear in the test function or depends on the trial function")]
  NotLinear(String),
  #[error("summands `{0}` and `{1}` differ in their trial/test degree")]
  NonHomogeneousSum(String, String),
  #[error("only the trial and test function can be differentiated, found `dx({0})`")]
  UnsupportedDerivative(String),
}

pub type CoeffFn = Rc<dyn Fn(f64) -> f64>;

/// Expression tree of a weak form integrand.
#[derive(Clone)]
pub enum Expr {
  Trial,
  Test,
  Dx(Box<Expr>),
  Const(f64),
  /// Coefficient given as a function of the position.
  Coeff(CoeffFn),
  Add(Box<Expr>, Box<Expr>),
  Mul(Box<Expr>, Box<Expr>),
  Neg(Box<Expr>),
}

pub fn trial() -> Expr {
  Expr::Trial
}
pub fn test() -> Expr {
  Expr::Test
}
pub fn constant(value: f64) -> Expr {
  Expr::Const(value)
}
pub fn coeff(f: impl Fn(f64) -> f64 + 'static) -> Expr {
  Expr::Coeff(Rc::new(f))
}

// builders
impl Expr {
  pub fn dx(self) -> Self {
    Self::Dx(Box::new(self))
  }
  pub fn times(self, other: Self) -> Self {
    Self::Mul(Box::new(self), Box::new(other))
  }
  pub fn plus(self, other: Self) -> Self {
    Self::Add(Box::new(self), Box::new(other))
  }
  pub fn minus(self, other: Self) -> Self {
    self.plus(other.negate())
  }
  pub fn negate(self) -> Self {
    Self::Neg(Box::new(self))
  }
  pub fn scaled(self, factor: f64) -> Self {
    constant(factor).times(self)
  }
}

/// Polynomial degree of an expression in the trial and in the test function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Degree {
  pub trial: usize,
  pub test: usize,
}
impl Degree {
  const BILINEAR: Self = Self { trial: 1, test: 1 };
  const LINEAR: Self = Self { trial: 0, test: 1 };
}

/// Values of the form arguments at a single point.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointValues {
  pub x: f64,
  pub trial: f64,
  pub trial_dx: f64,
  pub test: f64,
  pub test_dx: f64,
}

impl Expr {
  pub fn degree(&self) -> Result<Degree, FormError> {
    Ok(match self {
      Self::Trial => Degree { trial: 1, test: 0 },
      Self::Test => Degree { trial: 0, test: 1 },
      Self::Const(_) | Self::Coeff(_) => Degree { trial: 0, test: 0 },
      Self::Dx(inner) => match **inner {
        Self::Trial | Self::Test => inner.degree()?,
        _ => return Err(FormError::UnsupportedDerivative(inner.to_string())),
      },
      Self::Add(a, b) => {
        let (da, db) = (a.degree()?, b.degree()?);
        if da != db {
          return Err(FormError::NonHomogeneousSum(a.to_string(), b.to_string()));
        }
        da
      }
      Self::Mul(a, b) => {
        let (da, db) = (a.degree()?, b.degree()?);
        Degree {
          trial: da.trial + db.trial,
          test: da.test + db.test,
        }
      }
      Self::Neg(a) => a.degree()?,
    })
  }

  /// Panics on a derivative of anything but the trial or test function,
  /// which forms reject on construction.
  pub fn eval(&self, p: &PointValues) -> f64 {
    match self {
      Self::Trial => p.trial,
      Self::Test => p.test,
      Self::Dx(inner) => match **inner {
        Self::Trial => p.trial_dx,
        Self::Test => p.test_dx,
        _ => unreachable!("derivative of non-argument expression"),
      },
      Self::Const(c) => *c,
      Self::Coeff(f) => f(p.x),
      Self::Add(a, b) => a.eval(p) + b.eval(p),
      Self::Mul(a, b) => a.eval(p) * b.eval(p),
      Self::Neg(a) => -a.eval(p),
    }
  }
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Trial => write!(f, "u"),
      Self::Test => write!(f, "v"),
      Self::Dx(a) => write!(f, "dx({a})"),
      Self::Const(c) => write!(f, "{c}"),
      Self::Coeff(_) => write!(f, "c(x)"),
      Self::Add(a, b) => write!(f, "({a} + {b})"),
      Self::Mul(a, b) => write!(f, "{a}*{b}"),
      Self::Neg(a) => write!(f, "-{a}"),
    }
  }
}
impl fmt::Debug for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(self, f)
  }
}

/// An endpoint of the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
  Left,
  Right,
}
impl Side {
  pub fn outward_normal(self) -> f64 {
    match self {
      Self::Left => -1.0,
      Self::Right => 1.0,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
  /// Integration over all cells.
  Cells,
  /// Point evaluation at a domain endpoint, the 1D boundary integral.
  Point(Side),
}

#[derive(Debug, Clone)]
pub struct Integral {
  measure: Measure,
  integrand: Expr,
}
impl Integral {
  pub fn dx(integrand: Expr) -> Self {
    Self {
      measure: Measure::Cells,
      integrand,
    }
  }
  pub fn ds(side: Side, integrand: Expr) -> Self {
    Self {
      measure: Measure::Point(side),
      integrand,
    }
  }
  pub fn measure(&self) -> Measure {
    self.measure
  }
  pub fn integrand(&self) -> &Expr {
    &self.integrand
  }
}

impl fmt::Display for Integral {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.measure {
      Measure::Cells => write!(f, "int {} dx", self.integrand),
      Measure::Point(side) => write!(f, "[{}]_{side:?}", self.integrand),
    }
  }
}

fn check_integrals(integrals: &[Integral], expected: Degree) -> Result<(), FormError> {
  for integral in integrals {
    let degree = integral.integrand.degree()?;
    if degree != expected {
      let term = integral.integrand.to_string();
      return Err(if expected == Degree::BILINEAR {
        FormError::NotBilinear(term)
      } else {
        FormError::NotLinear(term)
      });
    }
  }
  Ok(())
}

/// A bilinear form $a(u,v)$ as a sum of integrals.
#[derive(Debug, Clone)]
pub struct BilinearForm {
  integrals: Vec<Integral>,
}
impl BilinearForm {
  pub fn new(integrals: Vec<Integral>) -> Result<Self, FormError> {
    check_integrals(&integrals, Degree::BILINEAR)?;
    Ok(Self { integrals })
  }
  pub fn integrals(&self) -> &[Integral] {
    &self.integrals
  }
  pub fn with(mut self, integral: Integral) -> Result<Self, FormError> {
    check_integrals(std::slice::from_ref(&integral), Degree::BILINEAR)?;
    self.integrals.push(integral);
    Ok(self)
  }
}

/// A linear form $L(v)$ as a sum of integrals.
#[derive(Debug, Clone, Default)]
pub struct LinearForm {
  integrals: Vec<Integral>,
}
impl LinearForm {
  pub fn new(integrals: Vec<Integral>) -> Result<Self, FormError> {
    check_integrals(&integrals, Degree::LINEAR)?;
    Ok(Self { integrals })
  }
  /// The form $L(v) = 0$.
  pub fn zero() -> Self {
    Self::default()
  }
  pub fn integrals(&self) -> &[Integral] {
    &self.integrals
  }
  pub fn with(mut self, integral: Integral) -> Result<Self, FormError> {
    check_integrals(std::slice::from_ref(&integral), Degree::LINEAR)?;
    self.integrals.push(integral);
    Ok(self)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn cable_integrand() -> Expr {
    trial()
      .times(test())
      .plus(trial().dx().times(test().dx()))
      .negate()
  }

  #[test]
  fn degrees() {
    assert_eq!(cable_integrand().degree(), Ok(Degree::BILINEAR));
    assert_eq!(coeff(|x| x).times(test()).degree(), Ok(Degree::LINEAR));
    assert_eq!(
      trial().times(trial()).degree(),
      Ok(Degree { trial: 2, test: 0 })
    );
  }

  #[test]
  fn evaluation_is_deferred() {
    let expr = cable_integrand();
    let p = PointValues {
      x: 0.0,
      trial: 2.0,
      trial_dx: 3.0,
      test: 5.0,
      test_dx: 7.0,
    };
    assert_eq!(expr.eval(&p), -(2.0 * 5.0 + 3.0 * 7.0));
    let q = PointValues {
      x: 0.5,
      test: 2.0,
      ..Default::default()
    };
    assert_eq!(coeff(|x| 4.0 * x).times(test()).eval(&q), 4.0);
  }

  #[test]
  fn rejects_malformed_forms() {
    assert!(matches!(
      BilinearForm::new(vec![Integral::dx(trial().times(trial()))]),
      Err(FormError::NotBilinear(_))
    ));
    assert!(matches!(
      LinearForm::new(vec![Integral::dx(trial().times(test()))]),
      Err(FormError::NotLinear(_))
    ));
    assert!(matches!(
      BilinearForm::new(vec![Integral::dx(trial().times(test()).plus(test()))]),
      Err(FormError::NonHomogeneousSum(_, _))
    ));
    assert!(matches!(
      BilinearForm::new(vec![Integral::dx(
        trial().times(test()).dx()
      )]),
      Err(FormError::UnsupportedDerivative(_))
    ));
    assert!(matches!(
      LinearForm::zero().with(Integral::ds(Side::Left, constant(1.0))),
      Err(FormError::NotLinear(_))
    ));
  }

  #[test]
  fn display() {
    let integral = Integral::dx(cable_integrand());
    assert_eq!(integral.to_string(), "int -(u*v + dx(u)*dx(v)) dx");
    let integral = Integral::ds(Side::Right, constant(2.0).times(test()));
    assert_eq!(integral.to_string(), "[2*v]_Right");
  }
}
