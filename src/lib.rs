//! Piecewise-linear finite elements on the real line,
//! used to solve the steady-state cable equation.

extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod fe;
pub mod form;
pub mod io;
pub mod mesh;
pub mod problems;
pub mod quadrature;
pub mod solve;
pub mod space;
pub mod sparse;
pub mod util;

pub type VertexIdx = usize;
pub type CellIdx = usize;
