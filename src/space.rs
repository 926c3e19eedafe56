use crate::{mesh::Mesh1D, CellIdx};

use std::rc::Rc;

pub type DofIdx = usize;

/// Lagrangian element of degree one on the reference cell $[0,1]$.
///
/// The local dofs are the point values at the two cell vertices.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceElement;
impl ReferenceElement {
  pub fn lagrange_p1() -> Self {
    Self
  }

  pub fn nlocal_dofs(&self) -> usize {
    2
  }

  /// Value of local basis function `idof` at reference coordinate `xi`.
  pub fn basis(&self, idof: usize, xi: f64) -> f64 {
    match idof {
      0 => 1.0 - xi,
      1 => xi,
      _ => panic!("P1 element has only two local dofs"),
    }
  }

  /// Derivative of local basis function `idof` with respect to `xi`.
  pub fn basis_ref_deriv(&self, idof: usize) -> f64 {
    match idof {
      0 => -1.0,
      1 => 1.0,
      _ => panic!("P1 element has only two local dofs"),
    }
  }
}

/// Maps the local dofs of each cell to the global dofs of the space.
#[derive(Debug)]
pub struct DofHandler {
  local2global_idx: Vec<Vec<DofIdx>>,
  ndofs: usize,
}
impl DofHandler {
  pub fn new(mesh: &Mesh1D) -> Self {
    // Every vertex carries exactly one dof, so vertices shared by
    // neighbouring cells are merged into a single global dof.
    let local2global_idx = mesh.cells().iter().map(|c| c.to_vec()).collect();
    let ndofs = mesh.nvertices();
    Self {
      local2global_idx,
      ndofs,
    }
  }

  pub fn local2global(&self, cell: CellIdx) -> &[DofIdx] {
    &self.local2global_idx[cell]
  }

  pub fn ndofs(&self) -> usize {
    self.ndofs
  }
}

/// A Finite Element Space of continuous piecewise-linear functions.
#[derive(Debug)]
pub struct FeSpace {
  /// The underlying mesh of the space.
  mesh: Rc<Mesh1D>,
  element: ReferenceElement,
  /// Degrees-of-Freedom handler
  dof_handler: DofHandler,
}

impl FeSpace {
  pub fn new(mesh: Rc<Mesh1D>) -> Self {
    let element = ReferenceElement::lagrange_p1();
    let dof_handler = DofHandler::new(&mesh);
    Self {
      mesh,
      element,
      dof_handler,
    }
  }

  pub fn mesh(&self) -> &Rc<Mesh1D> {
    &self.mesh
  }
  pub fn element(&self) -> &ReferenceElement {
    &self.element
  }
  pub fn ndofs(&self) -> usize {
    self.dof_handler.ndofs()
  }
  pub fn dof_handler(&self) -> &DofHandler {
    &self.dof_handler
  }

  /// Coordinates of the nodes carrying the dofs.
  pub fn dof_coords(&self) -> &[f64] {
    self.mesh.vertices()
  }
}
