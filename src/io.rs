//! Output of meshes and FE functions, as plain data and as SVG figures.

use crate::{fe::FeFunction, mesh::Mesh1D, util};

use std::{
  fs::File,
  io::{self, BufWriter, Write},
  path::Path,
};

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 50.0;
const NSAMPLES: usize = 200;

pub fn save_nodal_values(fe: &FeFunction, path: impl AsRef<Path>) -> io::Result<()> {
  let file = File::create(path)?;
  let writer = BufWriter::new(file);
  write_nodal_values(writer, fe)
}

/// Writes one `x u(x)` line per node, readable by gnuplot and friends.
pub fn write_nodal_values<W: Write>(mut writer: W, fe: &FeFunction) -> io::Result<()> {
  writeln!(writer, "# x u")?;
  for (x, u) in fe.nodal_values() {
    writeln!(writer, "{x:.6} {u:.6}")?;
  }
  writer.flush()
}

/// Maps data coordinates onto the drawing area.
struct Viewport {
  xmin: f64,
  xmax: f64,
  ymin: f64,
  ymax: f64,
}
impl Viewport {
  fn new(xmin: f64, xmax: f64, mut ymin: f64, mut ymax: f64) -> Self {
    if ymax - ymin < 1e-12 {
      ymin -= 1.0;
      ymax += 1.0;
    }
    let pad = 0.05 * (ymax - ymin);
    Self {
      xmin,
      xmax,
      ymin: ymin - pad,
      ymax: ymax + pad,
    }
  }
  fn px(&self, x: f64) -> f64 {
    MARGIN + (x - self.xmin) / (self.xmax - self.xmin) * (WIDTH - 2.0 * MARGIN)
  }
  fn py(&self, y: f64) -> f64 {
    HEIGHT - MARGIN - (y - self.ymin) / (self.ymax - self.ymin) * (HEIGHT - 2.0 * MARGIN)
  }
  fn polyline(&self, points: impl Iterator<Item = (f64, f64)>) -> String {
    points
      .map(|(x, y)| format!("{:.2},{:.2}", self.px(x), self.py(y)))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

fn svg_header<W: Write>(writer: &mut W, title: &str) -> io::Result<()> {
  writeln!(
    writer,
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
  )?;
  writeln!(writer, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
  writeln!(
    writer,
    r#"<text x="{}" y="{}" font-family="sans-serif" font-size="16" text-anchor="middle">{title}</text>"#,
    WIDTH / 2.0,
    MARGIN / 2.0
  )
}

fn svg_axes<W: Write>(writer: &mut W, view: &Viewport) -> io::Result<()> {
  let (left, right) = (view.px(view.xmin), view.px(view.xmax));
  let (bottom, top) = (view.py(view.ymin), view.py(view.ymax));
  writeln!(
    writer,
    r#"<rect x="{left:.2}" y="{top:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="black"/>"#,
    right - left,
    bottom - top
  )?;
  axis_label(writer, left, bottom + 16.0, "middle", view.xmin)?;
  axis_label(writer, right, bottom + 16.0, "middle", view.xmax)?;
  axis_label(writer, left - 6.0, bottom, "end", view.ymin)?;
  axis_label(writer, left - 6.0, top + 12.0, "end", view.ymax)
}

fn axis_label<W: Write>(writer: &mut W, x: f64, y: f64, anchor: &str, value: f64) -> io::Result<()> {
  writeln!(
    writer,
    r#"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="12" text-anchor="{anchor}">{value:.3}</text>"#
  )
}

pub fn save_mesh_svg(mesh: &Mesh1D, path: impl AsRef<Path>) -> io::Result<()> {
  let file = File::create(path)?;
  render_mesh_svg(BufWriter::new(file), mesh)
}

/// Draws the cells as segments of a line with a tick at every vertex.
pub fn render_mesh_svg<W: Write>(mut writer: W, mesh: &Mesh1D) -> io::Result<()> {
  let domain = mesh.domain();
  let view = Viewport::new(domain.min(), domain.max(), -1.0, 1.0);
  let y = view.py(0.0);

  svg_header(
    &mut writer,
    &format!("mesh: {} cells, h = {:.4}", mesh.ncells(), mesh.mesh_width()),
  )?;
  writeln!(
    writer,
    r#"<line x1="{:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="black" stroke-width="2"/>"#,
    view.px(domain.min()),
    view.px(domain.max())
  )?;
  for &x in mesh.vertices() {
    let px = view.px(x);
    writeln!(
      writer,
      r#"<line x1="{px:.2}" y1="{:.2}" x2="{px:.2}" y2="{:.2}" stroke="steelblue" stroke-width="2"/>"#,
      y - 10.0,
      y + 10.0
    )?;
  }
  axis_label(&mut writer, view.px(domain.min()), y + 28.0, "middle", domain.min())?;
  axis_label(&mut writer, view.px(domain.max()), y + 28.0, "middle", domain.max())?;
  writeln!(writer, "</svg>")?;
  writer.flush()
}

pub fn save_function_svg(
  fe: &FeFunction,
  reference: Option<&dyn Fn(f64) -> f64>,
  path: impl AsRef<Path>,
) -> io::Result<()> {
  let file = File::create(path)?;
  render_function_svg(BufWriter::new(file), fe, reference)
}

/// Plots the FE function as the polyline through its nodal values.
///
/// An optional `reference` function, for instance an analytical solution,
/// is sampled and drawn dashed on top.
pub fn render_function_svg<W: Write>(
  mut writer: W,
  fe: &FeFunction,
  reference: Option<&dyn Fn(f64) -> f64>,
) -> io::Result<()> {
  let domain = fe.space().mesh().domain();
  let samples = util::linspace(domain.min(), domain.max(), NSAMPLES);
  let reference_points: Vec<(f64, f64)> = reference
    .map(|f| samples.iter().map(|&x| (x, f(x))).collect())
    .unwrap_or_default();

  let values = fe.nodal_values().chain(reference_points.iter().copied()).map(|(_, u)| u);
  let (ymin, ymax) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), u| {
    (lo.min(u), hi.max(u))
  });
  let view = Viewport::new(domain.min(), domain.max(), ymin, ymax);

  svg_header(&mut writer, "solution")?;
  svg_axes(&mut writer, &view)?;
  writeln!(
    writer,
    r#"<polyline points="{}" fill="none" stroke="steelblue" stroke-width="2"/>"#,
    view.polyline(fe.nodal_values())
  )?;
  for (x, u) in fe.nodal_values() {
    writeln!(
      writer,
      r#"<circle cx="{:.2}" cy="{:.2}" r="3" fill="steelblue"/>"#,
      view.px(x),
      view.py(u)
    )?;
  }
  if !reference_points.is_empty() {
    writeln!(
      writer,
      r#"<polyline points="{}" fill="none" stroke="firebrick" stroke-width="1.5" stroke-dasharray="6 4"/>"#,
      view.polyline(reference_points.into_iter())
    )?;
  }
  writeln!(writer, "</svg>")?;
  writer.flush()
}
