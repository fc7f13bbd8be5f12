//! Software rasterization of the vertex grid.
//!
//! Produces what the GPU's rasterizer and interpolators should write for the
//! grid built by [`crate::grid::VertexGrid`]: barycentric interpolation inside
//! each triangle for float outputs, the provoking vertex for flat integer
//! outputs.

use crate::codec::{srgb, Pixel};
use crate::grid::VertexGrid;
use crate::image::PixelBuffer;
use crate::values::{GeneratedInput, InputValues};

/// Locates the grid cell containing pixel `(x, y)`.
///
/// Returns the cell coordinates and the pixel center's position inside the
/// cell, in `[0, 1]` per axis.
fn locate_cell(x: u32, y: u32, cell_width: f32, cell_height: f32, grid: &VertexGrid) -> (u32, u32, f32, f32) {
    // Rasterization samples at pixel centers.
    let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
    let cell_x = ((px / cell_width).floor() as i64).clamp(0, grid.width() as i64 - 2) as u32;
    let cell_y = ((py / cell_height).floor() as i64).clamp(0, grid.height() as i64 - 2) as u32;
    let xf = (px - cell_x as f32 * cell_width) / cell_width;
    let yf = (py - cell_y as f32 * cell_height) / cell_height;
    (cell_x, cell_y, xf, yf)
}

fn cell_size(dst: &PixelBuffer, grid: &VertexGrid) -> (f32, f32) {
    (
        dst.width() as f32 / (grid.width() - 1) as f32,
        dst.height() as f32 / (grid.height() - 1) as f32,
    )
}

/// Interpolates inside the triangle of the cell that contains `(xf, yf)`.
///
/// Corners are named `vXY` in cell-local coordinates. The cell is split along
/// the `v10`–`v01` diagonal: `xf + yf >= 1` selects the triangle with apex
/// `v11`, anything else the triangle with apex `v00`.
pub fn interpolate_cell(
    v00: [f32; 4],
    v10: [f32; 4],
    v01: [f32; 4],
    v11: [f32; 4],
    xf: f32,
    yf: f32,
) -> [f32; 4] {
    let upper = xf + yf >= 1.0;
    let (apex, along_x, along_y) = if upper { (v11, v01, v10) } else { (v00, v10, v01) };
    let s = if upper { 1.0 - xf } else { xf };
    let t = if upper { 1.0 - yf } else { yf };

    let mut color = [0.0; 4];
    for c in 0..4 {
        color[c] = apex[c] + (along_x[c] - apex[c]) * s + (along_y[c] - apex[c]) * t;
    }
    color
}

/// Renders a float output. `encode_srgb` converts the interpolated linear
/// color the way an sRGB attachment would on store.
pub fn render_float_reference(
    dst: &mut PixelBuffer,
    grid: &VertexGrid,
    input: &GeneratedInput,
    encode_srgb: bool,
) {
    let (cell_width, cell_height) = cell_size(dst, grid);
    let corner = |x: u32, y: u32| input.vertex_value(grid.vertex_index(x, y)).as_float();

    for y in 0..dst.height() {
        for x in 0..dst.width() {
            let (cell_x, cell_y, xf, yf) = locate_cell(x, y, cell_width, cell_height, grid);
            let color = interpolate_cell(
                corner(cell_x, cell_y),
                corner(cell_x + 1, cell_y),
                corner(cell_x, cell_y + 1),
                corner(cell_x + 1, cell_y + 1),
                xf,
                yf,
            );

            let color = if encode_srgb {
                srgb::linear_to_srgb_rgba(color)
            } else {
                color
            };
            dst.set(x, y, Pixel::Float(color));
        }
    }
}

/// Renders a flat-shaded integer output: every pixel takes the value of its
/// cell's provoking vertex `(cell_x + 1, cell_y)`.
pub fn render_flat_reference(dst: &mut PixelBuffer, grid: &VertexGrid, input: &GeneratedInput) {
    let (cell_width, cell_height) = cell_size(dst, grid);

    for y in 0..dst.height() {
        for x in 0..dst.width() {
            let (cell_x, cell_y, _, _) = locate_cell(x, y, cell_width, cell_height, grid);
            let value = input.vertex_value(grid.vertex_index(cell_x + 1, cell_y));
            dst.set(x, y, value);
        }
    }
}

/// Renders `input` with the interpolation its scalar kind calls for.
pub fn render_reference(
    dst: &mut PixelBuffer,
    grid: &VertexGrid,
    input: &GeneratedInput,
    encode_srgb: bool,
) {
    match input.values {
        InputValues::Float(_) => render_float_reference(dst, grid, input, encode_srgb),
        InputValues::Int(_) | InputValues::Uint(_) => render_flat_reference(dst, grid, input),
    }
}
