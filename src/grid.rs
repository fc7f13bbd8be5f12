//! The vertex grid drawn over every attachment.
//!
//! Each grid cell is split into two triangles along the diagonal running from
//! vertex `(x+1, y)` to vertex `(x, y+1)`. The reference renderer in
//! [`crate::reference`] relies on exactly this split and on `(x+1, y)` being
//! the first (provoking) vertex of both triangles.

/// Smallest cell edge, in pixels, the grid is built with.
pub const MIN_CELL_SIZE: u32 = 8;
/// Upper bound on cells per grid axis; keeps indices within `u16`.
pub const MAX_GRID_CELLS: u32 = 255;

#[derive(Debug, Clone, PartialEq)]
pub struct VertexGrid {
    width: u32,
    height: u32,
    positions: Vec<[f32; 2]>,
    indices: Vec<u16>,
}

impl VertexGrid {
    pub fn new(min_width: u32, min_height: u32, min_cell_size: u32) -> Self {
        let cell_size = min_cell_size.max(1);
        let width = (min_width / cell_size).clamp(1, MAX_GRID_CELLS) + 1;
        let height = (min_height / cell_size).clamp(1, MAX_GRID_CELLS) + 1;

        let mut positions = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let xf = x as f32 / (width - 1) as f32;
                let yf = y as f32 / (height - 1) as f32;
                positions.push([2.0 * xf - 1.0, 2.0 * yf - 1.0]);
            }
        }

        let mut indices = Vec::with_capacity(((width - 1) * (height - 1) * 6) as usize);
        for y in 0..height - 1 {
            for x in 0..width - 1 {
                let v00 = (y * width + x) as u16;
                let v10 = (y * width + x + 1) as u16;
                let v01 = ((y + 1) * width + x) as u16;
                let v11 = ((y + 1) * width + x + 1) as u16;

                indices.extend_from_slice(&[v10, v00, v01]);
                indices.extend_from_slice(&[v10, v01, v11]);
            }
        }

        Self {
            width,
            height,
            positions,
            indices,
        }
    }

    /// Grid covering an attachment of the given size with [`MIN_CELL_SIZE`].
    pub fn for_size(width: u32, height: u32) -> Self {
        Self::new(width, height, MIN_CELL_SIZE)
    }

    /// Vertices per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Vertices per column.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn quad_count(&self) -> usize {
        ((self.width - 1) * (self.height - 1)) as usize
    }

    pub fn vertex_index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    /// Vertex positions in normalized device coordinates, row-major with grid
    /// row 0 at y = -1.
    pub fn positions(&self) -> &[[f32; 2]] {
        &self.positions
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }
}
