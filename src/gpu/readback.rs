use crate::error::{Error, Result};
use tracing::warn;

/// Returns `(unpadded, padded)` bytes per row for a texture-to-buffer copy.
pub fn compute_padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> (u32, u32) {
    let unpadded_bytes_per_row = width * bytes_per_pixel;
    let padded_bytes_per_row =
        unpadded_bytes_per_row.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
    (unpadded_bytes_per_row, padded_bytes_per_row)
}

pub fn copy_padded_readback_rows(
    data: &[u8],
    height: u32,
    unpadded_bytes_per_row: u32,
    padded_bytes_per_row: u32,
    output: &mut Vec<u8>,
) {
    let output_size = (unpadded_bytes_per_row * height) as usize;
    output.resize(output_size, 0);

    if padded_bytes_per_row == unpadded_bytes_per_row {
        output.copy_from_slice(&data[..output_size]);
        return;
    }

    for row in 0..height {
        let padded_offset = (row * padded_bytes_per_row) as usize;
        let unpadded_offset = (row * unpadded_bytes_per_row) as usize;
        let row_data = &data[padded_offset..padded_offset + unpadded_bytes_per_row as usize];
        output[unpadded_offset..unpadded_offset + unpadded_bytes_per_row as usize]
            .copy_from_slice(row_data);
    }
}

pub(super) fn map_readback_buffer_into(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    mapped_bytes: &mut Vec<u8>,
) -> Result<()> {
    mapped_bytes.clear();

    let buffer_slice = buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        if sender.send(result).is_err() {
            warn!("Failed to send map_async result from callback");
        }
    });

    device.poll(wgpu::PollType::Wait)?;

    let map_result = receiver
        .recv()
        .map_err(|err| Error::Readback(format!("failed to receive map result: {err}")))?;
    map_result.map_err(|err| Error::Readback(format!("failed to map readback buffer: {err}")))?;

    let mapped_range = buffer_slice.get_mapped_range();
    mapped_bytes.extend_from_slice(&mapped_range);
    drop(mapped_range);
    buffer.unmap();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_padded_readback_rows_handles_unpadded_data() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let mut output = Vec::new();

        copy_padded_readback_rows(&data, 2, 4, 4, &mut output);
        assert_eq!(output, data);
    }

    #[test]
    fn copy_padded_readback_rows_strips_padding() {
        let data = vec![1, 2, 3, 4, 9, 9, 9, 9, 5, 6, 7, 8, 8, 8, 8, 8];
        let mut output = Vec::new();

        copy_padded_readback_rows(&data, 2, 4, 8, &mut output);
        assert_eq!(output, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn padded_rows_meet_copy_alignment() {
        assert_eq!(compute_padded_bytes_per_row(64, 4), (256, 256));
        assert_eq!(compute_padded_bytes_per_row(3, 16), (48, 256));
        assert_eq!(compute_padded_bytes_per_row(65, 4), (260, 512));
    }
}
