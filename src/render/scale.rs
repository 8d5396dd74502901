use crate::foundation::core::FrameRgba;
use crate::foundation::error::{PromptError, PromptResult};

/// Scale `src` to fill `dst` exactly, preserving aspect ratio by cropping
/// the overflowing dimension (center crop, nearest sampling).
///
/// Live frames pass through the identity fast path because the render
/// surface is sized to the camera's native resolution; the general path
/// covers file sources and tests with mismatched geometry.
pub fn aspect_fill(src: &FrameRgba, dst: &mut FrameRgba) -> PromptResult<()> {
    src.validate()?;
    dst.validate()?;

    if src.width == dst.width && src.height == dst.height {
        dst.data.copy_from_slice(&src.data);
        return Ok(());
    }

    let (sw, sh) = (src.width as f64, src.height as f64);
    let (dw, dh) = (dst.width as f64, dst.height as f64);
    let scale = (dw / sw).max(dh / sh);
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PromptError::validation("invalid aspect-fill geometry"));
    }

    // Visible source window, centered.
    let crop_x0 = (sw - dw / scale) / 2.0;
    let crop_y0 = (sh - dh / scale) / 2.0;

    let max_sx = src.width as usize - 1;
    let max_sy = src.height as usize - 1;
    let col_map: Vec<usize> = (0..dst.width as usize)
        .map(|x| {
            let sx = crop_x0 + (x as f64 + 0.5) / scale;
            (sx.floor().max(0.0) as usize).min(max_sx)
        })
        .collect();

    let src_stride = src.width as usize * 4;
    let dst_stride = dst.width as usize * 4;
    for y in 0..dst.height as usize {
        let sy_f = crop_y0 + (y as f64 + 0.5) / scale;
        let sy = (sy_f.floor().max(0.0) as usize).min(max_sy);
        let src_row = &src.data[sy * src_stride..sy * src_stride + src_stride];
        let dst_row = &mut dst.data[y * dst_stride..y * dst_stride + dst_stride];
        for (x, &sx) in col_map.iter().enumerate() {
            dst_row[x * 4..x * 4 + 4].copy_from_slice(&src_row[sx * 4..sx * 4 + 4]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::SurfaceSize;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> FrameRgba {
        let mut f = FrameRgba::new_black(SurfaceSize::new(w, h).unwrap());
        for px in f.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        f
    }

    #[test]
    fn identity_copies_pixels() {
        let src = solid(4, 4, [9, 8, 7, 255]);
        let mut dst = solid(4, 4, [0, 0, 0, 255]);
        aspect_fill(&src, &mut dst).unwrap();
        assert_eq!(dst.data, src.data);
    }

    #[test]
    fn upscale_fills_every_pixel() {
        let src = solid(2, 2, [1, 2, 3, 255]);
        let mut dst = solid(8, 4, [0, 0, 0, 0]);
        aspect_fill(&src, &mut dst).unwrap();
        assert!(dst.data.chunks_exact(4).all(|px| px == [1, 2, 3, 255]));
    }

    #[test]
    fn wide_source_center_crops_horizontally() {
        // Left half red, right half green; a square target must sample the
        // middle of the image, which straddles the color boundary.
        let mut src = solid(8, 4, [0, 0, 0, 255]);
        for y in 0..4usize {
            for x in 0..8usize {
                let idx = (y * 8 + x) * 4;
                let c = if x < 4 { [255, 0, 0, 255] } else { [0, 255, 0, 255] };
                src.data[idx..idx + 4].copy_from_slice(&c);
            }
        }
        let mut dst = solid(4, 4, [0, 0, 0, 0]);
        aspect_fill(&src, &mut dst).unwrap();

        // First destination column maps into the red half, last into green.
        assert_eq!(&dst.data[0..4], &[255, 0, 0, 255]);
        let last = (4usize - 1) * 4;
        assert_eq!(&dst.data[last..last + 4], &[0, 255, 0, 255]);
    }
}
