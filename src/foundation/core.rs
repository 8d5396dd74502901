use crate::foundation::error::{PromptError, PromptResult};

/// Absolute 0-based frame index in recording timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> PromptResult<Self> {
        if num == 0 || den == 0 {
            return Err(PromptError::validation("Fps num and den must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }
}

/// Render/display surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SurfaceSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SurfaceSize {
    /// Create a validated non-zero surface size.
    pub fn new(width: u32, height: u32) -> PromptResult<Self> {
        if width == 0 || height == 0 {
            return Err(PromptError::validation(
                "surface width/height must be non-zero",
            ));
        }
        Ok(Self { width, height })
    }

    /// Byte length of an RGBA8 buffer covering this surface.
    pub fn rgba8_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// Opaque straight-alpha RGBA8 frame buffer, row-major.
///
/// Camera sources produce these and the compositor draws into them in
/// place; alpha is always 255 at the capture/encode boundary.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgba {
    /// Allocate an opaque black frame of the given size.
    pub fn new_black(size: SurfaceSize) -> Self {
        let mut data = vec![0u8; size.rgba8_len()];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width: size.width,
            height: size.height,
            data,
        }
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Validate that `data` matches `width * height * 4`.
    pub fn validate(&self) -> PromptResult<()> {
        if self.data.len() != self.size().rgba8_len() {
            return Err(PromptError::validation(
                "frame data size mismatch with width*height*4",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_zero() {
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(30, 0).is_err());
        assert_eq!(Fps::new(30, 1).unwrap().as_f64(), 30.0);
    }

    #[test]
    fn surface_size_rejects_zero() {
        assert!(SurfaceSize::new(0, 10).is_err());
        assert!(SurfaceSize::new(10, 0).is_err());
        assert_eq!(SurfaceSize::new(4, 2).unwrap().rgba8_len(), 32);
    }

    #[test]
    fn black_frame_is_opaque() {
        let f = FrameRgba::new_black(SurfaceSize::new(2, 2).unwrap());
        f.validate().unwrap();
        assert!(f.data.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }
}
