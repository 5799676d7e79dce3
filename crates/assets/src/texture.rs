use crate::AssetError;

/// A decoded feature image in RGBA8, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    /// Decode a PNG or JPEG image.
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }

    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        debug_assert_eq!(rgba.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            rgba,
        }
    }

    /// Single-colour texture.
    pub fn solid(width: u32, height: u32, texel: [u8; 4]) -> Self {
        let rgba = texel.repeat((width * height) as usize);
        Self::from_rgba(width, height, rgba)
    }

    /// Nearest-neighbour lookup with OBJ texture coordinates (v points up),
    /// returned as normalized floats.
    pub fn sample_nearest(&self, uv: [f32; 2]) -> [f32; 4] {
        if self.width == 0 || self.height == 0 {
            return [0.0; 4];
        }
        let u = uv[0].clamp(0.0, 1.0);
        let v = 1.0 - uv[1].clamp(0.0, 1.0);
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        let i = ((y * self.width + x) * 4) as usize;
        let px = &self.rgba[i..i + 4];
        [px[0], px[1], px[2], px[3]].map(|c| c as f32 / 255.0)
    }

    /// Encode as PNG, used by tools and tests to fabricate scene folders.
    pub fn encode_png(&self) -> Result<Vec<u8>, AssetError> {
        let mut out = std::io::Cursor::new(Vec::new());
        image::write_buffer_with_format(
            &mut out,
            &self.rgba,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trip() {
        let tex = TextureData::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]);
        let bytes = tex.encode_png().unwrap();
        let decoded = TextureData::decode(&bytes).unwrap();
        assert_eq!(decoded, tex);
    }

    #[test]
    fn nearest_sample_flips_v() {
        // top row red, bottom row blue
        let tex = TextureData::from_rgba(1, 2, vec![255, 0, 0, 255, 0, 0, 255, 255]);
        assert_eq!(tex.sample_nearest([0.5, 0.9]), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(tex.sample_nearest([0.5, 0.1]), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(tex.sample_nearest([2.0, -1.0]), [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            TextureData::decode(b"not an image"),
            Err(AssetError::Image(_))
        ));
    }
}
