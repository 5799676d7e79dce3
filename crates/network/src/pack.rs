use crate::{NetworkError, WeightMatrix};

/// Width of a matrix's outer dimension after zero padding to a multiple of 4.
pub fn padded_width(cols: usize) -> usize {
    cols + (4 - cols % 4) % 4
}

/// A weight matrix laid out as a one-texel-wide RGBA float texture.
///
/// Texel `g * rows + i` channel `c` holds `w[4g + c][i]`, or `0.0` where
/// `4g + c` falls into the padding.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedWeightTexture {
    rows: usize,
    cols: usize,
    cols_padded: usize,
    texels: Vec<[f32; 4]>,
}

/// Pack a weight matrix into its texture layout.
pub fn pack(matrix: &WeightMatrix) -> Result<PackedWeightTexture, NetworkError> {
    let cols = matrix.outer();
    let rows = matrix.inner();
    if cols == 0 || rows == 0 {
        return Err(NetworkError::EmptyMatrix);
    }

    let cols_padded = padded_width(cols);
    let groups = cols_padded / 4;
    let mut texels = Vec::with_capacity(groups * rows);
    for g in 0..groups {
        for i in 0..rows {
            let mut texel = [0.0f32; 4];
            for (c, channel) in texel.iter_mut().enumerate() {
                let a = 4 * g + c;
                if a < cols {
                    *channel = matrix.get(a, i);
                }
            }
            texels.push(texel);
        }
    }

    tracing::trace!(rows, cols, cols_padded, texels = texels.len(), "packed weights");

    Ok(PackedWeightTexture {
        rows,
        cols,
        cols_padded,
        texels,
    })
}

impl PackedWeightTexture {
    /// Output dimension of the source matrix.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Input dimension of the source matrix, before padding.
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cols_padded(&self) -> usize {
        self.cols_padded
    }

    /// Texture width in texels. Always 1.
    pub fn width(&self) -> u32 {
        1
    }

    /// Texture height in texels: `rows * cols_padded / 4`.
    pub fn height(&self) -> u32 {
        self.texels.len() as u32
    }

    /// Fetch texel `(0, k)`. Out-of-range fetches read zeros.
    pub fn texel(&self, k: usize) -> [f32; 4] {
        self.texels.get(k).copied().unwrap_or([0.0; 4])
    }

    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    /// Raw `Rgba32Float` payload for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }
}
