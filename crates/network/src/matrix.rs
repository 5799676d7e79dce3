use serde::Deserialize;

use crate::NetworkError;

/// A trained weight matrix exactly as the manifest nests it: `w[a][b]`.
///
/// `outer` is the layer's input dimension (the nesting depth the packer pads
/// to a multiple of 4), `inner` its output dimension. Storage is flat and
/// outer-major. Immutable once built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Vec<f32>>")]
pub struct WeightMatrix {
    outer: usize,
    inner: usize,
    data: Vec<f32>,
}

impl WeightMatrix {
    /// Build from nested rows. Rejects empty, ragged and non-finite input.
    pub fn from_nested(rows: Vec<Vec<f32>>) -> Result<Self, NetworkError> {
        let outer = rows.len();
        let inner = rows.first().map(Vec::len).unwrap_or(0);
        if outer == 0 || inner == 0 {
            return Err(NetworkError::EmptyMatrix);
        }

        let mut data = Vec::with_capacity(outer * inner);
        for (a, row) in rows.into_iter().enumerate() {
            if row.len() != inner {
                return Err(NetworkError::RaggedMatrix {
                    row: a,
                    expected: inner,
                    found: row.len(),
                });
            }
            if let Some(b) = row.iter().position(|w| !w.is_finite()) {
                return Err(NetworkError::NonFinite { outer: a, inner: b });
            }
            data.extend(row);
        }

        Ok(Self { outer, inner, data })
    }

    /// Build an `outer x inner` matrix from a generator, mainly for tests and tools.
    pub fn from_fn(
        outer: usize,
        inner: usize,
        mut f: impl FnMut(usize, usize) -> f32,
    ) -> Result<Self, NetworkError> {
        let rows = (0..outer)
            .map(|a| (0..inner).map(|b| f(a, b)).collect())
            .collect();
        Self::from_nested(rows)
    }

    pub fn outer(&self) -> usize {
        self.outer
    }

    pub fn inner(&self) -> usize {
        self.inner
    }

    /// `w[a][b]`. Panics when out of range, like slice indexing.
    pub fn get(&self, a: usize, b: usize) -> f32 {
        assert!(a < self.outer && b < self.inner, "weight index out of range");
        self.data[a * self.inner + b]
    }
}

impl TryFrom<Vec<Vec<f32>>> for WeightMatrix {
    type Error = NetworkError;

    fn try_from(rows: Vec<Vec<f32>>) -> Result<Self, Self::Error> {
        Self::from_nested(rows)
    }
}
