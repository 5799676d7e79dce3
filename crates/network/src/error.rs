/// Errors from building weight matrices and network shapes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("weight matrix is empty")]
    EmptyMatrix,
    #[error("weight matrix row {row} has {found} entries, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("weight matrix holds a non-finite value at [{outer}][{inner}]")]
    NonFinite { outer: usize, inner: usize },
    #[error("layer 0 input dimension is {0}, expected 6")]
    InputDim(usize),
    #[error("hidden dimension {0} is not a positive multiple of 4")]
    HiddenDim(usize),
    #[error("layer 1 input dimension {layer1} does not match hidden dimension {hidden}")]
    LayerMismatch { hidden: usize, layer1: usize },
    #[error("layer 1 output dimension is {0}, expected 3")]
    OutputDim(usize),
}
