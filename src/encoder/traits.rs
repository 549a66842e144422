// Text encoder trait — the seam between raw text and the vector pipeline.
//
// The shipped implementation runs all-MiniLM-L6-v2 locally through ONNX.
// Tests swap in a deterministic encoder so the rest of the pipeline can be
// exercised without the model files.

use crate::error::Result;

pub trait TextEncoder: Send + Sync {
    /// Length of every vector this encoder produces.
    fn dim(&self) -> usize;

    /// Encode a batch of texts, returning one vector per input in input
    /// order. An empty batch returns an empty vec.
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
