// Text encoding — turns headlines into sentence embeddings.

pub mod download;
pub mod onnx;
pub mod traits;
