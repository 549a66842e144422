// Sentence embeddings with all-MiniLM-L6-v2 via ONNX Runtime.
//
// Each headline is tokenized, run through the BERT encoder, mean-pooled over
// the attention mask and L2-normalized. That is the same recipe the
// sentence-transformers package applies for this model, so vectors produced
// here land in the same space as the precomputed training embeddings.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::traits::TextEncoder;
use crate::error::{PipelineError, Result};

/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Longest input the model was trained with; longer text is truncated.
const MAX_SEQ_LEN: usize = 256;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Local ONNX sentence encoder. `Session::run` takes `&mut self`, so the
/// session sits behind a Mutex to let the encoder be shared by reference.
pub struct SentenceEncoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl SentenceEncoder {
    /// Load the model and tokenizer from `model_dir`. This is the expensive
    /// step and should happen once per process.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                return Err(PipelineError::artifact(
                    path,
                    "file not found; run `newstopic download-model` to fetch it",
                ));
            }
        }

        let session = Session::builder()
            .map_err(|e| PipelineError::artifact(&model_path, e))?
            .commit_from_file(&model_path)
            .map_err(|e| PipelineError::artifact(&model_path, e))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| PipelineError::artifact(&tokenizer_path, e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| PipelineError::artifact(&tokenizer_path, e))?;

        info!(model = %model_path.display(), dim = EMBEDDING_DIM, "Loaded sentence encoder");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn run(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let encodings = texts
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| PipelineError::inference(format!("tokenization failed: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        if max_len == 0 {
            return Ok(vec![vec![0.0; EMBEDDING_DIM]; batch_size]);
        }

        // input_ids and attention_mask are padded with 0; token_type_ids are
        // all 0 for single-sentence input.
        let mut input_ids: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        for enc in &encodings {
            let pad = max_len - enc.get_ids().len();
            input_ids.extend(enc.get_ids().iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat_n(0i64, pad));
            attention_mask.extend(enc.get_attention_mask().iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat_n(0i64, pad));
        }
        let token_type_ids = vec![0i64; batch_size * max_len];

        let shape = [batch_size as i64, max_len as i64];
        let tensor = |data: Vec<i64>, name: &str| {
            Tensor::from_array((shape, data)).map_err(|e| {
                PipelineError::inference(format!("failed to create {name} tensor: {e}"))
            })
        };
        let ids_tensor = tensor(input_ids, "input_ids")?;
        let mask_tensor = tensor(attention_mask.clone(), "attention_mask")?;
        let type_tensor = tensor(token_type_ids, "token_type_ids")?;

        // last_hidden_state: [batch, seq_len, 384]
        let (dims, hidden_states) = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| PipelineError::inference(format!("session lock poisoned: {e}")))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => ids_tensor,
                    "attention_mask" => mask_tensor,
                    "token_type_ids" => type_tensor
                })
                .map_err(|e| PipelineError::inference(format!("ONNX inference failed: {e}")))?;

            let (out_shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
                PipelineError::inference(format!("failed to extract output tensor: {e}"))
            })?;
            let dims: &[i64] = out_shape;
            (dims.to_vec(), data.to_vec())
        };

        if dims.len() != 3 || dims[0] as usize != batch_size || dims[2] as usize != EMBEDDING_DIM {
            return Err(PipelineError::inference(format!(
                "unexpected output shape {dims:?}, expected [{batch_size}, {max_len}, {EMBEDDING_DIM}]"
            )));
        }
        let seq_len = dims[1] as usize;

        let embeddings = (0..batch_size)
            .map(|i| {
                let mask = &attention_mask[i * max_len..(i + 1) * max_len];
                let row = seq_len * EMBEDDING_DIM;
                let tokens = &hidden_states[i * row..(i + 1) * row];
                let mut pooled = mean_pool(tokens, mask, EMBEDDING_DIM);
                l2_normalize(&mut pooled);
                pooled
            })
            .collect();

        debug!(batch_size, dim = EMBEDDING_DIM, "Computed sentence embeddings");
        Ok(embeddings)
    }
}

impl TextEncoder for SentenceEncoder {
    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run(texts)
    }
}

/// Average the token vectors of one sequence, counting only positions whose
/// attention mask is set. `tokens` is `[seq_len, dim]` flattened; positions
/// beyond the mask length are ignored.
pub fn mean_pool(tokens: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; dim];
    let mut count = 0.0f32;
    for (j, token) in tokens.chunks_exact(dim).enumerate() {
        let m = mask.get(j).copied().unwrap_or(0) as f32;
        if m > 0.0 {
            count += m;
            for (s, v) in sum.iter_mut().zip(token) {
                *s += v * m;
            }
        }
    }
    if count > 0.0 {
        for s in &mut sum {
            *s /= count;
        }
    }
    sum
}

/// Scale a vector to unit length. The zero vector is left alone.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
