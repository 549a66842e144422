// NumPy `.npy` reader for the numeric artifacts.
//
// The offline pipeline saves its arrays with `np.save`, so the matrices and
// label arrays arrive as .npy files. Only what those files actually contain
// is supported: little-endian f4/f8/i4/i8/u4/u8 in C order, format versions
// 1 through 3.

use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use thiserror::Error;

use crate::error::PipelineError;

const MAGIC: &[u8] = b"\x93NUMPY";

static DESCR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'descr'\s*:\s*'([^']+)'").expect("valid regex"));
static FORTRAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'fortran_order'\s*:\s*(True|False)").expect("valid regex"));
static SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'shape'\s*:\s*\(([^)]*)\)").expect("valid regex"));

#[derive(Debug, Error, PartialEq)]
pub enum NpyError {
    #[error("not an npy file (bad magic)")]
    BadMagic,
    #[error("unsupported npy format version {0}.{1}")]
    UnsupportedVersion(u8, u8),
    #[error("truncated npy file")]
    Truncated,
    #[error("malformed npy header: {0}")]
    MalformedHeader(String),
    #[error("unsupported dtype '{0}'")]
    UnsupportedDtype(String),
    #[error("fortran-ordered arrays are not supported")]
    FortranOrder,
    #[error("expected a {expected}-D array, got shape {actual:?}")]
    WrongRank { expected: usize, actual: Vec<usize> },
    #[error("expected {expected} data bytes, found {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Element type of an npy array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    F4,
    F8,
    I4,
    I8,
    U4,
    U8,
}

impl Dtype {
    fn parse(descr: &str) -> Result<Self, NpyError> {
        match descr {
            "<f4" => Ok(Dtype::F4),
            "<f8" => Ok(Dtype::F8),
            "<i4" => Ok(Dtype::I4),
            "<i8" => Ok(Dtype::I8),
            "<u4" => Ok(Dtype::U4),
            "<u8" => Ok(Dtype::U8),
            other => Err(NpyError::UnsupportedDtype(other.to_string())),
        }
    }

    fn size(self) -> usize {
        match self {
            Dtype::F4 | Dtype::I4 | Dtype::U4 => 4,
            Dtype::F8 | Dtype::I8 | Dtype::U8 => 8,
        }
    }

    fn is_float(self) -> bool {
        matches!(self, Dtype::F4 | Dtype::F8)
    }
}

/// Parsed npy header plus the offset where element data begins.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyHeader {
    pub dtype: Dtype,
    pub shape: Vec<usize>,
    pub data_offset: usize,
}

impl NpyHeader {
    /// Total element count, or `None` if the shape overflows `usize`.
    pub fn element_count(&self) -> Option<usize> {
        self.shape.iter().try_fold(1usize, |n, &d| n.checked_mul(d))
    }

    /// Byte length of the element data, or `None` on overflow.
    pub fn data_len(&self) -> Option<usize> {
        self.element_count()?.checked_mul(self.dtype.size())
    }
}

pub fn parse_header(bytes: &[u8]) -> Result<NpyHeader, NpyError> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(NpyError::BadMagic);
    }
    let (major, minor) = (bytes[6], bytes[7]);

    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(NpyError::Truncated);
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        _ => return Err(NpyError::UnsupportedVersion(major, minor)),
    };

    let data_offset = header_start + header_len;
    if bytes.len() < data_offset {
        return Err(NpyError::Truncated);
    }
    let header = String::from_utf8_lossy(&bytes[header_start..data_offset]);

    let descr = DESCR_RE
        .captures(&header)
        .and_then(|c| c.get(1))
        .ok_or_else(|| NpyError::MalformedHeader("missing 'descr'".to_string()))?;
    let dtype = Dtype::parse(descr.as_str())?;

    let fortran = FORTRAN_RE
        .captures(&header)
        .and_then(|c| c.get(1))
        .ok_or_else(|| NpyError::MalformedHeader("missing 'fortran_order'".to_string()))?;

    let shape_src = SHAPE_RE
        .captures(&header)
        .and_then(|c| c.get(1))
        .ok_or_else(|| NpyError::MalformedHeader("missing 'shape'".to_string()))?;
    let shape = shape_src
        .as_str()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| NpyError::MalformedHeader(format!("bad shape entry '{s}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Column-major only matters once there is more than one axis.
    if fortran.as_str() == "True" && shape.len() > 1 {
        return Err(NpyError::FortranOrder);
    }

    Ok(NpyHeader {
        dtype,
        shape,
        data_offset,
    })
}

fn element_bytes<'a>(bytes: &'a [u8], header: &NpyHeader) -> Result<&'a [u8], NpyError> {
    let expected = header.data_len().ok_or_else(|| {
        NpyError::MalformedHeader(format!("shape {:?} is too large", header.shape))
    })?;
    let actual = bytes.len() - header.data_offset;
    if actual < expected {
        return Err(NpyError::WrongLength { expected, actual });
    }
    Ok(&bytes[header.data_offset..header.data_offset + expected])
}

fn decode_f32(data: &[u8], dtype: Dtype) -> Vec<f32> {
    match dtype {
        Dtype::F4 => data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        Dtype::F8 => data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap_or([0; 8])) as f32)
            .collect(),
        _ => decode_i64(data, dtype).into_iter().map(|v| v as f32).collect(),
    }
}

fn decode_i64(data: &[u8], dtype: Dtype) -> Vec<i64> {
    match dtype {
        Dtype::I4 => data
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as i64)
            .collect(),
        Dtype::U4 => data
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as i64)
            .collect(),
        Dtype::I8 => data
            .chunks_exact(8)
            .map(|c| i64::from_le_bytes(c.try_into().unwrap_or([0; 8])))
            .collect(),
        Dtype::U8 => data
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(c.try_into().unwrap_or([0; 8])) as i64)
            .collect(),
        Dtype::F4 | Dtype::F8 => decode_f32(data, dtype).into_iter().map(|v| v as i64).collect(),
    }
}

/// Decode a 2-D array into row vectors.
pub fn decode_matrix(bytes: &[u8]) -> Result<Vec<Vec<f32>>, NpyError> {
    let header = parse_header(bytes)?;
    if header.shape.len() != 2 {
        return Err(NpyError::WrongRank {
            expected: 2,
            actual: header.shape,
        });
    }
    let (rows, cols) = (header.shape[0], header.shape[1]);
    if cols == 0 && rows > 0 {
        return Err(NpyError::MalformedHeader(format!(
            "matrix declares {rows} rows of zero columns"
        )));
    }
    let values = decode_f32(element_bytes(bytes, &header)?, header.dtype);
    if cols == 0 {
        return Ok(Vec::new());
    }
    Ok(values.chunks_exact(cols).map(<[f32]>::to_vec).collect())
}

/// Decode a 1-D integer array. Float arrays are rejected so that a
/// mixed-up file (e.g. embeddings passed as labels) is caught at load.
pub fn decode_int_vector(bytes: &[u8]) -> Result<Vec<i64>, NpyError> {
    let header = parse_header(bytes)?;
    if header.shape.len() != 1 {
        return Err(NpyError::WrongRank {
            expected: 1,
            actual: header.shape,
        });
    }
    if header.dtype.is_float() {
        return Err(NpyError::UnsupportedDtype(format!(
            "{:?} (integer array expected)",
            header.dtype
        )));
    }
    Ok(decode_i64(element_bytes(bytes, &header)?, header.dtype))
}

fn read(path: &Path) -> crate::error::Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| PipelineError::artifact(path, e))
}

pub fn read_matrix(path: &Path) -> crate::error::Result<Vec<Vec<f32>>> {
    decode_matrix(&read(path)?).map_err(|e| PipelineError::artifact(path, e))
}

pub fn read_int_vector(path: &Path) -> crate::error::Result<Vec<i64>> {
    decode_int_vector(&read(path)?).map_err(|e| PipelineError::artifact(path, e))
}
