//! Scalar element types.

/// Scalar data types supported by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl DType {
    /// Element size in bytes.
    pub const fn size_bytes(self) -> usize {
        match self {
            DType::Bool => 1,
            DType::Int32 => 4,
            DType::Int64 => 8,
            DType::Float32 => 4,
            DType::Float64 => 8,
        }
    }

    /// Decode one element from `bytes` into an `f64`.
    ///
    /// `f64` is the kernel-facing scalar carrier; `Int64` values above 2^53
    /// lose precision, which is acceptable for the environment this crate
    /// models.
    pub fn decode(self, bytes: &[u8]) -> f64 {
        fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
            let mut out = [0u8; N];
            out.copy_from_slice(&bytes[..N]);
            out
        }
        match self {
            DType::Bool => (bytes[0] != 0) as u8 as f64,
            DType::Int32 => i32::from_le_bytes(array(bytes)) as f64,
            DType::Int64 => i64::from_le_bytes(array(bytes)) as f64,
            DType::Float32 => f32::from_le_bytes(array(bytes)) as f64,
            DType::Float64 => f64::from_le_bytes(array(bytes)),
        }
    }

    /// Encode an `f64` into `bytes` as one element of this dtype.
    pub fn encode(self, value: f64, bytes: &mut [u8]) {
        match self {
            DType::Bool => bytes[0] = (value != 0.0) as u8,
            DType::Int32 => bytes[..4].copy_from_slice(&(value as i32).to_le_bytes()),
            DType::Int64 => bytes[..8].copy_from_slice(&(value as i64).to_le_bytes()),
            DType::Float32 => bytes[..4].copy_from_slice(&(value as f32).to_le_bytes()),
            DType::Float64 => bytes[..8].copy_from_slice(&value.to_le_bytes()),
        }
    }
}
