use crate::error::MemoryError;

/// Exhaustive squared-L2 index over a contiguous row-major vector buffer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Rebuild from a persisted buffer.
    pub(crate) fn from_raw(dimension: usize, data: Vec<f32>) -> Result<Self, MemoryError> {
        if dimension == 0 {
            return Err(MemoryError::CorruptIndex("dimension is zero".into()));
        }
        if data.len() % dimension != 0 {
            return Err(MemoryError::CorruptIndex(format!(
                "{} values do not divide into rows of {dimension}",
                data.len()
            )));
        }
        Ok(Self { dimension, data })
    }

    pub(crate) fn dimension(&self) -> usize {
        self.dimension
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub(crate) fn data(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn check_dimension(&self, vector: &[f32]) -> Result<(), MemoryError> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            })
        }
    }

    pub(crate) fn push(&mut self, vector: &[f32]) -> Result<(), MemoryError> {
        self.check_dimension(vector)?;
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Up to `k` `(row, distance)` pairs, nearest first. Equal distances keep row order.
    pub(crate) fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, MemoryError> {
        self.check_dimension(query)?;
        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .map(|row| squared_l2(query, row))
            .enumerate()
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        Ok(scored)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
