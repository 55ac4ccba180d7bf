use crate::error::{ModelError, Result};
use crate::math::{self, Matrix};

/// N-dimensional tensor backed by a flat `Vec<f32>`.
///
/// Hidden states travel through the model as rank-3 tensors of shape
/// `[batch, seq_len, d_model]`; position-wise layers view them as a
/// `(batch * seq_len) x d_model` [`Matrix`] via [`Tensor::to_matrix`].
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    /// Tensor elements in row-major order.
    pub data: Vec<f32>,
    /// Sizes for each dimension.
    pub shape: Vec<usize>,
}

impl Tensor {
    /// Create a new tensor from raw parts.  The number of elements in `data`
    /// must match the product of the requested `shape`.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>());
        Tensor { data, shape }
    }

    /// Create a tensor of zeros with the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len: usize = shape.iter().product();
        Tensor {
            data: vec![0.0; len],
            shape,
        }
    }

    /// Take ownership of a [`Matrix`] as a rank-2 tensor.
    pub fn from_matrix(m: Matrix) -> Self {
        Tensor {
            shape: vec![m.rows, m.cols],
            data: m.data,
        }
    }

    /// Size of the last dimension.
    pub fn last_dim(&self) -> usize {
        self.shape.last().copied().unwrap_or(1)
    }

    /// Collapse every leading dimension into rows, keeping the last one as
    /// columns.
    pub fn to_matrix(&self) -> Matrix {
        let cols = self.last_dim();
        let rows = if cols == 0 { 0 } else { self.data.len() / cols };
        Matrix::from_vec(rows, cols, self.data.clone())
    }

    /// Inverse of [`Tensor::to_matrix`]: reinterpret `m` with `shape`, whose
    /// last dimension may differ from the source tensor's.
    pub fn from_matrix_with_shape(m: Matrix, shape: Vec<usize>) -> Self {
        Tensor::new(m.data, shape)
    }

    /// Example `b` of a rank-3 tensor as a `seq_len x dim` matrix.
    pub fn batch(&self, b: usize) -> Matrix {
        assert_eq!(self.shape.len(), 3, "batch() requires a rank-3 tensor");
        let (rows, cols) = (self.shape[1], self.shape[2]);
        let len = rows * cols;
        Matrix::from_vec(rows, cols, self.data[b * len..(b + 1) * len].to_vec())
    }

    /// Stack equally sized matrices into a `[batch, rows, cols]` tensor.
    pub fn stack(items: &[Matrix]) -> Tensor {
        let (rows, cols) = items.first().map(|m| (m.rows, m.cols)).unwrap_or((0, 0));
        let mut data = Vec::with_capacity(items.len() * rows * cols);
        for m in items {
            assert_eq!((m.rows, m.cols), (rows, cols));
            data.extend_from_slice(&m.data);
        }
        Tensor::new(data, vec![items.len(), rows, cols])
    }

    /// Compute the flat index for a multi-dimensional coordinate.
    fn offset(&self, idx: &[usize]) -> usize {
        assert_eq!(idx.len(), self.shape.len());
        let mut stride = 1;
        let mut off = 0usize;
        for (i, &dim) in self.shape.iter().rev().enumerate() {
            let id = idx[self.shape.len() - 1 - i];
            assert!(id < dim, "index out of bounds");
            off += id * stride;
            stride *= dim;
        }
        off
    }

    /// Basic immutable indexing.
    pub fn get(&self, idx: &[usize]) -> f32 {
        self.data[self.offset(idx)]
    }

    /// Mutable indexing support.
    pub fn set(&mut self, idx: &[usize], value: f32) {
        let off = self.offset(idx);
        self.data[off] = value;
    }

    /// Change the view of the underlying data without modifying order.
    pub fn reshape(&mut self, new_shape: Vec<usize>) -> Result<()> {
        if self.data.len() != new_shape.iter().product::<usize>() {
            return Err(ModelError::ShapeMismatch {
                expected: self.shape.clone(),
                got: new_shape,
            });
        }
        self.shape = new_shape;
        Ok(())
    }

    /// Whether `self.shape` broadcasts to `target` under numpy rules.
    pub fn broadcasts_to(&self, target: &[usize]) -> bool {
        target.len() >= self.shape.len()
            && self
                .shape
                .iter()
                .rev()
                .zip(target.iter().rev())
                .all(|(&src, &dst)| src == dst || src == 1)
    }

    /// Broadcast the tensor to a larger shape following numpy semantics
    /// where dimensions of size 1 can be expanded.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<Tensor> {
        if !self.broadcasts_to(target) {
            return Err(ModelError::ShapeMismatch {
                expected: target.to_vec(),
                got: self.shape.clone(),
            });
        }

        let out_len: usize = target.iter().product();
        let mut out = vec![0.0; out_len];

        // Padded source shape and strides for index mapping.
        let mut src_shape = vec![1; target.len()];
        let offset = target.len() - self.shape.len();
        for (i, &dim) in self.shape.iter().enumerate() {
            src_shape[offset + i] = dim;
        }
        let mut src_stride = vec![0; target.len()];
        let mut stride = 1;
        for (i, dim) in src_shape.iter().rev().enumerate() {
            src_stride[src_shape.len() - 1 - i] = stride;
            stride *= *dim;
        }

        for (i, o) in out.iter_mut().enumerate() {
            let mut tmp = i;
            let mut src_index = 0usize;
            for ((&t_dim, &s_dim), &s_stride) in target
                .iter()
                .rev()
                .zip(src_shape.iter().rev())
                .zip(src_stride.iter().rev())
            {
                let idx = tmp % t_dim;
                tmp /= t_dim;
                let s_idx = if s_dim == 1 { 0 } else { idx };
                src_index += s_idx * s_stride;
            }
            *o = self.data[src_index];
        }

        Ok(Tensor {
            data: out,
            shape: target.to_vec(),
        })
    }

    /// Elementwise addition; `b` is broadcast to `a`'s shape.
    pub fn add(a: &Tensor, b: &Tensor) -> Result<Tensor> {
        let b = if a.shape == b.shape {
            b.clone()
        } else {
            b.broadcast_to(&a.shape)?
        };
        let data = a.data.iter().zip(b.data.iter()).map(|(x, y)| x + y).collect();
        Ok(Tensor {
            data,
            shape: a.shape.clone(),
        })
    }

    /// Softmax along the last dimension.
    pub fn softmax(t: &Tensor) -> Tensor {
        let cols = t.last_dim();
        let mut out = vec![0.0; t.data.len()];
        if cols > 0 {
            for (o, row) in out.chunks_mut(cols).zip(t.data.chunks(cols)) {
                math::softmax_row(row, o);
            }
        }
        Tensor {
            data: out,
            shape: t.shape.clone(),
        }
    }

    /// Arg-max along the last dimension, restricted to its first `limit`
    /// entries.
    pub fn argmax_last(&self, limit: usize) -> Vec<usize> {
        let cols = self.last_dim();
        let limit = limit.min(cols);
        if cols == 0 {
            return Vec::new();
        }
        self.data
            .chunks(cols)
            .map(|row| math::argmax(&row[..limit]))
            .collect()
    }

    /// True when no element is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}
