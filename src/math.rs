/// Row-major 2-D matrix of `f32`.
///
/// Everything position-wise in the model (projections, normalisation,
/// per-head attention) works on a `Matrix` whose rows are sequence positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(r: usize, c: usize) -> Self {
        Matrix {
            rows: r,
            cols: c,
            data: vec![0.0; r * c],
        }
    }

    pub fn from_vec(r: usize, c: usize, v: Vec<f32>) -> Self {
        assert_eq!(v.len(), r * c);
        Matrix {
            rows: r,
            cols: c,
            data: v,
        }
    }

    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: f32) {
        self.data[r * self.cols + c] = v;
    }

    /// Borrow row `r` as a slice.
    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn matmul(a: &Matrix, b: &Matrix) -> Matrix {
        assert_eq!(a.cols, b.rows);
        let mut out = vec![0.0; a.rows * b.cols];
        for i in 0..a.rows {
            let a_row = &a.data[i * a.cols..(i + 1) * a.cols];
            let out_row = &mut out[i * b.cols..(i + 1) * b.cols];
            for (k, &a_val) in a_row.iter().enumerate() {
                let b_row = &b.data[k * b.cols..(k + 1) * b.cols];
                for (o, &b_val) in out_row.iter_mut().zip(b_row) {
                    *o += a_val * b_val;
                }
            }
        }
        Matrix::from_vec(a.rows, b.cols, out)
    }

    pub fn add(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.rows, other.rows);
        assert_eq!(self.cols, other.cols);
        let v = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a + b)
            .collect();
        Matrix::from_vec(self.rows, self.cols, v)
    }

    pub fn transpose(&self) -> Matrix {
        let mut v = vec![0.0; self.rows * self.cols];
        for i in 0..self.rows {
            for j in 0..self.cols {
                v[j * self.rows + i] = self.get(i, j);
            }
        }
        Matrix::from_vec(self.cols, self.rows, v)
    }

    /// Copy out columns `start..start + width`.
    pub fn slice_cols(&self, start: usize, width: usize) -> Matrix {
        assert!(start + width <= self.cols);
        let mut out = Matrix::zeros(self.rows, width);
        for r in 0..self.rows {
            let src = &self.data[r * self.cols + start..r * self.cols + start + width];
            out.data[r * width..(r + 1) * width].copy_from_slice(src);
        }
        out
    }

    /// Write `src` into columns `start..start + src.cols`.
    pub fn copy_into_cols(&mut self, start: usize, src: &Matrix) {
        assert_eq!(self.rows, src.rows);
        assert!(start + src.cols <= self.cols);
        for r in 0..self.rows {
            let dst = &mut self.data[r * self.cols + start..r * self.cols + start + src.cols];
            dst.copy_from_slice(src.row(r));
        }
    }

    /// Row-wise softmax.
    ///
    /// A row made entirely of negative infinity produces NaN: `-inf - -inf`
    /// is undefined and is deliberately left that way so a fully masked
    /// attention row stays detectable.
    pub fn softmax(&self) -> Matrix {
        let mut v = vec![0.0; self.data.len()];
        if self.cols == 0 {
            return Matrix::from_vec(self.rows, 0, v);
        }
        for (out_row, row) in v.chunks_mut(self.cols).zip(self.data.chunks(self.cols)) {
            softmax_row(row, out_row);
        }
        Matrix::from_vec(self.rows, self.cols, v)
    }

    /// Index of the largest entry in every row. Ties resolve to the lowest index.
    pub fn argmax_rows(&self) -> Vec<usize> {
        if self.cols == 0 {
            return vec![0; self.rows];
        }
        self.data.chunks(self.cols).map(argmax).collect()
    }
}

/// Numerically stable softmax of `row` written into `out`.
pub fn softmax_row(row: &[f32], out: &mut [f32]) {
    let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for (o, &x) in out.iter_mut().zip(row) {
        let e = (x - max).exp();
        *o = e;
        sum += e;
    }
    for o in out.iter_mut() {
        *o /= sum;
    }
}

/// Index of the largest value; `0` for an empty slice.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matmul_small() {
        let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = Matrix::from_vec(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        let c = Matrix::matmul(&a, &b);
        assert_eq!(c.rows, 2);
        assert_eq!(c.cols, 2);
        assert_eq!(c.data, vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn transpose_swaps_axes() {
        let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let t = a.transpose();
        assert_eq!((t.rows, t.cols), (3, 2));
        assert_eq!(t.data, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn slice_and_copy_cols_roundtrip() {
        let a = Matrix::from_vec(2, 4, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let right = a.slice_cols(2, 2);
        assert_eq!(right.data, vec![3.0, 4.0, 7.0, 8.0]);
        let mut b = Matrix::zeros(2, 4);
        b.copy_into_cols(2, &right);
        assert_eq!(b.data, vec![0.0, 0.0, 3.0, 4.0, 0.0, 0.0, 7.0, 8.0]);
    }

    #[test]
    fn softmax_of_all_neg_inf_is_nan() {
        let m = Matrix::from_vec(1, 3, vec![f32::NEG_INFINITY; 3]);
        let s = m.softmax();
        assert!(s.data.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn softmax_masked_entry_is_exactly_zero() {
        let m = Matrix::from_vec(1, 3, vec![0.5, f32::NEG_INFINITY, -0.5]);
        let s = m.softmax();
        assert_eq!(s.get(0, 1), 0.0);
        assert!((s.data.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[]), 0);
        let m = Matrix::from_vec(2, 2, vec![0.0, 1.0, 3.0, -1.0]);
        assert_eq!(m.argmax_rows(), vec![1, 0]);
    }
}
