/// A trait for matrix-like types that can receive Jacobians and Hessians.
///
/// Results are written element by element through [`Matrix::set`], so the trait does not
/// depend on how a container lays out its memory: `ndarray` is row-major while `nalgebra`
/// is column-major, and both receive the same logical matrix.
///
/// # Examples
///
/// ```rust
/// use evalexpr_symdiff::prelude::Matrix;
///
/// let mut mat: Vec<Vec<f64>> = Matrix::zeros(2, 3);
/// mat.set(1, 2, 5.0);
/// assert_eq!(mat.dims(), (2, 3));
/// assert_eq!(mat[1][2], 5.0);
/// ```
pub trait Matrix: Sized {
    /// Creates a new matrix of the specified dimensions filled with zeros.
    fn zeros(rows: usize, cols: usize) -> Self;

    /// Writes `value` at (`row`, `col`).
    ///
    /// # Panics
    /// Panics if the position is out of bounds.
    fn set(&mut self, row: usize, col: usize, value: f64);

    /// Returns the dimensions of the matrix as (rows, columns).
    fn dims(&self) -> (usize, usize);

    /// Builds a matrix from row vectors of equal length.
    fn from_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        let mut matrix = Self::zeros(rows.len(), cols);
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                matrix.set(i, j, *value);
            }
        }
        matrix
    }
}

impl Matrix for Vec<Vec<f64>> {
    fn zeros(rows: usize, cols: usize) -> Self {
        vec![vec![0.0; cols]; rows]
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        self[row][col] = value;
    }

    fn dims(&self) -> (usize, usize) {
        (self.len(), self.first().map_or(0, Vec::len))
    }
}

/// Implementation of Matrix trait for ndarray's Array2<f64>.
#[cfg(feature = "ndarray")]
impl Matrix for ndarray::Array2<f64> {
    fn zeros(rows: usize, cols: usize) -> Self {
        ndarray::Array2::zeros((rows, cols))
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        self[[row, col]] = value;
    }

    fn dims(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }
}

/// Implementation of Matrix trait for nalgebra's DMatrix<f64>.
#[cfg(feature = "nalgebra")]
impl Matrix for nalgebra::DMatrix<f64> {
    fn zeros(rows: usize, cols: usize) -> Self {
        nalgebra::DMatrix::zeros(rows, cols)
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        self[(row, col)] = value;
    }

    fn dims(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }
}
