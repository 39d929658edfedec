#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::{Error, Number, Result};

/// A dense grid of numbers, addressed 1-based by `(row, col)`
///
/// Scalars are carried as a 1x1 matrix. Both dimensions are limited to 255
/// by the single size bytes of the variable description packet.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Matrix {
    rows: u8,
    cols: u8,
    cells: Vec<Number>,
}

impl Matrix {
    /// Creates a zero-filled [Matrix] with the given dimensions.
    ///
    /// Returns an error for a zero dimension.
    pub fn new(rows: u8, cols: u8) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::failure(format!(
                "invalid matrix dimensions: {rows}x{cols}"
            )));
        }

        let mut cells = Vec::new();
        cells.resize(rows as usize * cols as usize, Number::default());

        Ok(Self { rows, cols, cells })
    }

    /// Creates a 1x1 [Matrix] holding a single value.
    pub fn scalar(value: Number) -> Self {
        let mut cells = Vec::with_capacity(1);
        cells.push(value);

        Self {
            rows: 1,
            cols: 1,
            cells,
        }
    }

    /// Gets the declared row count.
    pub const fn rows(&self) -> u8 {
        self.rows
    }

    /// Gets the declared column count.
    pub const fn cols(&self) -> u8 {
        self.cols
    }

    /// Gets the total number of cells.
    pub fn cell_count(&self) -> u16 {
        self.rows as u16 * self.cols as u16
    }

    /// Gets whether this is a 1x1 grid.
    pub fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    fn offset(&self, row: u8, col: u8) -> Result<usize> {
        if row == 0 || row > self.rows || col == 0 || col > self.cols {
            return Err(Error::failure(format!(
                "cell ({row}, {col}) outside a {}x{} matrix",
                self.rows, self.cols
            )));
        }

        Ok((row as usize - 1) * self.cols as usize + (col as usize - 1))
    }

    /// Gets the cell at the 1-based `(row, col)` position.
    pub fn get(&self, row: u8, col: u8) -> Result<Number> {
        Ok(self.cells[self.offset(row, col)?])
    }

    /// Sets the cell at the 1-based `(row, col)` position.
    pub fn set(&mut self, row: u8, col: u8, value: Number) -> Result<()> {
        let offset = self.offset(row, col)?;
        self.cells[offset] = value;

        Ok(())
    }

    /// Iterates cells in row-major order with their 1-based coordinates:
    /// `(1, 1), (1, 2), ... (2, 1), ...`
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8, Number)> + '_ {
        let cols = self.cols as usize;

        self.cells.iter().enumerate().map(move |(i, &value)| {
            let row = (i / cols) as u8 + 1;
            let col = (i % cols) as u8 + 1;
            (row, col, value)
        })
    }
}

impl From<Number> for Matrix {
    fn from(value: Number) -> Self {
        Self::scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_cells() -> Result<()> {
        let mut matrix = Matrix::new(2, 3)?;
        assert_eq!(matrix.cell_count(), 6);
        assert!(!matrix.is_scalar());

        matrix.set(1, 3, Number::from_real(13.0))?;
        matrix.set(2, 1, Number::from_real(21.0))?;

        assert_eq!(matrix.get(1, 3)?, Number::from_real(13.0));
        assert_eq!(matrix.get(2, 1)?, Number::from_real(21.0));
        assert_eq!(matrix.get(1, 1)?, Number::default());

        Ok(())
    }

    #[test]
    fn test_matrix_bounds() -> Result<()> {
        let matrix = Matrix::new(2, 2)?;

        assert!(matrix.get(0, 1).is_err());
        assert!(matrix.get(1, 0).is_err());
        assert!(matrix.get(3, 1).is_err());
        assert!(matrix.get(1, 3).is_err());

        assert!(Matrix::new(0, 1).is_err());
        assert!(Matrix::new(1, 0).is_err());

        Ok(())
    }

    #[test]
    fn test_row_major_iteration() -> Result<()> {
        let mut matrix = Matrix::new(2, 2)?;
        for (i, (row, col)) in [(1, 1), (1, 2), (2, 1), (2, 2)].iter().enumerate() {
            matrix.set(*row, *col, Number::from_real(i as f64 + 1.0))?;
        }

        let cells: Vec<(u8, u8, Number)> = matrix.iter().collect();
        assert_eq!(
            cells,
            [
                (1, 1, Number::from_real(1.0)),
                (1, 2, Number::from_real(2.0)),
                (2, 1, Number::from_real(3.0)),
                (2, 2, Number::from_real(4.0)),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_scalar() {
        let matrix = Matrix::scalar(Number::new(1.0, -2.0));
        assert!(matrix.is_scalar());
        assert_eq!(matrix.get(1, 1), Ok(Number::new(1.0, -2.0)));
    }
}
