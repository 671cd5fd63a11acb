use serde::{Deserialize, Serialize};

/// A flattened, row-major 2D array.
///
/// Storage is a single boxed slice for cache locality; `(x, y)` addresses column `x` of row `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    /// Number of columns.
    width: usize,
    /// Number of rows.
    height: usize,
    /// Row-major cell values, `width * height` long.
    cells: Box<[T]>,
}

impl<T: Copy> Grid<T> {
    /// Creates a grid with every cell set to `fill`.
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self { width, height, cells: vec![fill; width * height].into_boxed_slice() }
    }

    /// Wraps an existing row-major buffer.
    ///
    /// # Returns
    /// `None` if `cells.len()` does not equal `width * height`.
    pub fn from_vec(width: usize, height: usize, cells: Vec<T>) -> Option<Self> {
        (cells.len() == width * height).then(|| Self {
            width,
            height,
            cells: cells.into_boxed_slice(),
        })
    }

    /// Builds a grid by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self { width, height, cells: cells.into_boxed_slice() }
    }

    pub fn get(&self, x: usize, y: usize) -> T { self.cells[self.index(x, y)] }

    /// Like [`Grid::get`], but returns `None` outside the grid instead of panicking.
    /// Signed coordinates let convolution code probe past the border.
    pub fn get_checked(&self, x: isize, y: isize) -> Option<T> {
        let (xu, yu) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        (xu < self.width && yu < self.height).then(|| self.get(xu, yu))
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let i = self.index(x, y);
        self.cells[i] = value;
    }

    /// Applies `f` to every cell, keeping the shape.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(|c| f(*c)).collect(),
        }
    }

    fn index(&self, x: usize, y: usize) -> usize { y * self.width + x }
}

impl<T> Grid<T> {
    pub fn width(&self) -> usize { self.width }

    pub fn height(&self) -> usize { self.height }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) { (self.width, self.height) }

    pub fn len(&self) -> usize { self.cells.len() }

    pub fn is_empty(&self) -> bool { self.cells.is_empty() }

    pub fn cells(&self) -> &[T] { &self.cells }

    pub fn iter(&self) -> std::slice::Iter<'_, T> { self.cells.iter() }
}
