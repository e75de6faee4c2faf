/// Row access to a grid of samples; rows run along the jaw axis, columns
/// along the MLC axis.
pub trait GridView {
    type Value: Copy;

    fn width(&self) -> usize;
    fn height(&self) -> usize;

    fn row(&self, y: usize) -> &[Self::Value];

    fn rows(&self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows { grid: self, y: 0 }
    }

    /// `(rows, cols)`, matching [`GridSpace::shape`](super::GridSpace::shape).
    fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }
}

pub trait GridViewMut: GridView {
    fn row_mut(&mut self, y: usize) -> &mut [Self::Value];
}

/// Iterator over the rows of a [`GridView`], top (largest jaw coordinate) first.
pub struct Rows<'a, G: GridView> {
    grid: &'a G,
    y: usize,
}

impl<'a, G: GridView> Iterator for Rows<'a, G> {
    type Item = &'a [G::Value];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.grid.height() {
            return None;
        }
        let y = self.y;
        self.y += 1;
        Some(self.grid.row(y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.grid.height().saturating_sub(self.y);
        (left, Some(left))
    }
}

impl<'a, G: GridView> ExactSizeIterator for Rows<'a, G> {}
