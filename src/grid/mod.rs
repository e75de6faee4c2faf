//! Density grids and the fixed lattice they live on.
pub mod density;
pub mod space;
pub mod traits;

pub use self::density::DensityGrid;
pub use self::space::{GridGeometry, GridSpace, LeafBand, RowSpan};
pub use self::traits::{GridView, GridViewMut, Rows};
