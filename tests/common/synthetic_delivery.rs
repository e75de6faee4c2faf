use mudensity_qa::delivery::{DeliveryRecord, JawPair, LeafPair};
use mudensity_qa::grid::GridSpace;

/// Leaf pairs of the standard layout.
pub fn standard_leaf_count() -> usize {
    GridSpace::standard().leaf_pair_count()
}

/// Two control points `[0, mu]` with every leaf pair at `leaves` and the
/// jaws at `jaw`, gantry at `gantry` degrees.
pub fn static_field(mu: f64, leaves: LeafPair, jaw: JawPair, gantry: f64) -> DeliveryRecord {
    let n = standard_leaf_count();
    DeliveryRecord::from_components(
        vec![0.0, mu],
        vec![vec![leaves; n]; 2],
        vec![jaw; 2],
        vec![gantry; 2],
    )
    .expect("static field is valid")
}

/// A single control point delivering `mu` through a fixed aperture.
pub fn single_control_point(mu: f64, leaves: LeafPair, jaw: JawPair) -> DeliveryRecord {
    let n = standard_leaf_count();
    DeliveryRecord::from_components(vec![mu], vec![vec![leaves; n]], vec![jaw], vec![0.0])
        .expect("single control point is valid")
}

/// Square field of side `2 * half` mm.
pub fn square_field(mu: f64, half: f64) -> DeliveryRecord {
    static_field(mu, [half, half], [half, half], 0.0)
}

/// Arc through `angles` delivering `mu_per_step` between consecutive control
/// points with a constant square aperture.
pub fn arc(angles: &[f64], mu_per_step: f64, half: f64) -> DeliveryRecord {
    let n = standard_leaf_count();
    let cps = angles.len();
    DeliveryRecord::from_components(
        (0..cps).map(|i| i as f64 * mu_per_step).collect(),
        vec![vec![[half, half]; n]; cps],
        vec![[half, half]; cps],
        angles.to_vec(),
    )
    .expect("arc is valid")
}

/// Bank B sweeping from `start` to `end` while `mu` is delivered.
pub fn sweep(mu: f64, start: f64, end: f64, jaw: JawPair) -> DeliveryRecord {
    let n = standard_leaf_count();
    DeliveryRecord::from_components(
        vec![0.0, mu],
        vec![vec![[0.0, start]; n], vec![[0.0, end]; n]],
        vec![jaw; 2],
        vec![0.0; 2],
    )
    .expect("sweep is valid")
}

/// Grid indices `(col, row)` of the standard lattice point at `(x_mm, y_mm)`.
pub fn standard_index(x_mm: f64, y_mm: f64) -> (usize, usize) {
    let space = GridSpace::standard();
    let col = space
        .mlc()
        .iter()
        .position(|&x| (x - x_mm).abs() < 1e-6)
        .expect("x on lattice");
    let row = space
        .jaw()
        .iter()
        .position(|&y| (y - y_mm).abs() < 1e-6)
        .expect("y on lattice");
    (col, row)
}
