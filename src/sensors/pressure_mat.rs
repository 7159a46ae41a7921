//! Pressure-sensing mat processor.
//!
//! Nine force cells in a 3×3 grid under the seat cushion. The processor
//! owns the calibration baseline, decides presence, and partitions the
//! grid into four overlapping 2×2 quadrant plates for the force-plate
//! analysis.
//!
//! Grid positions, looking down at the seat (front row first):
//!
//! ```text
//!   0 1 2     front-left .. front-right
//!   3 4 5
//!   6 7 8     back-left  .. back-right
//! ```

use serde::{Deserialize, Serialize};

use super::force_plate::{ForcePlate, PlateGeometry};
use super::Coord;

/// Number of force cells on the mat.
pub const CELL_COUNT: usize = 9;

/// ADC channel → grid position. The harness does not wire the cells in
/// raster order; this permutation reflects the physical cabling.
const CHANNEL_TO_CELL: [usize; CELL_COUNT] = [4, 1, 0, 3, 6, 7, 8, 5, 2];

/// The four quadrant plates, each a 2×2 sub-grid sharing the centre
/// row/column with its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Quadrant {
    FrontLeft = 0,
    FrontRight = 1,
    BackLeft = 2,
    BackRight = 3,
}

impl Quadrant {
    pub const COUNT: usize = 4;

    pub const ALL: [Quadrant; Self::COUNT] = [
        Quadrant::FrontLeft,
        Quadrant::FrontRight,
        Quadrant::BackLeft,
        Quadrant::BackRight,
    ];

    /// Grid cells of this quadrant, in plate corner order
    /// (z1 = +x+y corner, then counter-clockwise).
    fn corners(self) -> [usize; 4] {
        match self {
            // Local +x is toward the seat centre column, +y toward the front.
            Quadrant::FrontLeft => [1, 0, 3, 4],
            Quadrant::FrontRight => [2, 1, 4, 5],
            Quadrant::BackLeft => [4, 3, 6, 7],
            Quadrant::BackRight => [5, 4, 7, 8],
        }
    }

    /// Centre of this quadrant relative to the seat centre, in units of
    /// the plate corner distances.
    fn centre(self, geom: &PlateGeometry) -> Coord {
        let (sx, sy) = match self {
            Quadrant::FrontLeft => (-1.0, 1.0),
            Quadrant::FrontRight => (1.0, 1.0),
            Quadrant::BackLeft => (-1.0, -1.0),
            Quadrant::BackRight => (1.0, -1.0),
        };
        Coord {
            x: sx * geom.dx,
            y: sy * geom.dy,
        }
    }
}

/// Persisted mat calibration: per-cell baselines plus the presence
/// threshold derived from the baseline mean.
///
/// `calibrated` is only set by a completed calibration pass; a default
/// offset loaded from an empty store is invalid.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MatOffset {
    pub cell_baseline: [u16; CELL_COUNT],
    pub total_mean: f32,
    pub detection_threshold: f32,
    pub calibrated: bool,
}

impl MatOffset {
    pub fn is_valid(&self) -> bool {
        self.calibrated
    }
}

/// Rearrange a scan from ADC channel order into grid order.
pub fn rearrange_scan(scan: &[u16; CELL_COUNT]) -> [u16; CELL_COUNT] {
    let mut grid = [0u16; CELL_COUNT];
    for (channel, &raw) in scan.iter().enumerate() {
        grid[CHANNEL_TO_CELL[channel]] = raw;
    }
    grid
}

/// Accumulates raw scans for a mat calibration pass.
pub struct MatCalibration {
    sums: [u32; CELL_COUNT],
    count: u16,
    target: u16,
    margin: f32,
}

impl MatCalibration {
    pub fn new(iterations: u16, detection_margin: f32) -> Self {
        Self {
            sums: [0; CELL_COUNT],
            count: 0,
            target: iterations,
            margin: detection_margin,
        }
    }

    /// Feed one full raw scan (already in grid order). Returns the
    /// finished offset once the configured iteration count is reached.
    pub fn push_scan(&mut self, scan: &[u16; CELL_COUNT]) -> Option<MatOffset> {
        for (sum, &raw) in self.sums.iter_mut().zip(scan.iter()) {
            *sum += u32::from(raw);
        }
        self.count += 1;

        if self.count < self.target {
            return None;
        }

        let n = u32::from(self.count);
        let mut baseline = [0u16; CELL_COUNT];
        let mut total = 0.0f32;
        for (cell, sum) in baseline.iter_mut().zip(self.sums.iter()) {
            *cell = (sum / n) as u16;
            total += (sum / n) as f32;
        }
        let total_mean = total / CELL_COUNT as f32;

        Some(MatOffset {
            cell_baseline: baseline,
            total_mean,
            detection_threshold: total_mean * self.margin,
            calibrated: true,
        })
    }
}

/// Result of one pressure-field computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PressureField {
    /// Per-quadrant plate outputs.
    pub quadrants: [ForcePlate; Quadrant::COUNT],
    /// Global plate built from the four quadrant plates.
    pub global: ForcePlate,
}

impl PressureField {
    /// Per-quadrant centre-of-pressure coordinates, in telemetry order.
    pub fn quadrant_cops(&self) -> [Coord; Quadrant::COUNT] {
        [
            self.quadrants[0].cop,
            self.quadrants[1].cop,
            self.quadrants[2].cop,
            self.quadrants[3].cop,
        ]
    }
}

/// The pressure-field processor: latest samples, calibration baseline,
/// and the most recent field analysis.
pub struct PressureMat {
    cells: [u16; CELL_COUNT],
    offset: MatOffset,
    geometry: PlateGeometry,
    field: PressureField,
    prev_quadrant_cops: [Coord; Quadrant::COUNT],
    prev_global_cop: Coord,
}

impl PressureMat {
    pub fn new(geometry: PlateGeometry) -> Self {
        Self {
            cells: [0; CELL_COUNT],
            offset: MatOffset::default(),
            geometry,
            field: PressureField::default(),
            prev_quadrant_cops: [Coord::default(); Quadrant::COUNT],
            prev_global_cop: Coord::default(),
        }
    }

    /// Install a calibration baseline (from a completed pass or the
    /// persisted store). An invalid offset leaves the mat uncalibrated.
    pub fn set_offset(&mut self, offset: MatOffset) {
        self.offset = offset;
    }

    pub fn offset(&self) -> &MatOffset {
        &self.offset
    }

    pub fn is_calibrated(&self) -> bool {
        self.offset.is_valid()
    }

    /// Store one cell's latest raw reading, rearranging from ADC channel
    /// order to grid order.
    pub fn set_sample(&mut self, channel: usize, raw: u16) {
        if let Some(&cell) = CHANNEL_TO_CELL.get(channel) {
            self.cells[cell] = raw;
        }
    }

    /// Store a full scan delivered in ADC channel order.
    pub fn set_scan(&mut self, scan: &[u16; CELL_COUNT]) {
        for (channel, &raw) in scan.iter().enumerate() {
            self.set_sample(channel, raw);
        }
    }

    /// Offset-subtracted reading of one grid cell.
    fn net(&self, cell: usize) -> f32 {
        f32::from(self.cells[cell].saturating_sub(self.offset.cell_baseline[cell]))
    }

    /// Presence: mean of the calibrated cell readings against the
    /// detection threshold. Always `false` before calibration.
    pub fn is_user_detected(&self) -> bool {
        if !self.offset.is_valid() {
            return false;
        }
        let sum: f32 = (0..CELL_COUNT).map(|i| self.net(i)).sum();
        sum / CELL_COUNT as f32 > self.offset.detection_threshold
    }

    /// Run the force-plate analysis over the current samples.
    ///
    /// The global plate treats the four quadrant plates' vertical forces
    /// as corner signals at the quadrant centres, so the same analysis
    /// applies recursively.
    pub fn compute_force_plates(&mut self) -> PressureField {
        let mut quadrants = [ForcePlate::default(); Quadrant::COUNT];
        for q in Quadrant::ALL {
            let corners = q.corners().map(|cell| self.net(cell));
            let plate = ForcePlate::analyse(corners, &self.geometry, self.prev_quadrant_cops[q as usize]);
            self.prev_quadrant_cops[q as usize] = plate.cop;
            quadrants[q as usize] = plate;
        }

        // Global corner order (+x+y first, counter-clockwise):
        // FrontRight, FrontLeft, BackLeft, BackRight.
        let global_corners = [
            quadrants[Quadrant::FrontRight as usize].fz,
            quadrants[Quadrant::FrontLeft as usize].fz,
            quadrants[Quadrant::BackLeft as usize].fz,
            quadrants[Quadrant::BackRight as usize].fz,
        ];
        let global_geom = PlateGeometry {
            dx: Quadrant::FrontRight.centre(&self.geometry).x,
            dy: Quadrant::FrontRight.centre(&self.geometry).y,
            dz: self.geometry.dz,
        };
        let global = ForcePlate::analyse(global_corners, &global_geom, self.prev_global_cop);
        self.prev_global_cop = global.cop;

        self.field = PressureField { quadrants, global };
        self.field
    }

    /// Most recent field analysis (unchanged until the next
    /// [`compute_force_plates`](Self::compute_force_plates)).
    pub fn field(&self) -> &PressureField {
        &self.field
    }

    pub fn centre_of_pressure(&self) -> Coord {
        self.field.global.cop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom() -> PlateGeometry {
        PlateGeometry {
            dx: 4.0,
            dy: 4.0,
            dz: 2.0,
        }
    }

    fn calibrated_mat(baseline: u16) -> PressureMat {
        let mut cal = MatCalibration::new(5, 0.15);
        let mut offset = None;
        for _ in 0..5 {
            offset = cal.push_scan(&[baseline; CELL_COUNT]);
        }
        let mut mat = PressureMat::new(geom());
        mat.set_offset(offset.unwrap());
        mat
    }

    #[test]
    fn calibration_completes_after_configured_iterations() {
        let mut cal = MatCalibration::new(3, 0.15);
        assert!(cal.push_scan(&[100; CELL_COUNT]).is_none());
        assert!(cal.push_scan(&[100; CELL_COUNT]).is_none());
        let offset = cal.push_scan(&[100; CELL_COUNT]).unwrap();
        assert!(offset.is_valid());
        assert_eq!(offset.cell_baseline, [100; CELL_COUNT]);
        assert!((offset.total_mean - 100.0).abs() < 1e-3);
        assert!((offset.detection_threshold - 15.0).abs() < 1e-3);
    }

    #[test]
    fn uncalibrated_mat_never_detects() {
        let mut mat = PressureMat::new(geom());
        mat.set_scan(&[4000; CELL_COUNT]);
        assert!(!mat.is_user_detected());
    }

    #[test]
    fn presence_above_threshold() {
        let mut mat = calibrated_mat(100);
        // Baseline only: net mean 0, below threshold 15.
        mat.set_scan(&[100; CELL_COUNT]);
        assert!(!mat.is_user_detected());
        // Someone sits down.
        mat.set_scan(&[400; CELL_COUNT]);
        assert!(mat.is_user_detected());
    }

    #[test]
    fn permutation_routes_channels_to_cells() {
        let mut mat = PressureMat::new(geom());
        mat.set_sample(0, 1234);
        // Channel 0 is wired to the grid centre.
        assert_eq!(mat.cells[4], 1234);
        mat.set_sample(2, 77);
        assert_eq!(mat.cells[0], 77);
    }

    #[test]
    fn permutation_is_a_bijection() {
        let mut seen = [false; CELL_COUNT];
        for &cell in &CHANNEL_TO_CELL {
            assert!(!seen[cell], "cell {cell} mapped twice");
            seen[cell] = true;
        }
    }

    #[test]
    fn baseline_load_keeps_cop_defined() {
        let mut mat = calibrated_mat(100);
        mat.set_scan(&[100; CELL_COUNT]);
        let field = mat.compute_force_plates();
        // Fz ≈ 0 everywhere: COP must be the previous value (origin), not NaN.
        assert!(field.global.cop.x.is_finite());
        assert_eq!(field.global.cop, Coord::default());
        for plate in &field.quadrants {
            assert!(plate.cop.x.is_finite() && plate.cop.y.is_finite());
        }
    }

    #[test]
    fn cop_retained_after_user_leaves() {
        let mut mat = calibrated_mat(100);
        // Load the front-right of the mat (grid cells 1, 2, 4, 5).
        let mut scan = [100u16; CELL_COUNT];
        for channel in 0..CELL_COUNT {
            let cell = CHANNEL_TO_CELL[channel];
            if matches!(cell, 1 | 2 | 4 | 5) {
                scan[channel] = 900;
            }
        }
        mat.set_scan(&scan);
        let loaded = mat.compute_force_plates();
        assert!(loaded.global.cop.x > 0.0);
        assert!(loaded.global.cop.y > 0.0);

        // User stands up: COP holds its last value.
        mat.set_scan(&[100; CELL_COUNT]);
        let empty = mat.compute_force_plates();
        assert_eq!(empty.global.cop, loaded.global.cop);
    }

    #[test]
    fn centred_load_gives_centred_cop() {
        let mut mat = calibrated_mat(100);
        mat.set_scan(&[600; CELL_COUNT]);
        let field = mat.compute_force_plates();
        assert!(field.global.cop.x.abs() < 1e-3);
        assert!(field.global.cop.y.abs() < 1e-3);
    }

    #[test]
    fn offset_roundtrip_preserves_detection() {
        let mut cal = MatCalibration::new(4, 0.15);
        let mut offset = None;
        for _ in 0..4 {
            offset = cal.push_scan(&[120; CELL_COUNT]);
        }
        let offset = offset.unwrap();

        let bytes = postcard::to_allocvec(&offset).unwrap();
        let restored: MatOffset = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(offset, restored);

        let mut live = PressureMat::new(geom());
        live.set_offset(offset);
        let mut reloaded = PressureMat::new(geom());
        reloaded.set_offset(restored);

        for scan in [[120u16; CELL_COUNT], [500; CELL_COUNT], [130; CELL_COUNT]] {
            live.set_scan(&scan);
            reloaded.set_scan(&scan);
            assert_eq!(live.is_user_detected(), reloaded.is_user_detected());
        }
    }
}
