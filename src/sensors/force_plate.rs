//! Force-plate signal model.
//!
//! Each plate is four vertical-force cells at the corners of a rectangle.
//! Paired corner signals give the lateral channels, the corner forces give
//! the vertical channel, and moments follow from the fixed mounting
//! geometry. Centre of pressure is the moment-to-force ratio per axis,
//! taken about the top mat surface (the `1` moments).
//!
//! Corner numbering, looking down at the plate:
//!
//! ```text
//!        +y (front)
//!   z2 ─────────── z1
//!    │             │       z1 at (+dx, +dy)
//!    │      ·      │       z2 at (-dx, +dy)
//!    │             │       z3 at (-dx, -dy)
//!   z3 ─────────── z4      z4 at (+dx, -dy)
//!        -y (back)
//! ```

use super::Coord;

/// Fz magnitudes below this are "nobody on the plate": the centre of
/// pressure is carried over from the previous cycle instead of being
/// computed from a near-zero denominator.
pub const FZ_EPSILON: f32 = 1.0;

/// Fixed mounting geometry shared by every plate.
#[derive(Debug, Clone, Copy)]
pub struct PlateGeometry {
    /// Corner distance from plate centre along X (cm).
    pub dx: f32,
    /// Corner distance from plate centre along Y (cm).
    pub dy: f32,
    /// Height of the mat surface above the sensing plane (cm).
    pub dz: f32,
}

/// Output signals of one analysed plate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForcePlate {
    /// Medio-lateral force channel.
    pub fx: f32,
    /// Anterior-posterior force channel.
    pub fy: f32,
    /// Vertical force.
    pub fz: f32,
    /// Moment about the X axis.
    pub mx: f32,
    /// Moment about the Y axis.
    pub my: f32,
    /// Moment about the Z axis.
    pub mz: f32,
    /// Moment along X about the top plate surface.
    pub mx1: f32,
    /// Moment along Y about the top plate surface.
    pub my1: f32,
    /// Point where the resultant vertical force acts.
    pub cop: Coord,
}

impl ForcePlate {
    /// Analyse one plate from its four corner forces.
    ///
    /// `prev_cop` is returned unchanged when `fz` is below [`FZ_EPSILON`];
    /// the first valid reading starts from (0, 0).
    pub fn analyse(corners: [f32; 4], geom: &PlateGeometry, prev_cop: Coord) -> Self {
        let [z1, z2, z3, z4] = corners;

        // Paired corner signals along each lateral axis.
        let fy12 = z1 + z2; // front pair
        let fy34 = z3 + z4; // back pair
        let fx14 = z1 + z4; // right pair
        let fx23 = z2 + z3; // left pair

        let fx = fx14 - fx23;
        let fy = fy12 - fy34;
        let fz = z1 + z2 + z3 + z4;

        let mx = geom.dy * (z1 + z2 - z3 - z4);
        let my = geom.dx * (-z1 + z2 + z3 - z4);
        let mz = geom.dx * (fy12 - fy34) - geom.dy * (fx14 - fx23);

        let mx1 = mx + fy * geom.dz;
        let my1 = my - fx * geom.dz;

        let cop = if fz.abs() < FZ_EPSILON {
            prev_cop
        } else {
            Coord {
                x: -my1 / fz,
                y: mx1 / fz,
            }
        };

        Self {
            fx,
            fy,
            fz,
            mx,
            my,
            mz,
            mx1,
            my1,
            cop,
        }
    }
}
