//! Reference conversions through `palette`
//!
//! palette's D50 is `[0.96422, 1.0, 0.82521]`, slightly different from the
//! ICC D50 used by calverify. Comparisons pass [`PALETTE_D50`] explicitly.

use calverify_core::{Lab, Xyz};
use palette::color_difference::Ciede2000;
use palette::white_point::D50;
use palette::{FromColor, IntoColor};

/// palette's D50 white, Y = 1
pub const PALETTE_D50: Xyz = Xyz::new(0.96422, 1.0, 0.82521);

/// Lab → XYZ (Y = 1) via palette
pub fn lab_to_xyz(lab: Lab) -> Xyz {
    let lab = palette::Lab::<D50, f64>::new(lab.l, lab.a, lab.b);
    let xyz: palette::Xyz<D50, f64> = lab.into_color();
    Xyz::new(xyz.x, xyz.y, xyz.z)
}

/// XYZ (Y = 1) → Lab via palette
pub fn xyz_to_lab(xyz: Xyz) -> Lab {
    let lab = palette::Lab::<D50, f64>::from_color(palette::Xyz::<D50, f64>::new(xyz.x, xyz.y, xyz.z));
    Lab::new(lab.l, lab.a, lab.b)
}

/// CIEDE2000 via palette
pub fn ciede2000(reference: Lab, sample: Lab) -> f64 {
    let reference = palette::Lab::<D50, f64>::new(reference.l, reference.a, reference.b);
    let sample = palette::Lab::<D50, f64>::new(sample.l, sample.a, sample.b);
    reference.difference(sample)
}
