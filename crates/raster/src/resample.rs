//! Interpolation for resampling bands onto a common pixel grid.

use chip_common::ResampleMethod;

use crate::Raster;

/// Sample one band of a raster at a fractional pixel coordinate.
///
/// Coordinates outside the raster return NaN.
pub fn sample_at(raster: &Raster, band: usize, x: f64, y: f64, method: ResampleMethod) -> f32 {
    match method {
        ResampleMethod::Nearest => nearest(raster, band, x, y),
        ResampleMethod::Bilinear => bilinear(raster, band, x, y),
    }
}

fn nearest(raster: &Raster, band: usize, x: f64, y: f64) -> f32 {
    if x < -0.5 || y < -0.5 {
        return f32::NAN;
    }
    let col = x.round() as usize;
    let row = y.round() as usize;
    raster.sample(col, row, band)
}

fn bilinear(raster: &Raster, band: usize, x: f64, y: f64) -> f32 {
    if x < 0.0 || y < 0.0 || x > (raster.width - 1) as f64 || y > (raster.height - 1) as f64 {
        return f32::NAN;
    }

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(raster.width - 1);
    let y1 = (y0 + 1).min(raster.height - 1);

    let xf = (x - x0 as f64) as f32;
    let yf = (y - y0 as f64) as f32;

    let v00 = raster.sample(x0, y0, band);
    let v10 = raster.sample(x1, y0, band);
    let v01 = raster.sample(x0, y1, band);
    let v11 = raster.sample(x1, y1, band);

    // Any NaN corner poisons the interpolation; fall back to nearest so a
    // lone nodata pixel does not erode its whole neighborhood.
    if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
        return nearest(raster, band, x, y);
    }

    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    top * (1.0 - yf) + bottom * yf
}
