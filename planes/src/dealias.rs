//! Spectral zero-padding for the 3/2 dealiasing rule.
//!
//! A quadratic nonlinearity evaluated pointwise on an `n`-mode grid aliases
//! modes above `2n/3` back into the resolved range. Padding both operands to
//! `3n/2` modes before the product and truncating afterwards removes those
//! aliases exactly.
//!
//! Because the transforms are unnormalized, a coefficient describing the same
//! function at a larger resolution must grow by the element-count ratio; both
//! directions apply that rescale.

use transforms::{Complex, exec};

use crate::plane_data::{PlaneData, Representation};

/// The 3/2-rule padded resolution. Requires even extents so the padded
/// resolution is an integer.
pub fn padded_resolution(resolution: [usize; 2]) -> [usize; 2] {
    let [nx, ny] = resolution;
    assert!(
        nx % 2 == 0 && ny % 2 == 0,
        "odd resolution {nx}x{ny} not supported for dealiasing"
    );
    [nx * 3 / 2, ny * 3 / 2]
}

/// Zero-pads `src` to the 3/2 resolution. The result belongs to the aliased
/// transform family and is spectral-only.
pub fn scale_up(src: &PlaneData) -> PlaneData {
    scale_up_to(src, padded_resolution(src.resolution()))
}

/// Zero-pads `src` to an arbitrary larger resolution.
///
/// Rows split into the non-negative and negative y-frequency blocks; the
/// negative block keeps its distance from the top so wrapped frequencies are
/// preserved. Columns of the half spectrum copy directly since the x
/// frequency equals the column index.
pub fn scale_up_to(src: &PlaneData, resolution: [usize; 2]) -> PlaneData {
    let [src_nx, src_ny] = src.resolution();
    let [dst_nx, dst_ny] = resolution;
    assert!(
        dst_nx >= src_nx && dst_ny >= src_ny,
        "cannot scale up {src_nx}x{src_ny} to {dst_nx}x{dst_ny}"
    );

    let mut dst: PlaneData = PlaneData::new_aliased(resolution);
    let spectrum = src.spectral_cow();
    let src_sw: usize = src_nx / 2 + 1;
    let dst_sw: usize = dst_nx / 2 + 1;
    let half: usize = src_ny / 2;
    let row_shift: usize = dst_ny - src_ny;
    let scale: f64 = (dst_nx * dst_ny) as f64 / (src_nx * src_ny) as f64;

    let spectrum: &[Complex<f64>] = &spectrum;
    exec::policy().for_each_chunk(&mut dst.spectral, dst_sw, |j, row| {
        let sj: usize = if j < half {
            j
        } else if j >= dst_ny - (src_ny - half) {
            j - row_shift
        } else {
            row.iter_mut().for_each(|c| *c = Complex::new(0.0, 0.0));
            return;
        };
        let src_row: &[Complex<f64>] = &spectrum[sj * src_sw..(sj + 1) * src_sw];
        row[..src_sw]
            .iter_mut()
            .zip(src_row.iter())
            .for_each(|(d, s)| *d = s * scale);
        row[src_sw..]
            .iter_mut()
            .for_each(|c| *c = Complex::new(0.0, 0.0));
    });
    dst.state = Representation::SpectralOnly;
    dst
}

/// Truncates `src` back to `resolution`, dropping the padded modes. Inverse
/// of [`scale_up_to`] on fields whose padded modes are zero.
pub fn scale_down(src: &PlaneData, resolution: [usize; 2]) -> PlaneData {
    let [src_nx, src_ny] = src.resolution();
    let [dst_nx, dst_ny] = resolution;
    assert!(
        dst_nx <= src_nx && dst_ny <= src_ny,
        "cannot scale down {src_nx}x{src_ny} to {dst_nx}x{dst_ny}"
    );

    let mut dst: PlaneData = PlaneData::new(resolution);
    let spectrum = src.spectral_cow();
    let src_sw: usize = src_nx / 2 + 1;
    let dst_sw: usize = dst_nx / 2 + 1;
    let half: usize = dst_ny / 2;
    let row_shift: usize = src_ny - dst_ny;
    let scale: f64 = (dst_nx * dst_ny) as f64 / (src_nx * src_ny) as f64;

    let spectrum: &[Complex<f64>] = &spectrum;
    exec::policy().for_each_chunk(&mut dst.spectral, dst_sw, |j, row| {
        let sj: usize = if j < half { j } else { j + row_shift };
        let src_row: &[Complex<f64>] = &spectrum[sj * src_sw..sj * src_sw + dst_sw];
        row.iter_mut()
            .zip(src_row.iter())
            .for_each(|(d, s)| *d = s * scale);
    });
    dst.state = Representation::SpectralOnly;
    dst
}
