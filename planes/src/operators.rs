//! Differential, averaging and shift operators over periodic plane fields.
//!
//! Every operator is itself a [`PlaneData`] holding per-mode multipliers, so
//! application is always one spectral product regardless of how the operator
//! was built. Finite-difference operators start as a 3x3 stencil embedded in
//! physical space with periodic wrap-around and are transformed once at
//! construction; spectral operators are populated analytically.

use std::f64::consts::PI;

use crate::plane_data::PlaneData;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatorMode {
    FiniteDifference,
    Spectral,
}

/// Embeds a 3x3 stencil as a convolution kernel.
///
/// Row 0 of `kernel` addresses the higher-y neighbor and column 2 the
/// higher-x neighbor. Under the convolution theorem the kernel must be
/// mirrored in x and wrapped around the periodic origin, so entry `(j, i)`
/// lands at grid cell `((ny + j - 1) % ny, (nx + i - 1) % nx)` after the
/// mirror. The result is transformed immediately; applying it later is a
/// spectral multiply like any other operator.
pub fn kernel_operator(resolution: [usize; 2], kernel: [[f64; 3]; 3], scale: f64) -> PlaneData {
    let [nx, ny] = resolution;
    assert!(
        nx >= 3 && ny >= 3,
        "stencil operators need at least a 3x3 grid, got {nx}x{ny}"
    );

    let mut op: PlaneData = PlaneData::new(resolution);
    for j in 0..3 {
        for i in 0..3 {
            let value: f64 = kernel[j][2 - i] * scale;
            if value != 0.0 {
                op.set((ny + j - 1) % ny, (nx + i - 1) % nx, value);
            }
        }
    }
    op.request_spectral();
    op
}

/// First or second derivative along one axis.
///
/// Spectral first derivatives put `i*k*2pi/extent` on each mode; the
/// half-spectrum layout stores only non-negative x frequencies, so along x
/// every stored column takes the positive sign while along y the wrapped
/// negative rows mirror with flipped sign. The Nyquist mode is forced to
/// zero since a first derivative has no usable phase there. Second
/// derivatives are the real, symmetric `-(k*2pi/extent)^2`, Nyquist
/// included.
pub fn build_difference(
    resolution: [usize; 2],
    axis: Axis,
    order: u32,
    domain_extent: f64,
    mode: OperatorMode,
) -> PlaneData {
    assert!(
        order == 1 || order == 2,
        "only first and second differences are supported, got order {order}"
    );

    match mode {
        OperatorMode::FiniteDifference => {
            let n: usize = match axis {
                Axis::X => resolution[0],
                Axis::Y => resolution[1],
            };
            let h: f64 = domain_extent / n as f64;
            let (kernel, scale): ([[f64; 3]; 3], f64) = match (axis, order) {
                (Axis::X, 1) => ([[0., 0., 0.], [-1., 0., 1.], [0., 0., 0.]], 1.0 / (2.0 * h)),
                (Axis::Y, 1) => ([[0., 1., 0.], [0., 0., 0.], [0., -1., 0.]], 1.0 / (2.0 * h)),
                (Axis::X, _) => ([[0., 0., 0.], [1., -2., 1.], [0., 0., 0.]], 1.0 / (h * h)),
                (Axis::Y, _) => ([[0., 1., 0.], [0., -2., 0.], [0., 1., 0.]], 1.0 / (h * h)),
            };
            kernel_operator(resolution, kernel, scale)
        }
        OperatorMode::Spectral => match (axis, order) {
            (Axis::X, 1) => spectral_first_x(resolution, domain_extent),
            (Axis::Y, 1) => spectral_first_y(resolution, domain_extent),
            (_, _) => spectral_second(resolution, axis, domain_extent),
        },
    }
}

fn spectral_first_x(resolution: [usize; 2], domain_extent: f64) -> PlaneData {
    let [nx, ny] = resolution;
    let mut op: PlaneData = PlaneData::new(resolution);
    op.set_all_spectral(0.0, 0.0);
    let unit: f64 = 2.0 * PI / domain_extent;
    for row in 0..ny {
        // Column nx/2 is the x Nyquist mode and stays zero.
        for col in 0..nx / 2 {
            op.set_spectral(row, col, 0.0, col as f64 * unit);
        }
    }
    op
}

fn spectral_first_y(resolution: [usize; 2], domain_extent: f64) -> PlaneData {
    let [nx, ny] = resolution;
    let mut op: PlaneData = PlaneData::new(resolution);
    op.set_all_spectral(0.0, 0.0);
    let unit: f64 = 2.0 * PI / domain_extent;
    // Rows 0 (DC) and ny/2 (Nyquist) stay zero; wrapped negative rows flip
    // the sign so Hermitian symmetry along y is preserved.
    for k in 1..ny / 2 {
        for col in 0..nx / 2 {
            op.set_spectral(k, col, 0.0, k as f64 * unit);
            op.set_spectral(ny - k, col, 0.0, -(k as f64) * unit);
        }
    }
    op
}

fn spectral_second(resolution: [usize; 2], axis: Axis, domain_extent: f64) -> PlaneData {
    let [nx, ny] = resolution;
    let mut op: PlaneData = PlaneData::new(resolution);
    op.set_all_spectral(0.0, 0.0);
    let unit: f64 = 2.0 * PI / domain_extent;
    for row in 0..ny {
        for col in 0..nx / 2 + 1 {
            let k: f64 = match axis {
                Axis::X => col as f64,
                Axis::Y => {
                    if row <= ny / 2 {
                        row as f64
                    } else {
                        row as f64 - ny as f64
                    }
                }
            };
            let w: f64 = k * unit;
            op.set_spectral(row, col, -(w * w), 0.0);
        }
    }
    op
}

/// The full operator bank for one resolution and domain size.
///
/// Central first and second derivatives honor the requested mode; one-sided
/// differences, averages and unit shifts are inherently stencil-shaped and
/// are always built from kernels.
pub struct PlaneOperators {
    pub diff_c_x: PlaneData,
    pub diff_c_y: PlaneData,

    pub diff_f_x: PlaneData,
    pub diff_f_y: PlaneData,
    pub diff_b_x: PlaneData,
    pub diff_b_y: PlaneData,

    pub diff2_c_x: PlaneData,
    pub diff2_c_y: PlaneData,

    pub avg_f_x: PlaneData,
    pub avg_f_y: PlaneData,
    pub avg_b_x: PlaneData,
    pub avg_b_y: PlaneData,

    pub shift_left: PlaneData,
    pub shift_right: PlaneData,
    pub shift_up: PlaneData,
    pub shift_down: PlaneData,
}

impl PlaneOperators {
    pub fn new(resolution: [usize; 2], domain_size: [f64; 2], mode: OperatorMode) -> Self {
        let [nx, ny] = resolution;
        let hx: f64 = domain_size[0] / nx as f64;
        let hy: f64 = domain_size[1] / ny as f64;

        Self {
            diff_c_x: build_difference(resolution, Axis::X, 1, domain_size[0], mode),
            diff_c_y: build_difference(resolution, Axis::Y, 1, domain_size[1], mode),

            diff_f_x: kernel_operator(
                resolution,
                [[0., 0., 0.], [0., -1., 1.], [0., 0., 0.]],
                1.0 / hx,
            ),
            diff_f_y: kernel_operator(
                resolution,
                [[0., 1., 0.], [0., -1., 0.], [0., 0., 0.]],
                1.0 / hy,
            ),
            diff_b_x: kernel_operator(
                resolution,
                [[0., 0., 0.], [-1., 1., 0.], [0., 0., 0.]],
                1.0 / hx,
            ),
            diff_b_y: kernel_operator(
                resolution,
                [[0., 0., 0.], [0., 1., 0.], [0., -1., 0.]],
                1.0 / hy,
            ),

            diff2_c_x: build_difference(resolution, Axis::X, 2, domain_size[0], mode),
            diff2_c_y: build_difference(resolution, Axis::Y, 2, domain_size[1], mode),

            avg_f_x: kernel_operator(resolution, [[0., 0., 0.], [0., 1., 1.], [0., 0., 0.]], 0.5),
            avg_f_y: kernel_operator(resolution, [[0., 1., 0.], [0., 1., 0.], [0., 0., 0.]], 0.5),
            avg_b_x: kernel_operator(resolution, [[0., 0., 0.], [1., 1., 0.], [0., 0., 0.]], 0.5),
            avg_b_y: kernel_operator(resolution, [[0., 0., 0.], [0., 1., 0.], [0., 1., 0.]], 0.5),

            shift_left: kernel_operator(resolution, [[0., 0., 0.], [0., 0., 1.], [0., 0., 0.]], 1.0),
            shift_right: kernel_operator(resolution, [[0., 0., 0.], [1., 0., 0.], [0., 0., 0.]], 1.0),
            shift_up: kernel_operator(resolution, [[0., 0., 0.], [0., 0., 0.], [0., 1., 0.]], 1.0),
            shift_down: kernel_operator(resolution, [[0., 1., 0.], [0., 0., 0.], [0., 0., 0.]], 1.0),
        }
    }

    /// Laplacian, a plain sum of the two second-derivative operators.
    pub fn laplace(&self, a: &PlaneData) -> PlaneData {
        self.diff2_c_x.apply(a) + self.diff2_c_y.apply(a)
    }

    /// Sum of the two first-derivative operators.
    pub fn diff_dot(&self, a: &PlaneData) -> PlaneData {
        self.diff_c_x.apply(a) + self.diff_c_y.apply(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transforms::Complex;

    const TAU: f64 = 2.0 * PI;

    fn sampled(resolution: [usize; 2], f: impl Fn(f64, f64) -> f64) -> PlaneData {
        let [nx, ny] = resolution;
        let mut a: PlaneData = PlaneData::new(resolution);
        for row in 0..ny {
            for col in 0..nx {
                a.set(row, col, f(col as f64 / nx as f64, row as f64 / ny as f64));
            }
        }
        a
    }

    fn assert_matches(a: &PlaneData, f: impl Fn(f64, f64) -> f64, tol: f64) {
        let [nx, ny] = a.resolution();
        let data = a.physical_cow();
        for row in 0..ny {
            for col in 0..nx {
                let expected: f64 = f(col as f64 / nx as f64, row as f64 / ny as f64);
                let got: f64 = data[row * nx + col];
                assert!(
                    (got - expected).abs() < tol,
                    "({row},{col}): {got} != {expected}"
                );
            }
        }
    }

    #[test]
    fn spectral_derivative_of_a_constant_is_exactly_zero() {
        let op: PlaneData =
            build_difference([8, 8], Axis::X, 1, 1.0, OperatorMode::Spectral);
        let mut a: PlaneData = PlaneData::new([8, 8]);
        a.set_all(1.0);

        let d: PlaneData = op.apply(&a);
        for row in 0..8 {
            for col in 0..d.spectral_width() {
                assert_eq!(d.get_spectral(row, col), Complex::new(0.0, 0.0));
            }
        }
    }

    #[test]
    fn spectral_first_derivatives_are_exact_on_resolved_modes() {
        let ops: PlaneOperators = PlaneOperators::new([16, 16], [1.0, 1.0], OperatorMode::Spectral);
        let a: PlaneData = sampled([16, 16], |x, y| (TAU * x).sin() * (2.0 * TAU * y).cos());

        let dx: PlaneData = ops.diff_c_x.apply(&a);
        assert_matches(&dx, |x, y| TAU * (TAU * x).cos() * (2.0 * TAU * y).cos(), 1e-9);

        let dy: PlaneData = ops.diff_c_y.apply(&a);
        assert_matches(
            &dy,
            |x, y| -2.0 * TAU * (TAU * x).sin() * (2.0 * TAU * y).sin(),
            1e-9,
        );
    }

    #[test]
    fn laplacian_matches_the_analytic_eigenvalue() {
        let ops: PlaneOperators = PlaneOperators::new([16, 16], [1.0, 1.0], OperatorMode::Spectral);
        let a: PlaneData = sampled([16, 16], |x, y| (TAU * x).sin() * (TAU * y).sin());

        // sin(2pi x) sin(2pi y) is a Laplace eigenfunction with eigenvalue
        // -2 (2pi)^2.
        let lap: PlaneData = ops.laplace(&a);
        assert_matches(
            &lap,
            |x, y| -2.0 * TAU * TAU * (TAU * x).sin() * (TAU * y).sin(),
            1e-9,
        );
    }

    #[test]
    fn finite_difference_operator_reproduces_its_stencil() {
        let (nx, ny): (usize, usize) = (8, 8);
        let h: f64 = 1.0 / nx as f64;
        let ops: PlaneOperators =
            PlaneOperators::new([nx, ny], [1.0, 1.0], OperatorMode::FiniteDifference);
        let a: PlaneData = sampled([nx, ny], |x, y| (TAU * x).sin() + 0.3 * (TAU * y).cos());

        let mut dx: PlaneData = ops.diff_c_x.apply(&a);
        dx.request_physical();
        for row in 0..ny {
            for col in 0..nx {
                let east: f64 = a.get(row, (col + 1) % nx);
                let west: f64 = a.get(row, (col + nx - 1) % nx);
                let expected: f64 = (east - west) / (2.0 * h);
                assert!((dx.get(row, col) - expected).abs() < 1e-9, "({row},{col})");
            }
        }

        let mut d2y: PlaneData = ops.diff2_c_y.apply(&a);
        d2y.request_physical();
        for row in 0..ny {
            for col in 0..nx {
                let north: f64 = a.get((row + 1) % ny, col);
                let south: f64 = a.get((row + ny - 1) % ny, col);
                let expected: f64 = (north - 2.0 * a.get(row, col) + south) / (h * h);
                assert!((d2y.get(row, col) - expected).abs() < 1e-8, "({row},{col})");
            }
        }
    }

    #[test]
    fn shifts_move_by_exactly_one_cell() {
        let a: PlaneData = sampled([8, 8], |x, y| (TAU * x).sin() + 2.0 * (TAU * y).sin());
        let ops: PlaneOperators =
            PlaneOperators::new([8, 8], [1.0, 1.0], OperatorMode::FiniteDifference);

        let mut left: PlaneData = ops.shift_left.apply(&a);
        let mut up: PlaneData = ops.shift_up.apply(&a);
        left.request_physical();
        up.request_physical();
        for row in 0..8 {
            for col in 0..8 {
                let expected: f64 = a.get(row, (col + 1) % 8);
                assert!((left.get(row, col) - expected).abs() < 1e-11);
                let expected: f64 = a.get((row + 8 - 1) % 8, col);
                assert!((up.get(row, col) - expected).abs() < 1e-11);
            }
        }
    }

    #[test]
    fn averages_are_neighbor_midpoints() {
        let ops: PlaneOperators =
            PlaneOperators::new([8, 8], [1.0, 1.0], OperatorMode::FiniteDifference);
        let a: PlaneData = sampled([8, 8], |x, y| (TAU * x).cos() * (TAU * y).sin() + 0.5);

        let mut avg: PlaneData = ops.avg_f_x.apply(&a);
        avg.request_physical();
        for row in 0..8 {
            for col in 0..8 {
                let expected: f64 = 0.5 * (a.get(row, col) + a.get(row, (col + 1) % 8));
                assert!((avg.get(row, col) - expected).abs() < 1e-11);
            }
        }
    }

    #[test]
    fn first_derivative_nyquist_modes_are_zero() {
        let dx: PlaneData = build_difference([8, 8], Axis::X, 1, 1.0, OperatorMode::Spectral);
        for row in 0..8 {
            assert_eq!(dx.get_spectral(row, 4), Complex::new(0.0, 0.0));
        }

        let dy: PlaneData = build_difference([8, 8], Axis::Y, 1, 1.0, OperatorMode::Spectral);
        for col in 0..dy.spectral_width() {
            assert_eq!(dy.get_spectral(4, col), Complex::new(0.0, 0.0));
            assert_eq!(dy.get_spectral(0, col), Complex::new(0.0, 0.0));
        }

        // Second derivatives keep a real negative Nyquist value.
        let d2x: PlaneData = build_difference([8, 8], Axis::X, 2, 1.0, OperatorMode::Spectral);
        assert!(d2x.get_spectral(0, 4).re < 0.0);
    }

    #[test]
    fn operators_are_linear() {
        let ops: PlaneOperators = PlaneOperators::new([8, 8], [1.0, 1.0], OperatorMode::Spectral);
        let a: PlaneData = sampled([8, 8], |x, _| (TAU * x).sin());
        let b: PlaneData = sampled([8, 8], |x, y| (TAU * y).cos() - 0.25 * (TAU * x).cos());

        let lhs: PlaneData = ops.diff_c_x.apply(&(&a + &b));
        let rhs: PlaneData = ops.diff_c_x.apply(&a) + ops.diff_c_x.apply(&b);

        let l = lhs.physical_cow();
        let r = rhs.physical_cow();
        l.iter()
            .zip(r.iter())
            .for_each(|(x, y)| assert!((x - y).abs() < 1e-10));
    }
}
