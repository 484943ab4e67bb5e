use std::sync::Arc;

use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::exec;

/// Executable transform plans for one `(resolution, aliased)` family.
///
/// The 2D real transform is split into a real-to-complex pass along x (rows)
/// and a full complex pass along y (columns). The spectral layout is the
/// r2c convention: `ny` rows of `nx/2 + 1` complex values, row-major, with
/// wrapped (positive then negative) frequencies along y.
///
/// Plans are expensive to build and cheap to execute; they are shared across
/// all fields of equal resolution through the registry.
pub struct FourierPlans {
    resolution: [usize; 2],
    aliased: bool,
    row_forward: Arc<dyn RealToComplex<f64>>,
    row_backward: Arc<dyn ComplexToReal<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_backward: Arc<dyn Fft<f64>>,
}

impl FourierPlans {
    pub(crate) fn create(resolution: [usize; 2], aliased: bool) -> Self {
        let [nx, ny] = resolution;
        assert!(
            nx > 0 && ny > 0,
            "cannot create transform plans for empty resolution {nx}x{ny}"
        );

        let mut real_planner: RealFftPlanner<f64> = RealFftPlanner::new();
        let mut complex_planner: FftPlanner<f64> = FftPlanner::new();

        Self {
            resolution,
            aliased,
            row_forward: real_planner.plan_fft_forward(nx),
            row_backward: real_planner.plan_fft_inverse(nx),
            col_forward: complex_planner.plan_fft_forward(ny),
            col_backward: complex_planner.plan_fft_inverse(ny),
        }
    }

    pub fn resolution(&self) -> [usize; 2] {
        self.resolution
    }

    pub fn aliased(&self) -> bool {
        self.aliased
    }

    /// Number of real values in the physical representation.
    pub fn physical_len(&self) -> usize {
        self.resolution[0] * self.resolution[1]
    }

    /// Half-spectrum width along x (`nx/2 + 1`).
    pub fn spectral_width(&self) -> usize {
        self.resolution[0] / 2 + 1
    }

    /// Number of complex values in the spectral representation.
    pub fn spectral_len(&self) -> usize {
        self.spectral_width() * self.resolution[1]
    }

    /// Physical -> spectral, unnormalized. The physical input is preserved;
    /// rows are staged through scratch because the r2c pass consumes its
    /// input buffer.
    pub fn forward(&self, physical: &[f64], spectral: &mut [Complex<f64>]) {
        let [nx, ny] = self.resolution;
        let sw: usize = self.spectral_width();
        assert_eq!(physical.len(), self.physical_len());
        assert_eq!(spectral.len(), self.spectral_len());

        let policy = exec::policy();

        policy.for_each_chunk(spectral, sw, |j, spec_row| {
            let mut row: Vec<f64> = physical[j * nx..(j + 1) * nx].to_vec();
            self.row_forward
                .process(&mut row, spec_row)
                .unwrap_or_else(|e| {
                    panic!("forward r2c plan for resolution {nx}x{ny} failed: {e}")
                });
        });

        self.column_pass(spectral, &self.col_forward);
    }

    /// Spectral -> physical. Destructive: the column pass and the c2r pass
    /// consume the spectral input, so its contents are garbage afterwards.
    /// The physical output carries the `1/(nx*ny)` normalization.
    pub fn backward(&self, spectral: &mut [Complex<f64>], physical: &mut [f64]) {
        let [nx, ny] = self.resolution;
        let sw: usize = self.spectral_width();
        assert_eq!(physical.len(), self.physical_len());
        assert_eq!(spectral.len(), self.spectral_len());

        self.column_pass(spectral, &self.col_backward);

        let policy = exec::policy();
        let spectral_ref: &[Complex<f64>] = spectral;

        policy.for_each_chunk(physical, nx, |j, phys_row| {
            let mut spec_row: Vec<Complex<f64>> = spectral_ref[j * sw..(j + 1) * sw].to_vec();
            // The c2r pass requires exactly-zero imaginary parts at the DC
            // and Nyquist bins; after the column pass they only hold rounding
            // residue of a Hermitian spectrum.
            spec_row[0].im = 0.0;
            if nx % 2 == 0 {
                spec_row[sw - 1].im = 0.0;
            }
            self.row_backward
                .process(&mut spec_row, phys_row)
                .unwrap_or_else(|e| {
                    panic!("backward c2r plan for resolution {nx}x{ny} failed: {e}")
                });
        });

        let scale: f64 = 1.0 / (nx * ny) as f64;
        policy.for_each_indexed(physical, |_, x| *x *= scale);
    }

    /// Complex transform of every spectral column, staged through a
    /// transposed scratch buffer so columns become contiguous.
    fn column_pass(&self, spectral: &mut [Complex<f64>], fft: &Arc<dyn Fft<f64>>) {
        let ny: usize = self.resolution[1];
        if ny == 1 {
            return;
        }
        let sw: usize = self.spectral_width();
        let policy = exec::policy();

        let mut columns: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); sw * ny];
        {
            let spectral_ref: &[Complex<f64>] = spectral;
            policy.for_each_chunk(&mut columns, ny, |i, col| {
                col.iter_mut()
                    .enumerate()
                    .for_each(|(j, c)| *c = spectral_ref[j * sw + i]);
                fft.process(col);
            });
        }
        policy.for_each_chunk(spectral, sw, |j, row| {
            row.iter_mut()
                .enumerate()
                .for_each(|(i, c)| *c = columns[i * ny + j]);
        });
    }
}
