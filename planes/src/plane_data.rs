use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use transforms::{Complex, ExecPolicy, FourierPlans, TransformRegistry, exec};

/// Which of the two representations currently reflects the field's value.
///
/// The `{Neither}` state is unrepresentable: a freshly constructed field is
/// zero-initialized and starts `PhysicalOnly`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Representation {
    PhysicalOnly,
    SpectralOnly,
    Both,
}

impl Representation {
    pub fn has_physical(self) -> bool {
        matches!(self, Representation::PhysicalOnly | Representation::Both)
    }

    pub fn has_spectral(self) -> bool {
        matches!(self, Representation::SpectralOnly | Representation::Both)
    }
}

/// One scalar field over a periodic Cartesian plane, backed by a physical
/// (grid-point) buffer and a spectral (Fourier-mode) buffer.
///
/// The grid is stored row-major with row 0 at the domain's lower edge. The
/// spectral buffer follows the r2c half-spectrum layout of the shared plans:
/// `ny` rows of `nx/2 + 1` complex coefficients, wrapped frequencies along y.
///
/// A representation is converted lazily when requested. The forward transform
/// preserves its source, so after `request_spectral` both buffers are valid;
/// the backward transform consumes the spectral buffer, so after
/// `request_physical` only the physical one is.
pub struct PlaneData {
    pub(crate) resolution: [usize; 2],
    pub(crate) physical: Vec<f64>,
    pub(crate) spectral: Vec<Complex<f64>>,
    pub(crate) state: Representation,
    pub(crate) aliased: bool,
    pub(crate) plans: Arc<FourierPlans>,
}

impl PlaneData {
    pub fn new(resolution: [usize; 2]) -> Self {
        Self::with_aliasing(resolution, false)
    }

    /// A field belonging to the 3/2-padded transform family used for
    /// dealiased products.
    pub fn new_aliased(resolution: [usize; 2]) -> Self {
        Self::with_aliasing(resolution, true)
    }

    pub(crate) fn with_aliasing(resolution: [usize; 2], aliased: bool) -> Self {
        let plans: Arc<FourierPlans> = TransformRegistry::global().acquire(resolution, aliased);
        Self {
            resolution,
            physical: vec![0.0; plans.physical_len()],
            spectral: vec![Complex::new(0.0, 0.0); plans.spectral_len()],
            state: Representation::PhysicalOnly,
            aliased,
            plans,
        }
    }

    pub fn resolution(&self) -> [usize; 2] {
        self.resolution
    }

    pub fn is_aliased(&self) -> bool {
        self.aliased
    }

    pub fn state(&self) -> Representation {
        self.state
    }

    /// Half-spectrum width along x (`nx/2 + 1`).
    pub fn spectral_width(&self) -> usize {
        self.plans.spectral_width()
    }

    /// Idempotent: transforms from the physical representation when the
    /// spectral one is stale. The physical source stays valid.
    pub fn request_spectral(&mut self) {
        if self.state.has_spectral() {
            return;
        }
        self.plans.forward(&self.physical, &mut self.spectral);
        self.state = Representation::Both;
    }

    /// Idempotent: transforms from the spectral representation when the
    /// physical one is stale. The backward transform consumes the spectral
    /// buffer, which becomes stale.
    pub fn request_physical(&mut self) {
        if self.state.has_physical() {
            return;
        }
        self.plans.backward(&mut self.spectral, &mut self.physical);
        self.state = Representation::PhysicalOnly;
    }

    /// Raw physical buffer; callers must have synchronized via
    /// `request_physical` first.
    pub fn physical(&self) -> &[f64] {
        assert!(
            self.state.has_physical(),
            "physical representation is stale; call request_physical() first"
        );
        &self.physical
    }

    /// Raw spectral buffer; callers must have synchronized via
    /// `request_spectral` first.
    pub fn spectral(&self) -> &[Complex<f64>] {
        assert!(
            self.state.has_spectral(),
            "spectral representation is stale; call request_spectral() first"
        );
        &self.spectral
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        let [nx, ny] = self.resolution;
        assert!(row < ny && col < nx, "index ({row},{col}) out of {nx}x{ny}");
        self.physical()[row * nx + col]
    }

    /// Writes one grid point. The physical representation becomes the valid
    /// one; a stale spectral buffer is never recomputed first.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let [nx, ny] = self.resolution;
        assert!(row < ny && col < nx, "index ({row},{col}) out of {nx}x{ny}");
        self.physical[row * nx + col] = value;
        self.state = Representation::PhysicalOnly;
    }

    pub fn get_spectral(&self, row: usize, col: usize) -> Complex<f64> {
        let sw: usize = self.spectral_width();
        let ny: usize = self.resolution[1];
        assert!(
            row < ny && col < sw,
            "spectral index ({row},{col}) out of {sw}x{ny}"
        );
        self.spectral()[row * sw + col]
    }

    /// Writes one spectral mode; the spectral representation becomes the
    /// valid one.
    pub fn set_spectral(&mut self, row: usize, col: usize, re: f64, im: f64) {
        let sw: usize = self.spectral_width();
        let ny: usize = self.resolution[1];
        assert!(
            row < ny && col < sw,
            "spectral index ({row},{col}) out of {sw}x{ny}"
        );
        self.spectral[row * sw + col] = Complex::new(re, im);
        self.state = Representation::SpectralOnly;
    }

    /// Broadcasts a constant. A constant in physical space is exactly a
    /// Dirac in spectral space (`value * nx * ny` at mode (0,0)), so both
    /// representations are written analytically and no transform is needed.
    pub fn set_all(&mut self, value: f64) {
        let policy: ExecPolicy = exec::policy();
        policy.for_each_indexed(&mut self.physical, |_, x| *x = value);
        policy.for_each_indexed(&mut self.spectral, |_, c| *c = Complex::new(0.0, 0.0));
        self.spectral[0] = Complex::new(value * self.plans.physical_len() as f64, 0.0);
        self.state = Representation::Both;
    }

    /// Broadcasts a constant over every spectral mode.
    pub fn set_all_spectral(&mut self, re: f64, im: f64) {
        exec::policy().for_each_indexed(&mut self.spectral, |_, c| *c = Complex::new(re, im));
        self.state = Representation::SpectralOnly;
    }

    /// Physical values without mutating the field: borrows when valid,
    /// otherwise runs the backward transform out-of-place on a copy of the
    /// spectrum (which the transform would consume).
    pub fn physical_cow(&self) -> Cow<'_, [f64]> {
        if self.state.has_physical() {
            return Cow::Borrowed(&self.physical);
        }
        let mut scratch: Vec<Complex<f64>> = self.spectral.clone();
        let mut out: Vec<f64> = vec![0.0; self.plans.physical_len()];
        self.plans.backward(&mut scratch, &mut out);
        Cow::Owned(out)
    }

    /// Spectral coefficients without mutating the field.
    pub fn spectral_cow(&self) -> Cow<'_, [Complex<f64>]> {
        if self.state.has_spectral() {
            return Cow::Borrowed(&self.spectral);
        }
        let mut out: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); self.plans.spectral_len()];
        self.plans.forward(&self.physical, &mut out);
        Cow::Owned(out)
    }

    pub(crate) fn map_physical<F>(&self, f: F) -> PlaneData
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        let mut out: PlaneData = PlaneData::with_aliasing(self.resolution, self.aliased);
        let src: Cow<'_, [f64]> = self.physical_cow();
        let src: &[f64] = &src;
        exec::policy().for_each_indexed(&mut out.physical, |i, x| *x = f(src[i]));
        out.state = Representation::PhysicalOnly;
        out
    }

    pub fn one_if_positive(&self) -> PlaneData {
        self.map_physical(|x| if x > 0.0 { 1.0 } else { 0.0 })
    }

    pub fn value_if_positive(&self) -> PlaneData {
        self.map_physical(|x| if x > 0.0 { x } else { 0.0 })
    }

    pub fn one_if_negative(&self) -> PlaneData {
        self.map_physical(|x| if x < 0.0 { 1.0 } else { 0.0 })
    }

    pub fn value_if_negative(&self) -> PlaneData {
        self.map_physical(|x| if x < 0.0 { x } else { 0.0 })
    }

    fn reduce_compensated<S, P>(&self, seq: S, par: P) -> f64
    where
        S: Fn(&[f64]) -> f64,
        P: Fn(&[f64]) -> f64,
    {
        let data: Cow<'_, [f64]> = self.physical_cow();
        match exec::policy() {
            ExecPolicy::Sequential => seq(&data),
            ExecPolicy::DataParallel => par(&data),
        }
    }

    pub fn reduce_sum(&self) -> f64 {
        self.reduce_compensated(reductions::sum, reductions::par_sum)
    }

    pub fn reduce_sum_abs(&self) -> f64 {
        self.reduce_compensated(reductions::sum_abs, reductions::par_sum_abs)
    }

    pub fn reduce_norm1(&self) -> f64 {
        self.reduce_sum_abs()
    }

    pub fn reduce_norm2(&self) -> f64 {
        self.reduce_compensated(reductions::sum_of_squares, reductions::par_sum_of_squares)
            .sqrt()
    }

    pub fn reduce_rms(&self) -> f64 {
        let sum_sq: f64 =
            self.reduce_compensated(reductions::sum_of_squares, reductions::par_sum_of_squares);
        (sum_sq / self.plans.physical_len() as f64).sqrt()
    }

    pub fn reduce_max(&self) -> f64 {
        self.reduce_compensated(reductions::max, reductions::par_max)
    }

    pub fn reduce_min(&self) -> f64 {
        self.reduce_compensated(reductions::min, reductions::par_min)
    }

    pub fn reduce_max_abs(&self) -> f64 {
        self.reduce_compensated(reductions::max_abs, reductions::par_max_abs)
    }

    pub fn reduce_all_finite(&self) -> bool {
        let data: Cow<'_, [f64]> = self.physical_cow();
        match exec::policy() {
            ExecPolicy::Sequential => reductions::all_finite(&data),
            ExecPolicy::DataParallel => reductions::par_all_finite(&data),
        }
    }
}

pub(crate) fn assert_same_shape(a: &PlaneData, b: &PlaneData) {
    assert!(
        a.resolution == b.resolution && a.aliased == b.aliased,
        "mismatched operand resolutions {}x{} vs {}x{}",
        a.resolution[0],
        a.resolution[1],
        b.resolution[0],
        b.resolution[1]
    );
}

/// Duplicates only the currently valid buffers; a stale buffer is left
/// zeroed in the copy.
impl Clone for PlaneData {
    fn clone(&self) -> Self {
        Self {
            resolution: self.resolution,
            physical: if self.state.has_physical() {
                self.physical.clone()
            } else {
                vec![0.0; self.plans.physical_len()]
            },
            spectral: if self.state.has_spectral() {
                self.spectral.clone()
            } else {
                vec![Complex::new(0.0, 0.0); self.plans.spectral_len()]
            },
            state: self.state,
            aliased: self.aliased,
            plans: Arc::clone(&self.plans),
        }
    }
}

impl fmt::Display for PlaneData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [nx, ny] = self.resolution;
        let data: Cow<'_, [f64]> = self.physical_cow();
        for row in (0..ny).rev() {
            for col in 0..nx {
                write!(f, "{}\t", data[row * nx + col])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for PlaneData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PlaneData(resolution={}x{}, state={:?}, aliased={})",
            self.resolution[0], self.resolution[1], self.state, self.aliased
        )
    }
}
