//! Field algebra.
//!
//! `+` and `-` are linear and evaluated representation-wise, preferring
//! spectral. `*` and `/` are genuine pointwise products and therefore run in
//! physical space: multiplying truncated spectra element-wise is a different
//! operation (convolution theorem). The per-mode spectral product and
//! quotient, used for composing linear operators and never for field-field
//! products, are exposed under the distinct names
//! `spectral_multiply`/`spectral_divide`, and the dealiased nonlinear
//! product under `multiply_dealiased`.

use std::borrow::Cow;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use transforms::{Complex, exec};

use crate::dealias;
use crate::plane_data::{PlaneData, Representation, assert_same_shape};

fn combine_linear(
    a: &PlaneData,
    b: &PlaneData,
    phys: impl Fn(f64, f64) -> f64 + Sync + Send,
    spec: impl Fn(Complex<f64>, Complex<f64>) -> Complex<f64> + Sync + Send,
) -> PlaneData {
    assert_same_shape(a, b);
    let mut out: PlaneData = PlaneData::with_aliasing(a.resolution, a.aliased);

    let physical_only: bool = a.state.has_physical() && b.state.has_physical();
    if physical_only && !(a.state.has_spectral() && b.state.has_spectral()) {
        let pa: &[f64] = &a.physical;
        let pb: &[f64] = &b.physical;
        exec::policy().for_each_indexed(&mut out.physical, |i, x| *x = phys(pa[i], pb[i]));
        out.state = Representation::PhysicalOnly;
    } else {
        let sa: Cow<'_, [Complex<f64>]> = a.spectral_cow();
        let sb: Cow<'_, [Complex<f64>]> = b.spectral_cow();
        let (sa, sb): (&[Complex<f64>], &[Complex<f64>]) = (&sa, &sb);
        exec::policy().for_each_indexed(&mut out.spectral, |i, c| *c = spec(sa[i], sb[i]));
        out.state = Representation::SpectralOnly;
    }
    out
}

fn combine_pointwise(
    a: &PlaneData,
    b: &PlaneData,
    phys: impl Fn(f64, f64) -> f64 + Sync + Send,
) -> PlaneData {
    assert_same_shape(a, b);
    let mut out: PlaneData = PlaneData::with_aliasing(a.resolution, a.aliased);
    let pa: Cow<'_, [f64]> = a.physical_cow();
    let pb: Cow<'_, [f64]> = b.physical_cow();
    let (pa, pb): (&[f64], &[f64]) = (&pa, &pb);
    exec::policy().for_each_indexed(&mut out.physical, |i, x| *x = phys(pa[i], pb[i]));
    out.state = Representation::PhysicalOnly;
    out
}

impl Add<&PlaneData> for &PlaneData {
    type Output = PlaneData;

    fn add(self, rhs: &PlaneData) -> PlaneData {
        combine_linear(self, rhs, |x, y| x + y, |x, y| x + y)
    }
}

impl Sub<&PlaneData> for &PlaneData {
    type Output = PlaneData;

    fn sub(self, rhs: &PlaneData) -> PlaneData {
        combine_linear(self, rhs, |x, y| x - y, |x, y| x - y)
    }
}

impl AddAssign<&PlaneData> for PlaneData {
    fn add_assign(&mut self, rhs: &PlaneData) {
        assert_same_shape(self, rhs);
        self.request_spectral();
        let rs: Cow<'_, [Complex<f64>]> = rhs.spectral_cow();
        let rs: &[Complex<f64>] = &rs;
        exec::policy().for_each_indexed(&mut self.spectral, |i, c| *c += rs[i]);
        self.state = Representation::SpectralOnly;
    }
}

impl SubAssign<&PlaneData> for PlaneData {
    fn sub_assign(&mut self, rhs: &PlaneData) {
        assert_same_shape(self, rhs);
        self.request_spectral();
        let rs: Cow<'_, [Complex<f64>]> = rhs.spectral_cow();
        let rs: &[Complex<f64>] = &rs;
        exec::policy().for_each_indexed(&mut self.spectral, |i, c| *c -= rs[i]);
        self.state = Representation::SpectralOnly;
    }
}

// Owned operands reuse the left buffer; intermediate expression results are
// moved, not copied.
impl Add for PlaneData {
    type Output = PlaneData;

    fn add(mut self, rhs: PlaneData) -> PlaneData {
        self += &rhs;
        self
    }
}

impl Sub for PlaneData {
    type Output = PlaneData;

    fn sub(mut self, rhs: PlaneData) -> PlaneData {
        self -= &rhs;
        self
    }
}

/// Pointwise product, evaluated in physical space. For alias-sensitive
/// nonlinear terms use [`PlaneData::multiply_dealiased`] instead.
impl Mul<&PlaneData> for &PlaneData {
    type Output = PlaneData;

    fn mul(self, rhs: &PlaneData) -> PlaneData {
        combine_pointwise(self, rhs, |x, y| x * y)
    }
}

impl Mul for PlaneData {
    type Output = PlaneData;

    fn mul(self, rhs: PlaneData) -> PlaneData {
        &self * &rhs
    }
}

/// Pointwise quotient in physical space.
impl Div<&PlaneData> for &PlaneData {
    type Output = PlaneData;

    fn div(self, rhs: &PlaneData) -> PlaneData {
        combine_pointwise(self, rhs, |x, y| x / y)
    }
}

impl Div for PlaneData {
    type Output = PlaneData;

    fn div(self, rhs: PlaneData) -> PlaneData {
        &self / &rhs
    }
}

/// Adding a constant only shifts the DC mode, scaled by the element count.
impl Add<f64> for &PlaneData {
    type Output = PlaneData;

    fn add(self, value: f64) -> PlaneData {
        let mut out: PlaneData = PlaneData::with_aliasing(self.resolution, self.aliased);
        let src: Cow<'_, [Complex<f64>]> = self.spectral_cow();
        out.spectral.copy_from_slice(&src);
        out.spectral[0].re += value * self.plans.physical_len() as f64;
        out.state = Representation::SpectralOnly;
        out
    }
}

impl Sub<f64> for &PlaneData {
    type Output = PlaneData;

    fn sub(self, value: f64) -> PlaneData {
        self + (-value)
    }
}

impl Add<f64> for PlaneData {
    type Output = PlaneData;

    fn add(mut self, value: f64) -> PlaneData {
        self.request_spectral();
        self.spectral[0].re += value * self.plans.physical_len() as f64;
        self.state = Representation::SpectralOnly;
        self
    }
}

impl Sub<f64> for PlaneData {
    type Output = PlaneData;

    fn sub(self, value: f64) -> PlaneData {
        self + (-value)
    }
}

/// Scalar multiplication scales whichever representation is already valid.
impl Mul<f64> for &PlaneData {
    type Output = PlaneData;

    fn mul(self, value: f64) -> PlaneData {
        let mut out: PlaneData = PlaneData::with_aliasing(self.resolution, self.aliased);
        if self.state.has_spectral() {
            let src: &[Complex<f64>] = &self.spectral;
            exec::policy().for_each_indexed(&mut out.spectral, |i, c| *c = src[i] * value);
            out.state = Representation::SpectralOnly;
        } else {
            let src: &[f64] = &self.physical;
            exec::policy().for_each_indexed(&mut out.physical, |i, x| *x = src[i] * value);
            out.state = Representation::PhysicalOnly;
        }
        out
    }
}

impl Mul<f64> for PlaneData {
    type Output = PlaneData;

    fn mul(self, value: f64) -> PlaneData {
        &self * value
    }
}

impl Mul<&PlaneData> for f64 {
    type Output = PlaneData;

    fn mul(self, rhs: &PlaneData) -> PlaneData {
        rhs * self
    }
}

impl Neg for PlaneData {
    type Output = PlaneData;

    fn neg(mut self) -> PlaneData {
        let policy = exec::policy();
        if self.state.has_physical() {
            policy.for_each_indexed(&mut self.physical, |_, x| *x = -*x);
        }
        if self.state.has_spectral() {
            policy.for_each_indexed(&mut self.spectral, |_, c| *c = -*c);
        }
        self
    }
}

impl PlaneData {
    /// Per-mode complex product. This composes linear operators in spectral
    /// space; it is NOT the pointwise product of two fields.
    pub fn spectral_multiply(&self, rhs: &PlaneData) -> PlaneData {
        assert_same_shape(self, rhs);
        let mut out: PlaneData = PlaneData::with_aliasing(self.resolution, self.aliased);
        let sa: Cow<'_, [Complex<f64>]> = self.spectral_cow();
        let sb: Cow<'_, [Complex<f64>]> = rhs.spectral_cow();
        let (sa, sb): (&[Complex<f64>], &[Complex<f64>]) = (&sa, &sb);
        exec::policy().for_each_indexed(&mut out.spectral, |i, c| *c = sa[i] * sb[i]);
        out.state = Representation::SpectralOnly;
        out
    }

    /// Applies `self` as a linear operator to `rhs`. Synonym for
    /// [`spectral_multiply`](Self::spectral_multiply); reads as operator
    /// application at call sites.
    pub fn apply(&self, rhs: &PlaneData) -> PlaneData {
        self.spectral_multiply(rhs)
    }

    /// Per-mode complex quotient with the integration-constant convention:
    /// a mode where the denominator is exactly zero yields zero instead of
    /// NaN.
    pub fn spectral_divide(&self, rhs: &PlaneData) -> PlaneData {
        self.spectral_divide_threshold(rhs, 0.0)
    }

    /// As [`spectral_divide`](Self::spectral_divide), but a denominator mode
    /// with squared magnitude below `threshold` aborts: continuing a solve
    /// past a near-singular mode silently produces meaningless results.
    pub fn spectral_divide_threshold(&self, rhs: &PlaneData, threshold: f64) -> PlaneData {
        assert_same_shape(self, rhs);
        let mut out: PlaneData = PlaneData::with_aliasing(self.resolution, self.aliased);
        let sa: Cow<'_, [Complex<f64>]> = self.spectral_cow();
        let sb: Cow<'_, [Complex<f64>]> = rhs.spectral_cow();
        let (sa, sb): (&[Complex<f64>], &[Complex<f64>]) = (&sa, &sb);
        exec::policy().for_each_indexed(&mut out.spectral, |i, c| {
            let den: f64 = sb[i].norm_sqr();
            assert!(
                den >= threshold,
                "instability: spectral division by near-zero mode (|den|^2 = {den:e})"
            );
            *c = if den == 0.0 {
                Complex::new(0.0, 0.0)
            } else {
                sa[i] * sb[i].conj() / den
            };
        });
        out.state = Representation::SpectralOnly;
        out
    }

    /// Alias-free pointwise product: both operands are zero-padded to the
    /// 3/2 resolution, multiplied in physical space there, and truncated
    /// back. Never multiplies raw unpadded spectra.
    pub fn multiply_dealiased(&self, rhs: &PlaneData) -> PlaneData {
        assert_same_shape(self, rhs);
        let mut u: PlaneData = dealias::scale_up(self);
        let mut v: PlaneData = dealias::scale_up(rhs);
        u.request_physical();
        v.request_physical();
        let product: PlaneData = &u * &v;
        dealias::scale_down(&product, self.resolution)
    }
}
