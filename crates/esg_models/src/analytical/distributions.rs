//! Standard normal distribution functions.
//!
//! `norm_cdf` uses Hart's double-precision rational approximation
//! (algorithm 5666, as popularised by West 2005), accurate to about 1e-14
//! over the whole real line. Implied volatilities are backed out of prices
//! computed with this CDF, so its accuracy bounds the calibration residual.

use num_traits::Float;

/// 1 / sqrt(2π)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// sqrt(2π)
const SQRT_2PI: f64 = 2.506_628_274_631_000_5;

/// Standard normal cumulative distribution function Φ(x).
///
/// # Examples
/// ```
/// use esg_models::analytical::norm_cdf;
///
/// assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-14);
/// assert!((norm_cdf(1.96_f64) - 0.975_002_104_851_780).abs() < 1e-12);
/// ```
pub fn norm_cdf<T: Float>(x: T) -> T {
    let c = |v: f64| T::from(v).unwrap();
    let abs_x = x.abs();

    let tail = if abs_x > c(37.0) {
        T::zero()
    } else {
        let e = (-abs_x * abs_x / c(2.0)).exp();
        if abs_x < c(7.071_067_811_865_47) {
            let mut num = c(3.526_249_659_989_11e-2) * abs_x + c(0.700_383_064_443_688);
            num = num * abs_x + c(6.373_962_203_531_65);
            num = num * abs_x + c(33.912_866_078_383);
            num = num * abs_x + c(112.079_291_497_871);
            num = num * abs_x + c(221.213_596_169_931);
            num = num * abs_x + c(220.206_867_912_376);

            let mut den = c(8.838_834_764_831_84e-2) * abs_x + c(1.755_667_163_182_64);
            den = den * abs_x + c(16.064_177_579_207);
            den = den * abs_x + c(86.780_732_202_946_1);
            den = den * abs_x + c(296.564_248_779_674);
            den = den * abs_x + c(637.333_633_378_831);
            den = den * abs_x + c(793.826_512_519_948);
            den = den * abs_x + c(440.413_735_824_752);

            e * num / den
        } else {
            // Continued fraction for the far tail
            let mut b = abs_x + c(0.65);
            b = abs_x + c(4.0) / b;
            b = abs_x + c(3.0) / b;
            b = abs_x + c(2.0) / b;
            b = abs_x + T::one() / b;
            e / b / c(SQRT_2PI)
        }
    };

    if x > T::zero() {
        T::one() - tail
    } else {
        tail
    }
}

/// Standard normal density φ(x) = exp(-x²/2) / sqrt(2π).
///
/// # Examples
/// ```
/// use esg_models::analytical::norm_pdf;
///
/// assert!((norm_pdf(0.0_f64) - 0.398_942_280_401_432_7).abs() < 1e-15);
/// ```
#[inline]
pub fn norm_pdf<T: Float>(x: T) -> T {
    let half = T::from(0.5).unwrap();
    T::from(FRAC_1_SQRT_2PI).unwrap() * (-half * x * x).exp()
}
