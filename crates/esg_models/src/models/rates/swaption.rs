//! European swaptions under Hull-White.
//!
//! A payer swaption is a put on a coupon bond paying `K·τ` at each payment
//! date and `1 + K·τ` at the last one. Jamshidian's decomposition writes it
//! as a strip of zero-coupon bond puts struck at the bond prices implied by
//! the single short rate `r*` at which the coupon bond is worth par.

use esg_core::math::solvers::BrentSolver;

use super::{HullWhiteParams, InitialCurve};
use crate::models::error::{require_above, ModelError};

/// Fixed-leg schedule of a swap starting at the option expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapSchedule {
    expiry: f64,
    accrual: f64,
    payment_times: Vec<f64>,
}

impl SwapSchedule {
    /// Regular schedule: `tenor · frequency` payments of accrual `1/frequency`
    /// after `expiry`.
    ///
    /// # Errors
    /// `ModelError::InvalidParameter` for a non-positive expiry or tenor, a zero
    /// frequency, or a tenor shorter than one accrual period.
    pub fn new(expiry: f64, tenor: f64, frequency: u32) -> Result<Self, ModelError> {
        require_above("swaption", "expiry", expiry, 0.0)?;
        require_above("swaption", "tenor", tenor, 0.0)?;
        require_above("swaption", "frequency", f64::from(frequency), 0.0)?;

        let accrual = 1.0 / f64::from(frequency);
        let n_payments = (tenor * f64::from(frequency)).round() as usize;
        if n_payments == 0 {
            return Err(ModelError::invalid_parameter("swaption", "tenor", tenor));
        }
        let payment_times = (1..=n_payments)
            .map(|i| expiry + i as f64 * accrual)
            .collect();
        Ok(Self {
            expiry,
            accrual,
            payment_times,
        })
    }

    /// Option expiry, also the swap start date.
    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    /// Accrual fraction of each fixed period.
    pub fn accrual(&self) -> f64 {
        self.accrual
    }

    /// Fixed-leg payment dates.
    pub fn payment_times(&self) -> &[f64] {
        &self.payment_times
    }

    /// Last payment date.
    pub fn end(&self) -> f64 {
        self.payment_times.last().copied().unwrap_or(self.expiry)
    }

    /// Annuity `Σ τ·P(0, S_i)`.
    pub fn annuity<C: InitialCurve + ?Sized>(&self, curve: &C) -> Result<f64, ModelError> {
        let mut sum = 0.0;
        for &s in &self.payment_times {
            sum += self.accrual * curve.discount(s)?;
        }
        Ok(sum)
    }

    /// Forward swap rate `(P(0,T) - P(0,S_n)) / annuity`.
    pub fn forward_rate<C: InitialCurve + ?Sized>(&self, curve: &C) -> Result<f64, ModelError> {
        let annuity = self.annuity(curve)?;
        Ok((curve.discount(self.expiry)? - curve.discount(self.end())?) / annuity)
    }

    /// Coupon of each fixed payment for the given strike, principal included last.
    pub fn coupons(&self, strike: f64) -> Vec<f64> {
        let n = self.payment_times.len();
        (0..n)
            .map(|i| {
                let coupon = strike * self.accrual;
                if i + 1 == n {
                    coupon + 1.0
                } else {
                    coupon
                }
            })
            .collect()
    }

    /// Payer exercise value at expiry given the short rate `r_expiry`:
    /// `max(1 - Σ c_i·P(T, S_i | r_T), 0)`.
    pub fn payer_exercise_value<C: InitialCurve + ?Sized>(
        &self,
        params: &HullWhiteParams,
        curve: &C,
        strike: f64,
        r_expiry: f64,
    ) -> Result<f64, ModelError> {
        let mut bond = 0.0;
        for (&s, c) in self.payment_times.iter().zip(self.coupons(strike)) {
            bond += c * params.zero_coupon_bond(curve, self.expiry, s, r_expiry)?;
        }
        Ok((1.0 - bond).max(0.0))
    }
}

/// Strike prices `X_i = P(T, S_i | r*)` of the Jamshidian bond-option strip.
fn jamshidian_strikes<C: InitialCurve + ?Sized>(
    params: &HullWhiteParams,
    curve: &C,
    schedule: &SwapSchedule,
    coupons: &[f64],
) -> Result<Vec<f64>, ModelError> {
    let expiry = schedule.expiry();
    let mut ln_a = Vec::with_capacity(coupons.len());
    let mut b = Vec::with_capacity(coupons.len());
    for &s in schedule.payment_times() {
        ln_a.push(params.bond_ln_a(curve, expiry, s)?);
        b.push(params.bond_b(expiry, s));
    }

    let coupon_bond = |r: f64| -> f64 {
        coupons
            .iter()
            .zip(ln_a.iter().zip(b.iter()))
            .map(|(c, (la, bi))| c * (la - bi * r).exp())
            .sum::<f64>()
            - 1.0
    };
    let r_star = BrentSolver::with_defaults().find_root_expanding(coupon_bond, -0.05, 0.05)?;

    Ok(ln_a
        .iter()
        .zip(b.iter())
        .map(|(la, bi)| (la - bi * r_star).exp())
        .collect())
}

/// Payer swaption price at time 0 (unit notional) by Jamshidian decomposition.
///
/// # Examples
/// ```
/// use esg_models::models::rates::{jamshidian_payer, FlatCurve, HullWhiteParams, SwapSchedule};
///
/// let params = HullWhiteParams::new(0.05, 0.01).unwrap();
/// let curve = FlatCurve::new(0.02);
/// let schedule = SwapSchedule::new(5.0, 10.0, 1).unwrap();
/// let atm = schedule.forward_rate(&curve).unwrap();
/// let price = jamshidian_payer(&params, &curve, &schedule, atm).unwrap();
/// assert!(price > 0.0);
/// ```
pub fn jamshidian_payer<C: InitialCurve + ?Sized>(
    params: &HullWhiteParams,
    curve: &C,
    schedule: &SwapSchedule,
    strike: f64,
) -> Result<f64, ModelError> {
    let coupons = schedule.coupons(strike);
    let strikes = jamshidian_strikes(params, curve, schedule, &coupons)?;
    let mut price = 0.0;
    for ((&s, c), x) in schedule.payment_times().iter().zip(&coupons).zip(strikes) {
        price += c * params.zero_bond_put(curve, schedule.expiry(), s, x)?;
    }
    Ok(price)
}

/// Receiver swaption price at time 0 (unit notional) by Jamshidian decomposition.
pub fn jamshidian_receiver<C: InitialCurve + ?Sized>(
    params: &HullWhiteParams,
    curve: &C,
    schedule: &SwapSchedule,
    strike: f64,
) -> Result<f64, ModelError> {
    let coupons = schedule.coupons(strike);
    let strikes = jamshidian_strikes(params, curve, schedule, &coupons)?;
    let mut price = 0.0;
    for ((&s, c), x) in schedule.payment_times().iter().zip(&coupons).zip(strikes) {
        price += c * params.zero_bond_call(curve, schedule.expiry(), s, x)?;
    }
    Ok(price)
}
