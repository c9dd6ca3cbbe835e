//! Bachelier (normal) model for European options on a rate.
//!
//! **Call**: C = (F - K)·N(d) + σ√T·φ(d)
//! **Put**: P = (K - F)·N(-d) + σ√T·φ(d)
//!
//! with d = (F - K) / (σ√T). Swaption normal volatilities are quoted in this
//! model, with prices expressed per unit annuity.

use esg_core::math::solvers::{BrentSolver, SolverConfig};
use num_traits::Float;

use super::distributions::{norm_cdf, norm_pdf};
use super::error::AnalyticalError;

/// Bachelier model with a fixed forward and normal volatility.
///
/// # Examples
/// ```
/// use esg_models::analytical::Bachelier;
///
/// let model = Bachelier::new(0.02_f64, 0.008).unwrap();
/// let call = model.price_call(0.025, 5.0).unwrap();
/// let put = model.price_put(0.025, 5.0).unwrap();
///
/// // Put-call parity: C - P = F - K
/// assert!((call - put - (0.02 - 0.025)).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Bachelier<T: Float> {
    forward: T,
    volatility: T,
}

impl<T: Float> Bachelier<T> {
    /// Creates a new Bachelier model.
    ///
    /// # Errors
    /// `AnalyticalError::InvalidVolatility` if `volatility <= 0`.
    pub fn new(forward: T, volatility: T) -> Result<Self, AnalyticalError> {
        if !(volatility > T::zero()) {
            return Err(AnalyticalError::InvalidVolatility {
                volatility: volatility.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(Self {
            forward,
            volatility,
        })
    }

    /// Forward rate.
    pub fn forward(&self) -> T {
        self.forward
    }

    /// Normal volatility.
    pub fn volatility(&self) -> T {
        self.volatility
    }

    fn d_and_std(&self, strike: T, expiry: T) -> Result<(T, T), AnalyticalError> {
        if !(expiry > T::zero()) {
            return Err(AnalyticalError::InvalidExpiry {
                expiry: expiry.to_f64().unwrap_or(f64::NAN),
            });
        }
        let std = self.volatility * expiry.sqrt();
        Ok(((self.forward - strike) / std, std))
    }

    /// Undiscounted call (payer) price.
    pub fn price_call(&self, strike: T, expiry: T) -> Result<T, AnalyticalError> {
        let (d, std) = self.d_and_std(strike, expiry)?;
        Ok((self.forward - strike) * norm_cdf(d) + std * norm_pdf(d))
    }

    /// Undiscounted put (receiver) price.
    pub fn price_put(&self, strike: T, expiry: T) -> Result<T, AnalyticalError> {
        let (d, std) = self.d_and_std(strike, expiry)?;
        Ok((strike - self.forward) * norm_cdf(-d) + std * norm_pdf(d))
    }

    /// Normal volatility that reproduces an undiscounted option `price`.
    ///
    /// The upper end of the search bracket is doubled until it prices above
    /// the target, then Brent's method solves inside the bracket.
    ///
    /// # Errors
    /// - `InvalidExpiry` for a non-positive expiry
    /// - `PriceBelowIntrinsic` when no positive volatility matches the price
    /// - `Solver` if the root search fails
    pub fn implied_volatility(
        price: T,
        forward: T,
        strike: T,
        expiry: T,
        is_call: bool,
    ) -> Result<T, AnalyticalError> {
        if !(expiry > T::zero()) {
            return Err(AnalyticalError::InvalidExpiry {
                expiry: expiry.to_f64().unwrap_or(f64::NAN),
            });
        }
        let intrinsic = if is_call {
            (forward - strike).max(T::zero())
        } else {
            (strike - forward).max(T::zero())
        };
        if !(price > intrinsic) {
            return Err(AnalyticalError::PriceBelowIntrinsic {
                price: price.to_f64().unwrap_or(f64::NAN),
                intrinsic: intrinsic.to_f64().unwrap_or(f64::NAN),
            });
        }

        let objective = |sigma: T| -> T {
            let model = Bachelier {
                forward,
                volatility: sigma,
            };
            let value = if is_call {
                model.price_call(strike, expiry)
            } else {
                model.price_put(strike, expiry)
            };
            value.map_or(T::nan(), |v| v - price)
        };

        let config = SolverConfig::new(T::from(1e-14).unwrap(), 200);
        let solver = BrentSolver::new(config);

        let lower = T::from(1e-12).unwrap();
        // ATM inversion as the first guess for the upper end
        let mut upper = (price * T::from(2.506_628_274_631).unwrap() / expiry.sqrt())
            .max(T::from(1e-4).unwrap());
        let mut expansions = 0;
        while objective(upper) < T::zero() {
            if expansions >= config.max_expansions {
                return Err(AnalyticalError::Solver(
                    esg_core::types::SolverError::NoBracket {
                        a: lower.to_f64().unwrap_or(f64::NAN),
                        b: upper.to_f64().unwrap_or(f64::NAN),
                    },
                ));
            }
            upper = upper + upper;
            expansions += 1;
        }

        Ok(solver.find_root(objective, lower, upper)?)
    }
}
