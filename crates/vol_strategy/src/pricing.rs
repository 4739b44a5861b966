//! Option fair value and delta.
//!
//! Black–Scholes for European calls and puts, with a central
//! finite-difference delta. The numeric delta is what the hedger consumes;
//! its O(h²) error against the analytic delta is part of the strategy's
//! calibration and must be kept.

/// Option right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    pub fn is_call(self) -> bool {
        matches!(self, OptionKind::Call)
    }

    /// Ticker suffix used by the venue ("C" / "P").
    pub fn suffix(self) -> char {
        match self {
            OptionKind::Call => 'C',
            OptionKind::Put => 'P',
        }
    }
}

/// Payoff at expiry.
pub fn intrinsic_value(spot: f64, strike: f64, kind: OptionKind) -> f64 {
    match kind {
        OptionKind::Call => (spot - strike).max(0.0),
        OptionKind::Put => (strike - spot).max(0.0),
    }
}

/// Black–Scholes fair value.
///
/// Degenerate inputs (`time <= 0`, `sigma <= 0`, or a non-positive price)
/// short-circuit to intrinsic value.
pub fn fair_value(spot: f64, strike: f64, rate: f64, sigma: f64, time: f64, kind: OptionKind) -> f64 {
    if time <= 0.0 || sigma <= 0.0 || spot <= 0.0 || strike <= 0.0 {
        return intrinsic_value(spot, strike, kind);
    }

    let (d1, d2) = d1_d2(spot, strike, rate, sigma, time);
    let discounted_strike = strike * (-rate * time).exp();

    match kind {
        OptionKind::Call => spot * normal_cdf(d1) - discounted_strike * normal_cdf(d2),
        OptionKind::Put => discounted_strike * normal_cdf(-d2) - spot * normal_cdf(-d1),
    }
}

/// Central-difference delta: `(fv(S+h) − fv(S−h)) / 2h`.
pub fn delta(
    spot: f64,
    strike: f64,
    rate: f64,
    sigma: f64,
    time: f64,
    kind: OptionKind,
    bump: f64,
) -> f64 {
    let up = fair_value(spot + bump, strike, rate, sigma, time, kind);
    let down = fair_value(spot - bump, strike, rate, sigma, time, kind);
    (up - down) / (2.0 * bump)
}

/// Time to expiry in years for a session that expires at `session_ticks`.
pub fn time_to_expiry(tick: u32, session_ticks: u32, ticks_per_year: f64) -> f64 {
    (f64::from(session_ticks) - f64::from(tick)) / ticks_per_year
}

fn d1_d2(spot: f64, strike: f64, rate: f64, sigma: f64, time: f64) -> (f64, f64) {
    let vol_sqrt_t = sigma * time.sqrt();
    let d1 = ((spot / strike).ln() + (rate + 0.5 * sigma * sigma) * time) / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

// ── Normal CDF (Abramowitz & Stegun 26.2.17) ─────────────────────────

/// Normal CDF, rational approximation with |error| < 7.5e-8.
pub(crate) fn normal_cdf(z: f64) -> f64 {
    if z < -8.0 {
        return 0.0;
    }
    if z > 8.0 {
        return 1.0;
    }
    if z < 0.0 {
        return 1.0 - normal_cdf(-z);
    }

    const B0: f64 = 0.2316419;
    const B1: f64 = 0.319381530;
    const B2: f64 = -0.356563782;
    const B3: f64 = 1.781477937;
    const B4: f64 = -1.821255978;
    const B5: f64 = 1.330274429;

    let t = 1.0 / (1.0 + B0 * z);
    let poly = t * (B1 + t * (B2 + t * (B3 + t * (B4 + t * B5))));
    let pdf = (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt();

    1.0 - pdf * poly
}
