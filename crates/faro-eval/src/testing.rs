//! Synthetic panels shared by the backtester tests.

use faro_data::Panel;
use faro_traits::{FeatureVector, Month, Observation};

pub(crate) fn month(index: usize) -> Month {
    Month::new(1986 + (index / 12) as i32, (index % 12) as u32 + 1).unwrap()
}

/// Low-volatility securities earn more next month.
pub(crate) fn synthetic_observations(n_months: usize, n_securities: usize) -> Vec<Observation> {
    let mut rows = Vec::new();
    for t in 0..n_months {
        for s in 0..n_securities {
            let vol = 0.01 + 0.002 * ((s * 7 + t * 3) % 10) as f64;
            let lag = 0.001 * ((s + t) % 5) as f64 - 0.002;
            let noise = 0.0005 * ((s * t) % 3) as f64;
            rows.push(Observation {
                security_id: 10_000 + s as i64,
                month: month(t),
                monthly_return: Some(lag),
                return_lead: 0.03 - vol + noise,
                features: FeatureVector {
                    idiosyncratic_volatility: Some(vol),
                    lag_2_return: Some(lag),
                },
            });
        }
    }
    rows
}

pub(crate) fn synthetic_panel(n_months: usize, n_securities: usize) -> Panel {
    Panel::from_observations(synthetic_observations(n_months, n_securities)).unwrap()
}
