//! Unit conversions applied to every climate value before it is emitted.
//!
//! Both conversions preserve missing data: `None` or `NaN` in gives `None` out.

const MM_PER_INCH: f64 = 25.4;

/// Celsius to Fahrenheit, rounded to one decimal.
pub fn c_to_f(celsius: Option<f64>) -> Option<f64> {
    let c = celsius.filter(|v| !v.is_nan())?;
    Some(round_to(c * 9.0 / 5.0 + 32.0, 1))
}

/// Millimeters to inches, rounded to two decimals.
pub fn mm_to_in(mm: Option<f64>) -> Option<f64> {
    let mm = mm.filter(|v| !v.is_nan())?;
    Some(round_to(mm / MM_PER_INCH, 2))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
