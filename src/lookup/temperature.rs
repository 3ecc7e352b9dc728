//! Temperature scale conversion.

/// Convert a Celsius reading to Fahrenheit.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Convert a Celsius reading to Kelvin.
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + 273.15
}
