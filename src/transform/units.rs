// src/transform/units.rs
//! Unit conversions into the metric shape records are stored in.

const INHG_TO_HPA: f64 = 33.8639;
const MPH_TO_MPS: f64 = 0.44704;

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

pub fn mph_to_mps(mph: f64) -> f64 {
    mph * MPH_TO_MPS
}

pub fn kmh_to_mps(kmh: f64) -> f64 {
    kmh / 3.6
}

/// Inches of mercury to whole hectopascals.
pub fn inhg_to_hpa(inhg: f64) -> i64 {
    (inhg * INHG_TO_HPA).round() as i64
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
