//! Bühlmann ZH-L16 tissue model in metres-of-seawater pressure units.
//!
//! Pressures are absolute and expressed as depth (msw) + 10. The sixteen
//! compartments are numbered 1–16 in reports and errors, compartment 1 being
//! the fastest; storage is 0-indexed.
//!
//! Gas exchange uses the closed-form Schreiner equation for linear depth
//! changes and the single exponential for constant ambient pressure. Limits
//! use He/N2 coefficients weighted by each gas's share of the combined
//! compartment tension.

use crate::error::DecoError;

// ============================================================================
// Physical Constants
// ============================================================================

/// Water vapour pressure in the lungs (msw).
pub const WATER_VAPOR_PRESSURE: f64 = 0.567;

/// Surface ambient pressure (msw absolute).
pub const SURFACE_PRESSURE: f64 = 10.0;

/// Compartment N2 tension when saturated with air at sea level (msw).
pub const SURFACE_N2_TENSION: f64 = 7.452;

/// Number of tissue compartments.
pub const NUM_COMPARTMENTS: usize = 16;

/// Convert a depth (msw gauge) to absolute ambient pressure.
pub fn ambient_pressure(depth: f64) -> f64 {
    depth + SURFACE_PRESSURE
}

// ============================================================================
// ZH-L16 Compartment Constants
// ============================================================================

/// Kinetic constants and M-value coefficients for one compartment.
///
/// `a` coefficients are in msw, `b` is dimensionless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compartment {
    pub he_half_time: f64,
    pub n2_half_time: f64,
    pub a_he: f64,
    pub b_he: f64,
    pub a_n2: f64,
    pub b_n2: f64,
}

impl Compartment {
    const fn new(he_half_time: f64, n2_half_time: f64, coefficients: [f64; 4]) -> Self {
        Self {
            he_half_time,
            n2_half_time,
            a_he: coefficients[0],
            b_he: coefficients[1],
            a_n2: coefficients[2],
            b_n2: coefficients[3],
        }
    }

    /// Helium rate constant, ln 2 / half-time (per minute).
    pub fn k_he(&self) -> f64 {
        std::f64::consts::LN_2 / self.he_half_time
    }

    /// Nitrogen rate constant, ln 2 / half-time (per minute).
    pub fn k_n2(&self) -> f64 {
        std::f64::consts::LN_2 / self.n2_half_time
    }
}

/// ZH-L16 table, compartments 1–16. Coefficients are `[aHe, bHe, aN2, bN2]`.
pub const COMPARTMENTS: [Compartment; NUM_COMPARTMENTS] = [
    Compartment::new(1.88, 5.0, [16.189, 0.4770, 11.696, 0.5578]),
    Compartment::new(3.02, 8.0, [13.830, 0.5747, 10.000, 0.6514]),
    Compartment::new(4.72, 12.5, [11.919, 0.6527, 8.618, 0.7222]),
    Compartment::new(6.99, 18.5, [10.458, 0.7223, 7.562, 0.7825]),
    Compartment::new(10.21, 27.0, [9.220, 0.7582, 6.667, 0.8126]),
    Compartment::new(14.48, 38.3, [8.205, 0.7957, 5.600, 0.8434]),
    Compartment::new(20.53, 54.3, [7.305, 0.8279, 4.947, 0.8693]),
    Compartment::new(29.11, 77.0, [6.502, 0.8553, 4.500, 0.8910]),
    Compartment::new(41.21, 109.0, [5.950, 0.8757, 4.187, 0.9092]),
    Compartment::new(55.19, 146.0, [5.545, 0.8903, 3.798, 0.9222]),
    Compartment::new(70.69, 187.0, [5.333, 0.8997, 3.497, 0.9319]),
    Compartment::new(90.34, 239.0, [5.189, 0.9073, 3.223, 0.9403]),
    Compartment::new(115.29, 305.0, [5.181, 0.9122, 2.850, 0.9477]),
    Compartment::new(147.42, 390.0, [5.176, 0.9171, 2.737, 0.9544]),
    Compartment::new(188.24, 498.0, [5.172, 0.9217, 2.523, 0.9602]),
    Compartment::new(240.03, 635.0, [5.119, 0.9267, 2.327, 0.9653]),
];

// ============================================================================
// Inspired gas
// ============================================================================

/// Inspired inert gas fractions for an exposure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertFractions {
    pub he: f64,
    pub n2: f64,
}

impl InertFractions {
    /// Alveolar partial pressures at the given ambient pressure, `(He, N2)`.
    pub fn inspired_at(&self, ambient: f64) -> (f64, f64) {
        let dry = ambient - WATER_VAPOR_PRESSURE;
        (dry * self.he, dry * self.n2)
    }
}

// ============================================================================
// Tissue State
// ============================================================================

/// Inert gas tension of the 16 compartments.
#[derive(Debug, Clone, PartialEq)]
pub struct TissueState {
    /// He partial pressure in each compartment (msw).
    pub p_he: [f64; NUM_COMPARTMENTS],
    /// N2 partial pressure in each compartment (msw).
    pub p_n2: [f64; NUM_COMPARTMENTS],
}

impl Default for TissueState {
    fn default() -> Self {
        Self::surface_equilibrium()
    }
}

impl TissueState {
    /// Tissues saturated with air at sea level: no helium, surface N2 tension.
    pub fn surface_equilibrium() -> Self {
        TissueState {
            p_he: [0.0; NUM_COMPARTMENTS],
            p_n2: [SURFACE_N2_TENSION; NUM_COMPARTMENTS],
        }
    }

    /// Advance every compartment across a linear change of ambient pressure.
    ///
    /// `start_ambient` is the absolute pressure at the start of the leg and
    /// `rate` the change in ambient pressure per minute.
    pub fn load_linear(&mut self, start_ambient: f64, rate: f64, gas: InertFractions, minutes: f64) {
        let (pi_he, pi_n2) = gas.inspired_at(start_ambient);
        let he_rate = rate * gas.he;
        let n2_rate = rate * gas.n2;
        for (i, c) in COMPARTMENTS.iter().enumerate() {
            self.p_he[i] = schreiner(pi_he, he_rate, self.p_he[i], c.k_he(), minutes);
            self.p_n2[i] = schreiner(pi_n2, n2_rate, self.p_n2[i], c.k_n2(), minutes);
        }
    }

    /// Equilibrate every compartment toward fixed inspired pressures.
    pub fn load_constant(&mut self, pi_he: f64, pi_n2: f64, minutes: f64) {
        for (i, c) in COMPARTMENTS.iter().enumerate() {
            self.p_he[i] = haldane(pi_he, self.p_he[i], c.k_he(), minutes);
            self.p_n2[i] = haldane(pi_n2, self.p_n2[i], c.k_n2(), minutes);
        }
    }

    /// Combined tension and weighted `(p, a, b)` for a 0-indexed compartment.
    fn combined(&self, i: usize) -> Result<(f64, f64, f64), DecoError> {
        let c = &COMPARTMENTS[i];
        let p_total = self.p_he[i] + self.p_n2[i];
        if p_total == 0.0 {
            return Err(DecoError::NumericDegeneracy {
                compartment: i as u32 + 1,
            });
        }
        let a = (self.p_he[i] * c.a_he + self.p_n2[i] * c.a_n2) / p_total;
        let b = (self.p_he[i] * c.b_he + self.p_n2[i] * c.b_n2) / p_total;
        Ok((p_total, a, b))
    }

    /// Deepest tolerated depth across all compartments at gradient factor `gf`.
    ///
    /// Returns 0 when every compartment clears the surface.
    pub fn ceiling(&self, gf: f64) -> Result<f64, DecoError> {
        let mut ceiling: f64 = 0.0;
        for i in 0..NUM_COMPARTMENTS {
            let (p, a, b) = self.combined(i)?;
            let tolerated = (p - a * gf) / (gf / b - gf + 1.0);
            ceiling = ceiling.max(tolerated - SURFACE_PRESSURE);
        }
        Ok(ceiling)
    }

    /// Highest fraction of the M-value reached at `ambient` pressure.
    ///
    /// Values above 1.0 mean a compartment exceeds its M-value; they are
    /// returned as-is.
    pub fn percent_m_value(&self, ambient: f64) -> Result<f64, DecoError> {
        let mut max: f64 = 0.0;
        for i in 0..NUM_COMPARTMENTS {
            let (p, a, b) = self.combined(i)?;
            let m_value = ambient / b + a;
            max = max.max(p / m_value);
        }
        Ok(max)
    }

    /// 1-based number of the compartment that sets the ceiling at `gf`.
    pub fn leading_compartment(&self, gf: f64) -> Result<u32, DecoError> {
        let mut leading = 1;
        let mut deepest = f64::NEG_INFINITY;
        for i in 0..NUM_COMPARTMENTS {
            let (p, a, b) = self.combined(i)?;
            let tolerated = (p - a * gf) / (gf / b - gf + 1.0);
            if tolerated > deepest {
                deepest = tolerated;
                leading = i as u32 + 1;
            }
        }
        Ok(leading)
    }
}

/// Schreiner equation: tension after `t` minutes with inspired pressure
/// starting at `pi0` and changing by `r` per minute.
fn schreiner(pi0: f64, r: f64, p0: f64, k: f64, t: f64) -> f64 {
    pi0 + r * (t - 1.0 / k) - (pi0 - p0 - r / k) * (-k * t).exp()
}

/// Tension after `t` minutes at constant inspired pressure `pi`.
fn haldane(pi: f64, p0: f64, k: f64, t: f64) -> f64 {
    p0 + (pi - p0) * (1.0 - (-k * t).exp())
}

// ============================================================================
// Tests
// ============================================================================
