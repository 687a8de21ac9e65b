//! Per-second rates from cumulative counters.

use serde::{Deserialize, Serialize};

/// How to divide a counter delta into a per-second rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateBasis {
    /// Divide by the configured poll period.
    #[default]
    Nominal,
    /// Divide by the time actually elapsed between the two observations.
    Measured,
}

/// What to do when a counter goes backwards (the service restarted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterResetPolicy {
    /// Emit nothing this cycle and start again from the new value.
    #[default]
    Rebaseline,
    /// Emit a zero rate.
    ClampToZero,
}

/// Turns successive counter observations into rates.
///
/// A previous value of exactly zero is treated as "no baseline yet", so a
/// counter that is still zero never produces a spike on its first increment.
#[derive(Debug, Clone)]
pub struct RateDeriver {
    period_ms: u64,
    basis: RateBasis,
    reset_policy: CounterResetPolicy,
    previous: Option<Observation>,
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    value: f64,
    timestamp_ms: u64,
}

impl RateDeriver {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            basis: RateBasis::default(),
            reset_policy: CounterResetPolicy::default(),
            previous: None,
        }
    }

    pub fn with_basis(mut self, basis: RateBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn with_reset_policy(mut self, policy: CounterResetPolicy) -> Self {
        self.reset_policy = policy;
        self
    }

    /// The value the next rate will be computed against.
    pub fn baseline(&self) -> Option<f64> {
        self.previous.map(|o| o.value)
    }

    /// Record an observation and return the rate, if one can be derived.
    ///
    /// A missing `current` clears the baseline.
    pub fn observe(&mut self, current: Option<f64>, timestamp_ms: u64) -> Option<f64> {
        let Some(current) = current else {
            self.previous = None;
            return None;
        };

        let observation = Observation {
            value: current,
            timestamp_ms,
        };
        let Some(previous) = self.previous.replace(observation) else {
            return None;
        };
        if previous.value == 0.0 {
            return None;
        }

        if current < previous.value {
            return match self.reset_policy {
                CounterResetPolicy::Rebaseline => None,
                CounterResetPolicy::ClampToZero => Some(0.0),
            };
        }

        let elapsed_ms = match self.basis {
            RateBasis::Nominal => self.period_ms,
            RateBasis::Measured => timestamp_ms.saturating_sub(previous.timestamp_ms),
        };
        if elapsed_ms == 0 {
            return None;
        }

        Some((current - previous.value) / (elapsed_ms as f64 / 1000.0))
    }
}
