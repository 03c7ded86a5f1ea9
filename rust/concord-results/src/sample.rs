//! Parameters for taking a random sample of a result stream.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How much of the stream to sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSpec {
    /// A fraction of the total size, in `0.0..=1.0`.
    Fraction(f64),
    /// A fixed number of results.
    Count(usize),
}

/// Sample parameters with a resolved seed.
///
/// The seed is fixed when the parameters are built (either taken from the
/// caller or drawn once), so the same parameters always reproduce the exact
/// same sample, and the resolved seed can be reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleParameters {
    spec: SampleSpec,
    seed: u64,
}

impl SampleParameters {
    pub fn with_seed(spec: SampleSpec, seed: u64) -> SampleParameters {
        SampleParameters { spec, seed }
    }

    /// Builds parameters with a freshly drawn seed.
    pub fn with_random_seed(spec: SampleSpec) -> SampleParameters {
        SampleParameters {
            spec,
            seed: rand::random::<u64>(),
        }
    }

    pub fn spec(&self) -> SampleSpec {
        self.spec
    }

    /// The resolved seed; reusing it reproduces the exact sample.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of results to select out of `total`, before clamping to the
    /// available size.
    pub fn number_of_results(&self, total: usize) -> usize {
        match self.spec {
            SampleSpec::Fraction(fraction) => (fraction * total as f64).round() as usize,
            SampleSpec::Count(count) => count,
        }
    }
}

impl fmt::Display for SampleParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.spec {
            SampleSpec::Fraction(fraction) => write!(f, "seed={}, fraction={}", self.seed, fraction),
            SampleSpec::Count(count) => write!(f, "seed={}, count={}", self.seed, count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_spec_is_independent_of_total() {
        let params = SampleParameters::with_seed(SampleSpec::Count(5), 1);
        assert_eq!(params.number_of_results(100), 5);
        assert_eq!(params.number_of_results(3), 5);
    }

    #[test]
    fn fraction_spec_rounds() {
        let params = SampleParameters::with_seed(SampleSpec::Fraction(0.25), 1);
        assert_eq!(params.number_of_results(10), 3);
        assert_eq!(params.number_of_results(0), 0);
    }

    #[test]
    fn display_includes_resolved_seed() {
        let params = SampleParameters::with_seed(SampleSpec::Count(3), 42);
        assert_eq!(params.to_string(), "seed=42, count=3");
    }
}
