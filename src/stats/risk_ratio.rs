//! Risk ratio with log-based 95% confidence interval.

/// Two-by-two table counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    /// Exposed with disease.
    pub exposed_cases: usize,
    /// Exposed without disease.
    pub exposed_non_cases: usize,
    /// Not exposed with disease.
    pub unexposed_cases: usize,
    /// Not exposed without disease.
    pub unexposed_non_cases: usize,
}

impl Counts {
    /// Add one observation.
    pub fn add(&mut self, exposed: bool, case: bool) {
        match (exposed, case) {
            (true, true) => self.exposed_cases += 1,
            (true, false) => self.exposed_non_cases += 1,
            (false, true) => self.unexposed_cases += 1,
            (false, false) => self.unexposed_non_cases += 1,
        }
    }

    /// Number of exposed observations.
    pub fn exposed(&self) -> usize {
        self.exposed_cases + self.exposed_non_cases
    }
}

/// A risk ratio with the bounds of its 95% confidence interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskRatio {
    pub rr: f64,
    pub low: f64,
    pub up: f64,
}

/// Quantile of the standard normal distribution for a two-sided 95% interval.
const Z_95: f64 = 1.96;

impl RiskRatio {
    /// Compute from the cells of the two-by-two table.
    ///
    /// Returns `None` if the ratio or its interval is undefined, i.e., one of
    /// the groups is empty or has no cases.
    pub fn from_counts(a: usize, b: usize, c: usize, d: usize) -> Option<Self> {
        if a == 0 || c == 0 {
            return None;
        }
        let (a, b, c, d) = (a as f64, b as f64, c as f64, d as f64);
        let rr = (a / (a + b)) / (c / (c + d));
        let se = (1.0 / a + 1.0 / c - 1.0 / (a + b) - 1.0 / (c + d)).sqrt();
        Some(Self {
            rr,
            low: (rr.ln() - Z_95 * se).exp(),
            up: (rr.ln() + Z_95 * se).exp(),
        })
    }
}

impl From<Counts> for Option<RiskRatio> {
    fn from(counts: Counts) -> Self {
        RiskRatio::from_counts(
            counts.exposed_cases,
            counts.exposed_non_cases,
            counts.unexposed_cases,
            counts.unexposed_non_cases,
        )
    }
}

impl std::fmt::Display for RiskRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} ({:.2}-{:.2})", self.rr, self.low, self.up)
    }
}

#[cfg(test)]
mod test {
    use float_cmp::approx_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn textbook_example() -> Result<(), anyhow::Error> {
        let rr = RiskRatio::from_counts(20, 80, 25, 175)
            .ok_or_else(|| anyhow::anyhow!("risk ratio undefined"))?;

        assert!(approx_eq!(f64, 1.6, rr.rr, epsilon = 1e-12));
        assert!(approx_eq!(f64, 0.9354, rr.low, epsilon = 1e-4));
        assert!(approx_eq!(f64, 2.7368, rr.up, epsilon = 1e-4));
        assert_eq!("1.60 (0.94-2.74)", format!("{}", rr));

        Ok(())
    }

    #[rstest::rstest]
    #[case(0, 10, 5, 5)]
    #[case(5, 5, 0, 10)]
    #[case(0, 0, 5, 5)]
    #[case(5, 5, 0, 0)]
    fn undefined(#[case] a: usize, #[case] b: usize, #[case] c: usize, #[case] d: usize) {
        assert_eq!(None, RiskRatio::from_counts(a, b, c, d));
    }

    #[test]
    fn counts() {
        let mut counts = Counts::default();
        for (exposed, case) in [(true, true), (true, false), (true, false), (false, true)] {
            counts.add(exposed, case);
        }

        assert_eq!(3, counts.exposed());
        let rr: Option<RiskRatio> = counts.into();
        let rr = rr.map(|rr| rr.rr);
        assert_eq!(Some(1.0 / 3.0), rr);
    }
}
