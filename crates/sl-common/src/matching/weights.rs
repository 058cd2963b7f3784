/// Composite score weights. Each factor is scored in [0, 1] before weighting.
pub const MATCH_WEIGHTS: Weights = Weights {
    skills: 0.40,
    distance: 0.25,
    trust: 0.20,
    rate: 0.10,
    availability: 0.05,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub skills: f64,
    pub distance: f64,
    pub trust: f64,
    pub rate: f64,
    pub availability: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.skills + self.distance + self.trust + self.rate + self.availability
    }
}

impl Default for Weights {
    fn default() -> Self {
        MATCH_WEIGHTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        assert!((MATCH_WEIGHTS.sum() - 1.0).abs() < 1e-12);
    }
}
