use rand::Rng;

/// Logistic of `x`, written so large |x| never overflows.
pub fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Ground-truth outcome generator. The ranking layers never see its inputs.
#[derive(Clone, Copy, Debug)]
pub struct OutcomeModel {
    tightness: f64,
}

impl OutcomeModel {
    /// `tightness` must be positive; the config validates it.
    pub fn new(tightness: f64) -> Self {
        Self { tightness }
    }

    /// P(A beats B)
    pub fn win_probability(&self, skill_a: f64, skill_b: f64) -> f64 {
        logistic(self.tightness * (skill_a - skill_b))
    }

    /// Draw one outcome, true if A wins. Consumes exactly one uniform draw.
    pub fn sample_outcome(&self, skill_a: f64, skill_b: f64, rng: &mut impl Rng) -> bool {
        let p = self.win_probability(skill_a, skill_b);
        rng.gen::<f64>() < p
    }
}
