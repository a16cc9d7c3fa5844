use super::Belief;
use crate::model::id::CharacterId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeliefMetrics {
    /// Shannon entropy of the distribution, in bits.
    pub entropy_bits: f64,
    pub top_candidate: Option<CharacterId>,
    pub top_probability: f64,
    /// Gap between the leading and the runner-up probability.
    pub margin: f64,
}

impl BeliefMetrics {
    pub fn from_belief(belief: &Belief) -> Self {
        let mut entropy_bits = 0.0;
        let mut first: Option<(&CharacterId, f64)> = None;
        let mut second = 0.0_f64;

        for (id, prob) in belief.iter() {
            if prob > 0.0 {
                entropy_bits -= prob * prob.log2();
            }
            match first {
                Some((_, best)) if prob <= best => second = second.max(prob),
                Some((_, best)) => {
                    second = best;
                    first = Some((id, prob));
                }
                None => first = Some((id, prob)),
            }
        }

        let top_probability = first.map(|(_, prob)| prob).unwrap_or(0.0);
        Self {
            entropy_bits,
            top_candidate: first.map(|(id, _)| id.clone()),
            top_probability,
            margin: top_probability - second,
        }
    }
}
