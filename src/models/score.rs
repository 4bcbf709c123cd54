use serde::{Deserialize, Serialize};

pub const BAND_MIN: f64 = 0.0;
pub const BAND_MAX: f64 = 9.0;

/// The four criteria a speaking attempt is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCriterion {
    FluencyCoherence,
    LexicalResource,
    GrammaticalRange,
    Pronunciation,
}

impl ScoreCriterion {
    pub const ALL: [ScoreCriterion; 4] = [
        ScoreCriterion::FluencyCoherence,
        ScoreCriterion::LexicalResource,
        ScoreCriterion::GrammaticalRange,
        ScoreCriterion::Pronunciation,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ScoreCriterion::FluencyCoherence => "fluency_coherence",
            ScoreCriterion::LexicalResource => "lexical_resource",
            ScoreCriterion::GrammaticalRange => "grammatical_range",
            ScoreCriterion::Pronunciation => "pronunciation",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreCriterion::FluencyCoherence => "fluency and coherence",
            ScoreCriterion::LexicalResource => "lexical resource",
            ScoreCriterion::GrammaticalRange => "grammatical range and accuracy",
            ScoreCriterion::Pronunciation => "pronunciation",
        }
    }
}

/// Round a band value to the nearest half band.
pub fn band_round(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

pub fn is_valid_band(value: f64) -> bool {
    value.is_finite() && (BAND_MIN..=BAND_MAX).contains(&value)
}

/// Four criterion sub-scores plus the derived overall band.
///
/// `overall` is always recomputed from the sub-scores; it is carried on the
/// struct only so serialized output shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProficiencyScore {
    pub fluency_coherence: f64,
    pub lexical_resource: f64,
    pub grammatical_range: f64,
    pub pronunciation: f64,
    pub overall: f64,
}

impl ProficiencyScore {
    pub fn from_criteria(
        fluency_coherence: f64,
        lexical_resource: f64,
        grammatical_range: f64,
        pronunciation: f64,
    ) -> Self {
        let mut score = Self {
            fluency_coherence,
            lexical_resource,
            grammatical_range,
            pronunciation,
            overall: 0.0,
        };
        score.overall = score.recomputed_overall();
        score
    }

    pub fn get(&self, criterion: ScoreCriterion) -> f64 {
        match criterion {
            ScoreCriterion::FluencyCoherence => self.fluency_coherence,
            ScoreCriterion::LexicalResource => self.lexical_resource,
            ScoreCriterion::GrammaticalRange => self.grammatical_range,
            ScoreCriterion::Pronunciation => self.pronunciation,
        }
    }

    /// Mean of the four sub-scores rounded to the nearest half band.
    pub fn recomputed_overall(&self) -> f64 {
        let mean = (self.fluency_coherence
            + self.lexical_resource
            + self.grammatical_range
            + self.pronunciation)
            / 4.0;
        band_round(mean)
    }

    pub fn all_bands_valid(&self) -> bool {
        ScoreCriterion::ALL.iter().all(|c| is_valid_band(self.get(*c)))
    }

    /// Criterion with the lowest sub-score; ties resolve in `ALL` order so
    /// output stays deterministic.
    pub fn weakest_criterion(&self) -> ScoreCriterion {
        let mut weakest = ScoreCriterion::FluencyCoherence;
        let mut lowest = self.get(weakest);
        for criterion in ScoreCriterion::ALL {
            let value = self.get(criterion);
            if value < lowest {
                weakest = criterion;
                lowest = value;
            }
        }
        weakest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_round_half_steps() {
        assert_eq!(band_round(6.25), 6.5);
        assert_eq!(band_round(6.2), 6.0);
        assert_eq!(band_round(6.75), 7.0);
        assert_eq!(band_round(0.0), 0.0);
        assert_eq!(band_round(9.0), 9.0);
    }

    #[test]
    fn test_overall_is_rounded_mean() {
        let score = ProficiencyScore::from_criteria(6.0, 6.0, 7.0, 7.0);
        assert_eq!(score.overall, 6.5);
    }

    #[test]
    fn test_overall_recompute_is_idempotent() {
        let score = ProficiencyScore::from_criteria(5.5, 6.0, 6.5, 5.0);
        assert_eq!(score.overall, score.recomputed_overall());
        assert_eq!(score.recomputed_overall(), score.recomputed_overall());
    }

    #[test]
    fn test_weakest_criterion_prefers_declared_order_on_tie() {
        let score = ProficiencyScore::from_criteria(5.0, 5.0, 6.0, 6.0);
        assert_eq!(score.weakest_criterion(), ScoreCriterion::FluencyCoherence);

        let score = ProficiencyScore::from_criteria(7.0, 6.0, 5.5, 6.5);
        assert_eq!(score.weakest_criterion(), ScoreCriterion::GrammaticalRange);
    }

    #[test]
    fn test_band_validity_bounds() {
        assert!(is_valid_band(0.0));
        assert!(is_valid_band(9.0));
        assert!(!is_valid_band(9.5));
        assert!(!is_valid_band(-0.5));
        assert!(!is_valid_band(f64::NAN));
    }
}
