//! Longitudinal performance analytics. Everything here is a pure function
//! over already-loaded score lists; nothing queries storage.

use serde::Serialize;

use crate::models::learner::LearnerProfile;
use crate::models::result::DifficultyTier;

pub const DEFAULT_TREND_WINDOW: usize = 5;
pub const DEFAULT_CONSISTENCY_CALIBRATION: f64 = 2.0;

/// Band delta below which a window counts as stable.
const TREND_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub direction: TrendDirection,
    pub delta: Option<f64>,
    pub window_min: Option<f64>,
    pub window_max: Option<f64>,
    pub window_mean: Option<f64>,
    pub sample_count: usize,
}

impl TrendSummary {
    fn insufficient(sample_count: usize) -> Self {
        Self {
            direction: TrendDirection::InsufficientData,
            delta: None,
            window_min: None,
            window_max: None,
            window_mean: None,
            sample_count,
        }
    }
}

/// Compare the newest score in the window against the oldest.
/// `scores` must be ordered newest-first.
pub fn trend(scores_newest_first: &[f64], window: usize) -> TrendSummary {
    let window_scores: Vec<f64> = scores_newest_first.iter().take(window).copied().collect();
    if window_scores.len() < 2 {
        return TrendSummary::insufficient(window_scores.len());
    }

    let newest = window_scores[0];
    let oldest = window_scores[window_scores.len() - 1];
    let delta = newest - oldest;

    let direction = if delta > TREND_THRESHOLD {
        TrendDirection::Improving
    } else if delta < -TREND_THRESHOLD {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    let min = window_scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = window_scores
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let mean = window_scores.iter().sum::<f64>() / window_scores.len() as f64;

    TrendSummary {
        direction,
        delta: Some(delta),
        window_min: Some(min),
        window_max: Some(max),
        window_mean: Some((mean * 10.0).round() / 10.0),
        sample_count: window_scores.len(),
    }
}

/// Map the population standard deviation onto 0..1, higher meaning more
/// consistent. `calibration` is a tuning constant, not derived; fewer than
/// two points count as perfectly consistent.
pub fn consistency(scores: &[f64], calibration: f64) -> f64 {
    if scores.len() < 2 {
        return 1.0;
    }
    let stddev = population_stddev(scores);
    (1.0 - stddev / calibration).max(0.0)
}

/// Ordinary-least-squares slope of score against chronological session
/// index. `scores` must be ordered oldest-first; fewer than two points
/// yield a flat 0.0.
pub fn improvement_rate(scores_oldest_first: &[f64]) -> f64 {
    let n = scores_oldest_first.len();
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let sum_x: f64 = (0..n).map(|i| i as f64).sum();
    let sum_y: f64 = scores_oldest_first.iter().sum();
    let sum_xy: f64 = scores_oldest_first
        .iter()
        .enumerate()
        .map(|(i, y)| i as f64 * y)
        .sum();
    let sum_x2: f64 = (0..n).map(|i| (i as f64).powi(2)).sum();

    let denominator = n_f * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }
    (n_f * sum_xy - sum_x * sum_y) / denominator
}

/// Textual guidance from tier, trend and the weakest criterion of the most
/// recent completed result. Deterministic for identical inputs.
pub fn recommendations(profile: &LearnerProfile, trend: &TrendSummary) -> Vec<String> {
    let mut output = Vec::new();

    if let Some(latest) = profile.latest_completed() {
        let weakest = latest.scores.weakest_criterion();
        output.push(format!(
            "Focus on {}: it was your lowest criterion last session ({:.1}).",
            weakest.label(),
            latest.scores.get(weakest)
        ));
    } else {
        output.push("Complete your first assessment to get personalised guidance.".to_string());
        return output;
    }

    match trend.direction {
        TrendDirection::Improving => {
            output.push("Your band is climbing; keep the current practice rhythm.".to_string());
        }
        TrendDirection::Declining => {
            output.push(
                "Recent scores have slipped; shorter, more frequent sessions usually help."
                    .to_string(),
            );
        }
        TrendDirection::Stable => {
            output.push(
                "Scores have plateaued; try stretching answers with reasons and examples."
                    .to_string(),
            );
        }
        TrendDirection::InsufficientData => {
            output.push("Complete a few more assessments to unlock trend analysis.".to_string());
        }
    }

    match profile.summary.current_tier {
        DifficultyTier::Basic => {
            output.push(
                "Build fluency with everyday topics before moving up a difficulty tier."
                    .to_string(),
            );
        }
        DifficultyTier::Intermediate => {
            output.push(
                "Push for band 7 by extending Part 3 answers beyond two sentences.".to_string(),
            );
        }
        DifficultyTier::Advanced => {
            output.push(
                "Refine precision: idiomatic range and nuanced argument separate 7.5 from 8+."
                    .to_string(),
            );
        }
    }

    output
}

/// Everything the analytics operation returns to a programmatic caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub identifier: String,
    pub total_completed: u32,
    pub current_tier: DifficultyTier,
    pub latest_score: Option<f64>,
    pub best_score: Option<f64>,
    pub average_score: Option<f64>,
    pub trend: TrendSummary,
    pub consistency: f64,
    pub improvement_rate: f64,
    pub recommendations: Vec<String>,
}

/// Assemble the full report from a loaded profile.
pub fn report(profile: &LearnerProfile, window: usize, calibration: f64) -> AnalyticsReport {
    let newest_first = profile.completed_scores();
    let oldest_first: Vec<f64> = newest_first.iter().rev().copied().collect();

    let trend_summary = trend(&newest_first, window);
    let recs = recommendations(profile, &trend_summary);

    AnalyticsReport {
        identifier: profile.identifier.clone(),
        total_completed: profile.summary.total_completed,
        current_tier: profile.summary.current_tier,
        latest_score: profile.summary.latest_score,
        best_score: profile.summary.best_score,
        average_score: profile.summary.average_score,
        trend: trend_summary,
        consistency: consistency(&newest_first, calibration),
        improvement_rate: improvement_rate(&oldest_first),
        recommendations: recs,
    }
}

fn population_stddev(values: &[f64]) -> f64 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_improving() {
        // Chronological 5.0 -> 6.5, so newest-first input.
        let summary = trend(&[6.5, 6.0, 5.5, 5.0], 5);
        assert_eq!(summary.direction, TrendDirection::Improving);
        assert_eq!(summary.delta, Some(1.5));
        assert_eq!(summary.window_min, Some(5.0));
        assert_eq!(summary.window_max, Some(6.5));
        assert_eq!(summary.window_mean, Some(5.8));
    }

    #[test]
    fn test_trend_declining() {
        let summary = trend(&[5.5, 6.0, 6.5, 7.0], 5);
        assert_eq!(summary.direction, TrendDirection::Declining);
        assert_eq!(summary.delta, Some(-1.5));
    }

    #[test]
    fn test_trend_stable() {
        let summary = trend(&[6.0, 6.0, 6.0, 6.0], 5);
        assert_eq!(summary.direction, TrendDirection::Stable);
        assert_eq!(summary.delta, Some(0.0));
    }

    #[test]
    fn test_trend_half_band_delta_is_stable() {
        let summary = trend(&[6.5, 6.0], 5);
        assert_eq!(summary.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_trend_insufficient_data() {
        assert_eq!(
            trend(&[6.0], 5).direction,
            TrendDirection::InsufficientData
        );
        assert_eq!(trend(&[], 5).direction, TrendDirection::InsufficientData);
    }

    #[test]
    fn test_trend_respects_window() {
        // Only the newest two fall inside the window; the old 3.0 must not
        // drag the delta.
        let summary = trend(&[6.0, 6.0, 3.0], 2);
        assert_eq!(summary.direction, TrendDirection::Stable);
        assert_eq!(summary.sample_count, 2);
    }

    #[test]
    fn test_consistency_identical_scores() {
        assert_eq!(consistency(&[6.0, 6.0, 6.0], 2.0), 1.0);
    }

    #[test]
    fn test_consistency_single_score_is_perfect() {
        assert_eq!(consistency(&[6.0], 2.0), 1.0);
        assert_eq!(consistency(&[], 2.0), 1.0);
    }

    #[test]
    fn test_consistency_is_clamped_at_zero() {
        assert_eq!(consistency(&[0.0, 9.0, 0.0, 9.0], 2.0), 0.0);
    }

    #[test]
    fn test_consistency_decreases_with_spread() {
        let tight = consistency(&[6.0, 6.5, 6.0], 2.0);
        let loose = consistency(&[4.0, 7.0, 5.0], 2.0);
        assert!(tight > loose);
    }

    #[test]
    fn test_improvement_rate_positive_slope() {
        // Perfect 0.5-band-per-session climb.
        let slope = improvement_rate(&[5.0, 5.5, 6.0, 6.5]);
        assert!((slope - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_improvement_rate_flat_and_short() {
        assert_eq!(improvement_rate(&[6.0, 6.0, 6.0]), 0.0);
        assert_eq!(improvement_rate(&[6.0]), 0.0);
        assert_eq!(improvement_rate(&[]), 0.0);
    }

    #[test]
    fn test_improvement_rate_negative_slope() {
        let slope = improvement_rate(&[7.0, 6.5, 6.0, 5.5]);
        assert!((slope + 0.5).abs() < 1e-9);
    }
}
