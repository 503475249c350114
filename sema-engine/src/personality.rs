//! Personality profile: derivation and perception bias
//!
//! The profile is a fixed set of five trait weights derived at training
//! time from dataset-wide label statistics. The derivation is a declared
//! deterministic formula, not a second model. During inference every trait
//! biases the raw classifier distribution through exactly one documented
//! transform — the transform set is total, none are no-ops.
//!
//! A trait weight of 0.5 is the neutral point at which its transform
//! degenerates to identity; weights are always clamped to [0.0, 1.0].

use sema_common::labels::{Emotion, EMOTION_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The five personality traits, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityTrait {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

impl PersonalityTrait {
    pub const ALL: [PersonalityTrait; 5] = [
        PersonalityTrait::Openness,
        PersonalityTrait::Conscientiousness,
        PersonalityTrait::Extraversion,
        PersonalityTrait::Agreeableness,
        PersonalityTrait::Neuroticism,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for PersonalityTrait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PersonalityTrait::Openness => "openness",
            PersonalityTrait::Conscientiousness => "conscientiousness",
            PersonalityTrait::Extraversion => "extraversion",
            PersonalityTrait::Agreeableness => "agreeableness",
            PersonalityTrait::Neuroticism => "neuroticism",
        };
        f.write_str(name)
    }
}

/// Bounded per-trait adjustment produced by a feedback correction
pub type PersonalityDelta = BTreeMap<PersonalityTrait, f32>;

/// Fixed trait-weight vector biasing inference
///
/// All five traits are always present; each weight is bounded to [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityProfile {
    weights: [f32; 5],
}

impl PersonalityProfile {
    /// Neutral profile: every trait at 0.5, all transforms identity
    pub fn neutral() -> Self {
        Self { weights: [0.5; 5] }
    }

    /// Weight of one trait
    pub fn weight(&self, personality_trait: PersonalityTrait) -> f32 {
        self.weights[personality_trait.index()]
    }

    /// Copy with one trait set (clamped to [0, 1]) — test/tuning helper
    pub fn with_weight(mut self, personality_trait: PersonalityTrait, weight: f32) -> Self {
        self.weights[personality_trait.index()] = weight.clamp(0.0, 1.0);
        self
    }

    /// Derive the profile from dataset-wide label frequencies
    ///
    /// `frequencies` is the normalized label distribution of the training
    /// dataset (indexed by `Emotion::index()`). Hand-authored heuristics:
    ///
    /// - **openness** — normalized entropy of the distribution (a varied
    ///   emotional diet reads as openness)
    /// - **conscientiousness** — concentration: 0.3 + 0.7 × top-label share
    /// - **extraversion** — frequency-weighted mean arousal
    /// - **agreeableness** — 0.5 + 0.5 × frequency-weighted mean valence
    /// - **neuroticism** — 0.2 + 0.8 × negative-valence share
    pub fn derive(frequencies: &[f32; EMOTION_COUNT]) -> Self {
        let mut mean_valence = 0.0f32;
        let mut mean_arousal = 0.0f32;
        let mut negative_share = 0.0f32;
        let mut top_share = 0.0f32;
        let mut entropy = 0.0f32;

        for emotion in Emotion::ALL {
            let f = frequencies[emotion.index()];
            mean_valence += f * emotion.valence();
            mean_arousal += f * emotion.arousal();
            if emotion.valence() < 0.0 {
                negative_share += f;
            }
            top_share = top_share.max(f);
            if f > 0.0 {
                entropy -= f * f.ln();
            }
        }
        let entropy_norm = entropy / (EMOTION_COUNT as f32).ln();

        let mut profile = Self::neutral();
        profile.weights[PersonalityTrait::Openness.index()] = entropy_norm.clamp(0.0, 1.0);
        profile.weights[PersonalityTrait::Conscientiousness.index()] =
            (0.3 + 0.7 * top_share).clamp(0.0, 1.0);
        profile.weights[PersonalityTrait::Extraversion.index()] = mean_arousal.clamp(0.0, 1.0);
        profile.weights[PersonalityTrait::Agreeableness.index()] =
            (0.5 + 0.5 * mean_valence).clamp(0.0, 1.0);
        profile.weights[PersonalityTrait::Neuroticism.index()] =
            (0.2 + 0.8 * negative_share).clamp(0.0, 1.0);
        profile
    }

    /// Apply every trait's transform to a distribution, in canonical order
    ///
    /// `scale` is the global bias magnitude (PARAMS.trait_bias_scale).
    /// The transforms, applied in trait order and renormalized after each:
    ///
    /// - **openness** — tilts mass toward emotionally ambiguous labels:
    ///   factor 1 + s·(w−0.5)·(1−|valence|)
    /// - **conscientiousness** — sharpens or softens the whole
    ///   distribution: exponent 1 + s·(w−0.5)
    /// - **extraversion** — tilts toward high-arousal labels:
    ///   factor 1 + s·(w−0.5)·(2·arousal−1)
    /// - **agreeableness** — tilts toward positive valence:
    ///   factor 1 + s·(w−0.5)·valence
    /// - **neuroticism** — tilts toward negative valence and flattens
    ///   (confidence volatility): factor 1 + s·(w−0.5)·(−valence),
    ///   then exponent 1 − 0.5·s·(w−0.5)
    pub fn apply_bias(&self, distribution: &mut [f32; EMOTION_COUNT], scale: f32) {
        let weight = |t: PersonalityTrait| self.weights[t.index()] - 0.5;

        // Openness
        let w = weight(PersonalityTrait::Openness);
        for emotion in Emotion::ALL {
            let ambiguity = 1.0 - emotion.valence().abs();
            distribution[emotion.index()] *=
                (1.0 + scale * w * ambiguity).max(0.01);
        }
        normalize(distribution);

        // Conscientiousness
        let w = weight(PersonalityTrait::Conscientiousness);
        let exponent = 1.0 + scale * w;
        for p in distribution.iter_mut() {
            *p = p.max(1e-9).powf(exponent);
        }
        normalize(distribution);

        // Extraversion
        let w = weight(PersonalityTrait::Extraversion);
        for emotion in Emotion::ALL {
            distribution[emotion.index()] *=
                (1.0 + scale * w * (2.0 * emotion.arousal() - 1.0)).max(0.01);
        }
        normalize(distribution);

        // Agreeableness
        let w = weight(PersonalityTrait::Agreeableness);
        for emotion in Emotion::ALL {
            distribution[emotion.index()] *=
                (1.0 + scale * w * emotion.valence()).max(0.01);
        }
        normalize(distribution);

        // Neuroticism
        let w = weight(PersonalityTrait::Neuroticism);
        for emotion in Emotion::ALL {
            distribution[emotion.index()] *=
                (1.0 + scale * w * (-emotion.valence())).max(0.01);
        }
        let exponent = 1.0 - 0.5 * scale * w;
        for p in distribution.iter_mut() {
            *p = p.max(1e-9).powf(exponent);
        }
        normalize(distribution);
    }

    /// New profile with bounded nudges applied (each weight clamped)
    pub fn nudged(&self, delta: &PersonalityDelta) -> Self {
        let mut next = self.clone();
        for (&personality_trait, &step) in delta {
            let index = personality_trait.index();
            next.weights[index] = (next.weights[index] + step).clamp(0.0, 1.0);
        }
        next
    }
}

fn normalize(distribution: &mut [f32; EMOTION_COUNT]) {
    let sum: f32 = distribution.iter().sum();
    if sum > 0.0 {
        for p in distribution.iter_mut() {
            *p /= sum;
        }
    } else {
        // Degenerate input: fall back to uniform rather than NaN
        for p in distribution.iter_mut() {
            *p = 1.0 / EMOTION_COUNT as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform() -> [f32; EMOTION_COUNT] {
        [1.0 / EMOTION_COUNT as f32; EMOTION_COUNT]
    }

    #[test]
    fn test_neutral_profile_is_identity() {
        let mut dist = uniform();
        dist[Emotion::Joy.index()] = 0.3;
        normalize(&mut dist);
        let expected = dist;

        PersonalityProfile::neutral().apply_bias(&mut dist, 0.3);
        for (a, b) in dist.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-5, "neutral bias changed distribution");
        }
    }

    #[test]
    fn test_every_trait_affects_the_distribution() {
        // "None are no-ops": pushing any single trait off neutral must
        // change a non-degenerate distribution.
        let mut base = uniform();
        base[Emotion::Joy.index()] = 0.2;
        base[Emotion::Fear.index()] = 0.15;
        normalize(&mut base);

        for personality_trait in PersonalityTrait::ALL {
            let profile = PersonalityProfile::neutral().with_weight(personality_trait, 0.9);
            let mut biased = base;
            profile.apply_bias(&mut biased, 0.3);
            let moved: f32 = biased
                .iter()
                .zip(&base)
                .map(|(a, b)| (a - b).abs())
                .sum();
            assert!(moved > 1e-4, "{} transform was a no-op", personality_trait);
        }
    }

    #[test]
    fn test_agreeableness_favors_positive_valence() {
        let profile =
            PersonalityProfile::neutral().with_weight(PersonalityTrait::Agreeableness, 1.0);
        let mut dist = uniform();
        profile.apply_bias(&mut dist, 0.3);
        assert!(
            dist[Emotion::Joy.index()] > dist[Emotion::Fear.index()],
            "joy {} should beat fear {}",
            dist[Emotion::Joy.index()],
            dist[Emotion::Fear.index()]
        );
    }

    #[test]
    fn test_bias_preserves_distribution_invariant() {
        let profile = PersonalityProfile::derive(&{
            let mut f = [0.0; EMOTION_COUNT];
            f[Emotion::Anger.index()] = 0.6;
            f[Emotion::Serenity.index()] = 0.4;
            f
        });
        let mut dist = uniform();
        profile.apply_bias(&mut dist, 0.3);
        let sum: f32 = dist.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4, "sum {}", sum);
        assert!(dist.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_derive_bounds_and_determinism() {
        let mut frequencies = [0.0f32; EMOTION_COUNT];
        frequencies[Emotion::Sadness.index()] = 0.5;
        frequencies[Emotion::Melancholy.index()] = 0.5;

        let a = PersonalityProfile::derive(&frequencies);
        let b = PersonalityProfile::derive(&frequencies);
        assert_eq!(a, b);

        for personality_trait in PersonalityTrait::ALL {
            let w = a.weight(personality_trait);
            assert!((0.0..=1.0).contains(&w), "{} out of range: {}", personality_trait, w);
        }
        // All-negative dataset reads as high neuroticism, low agreeableness
        assert!(a.weight(PersonalityTrait::Neuroticism) > 0.6);
        assert!(a.weight(PersonalityTrait::Agreeableness) < 0.5);
    }

    #[test]
    fn test_nudged_clamps_to_trait_range() {
        let profile = PersonalityProfile::neutral();
        let mut delta = PersonalityDelta::new();
        delta.insert(PersonalityTrait::Agreeableness, 5.0);
        delta.insert(PersonalityTrait::Neuroticism, -5.0);
        let next = profile.nudged(&delta);
        assert_eq!(next.weight(PersonalityTrait::Agreeableness), 1.0);
        assert_eq!(next.weight(PersonalityTrait::Neuroticism), 0.0);
        // Untouched traits unchanged
        assert_eq!(next.weight(PersonalityTrait::Openness), 0.5);
    }
}
