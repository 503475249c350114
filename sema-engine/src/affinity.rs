//! Musical genre affinity table
//!
//! Per-genre emotional-response priors derived at training time from
//! genre × label co-occurrence counts, normalized per genre. When a genre
//! hint accompanies an inference, the engine blends the genre's response
//! distribution into the biased classifier output; when the hint is
//! absent the table is skipped entirely.

use sema_common::labels::{Emotion, EMOTION_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One genre's emotional-response prior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreAffinity {
    /// How strongly this genre shapes perception, in [0, 1]
    ///
    /// Derived from the genre's prevalence in the training dataset
    /// relative to the most common genre.
    pub base_affinity: f32,
    /// Label → intensity in [0, 1]; per-genre normalized co-occurrence.
    /// Always covers at least one label.
    pub emotional_response: BTreeMap<Emotion, f32>,
}

/// Genre → emotional-response priors
///
/// Genre names are matched case-insensitively (stored lowercased).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicalAffinityTable {
    genres: BTreeMap<String, GenreAffinity>,
}

impl MusicalAffinityTable {
    /// Derive the table from (genre, label) co-occurrences
    ///
    /// Records without a genre contribute nothing. Each genre's response
    /// intensities are its label counts divided by its own total, so the
    /// most co-occurring label sits at the top of [0, 1]-normalized mass.
    pub fn derive<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Emotion)>,
    {
        let mut counts: BTreeMap<String, BTreeMap<Emotion, u32>> = BTreeMap::new();
        for (genre, label) in pairs {
            let genre = genre.trim().to_lowercase();
            if genre.is_empty() {
                continue;
            }
            *counts.entry(genre).or_default().entry(label).or_insert(0) += 1;
        }

        let max_total = counts
            .values()
            .map(|labels| labels.values().sum::<u32>())
            .max()
            .unwrap_or(0);

        let genres = counts
            .into_iter()
            .map(|(genre, labels)| {
                let total: u32 = labels.values().sum();
                let emotional_response = labels
                    .into_iter()
                    .map(|(label, count)| (label, count as f32 / total as f32))
                    .collect();
                let base_affinity = if max_total > 0 {
                    total as f32 / max_total as f32
                } else {
                    0.0
                };
                (
                    genre,
                    GenreAffinity {
                        base_affinity,
                        emotional_response,
                    },
                )
            })
            .collect();

        Self { genres }
    }

    /// Look up a genre (case-insensitive)
    pub fn get(&self, genre: &str) -> Option<&GenreAffinity> {
        self.genres.get(&genre.trim().to_lowercase())
    }

    /// Number of known genres
    pub fn len(&self) -> usize {
        self.genres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }

    /// A genre's response as a full normalized distribution over all labels
    ///
    /// Labels the genre never co-occurred with get zero mass. Returns None
    /// for unknown genres, paired with the genre's base affinity otherwise.
    pub fn response_distribution(&self, genre: &str) -> Option<(f32, [f32; EMOTION_COUNT])> {
        let affinity = self.get(genre)?;
        let mut distribution = [0.0f32; EMOTION_COUNT];
        let total: f32 = affinity.emotional_response.values().sum();
        if total <= 0.0 {
            return None;
        }
        for (&label, &intensity) in &affinity.emotional_response {
            distribution[label.index()] = intensity / total;
        }
        Some((affinity.base_affinity, distribution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_normalizes_per_genre() {
        let pairs = vec![
            ("Jazz", Emotion::Serenity),
            ("Jazz", Emotion::Serenity),
            ("Jazz", Emotion::Nostalgia),
            ("Metal", Emotion::Anger),
        ];
        let table = MusicalAffinityTable::derive(pairs.iter().map(|(g, e)| (*g, *e)));
        assert_eq!(table.len(), 2);

        let jazz = table.get("jazz").unwrap();
        assert!((jazz.emotional_response[&Emotion::Serenity] - 2.0 / 3.0).abs() < 1e-6);
        assert!((jazz.emotional_response[&Emotion::Nostalgia] - 1.0 / 3.0).abs() < 1e-6);
        // Jazz has 3 of the max-genre total 3 → base affinity 1.0
        assert_eq!(jazz.base_affinity, 1.0);

        let metal = table.get("metal").unwrap();
        assert_eq!(metal.emotional_response[&Emotion::Anger], 1.0);
        assert!((metal.base_affinity - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = MusicalAffinityTable::derive([("Lo-Fi ", Emotion::Serenity)]);
        assert!(table.get("lo-fi").is_some());
        assert!(table.get("LO-FI").is_some());
        assert!(table.get("techno").is_none());
    }

    #[test]
    fn test_response_distribution_sums_to_one() {
        let table = MusicalAffinityTable::derive([
            ("folk", Emotion::Nostalgia),
            ("folk", Emotion::Melancholy),
            ("folk", Emotion::Serenity),
        ]);
        let (affinity, distribution) = table.response_distribution("folk").unwrap();
        assert!(affinity > 0.0);
        let sum: f32 = distribution.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(distribution[Emotion::Anger.index()], 0.0);
    }

    #[test]
    fn test_every_genre_response_is_non_empty() {
        let table = MusicalAffinityTable::derive([
            ("ambient", Emotion::Serenity),
            ("noise", Emotion::Fear),
        ]);
        for genre in ["ambient", "noise"] {
            assert!(!table.get(genre).unwrap().emotional_response.is_empty());
        }
    }
}
