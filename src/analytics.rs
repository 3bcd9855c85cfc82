//! Aggregations over the full set of stored entries. Every function here
//! is a pure function of its input and recomputes from scratch; nothing is
//! cached between calls.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::{FeelingLevel, MoodBand};
use crate::entry::MoodEntry;

/// The number of emotions reported per location.
pub const TOP_EMOTIONS: usize = 3;

/// Locations averaging at least this are counted as happy.
pub const HAPPY_THRESHOLD: f64 = 4.0;

/// Heatmap intensity never drops below this, so that the worst moods
/// remain visible.
pub const MIN_HEAT_INTENSITY: f64 = 0.1;

/// Entry counts per mood band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodDistribution {
    pub very_bad: usize,
    pub bad: usize,
    pub neutral: usize,
    pub good: usize,
    pub very_good: usize,
}

impl MoodDistribution {
    pub fn record(&mut self, level: FeelingLevel) {
        let bucket = match level.band() {
            MoodBand::VeryBad => &mut self.very_bad,
            MoodBand::Bad => &mut self.bad,
            MoodBand::Neutral => &mut self.neutral,
            MoodBand::Good => &mut self.good,
            MoodBand::VeryGood => &mut self.very_good,
        };

        *bucket += 1;
    }

    pub fn total(&self) -> usize {
        self.very_bad + self.bad + self.neutral + self.good + self.very_good
    }
}

/// Mood statistics for one `"city, state, country"` location.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMoodSummary {
    pub location_key: String,
    pub average_feeling: f64,
    pub total_entries: usize,
    pub distribution: MoodDistribution,
    pub top_emotions: Vec<String>,
}

/// Running totals for a group of entries.
#[derive(Default)]
struct Tally {
    feeling_sum: u64,
    entries: usize,
    distribution: MoodDistribution,
    // (label, count) in order of first appearance
    emotions: Vec<(String, usize)>,
    emotion_positions: HashMap<String, usize>,
}

impl Tally {
    fn add(&mut self, entry: &MoodEntry) {
        self.feeling_sum += u64::from(entry.feeling_state.value());
        self.entries += 1;
        self.distribution.record(entry.feeling_state);

        for emotion in &entry.selected_emotions {
            match self.emotion_positions.get(emotion) {
                Some(&position) => self.emotions[position].1 += 1,
                None => {
                    self.emotion_positions
                        .insert(emotion.clone(), self.emotions.len());
                    self.emotions.push((emotion.clone(), 1));
                }
            }
        }
    }

    fn average(&self) -> f64 {
        if self.entries == 0 {
            0.0
        } else {
            self.feeling_sum as f64 / self.entries as f64
        }
    }

    /// The most frequent emotions. The sort is stable, so ties keep the
    /// order in which the labels were first seen.
    fn top_emotions(mut self, count: usize) -> Vec<String> {
        self.emotions.sort_by(|a, b| b.1.cmp(&a.1));

        self.emotions
            .into_iter()
            .take(count)
            .map(|(label, _)| label)
            .collect()
    }
}

/// Groups entries by location key and summarizes each group. Entries
/// without a complete address are left out. Groups are ordered by entry
/// count, largest first; equal counts keep the order in which the
/// groups first appeared.
pub fn summarize_locations(entries: &[MoodEntry]) -> Vec<LocationMoodSummary> {
    let mut groups: Vec<(String, Tally)> = vec![];
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let key = match entry.location_key() {
            Some(key) => key,
            None => continue,
        };

        let position = *positions.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Tally::default()));
            groups.len() - 1
        });

        groups[position].1.add(entry);
    }

    let mut summaries = groups
        .into_iter()
        .map(|(location_key, tally)| LocationMoodSummary {
            location_key,
            average_feeling: tally.average(),
            total_entries: tally.entries,
            distribution: tally.distribution,
            top_emotions: tally.top_emotions(TOP_EMOTIONS),
        })
        .collect::<Vec<_>>();

    summaries.sort_by(|a, b| b.total_entries.cmp(&a.total_entries));

    summaries
}

/// Headline numbers for the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_entries: usize,
    pub located_entries: usize,
    pub unlocated_entries: usize,
    pub locations: usize,
    /// The mean of the per-location averages, not of all entries.
    pub global_average_feeling: f64,
    pub happy_locations: usize,
}

pub fn overview(entries: &[MoodEntry]) -> Overview {
    let summaries = summarize_locations(entries);
    let located_entries: usize = summaries.iter().map(|s| s.total_entries).sum();

    let global_average_feeling = if summaries.is_empty() {
        0.0
    } else {
        summaries.iter().map(|s| s.average_feeling).sum::<f64>() / summaries.len() as f64
    };

    Overview {
        total_entries: entries.len(),
        located_entries,
        unlocated_entries: entries.len() - located_entries,
        locations: summaries.len(),
        global_average_feeling,
        happy_locations: summaries
            .iter()
            .filter(|s| s.average_feeling >= HAPPY_THRESHOLD)
            .count(),
    }
}

/// A weighted point for the mood heatmap.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub feeling_state: FeelingLevel,
    pub intensity: f64,
}

/// One point per located entry. Locations are stored only with a
/// complete address, so these are the same entries the location
/// summaries count.
pub fn heatmap(entries: &[MoodEntry]) -> Vec<HeatPoint> {
    let max = f64::from(FeelingLevel::MAX.value());

    entries
        .iter()
        .filter_map(|entry| {
            let coordinates = entry.location.as_ref()?.coordinates;
            let intensity = f64::from(entry.feeling_state.value()) / max;

            Some(HeatPoint {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
                feeling_state: entry.feeling_state,
                intensity: intensity.max(MIN_HEAT_INTENSITY),
            })
        })
        .collect()
}

/// Mood statistics for one UTC calendar day.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMoodSummary {
    /// `YYYY-MM-DD`
    pub date: String,
    pub average_feeling: f64,
    pub total_entries: usize,
    pub distribution: MoodDistribution,
}

/// Groups entries by the UTC date of their timestamp, oldest day first.
pub fn summarize_days(entries: &[MoodEntry]) -> Vec<DailyMoodSummary> {
    use std::collections::BTreeMap;

    use time::UtcOffset;

    let mut days: BTreeMap<time::Date, Tally> = BTreeMap::new();

    for entry in entries {
        let date = entry.timestamp.to_offset(UtcOffset::UTC).date();
        days.entry(date).or_default().add(entry);
    }

    days.into_iter()
        .map(|(date, tally)| DailyMoodSummary {
            date: date.to_string(),
            average_feeling: tally.average(),
            total_entries: tally.entries,
            distribution: tally.distribution,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use proptest::prelude::*;
    use time::macros::datetime;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::entry::{Address, Coordinates, Location};

    fn located(city: &str, state: &str, country: &str) -> Option<Location> {
        Some(Location::new(
            Coordinates {
                latitude: 10.0,
                longitude: 20.0,
            },
            Address {
                city: Some(city.to_owned()),
                district: None,
                state: Some(state.to_owned()),
                country: Some(country.to_owned()),
            },
        ))
    }

    fn entry(feeling: i64, emotions: &[&str], location: Option<Location>) -> MoodEntry {
        entry_at(feeling, emotions, location, datetime!(2024-01-01 12:00 UTC))
    }

    fn entry_at(
        feeling: i64,
        emotions: &[&str],
        location: Option<Location>,
        timestamp: OffsetDateTime,
    ) -> MoodEntry {
        MoodEntry {
            id: Uuid::new_v4(),
            selected_emotions: emotions.iter().map(|e| e.to_string()).collect(),
            feeling_state: FeelingLevel::try_from(feeling).unwrap(),
            impact_factors: vec!["Work".to_owned()],
            additional_context: None,
            timestamp,
            created_at: timestamp,
            location,
        }
    }

    fn paris() -> Option<Location> {
        located("Paris", "Île-de-France", "France")
    }

    #[test]
    fn extremes_average_to_neutral() {
        let entries = vec![entry(0, &["Sad"], paris()), entry(6, &["Joyful"], paris())];

        let summaries = summarize_locations(&entries);

        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.location_key, "Paris, Île-de-France, France");
        assert_eq!(summary.average_feeling, 3.0);
        assert_eq!(summary.total_entries, 2);
        assert_eq!(
            summary.distribution,
            MoodDistribution {
                very_bad: 1,
                bad: 0,
                neutral: 0,
                good: 0,
                very_good: 1,
            }
        );
    }

    #[test]
    fn top_emotions_break_ties_by_first_appearance() {
        let entries = vec![
            entry(3, &["Calm", "Tired", "Bored"], paris()),
            entry(4, &["Hopeful", "Tired"], paris()),
            entry(2, &["Anxious", "Bored"], paris()),
        ];

        let summaries = summarize_locations(&entries);

        assert_eq!(summaries[0].top_emotions, vec!["Tired", "Bored", "Calm"]);
    }

    #[test]
    fn top_emotions_are_not_padded() {
        let entries = vec![entry(3, &["Calm"], paris()), entry(3, &["Calm"], paris())];

        assert_eq!(summarize_locations(&entries)[0].top_emotions, vec!["Calm"]);
    }

    #[test]
    fn incomplete_addresses_are_excluded() {
        let mut no_state = paris();
        no_state.as_mut().unwrap().address.state = None;

        let entries = vec![
            entry(3, &["Calm"], None),
            entry(3, &["Calm"], no_state),
            entry(5, &["Happy"], located("Lyon", "Auvergne-Rhône-Alpes", "France")),
        ];

        let summaries = summarize_locations(&entries);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].location_key, "Lyon, Auvergne-Rhône-Alpes, France");

        let overview = overview(&entries);
        assert_eq!(overview.total_entries, 3);
        assert_eq!(overview.located_entries, 1);
        assert_eq!(overview.unlocated_entries, 2);
        assert_eq!(overview.locations, 1);
        assert_eq!(overview.happy_locations, 1);
    }

    #[test]
    fn groups_are_sorted_by_size_with_stable_ties() {
        let entries = vec![
            entry(1, &["Sad"], located("Oslo", "Oslo", "Norway")),
            entry(2, &["Meh"], located("Lima", "Lima", "Peru")),
            entry(3, &["Calm"], paris()),
            entry(4, &["Glad"], paris()),
        ];

        let keys: Vec<String> = summarize_locations(&entries)
            .into_iter()
            .map(|s| s.location_key)
            .collect();

        assert_eq!(
            keys,
            vec![
                "Paris, Île-de-France, France",
                "Oslo, Oslo, Norway",
                "Lima, Lima, Peru"
            ]
        );
    }

    #[test]
    fn overview_averages_location_averages() {
        let entries = vec![
            entry(6, &["Joyful"], paris()),
            entry(6, &["Joyful"], paris()),
            entry(6, &["Joyful"], paris()),
            entry(0, &["Sad"], located("Oslo", "Oslo", "Norway")),
        ];

        let overview = overview(&entries);

        assert_eq!(overview.global_average_feeling, 3.0);
        assert_eq!(overview.happy_locations, 1);
        assert_eq!(super::overview(&[]).global_average_feeling, 0.0);
    }

    #[test]
    fn heat_intensity_has_a_floor() {
        let entries = vec![
            entry(0, &["Sad"], paris()),
            entry(3, &["Calm"], paris()),
            entry(6, &["Joyful"], None),
        ];

        let points = heatmap(&entries);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].intensity, MIN_HEAT_INTENSITY);
        assert_eq!(points[1].intensity, 0.5);
    }

    #[test]
    fn days_are_grouped_in_utc() {
        let entries = vec![
            entry_at(2, &["Meh"], None, datetime!(2024-01-02 23:30 -2)),
            entry_at(4, &["Calm"], None, datetime!(2024-01-03 09:00 UTC)),
            entry_at(6, &["Joyful"], None, datetime!(2024-01-01 10:00 UTC)),
        ];

        let days = summarize_days(&entries);

        let dates: Vec<&str> = days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-03"]);
        assert_eq!(days[1].total_entries, 2);
        assert_eq!(days[1].average_feeling, 3.0);
        assert_eq!(days[1].distribution.good, 1);
        assert_eq!(days[1].distribution.neutral, 1);
    }

    fn arbitrary_entry() -> impl Strategy<Value = MoodEntry> {
        let locations = prop_oneof![
            Just(None),
            Just(paris()),
            Just(located("Oslo", "Oslo", "Norway")),
            Just(located("Lima", "Lima", "Peru")),
        ];
        let emotions = proptest::collection::vec(
            proptest::sample::select(vec!["Calm", "Sad", "Proud", "Tired", "Glad"]),
            0..4,
        );

        (0i64..=6, emotions, locations).prop_map(|(feeling, emotions, location)| {
            entry(feeling, &emotions, location)
        })
    }

    proptest! {
        #[test]
        fn summaries_account_for_every_located_entry(entries in proptest::collection::vec(arbitrary_entry(), 0..40)) {
            let summaries = summarize_locations(&entries);
            let unlocated = entries.iter().filter(|e| e.location_key().is_none()).count();

            let grouped: usize = summaries.iter().map(|s| s.total_entries).sum();
            prop_assert_eq!(grouped + unlocated, entries.len());

            for pair in summaries.windows(2) {
                prop_assert!(pair[0].total_entries >= pair[1].total_entries);
            }

            for summary in &summaries {
                prop_assert_eq!(summary.distribution.total(), summary.total_entries);
                prop_assert!((0.0..=6.0).contains(&summary.average_feeling));

                let mut distinct: Vec<&String> = entries
                    .iter()
                    .filter(|e| e.location_key().as_ref() == Some(&summary.location_key))
                    .flat_map(|e| e.selected_emotions.iter())
                    .collect();
                distinct.sort();
                distinct.dedup();

                prop_assert_eq!(summary.top_emotions.len(), distinct.len().min(TOP_EMOTIONS));
            }

            prop_assert_eq!(summarize_locations(&entries), summaries);
        }
    }
}
