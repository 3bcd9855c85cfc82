use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalog::FeelingLevel;
use crate::normalization;

/// A single journal entry. Entries are never modified once stored.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    /// The ID assigned at creation.
    pub id: Uuid,

    /// The emotions selected, in the order they were chosen.
    #[serde(default)]
    pub selected_emotions: Vec<String>,

    /// The overall feeling level.
    pub feeling_state: FeelingLevel,

    /// The factors the author said influenced their mood.
    #[serde(default)]
    pub impact_factors: Vec<String>,

    /// Free text provided with the entry, if any.
    pub additional_context: Option<String>,

    /// The time the author says the mood was felt.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,

    /// The time the entry was recorded by the service.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Where the entry was recorded, if known.
    pub location: Option<Location>,
}

impl MoodEntry {
    /// The grouping key for location analytics, if the entry has a
    /// complete address.
    pub fn location_key(&self) -> Option<String> {
        self.location.as_ref().and_then(Location::key)
    }

    /// Orders entries by creation time, falling back to ID. Stores make
    /// no ordering promises, so everything read back goes through here.
    pub fn sort_chronologically(entries: &mut [MoodEntry]) {
        entries.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A structured address, as returned by reverse geocoding.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Address {
    pub city: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Whether the fields needed for grouping are all present.
    pub fn is_complete(&self) -> bool {
        [&self.city, &self.state, &self.country]
            .iter()
            .all(|field| present(field).is_some())
    }

    /// NFC-normalizes every field and drops the blank ones, so that a
    /// place keys the same way whether it was typed or geocoded.
    pub fn normalized(self) -> Address {
        let clean = |field: Option<String>| {
            field
                .map(normalization::normalize_label)
                .filter(|s| !s.is_empty())
        };

        Address {
            city: clean(self.city),
            district: clean(self.district),
            state: clean(self.state),
            country: clean(self.country),
        }
    }
}

/// A geocoded location attached to an entry.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Location {
    #[serde(flatten)]
    pub coordinates: Coordinates,

    #[serde(flatten)]
    pub address: Address,
}

impl Location {
    pub fn new(coordinates: Coordinates, address: Address) -> Self {
        Location {
            coordinates,
            address,
        }
    }

    /// Returns `"{city}, {state}, {country}"`, or `None` when any of
    /// the three is missing or blank.
    pub fn key(&self) -> Option<String> {
        let Address {
            city,
            state,
            country,
            ..
        } = &self.address;

        Some(format!(
            "{}, {}, {}",
            present(city)?,
            present(state)?,
            present(country)?
        ))
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
