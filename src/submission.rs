use std::convert::TryFrom;

use serde::Deserialize;
use time::OffsetDateTime;

use crate::catalog::{impact_factor, FeelingLevel};
use crate::entry::{Address, Coordinates};
use crate::errors::ValidationError;
use crate::normalization::{self, normalize_labels};

/// The payload accepted by the create route. Everything is optional
/// here so that a missing field is reported by name instead of as a
/// parse failure.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub selected_emotions: Option<Vec<String>>,

    pub feeling_state: Option<FeelingStateInput>,

    pub impact_factors: Option<Vec<String>>,

    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub additional_context: Option<String>,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,

    pub location: Option<LocationInput>,
}

/// Clients send either the bare level or the whole catalog record.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum FeelingStateInput {
    Value(i64),
    Record { value: i64 },
}

impl FeelingStateInput {
    fn value(&self) -> i64 {
        match *self {
            FeelingStateInput::Value(value) | FeelingStateInput::Record { value } => value,
        }
    }
}

/// A location as submitted: coordinates are required, the address is
/// whatever the client managed to resolve.
#[derive(Clone, Debug, Deserialize)]
pub struct LocationInput {
    #[serde(flatten)]
    pub coordinates: Coordinates,

    #[serde(flatten)]
    pub address: Address,
}

/// A submission that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidSubmission {
    pub selected_emotions: Vec<String>,
    pub feeling_state: FeelingLevel,
    pub impact_factors: Vec<String>,
    pub additional_context: Option<String>,
    pub timestamp: Option<OffsetDateTime>,
    pub coordinates: Option<Coordinates>,
    pub address: Address,
}

impl ValidSubmission {
    /// The client's timestamp, defaulted to and capped at the time the
    /// service received the entry.
    pub fn effective_timestamp(&self, created_at: OffsetDateTime) -> OffsetDateTime {
        match self.timestamp {
            Some(timestamp) if timestamp <= created_at => timestamp,
            _ => created_at,
        }
    }
}

impl Submission {
    pub fn validate(self) -> Result<ValidSubmission, ValidationError> {
        let selected_emotions = required_labels("selectedEmotions", self.selected_emotions)?;

        let feeling_state = self
            .feeling_state
            .ok_or(ValidationError::MissingField("feelingState"))
            .and_then(|input| FeelingLevel::try_from(input.value()))?;

        let impact_factors = required_labels("impactFactors", self.impact_factors)?
            .into_iter()
            .map(canonical_factor)
            .collect::<Vec<_>>();

        let (coordinates, address) = match self.location {
            Some(LocationInput {
                coordinates,
                address,
            }) => {
                if !coordinates.is_valid() {
                    return Err(ValidationError::InvalidCoordinates {
                        latitude: coordinates.latitude,
                        longitude: coordinates.longitude,
                    });
                }

                (Some(coordinates), address.normalized())
            }
            None => (None, Address::default()),
        };

        Ok(ValidSubmission {
            selected_emotions,
            feeling_state,
            impact_factors: normalize_labels(impact_factors),
            additional_context: self.additional_context,
            timestamp: self.timestamp,
            coordinates,
            address,
        })
    }
}

fn required_labels(
    name: &'static str,
    labels: Option<Vec<String>>,
) -> Result<Vec<String>, ValidationError> {
    let labels = normalize_labels(labels.ok_or(ValidationError::MissingField(name))?);

    if labels.is_empty() {
        Err(ValidationError::EmptyField(name))
    } else {
        Ok(labels)
    }
}

/// Catalog factors are stored with their catalog spelling; anything
/// else is kept as typed.
fn canonical_factor(label: String) -> String {
    match impact_factor(&label) {
        Some(factor) => factor.name.to_owned(),
        None => label,
    }
}
