use std::sync::Arc;

use log::{debug, warn, Logger};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::Db;
use crate::entry::{Address, Coordinates, Location, MoodEntry};
use crate::errors::BackendError;
use crate::geocoding::Geocoder;
use crate::submission::Submission;

/// Validates a submission, resolves its location and stores it. Returns
/// the stored entry.
pub async fn create_entry(
    logger: Arc<Logger>,
    db: Arc<dyn Db + Send + Sync>,
    geocoder: Arc<dyn Geocoder + Send + Sync>,
    submission: Submission,
) -> Result<MoodEntry, BackendError> {
    debug!(logger, "Validating submission...");
    let submission = submission.validate()?;

    let created_at = OffsetDateTime::now_utc();
    let timestamp = submission.effective_timestamp(created_at);

    if submission.timestamp.map_or(false, |t| t != timestamp) {
        debug!(logger, "Clamped future timestamp"; "submitted" => ?submission.timestamp, "created_at" => %created_at);
    }

    let location = match submission.coordinates {
        Some(coordinates) => {
            resolve_location(logger.clone(), geocoder, coordinates, submission.address).await
        }
        None => None,
    };

    let entry = MoodEntry {
        id: Uuid::new_v4(),
        selected_emotions: submission.selected_emotions,
        feeling_state: submission.feeling_state,
        impact_factors: submission.impact_factors,
        additional_context: submission.additional_context,
        timestamp,
        created_at,
        location,
    };

    debug!(logger, "Writing entry to database..."; "id" => %entry.id);
    db.insert(&entry).await?;

    Ok(entry)
}

/// Completes a partial address through the geocoder. A location is
/// attached only with a complete address; if the geocoder fails, the
/// entry goes without one.
async fn resolve_location(
    logger: Arc<Logger>,
    geocoder: Arc<dyn Geocoder + Send + Sync>,
    coordinates: Coordinates,
    submitted: Address,
) -> Option<Location> {
    if submitted.is_complete() {
        return Some(Location::new(coordinates, submitted));
    }

    debug!(logger, "Resolving location..."; "latitude" => coordinates.latitude, "longitude" => coordinates.longitude);

    match geocoder.reverse(coordinates).await {
        Ok(address) => {
            let address = address.normalized();

            if address.is_complete() {
                return Some(Location::new(coordinates, address));
            }

            warn!(logger, "Geocoder returned an incomplete address; storing entry without location"; "address" => ?address);
            None
        }
        Err(e) => {
            warn!(logger, "Geocoding failed; storing entry without location"; "error" => %e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::{BoxFuture, FutureExt};

    use super::create_entry;
    use crate::db::{memory::MemoryDb, Db};
    use crate::entry::{Address, Coordinates};
    use crate::errors::{BackendError, ValidationError};
    use crate::geocoding::{DisabledGeocoder, Geocoder, GeocodingError};
    use crate::submission::Submission;

    struct FixedGeocoder(Address);

    impl Geocoder for FixedGeocoder {
        fn reverse(&self, _: Coordinates) -> BoxFuture<Result<Address, GeocodingError>> {
            futures::future::ready(Ok(self.0.clone())).boxed()
        }
    }

    fn tokyo() -> Address {
        Address {
            city: Some("Tokyo".to_owned()),
            district: Some("Shibuya".to_owned()),
            state: Some("Tokyo".to_owned()),
            country: Some("Japan".to_owned()),
        }
    }

    fn submission(json: &str) -> Submission {
        serde_json::from_str(json).unwrap()
    }

    const WITH_COORDINATES: &str = r#"{
        "selectedEmotions": ["Excited"], "feelingState": 5, "impactFactors": ["Travel"],
        "location": {"latitude": 35.66, "longitude": 139.7}
    }"#;

    #[tokio::test]
    async fn coordinates_are_geocoded() {
        let db = Arc::new(MemoryDb::new());

        let entry = create_entry(
            Arc::new(log::discard()),
            db.clone(),
            Arc::new(FixedGeocoder(tokyo())),
            submission(WITH_COORDINATES),
        )
        .await
        .unwrap();

        assert_eq!(entry.location_key().as_deref(), Some("Tokyo, Tokyo, Japan"));
        assert_eq!(db.list().await.unwrap(), vec![entry]);
    }

    #[tokio::test]
    async fn geocoded_addresses_are_normalized() {
        let entry = create_entry(
            Arc::new(log::discard()),
            Arc::new(MemoryDb::new()),
            Arc::new(FixedGeocoder(Address {
                city: Some(" Mont-Saint-Miche\u{301}l ".to_owned()),
                district: Some("  ".to_owned()),
                state: Some("Normandie".to_owned()),
                country: Some("France".to_owned()),
            })),
            submission(WITH_COORDINATES),
        )
        .await
        .unwrap();

        let location = entry.location.expect("geocoded location");
        assert_eq!(location.address.city.as_deref(), Some("Mont-Saint-Mich\u{e9}l"));
        assert_eq!(location.address.district, None);
        assert_eq!(
            location.key().as_deref(),
            Some("Mont-Saint-Mich\u{e9}l, Normandie, France")
        );
    }

    #[tokio::test]
    async fn geocoding_failures_drop_the_location() {
        let entry = create_entry(
            Arc::new(log::discard()),
            Arc::new(MemoryDb::new()),
            Arc::new(DisabledGeocoder),
            submission(WITH_COORDINATES),
        )
        .await
        .unwrap();

        assert_eq!(entry.location, None);
    }

    #[tokio::test]
    async fn incomplete_geocoding_results_drop_the_location() {
        let entry = create_entry(
            Arc::new(log::discard()),
            Arc::new(MemoryDb::new()),
            Arc::new(FixedGeocoder(Address {
                country: None,
                ..tokyo()
            })),
            submission(WITH_COORDINATES),
        )
        .await
        .unwrap();

        assert_eq!(entry.location, None);
    }

    #[tokio::test]
    async fn invalid_submissions_are_not_stored() {
        let db = Arc::new(MemoryDb::new());

        let result = create_entry(
            Arc::new(log::discard()),
            db.clone(),
            Arc::new(DisabledGeocoder),
            submission(r#"{"selectedEmotions": ["Calm"], "feelingState": 3}"#),
        )
        .await;

        assert!(matches!(
            result,
            Err(BackendError::Validation(ValidationError::MissingField("impactFactors")))
        ));
        assert_eq!(db.count().await.unwrap(), 0);
    }
}
