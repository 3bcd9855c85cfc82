use futures::future::BoxFuture;

use crate::entry::MoodEntry;
use crate::errors::PersistenceError;

pub mod memory;

/// The persistence collaborator. Stores only need to insert and return
/// everything; ordering is imposed by callers.
pub trait Db {
    fn count(&self) -> BoxFuture<Result<i64, PersistenceError>>;

    fn insert(&self, entry: &MoodEntry) -> BoxFuture<Result<(), PersistenceError>>;

    fn list(&self) -> BoxFuture<Result<Vec<MoodEntry>, PersistenceError>>;
}

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::{
        self,
        postgres::{PgPool, PgRow},
    };
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::catalog::FeelingLevel;
    use crate::entry::{Address, Coordinates, Location, MoodEntry};
    use crate::errors::PersistenceError;

    const ENTRIES_ID_CONSTRAINT: &str = "mood_entries_primary_key";

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }

        /// Creates the entries table if it doesn’t exist yet.
        pub async fn initialize(&self) -> Result<(), PersistenceError> {
            sqlx::query(include_str!("queries/create_table.sql"))
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, None))?;

            Ok(())
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn count(&self) -> BoxFuture<Result<i64, PersistenceError>> {
            async move {
                let query = sqlx::query_as::<_, (i64,)>(include_str!("queries/count.sql"));

                let (count,) = query
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| map_sqlx_error(e, None))?;

                Ok(count)
            }
            .boxed()
        }

        fn insert(&self, entry: &MoodEntry) -> BoxFuture<Result<(), PersistenceError>> {
            let entry = entry.clone();

            async move {
                let query = sqlx::query(include_str!("queries/insert.sql"));

                let location = entry.location.as_ref();
                let address = location.map(|l| &l.address);

                query
                    .bind(entry.id)
                    .bind(entry.selected_emotions.clone())
                    .bind(i16::from(entry.feeling_state))
                    .bind(entry.impact_factors.clone())
                    .bind(entry.additional_context.clone())
                    .bind(entry.timestamp)
                    .bind(entry.created_at)
                    .bind(location.map(|l| l.coordinates.latitude))
                    .bind(location.map(|l| l.coordinates.longitude))
                    .bind(address.and_then(|a| a.city.clone()))
                    .bind(address.and_then(|a| a.district.clone()))
                    .bind(address.and_then(|a| a.state.clone()))
                    .bind(address.and_then(|a| a.country.clone()))
                    .execute(&self.pool)
                    .await
                    .map_err(|e| map_sqlx_error(e, Some(entry.id)))?;

                Ok(())
            }
            .boxed()
        }

        fn list(&self) -> BoxFuture<Result<Vec<MoodEntry>, PersistenceError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list.sql"));

                let entries = query
                    .try_map(|row: PgRow| entry_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| map_sqlx_error(e, None))?;

                Ok(entries)
            }
            .boxed()
        }
    }

    fn entry_from_row(row: &PgRow) -> Result<MoodEntry, sqlx::Error> {
        use std::convert::TryFrom;

        let feeling_state: i16 = try_get(row, "feeling_state")?;
        let feeling_state = FeelingLevel::try_from(i64::from(feeling_state))
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        let latitude: Option<f64> = try_get(row, "latitude")?;
        let longitude: Option<f64> = try_get(row, "longitude")?;

        // coordinates are written together, so one without the other
        // means the row was edited by hand; treat it as unlocated
        let location = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Location::new(
                Coordinates {
                    latitude,
                    longitude,
                },
                Address {
                    city: try_get(row, "city")?,
                    district: try_get(row, "district")?,
                    state: try_get(row, "state")?,
                    country: try_get(row, "country")?,
                },
            )),
            _ => None,
        };

        let selected_emotions: Option<Vec<String>> = try_get(row, "selected_emotions")?;
        let impact_factors: Option<Vec<String>> = try_get(row, "impact_factors")?;
        let id: Uuid = try_get(row, "id")?;
        let timestamp: OffsetDateTime = try_get(row, "timestamp")?;
        let created_at: OffsetDateTime = try_get(row, "created_at")?;

        Ok(MoodEntry {
            id,
            selected_emotions: selected_emotions.unwrap_or_default(),
            feeling_state,
            impact_factors: impact_factors.unwrap_or_default(),
            additional_context: try_get(row, "additional_context")?,
            timestamp,
            created_at,
            location,
        })
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::prelude::*;

        row.try_get(column)
    }

    fn map_sqlx_error(error: sqlx::Error, id: Option<Uuid>) -> PersistenceError {
        use sqlx::Error;

        match (error, id) {
            (Error::Database(ref e), Some(id)) if e.constraint() == Some(ENTRIES_ID_CONSTRAINT) => {
                PersistenceError::DuplicateId(id)
            }
            (source, _) => PersistenceError::Sqlx { source },
        }
    }
}
