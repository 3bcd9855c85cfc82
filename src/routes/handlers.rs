use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, o};
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::analytics;
use crate::catalog::{EMOTIONS, FEELING_STATES, IMPACT_FACTORS};
use crate::entry::MoodEntry;
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::ingest::create_entry;
use crate::routes::{
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::submission::Submission;

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($body:tt)+) => {{
        let start = Instant::now();

        // TODO when `try` blocks are stabilized, we can wrap the body
        // and return the headers even on errors
        let result = { $($body)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    }};
}

pub async fn create(environment: Environment, body: Bytes) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::Create, e);
        let logger = environment.logger.new(o!("route" => "create"));

        debug!(logger, "Parsing submission..."; "length" => body.len());
        let submission: Submission = serde_json::from_slice(&body)
            .map_err(BackendError::MalformedSubmission)
            .map_err(error_handler)?;

        let entry = create_entry(
            std::sync::Arc::new(logger),
            environment.db.clone(),
            environment.geocoder.clone(),
            submission,
        )
        .await
        .map_err(error_handler)?;

        with_status(
            json(&SuccessResponse::Created {
                success: true,
                id: entry.id,
            }),
            StatusCode::CREATED,
        )
    }
}

pub async fn list(environment: Environment) -> RouteResult {
    timed! {
        let entries = fetch_entries(&environment)
            .await
            .map_err(|e| Rejection::new(Context::List, e))?;

        json(&entries)
    }
}

pub async fn count(environment: Environment) -> RouteResult {
    timed! {
        let count = environment
            .db
            .count()
            .await
            .map_err(|e| Rejection::new(Context::Count, e.into()))?;

        json(&SuccessResponse::Count { count })
    }
}

pub async fn feeling_states(_environment: Environment) -> RouteResult {
    timed! {
        json(&&FEELING_STATES[..])
    }
}

pub async fn impact_factors(_environment: Environment) -> RouteResult {
    timed! {
        json(&&IMPACT_FACTORS[..])
    }
}

pub async fn emotions(_environment: Environment) -> RouteResult {
    timed! {
        json(&&EMOTIONS[..])
    }
}

pub async fn locations(environment: Environment) -> RouteResult {
    timed! {
        let entries = fetch_entries(&environment)
            .await
            .map_err(|e| Rejection::new(Context::Locations, e))?;

        json(&analytics::summarize_locations(&entries))
    }
}

pub async fn overview(environment: Environment) -> RouteResult {
    timed! {
        let entries = fetch_entries(&environment)
            .await
            .map_err(|e| Rejection::new(Context::Overview, e))?;

        json(&analytics::overview(&entries))
    }
}

pub async fn heatmap(environment: Environment) -> RouteResult {
    timed! {
        let entries = fetch_entries(&environment)
            .await
            .map_err(|e| Rejection::new(Context::Heatmap, e))?;

        json(&analytics::heatmap(&entries))
    }
}

pub async fn daily(environment: Environment) -> RouteResult {
    timed! {
        let entries = fetch_entries(&environment)
            .await
            .map_err(|e| Rejection::new(Context::Daily, e))?;

        json(&analytics::summarize_days(&entries))
    }
}

/// Reads every entry, oldest first.
async fn fetch_entries(environment: &Environment) -> Result<Vec<MoodEntry>, BackendError> {
    debug!(environment.logger, "Reading entries...");

    let mut entries = environment.db.list().await?;
    MoodEntry::sort_chronologically(&mut entries);

    Ok(entries)
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
