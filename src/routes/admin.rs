use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use log::warn;
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Reply};
use warp::Filter;

use super::response::SuccessResponse;
use crate::environment::Environment;

/// Reports build information, and whether the store is reachable.
pub fn make_healthz_route(
    environment: Environment,
) -> impl warp::Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    warp::path("healthz")
        .and(warp::get())
        .and(warp::any().map(move || environment.clone()))
        .and_then(healthz)
}

async fn healthz(environment: Environment) -> Result<impl Reply, std::convert::Infallible> {
    let (entries, status) = match environment.db.count().await {
        Ok(count) => (Some(count), StatusCode::OK),
        Err(e) => {
            warn!(environment.logger, "Health check failed"; "error" => %e);
            (None, StatusCode::SERVICE_UNAVAILABLE)
        }
    };

    Ok(with_status(
        json(&SuccessResponse::Healthz {
            revision: info::REVISION,
            timestamp: info::BUILD_TIMESTAMP,
            version: info::VERSION,
            entries,
        }),
        status,
    ))
}

type TerminationFuture<'a> = BoxFuture<'a, ()>;

pub type TerminationFunctionWrapper<'a> =
    Arc<dyn Fn() -> TerminationFuture<'a> + Send + Sync + 'a>;

pub fn make_termination_route<'a>(
    terminate: TerminationFunctionWrapper<'a>,
) -> impl warp::Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone + 'a {
    let handler = move || -> BoxFuture<Result<StatusCode, std::convert::Infallible>> {
        let terminate = terminate.clone();

        async move {
            let future = terminate();
            future.await;
            Ok(StatusCode::NO_CONTENT)
        }
        .boxed()
    };

    warp::path("terminate").and(warp::post()).and_then(handler)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use futures::future::FutureExt;

    use super::{make_healthz_route, make_termination_route};
    use crate::db::memory::MemoryDb;
    use crate::environment::{Config, Environment};
    use crate::geocoding::DisabledGeocoder;

    #[tokio::test]
    async fn healthz_reports_version_and_entry_count() {
        let environment = Environment::new(
            Arc::new(log::discard()),
            Arc::new(MemoryDb::new()),
            Arc::new(DisabledGeocoder),
            Config::default(),
        );

        let response = warp::test::request()
            .path("/healthz")
            .reply(&make_healthz_route(environment))
            .await;

        assert_eq!(response.status(), 200);

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["version"], info::VERSION);
        assert_eq!(body["entries"], 0);
    }

    #[tokio::test]
    async fn termination_runs_the_callback() {
        let terminated = Arc::new(AtomicBool::new(false));

        let flag = terminated.clone();
        let terminate = Arc::new(move || {
            let flag = flag.clone();

            async move {
                flag.store(true, Ordering::SeqCst);
            }
            .boxed()
        });

        let response = warp::test::request()
            .method("POST")
            .path("/terminate")
            .reply(&make_termination_route(terminate))
            .await;

        assert_eq!(response.status(), 204);
        assert!(terminated.load(Ordering::SeqCst));
    }
}
