use std::sync::Arc;

use log::{error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, Reply, WithStatus};
use warp::Filter;

use crate::environment::Environment;
use crate::errors::BackendError;

pub mod admin;
mod handlers;
mod rejection;
mod response;

pub use internal::*;

/// Combines every API route and renders failures as JSON.
pub fn make_api(
    environment: Environment,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    let logger = environment.logger.clone();

    make_create_route(environment.clone())
        .or(make_count_route(environment.clone()))
        .or(make_list_route(environment.clone()))
        .or(make_feeling_states_route(environment.clone()))
        .or(make_impact_factors_route(environment.clone()))
        .or(make_emotions_route(environment.clone()))
        .or(make_locations_route(environment.clone()))
        .or(make_overview_route(environment.clone()))
        .or(make_heatmap_route(environment.clone()))
        .or(make_daily_route(environment))
        .recover(move |r| format_rejection(logger.clone(), r))
}

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status_code_for(e), "message" => %r.error);
        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status_code_for(e)));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

mod internal {
    use warp::body::{bytes, content_length_limit};
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{get as g, path as p, post};

    use super::handlers;
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
        ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
        ($route_variable:ident; $first:expr, $($rest:expr),+) => (
            let $route_variable = $route_variable.and($first);
            route_filter!($route_variable; $($rest),+);
        )
    }

    macro_rules! route {
        ($name:ident => $handler:ident, $route_variable:ident, $config:ident; $($filters:expr),+) => (
            pub fn $name(environment: Environment) -> Route {
                let $config = environment.config.clone();
                let prefix = $config.api_path.clone();

                let $route_variable = warp::any()
                    .map(move || environment.clone())
                    .and(p(prefix));

                route_filter!($route_variable; $($filters),+);

                $route_variable.and_then(handlers::$handler)
                    .boxed()
            }
        );
    }

    route!(make_create_route => create, rt, config; p("mood-entries"), end(), post(), content_length_limit(config.max_body_bytes), bytes());
    route!(make_list_route => list, rt, _config; p("mood-entries"), end(), g());
    route!(make_count_route => count, rt, _config; p("mood-entries"), p("count"), end(), g());
    route!(make_feeling_states_route => feeling_states, rt, _config; p("feeling-states"), end(), g());
    route!(make_impact_factors_route => impact_factors, rt, _config; p("impact-factors"), end(), g());
    route!(make_emotions_route => emotions, rt, _config; p("emotions"), end(), g());
    route!(make_locations_route => locations, rt, _config; p("analytics"), p("locations"), end(), g());
    route!(make_overview_route => overview, rt, _config; p("analytics"), p("overview"), end(), g());
    route!(make_heatmap_route => heatmap, rt, _config; p("analytics"), p("heatmap"), end(), g());
    route!(make_daily_route => daily, rt, _config; p("analytics"), p("daily"), end(), g());
}
