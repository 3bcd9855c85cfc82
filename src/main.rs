use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;
use log::{info, initialize_logger, warn, Logger};
use sqlx::postgres::PgPool;
use url::Url;
use warp::Filter;

use mood_journal::config::{get_optional_variable, get_variable, parse_variable_or, Storage};
use mood_journal::db::{memory::MemoryDb, Db, PgDb};
use mood_journal::environment::{
    Config, Environment, DEFAULT_API_PATH, DEFAULT_MAX_BODY_BYTES,
};
use mood_journal::geocoding::{DisabledGeocoder, Geocoder, NominatimGeocoder};
use mood_journal::routes;
use tokio::sync::mpsc;

const DEFAULT_GEOCODER_USER_AGENT: &str = concat!("mood-journal/", env!("CARGO_PKG_VERSION"));
const DEFAULT_GEOCODER_TIMEOUT_SECONDS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("MOOD_JOURNAL_PORT")
        .parse()
        .expect("parse MOOD_JOURNAL_PORT as u16");
    let admin_port: u16 = get_variable("MOOD_JOURNAL_ADMIN_PORT")
        .parse()
        .expect("parse MOOD_JOURNAL_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    let db = make_db(&logger).await;
    let geocoder = make_geocoder(&logger);

    let config = Config::new(
        get_optional_variable("MOOD_JOURNAL_API_PATH").unwrap_or_else(|| DEFAULT_API_PATH.to_owned()),
        parse_variable_or("MOOD_JOURNAL_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
    );
    let environment = Environment::new(logger.clone(), db, geocoder, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            // the receiver only goes away once shutdown has begun
            let _ = termination_sender.send(()).await;
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let (_, main_server) = warp::serve(routes::make_api(environment.clone()))
            .bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone())
            .or(routes::admin::make_termination_route(terminate));

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}

async fn make_db(logger: &Logger) -> Arc<dyn Db + Send + Sync> {
    let storage: Storage = parse_variable_or("MOOD_JOURNAL_STORAGE", Storage::Postgres);

    match storage {
        Storage::Postgres => {
            info!(logger, "Creating database pool...");
            let connection_string = get_variable("MOOD_JOURNAL_DB_CONNECTION_STRING");
            let pool = PgPool::connect(&connection_string)
                .await
                .expect("create database pool from MOOD_JOURNAL_DB_CONNECTION_STRING");

            let db = PgDb::new(pool);
            db.initialize().await.expect("create mood_entries table");

            Arc::new(db)
        }
        Storage::Memory => {
            warn!(logger, "Keeping entries in memory; they will be lost on exit");
            Arc::new(MemoryDb::new())
        }
    }
}

fn make_geocoder(logger: &Logger) -> Arc<dyn Geocoder + Send + Sync> {
    let base_url = match get_optional_variable("MOOD_JOURNAL_GEOCODER_URL") {
        Some(url) => Url::parse(&url).expect("parse MOOD_JOURNAL_GEOCODER_URL"),
        None => {
            info!(logger, "No geocoder configured; submitted coordinates without an address will be dropped");
            return Arc::new(DisabledGeocoder);
        }
    };

    let user_agent = get_optional_variable("MOOD_JOURNAL_GEOCODER_USER_AGENT")
        .unwrap_or_else(|| DEFAULT_GEOCODER_USER_AGENT.to_owned());
    let timeout = Duration::from_secs(parse_variable_or(
        "MOOD_JOURNAL_GEOCODER_TIMEOUT_SECONDS",
        DEFAULT_GEOCODER_TIMEOUT_SECONDS,
    ));

    info!(logger, "Using geocoder"; "url" => %base_url, "timeout" => ?timeout);

    Arc::new(
        NominatimGeocoder::new(base_url, &user_agent, timeout).expect("create geocoding client"),
    )
}
