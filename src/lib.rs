pub mod analytics;
pub mod catalog;
pub mod config;
pub mod db;
pub mod entry;
pub mod environment;
pub mod errors;
pub mod geocoding;
pub mod ingest;
pub mod normalization;
pub mod routes;
pub mod submission;
