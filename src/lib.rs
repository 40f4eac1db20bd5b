pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod engine;
pub mod error;
pub mod model;
pub mod report;
pub mod routes;
pub mod store;
