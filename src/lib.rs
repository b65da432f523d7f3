use config::Config;
use database::PgRideStore;
use rides::RideRegistrar;

pub mod common;
pub mod config;
pub mod database;
pub mod error;
pub mod matching;
pub mod rides;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub registrar: RideRegistrar<PgRideStore>,
    pub config: Config,
}
