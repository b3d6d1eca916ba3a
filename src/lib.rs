pub mod bbb;
pub mod config;
pub mod hub;
pub mod routes;
pub mod state;
