pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod scope;
pub mod services;
pub mod state;
pub mod validation;
