//! HTTP API handlers for tam-server

pub mod buildinfo;
pub mod health;
pub mod library;
pub mod tonies;
pub mod upload;

pub use health::health_routes;
pub use library::library_routes;
pub use tonies::tonie_routes;
pub use upload::upload_routes;
