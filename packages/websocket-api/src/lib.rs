pub mod actions;
pub mod routes;

pub use routes::routes;
