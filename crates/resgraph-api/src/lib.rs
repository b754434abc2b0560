pub mod auth;
pub mod error;
pub mod rest;
pub mod routes;
pub mod server;
pub mod state;

pub use auth::*;
pub use error::*;
pub use routes::*;
pub use server::*;
pub use state::*;
