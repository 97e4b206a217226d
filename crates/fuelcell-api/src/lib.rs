pub mod error;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod prediction_client;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

pub use error::*;
pub use extract::ApiJson;
pub use handlers::*;
pub use logging::init_tracing;
pub use prediction_client::{HttpPredictionClient, PredictionClient};
pub use routes::create_router;
pub use server::Server;
pub use state::AppState;
pub use store::{InMemoryPredictionStore, PredictionStore};
