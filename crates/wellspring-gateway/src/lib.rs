pub mod api;
pub mod router;
pub mod server;
pub mod state;

pub use router::build_router;
pub use server::serve;
pub use state::{AppState, SharedState};
