// Main module declarations for aprsRunner

// Beacon state machine
pub mod core {
    pub mod cancellation;
    pub mod runner;
}

// Great-circle geometry and routes
pub mod geo {
    pub mod great_circle;
    pub mod route;
}

// APRS wire format
pub mod protocol {
    pub mod packet;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod runner_config;
}

// Model definitions
pub mod models {
    pub mod coordinate;
}

// Data loaders and persisted state
pub mod data {
    pub mod track_loader;
    pub mod state_store;
}

// APRS-IS sessions
pub mod transport {
    pub mod error;
    pub mod aprs_is;
    pub mod dry_run;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod traits;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used modules
pub use crate::core::runner::BeaconRunner;
pub use crate::geo::route::Route;
pub use crate::models::coordinate::Coordinate;
