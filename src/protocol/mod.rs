pub mod flight;
pub mod message;
pub mod state;
pub mod transcript;
pub mod version;
