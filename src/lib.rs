pub mod client;
pub mod config;
pub mod error;
pub mod object_url;
pub mod params;
pub mod state;
