pub mod api;
pub mod models;
pub mod resources;

pub use models::Mood;
