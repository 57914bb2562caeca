pub mod connections;
pub mod schema;
pub mod types;
