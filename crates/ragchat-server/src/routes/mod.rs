pub mod health;
pub mod models;
