pub mod health;
pub mod metrics;
pub mod swagger;
pub mod auth;
pub mod products;
pub mod categories;
pub mod cart;
pub mod favorites;
pub mod orders;
pub mod upload;
pub mod admin;
