pub mod errors;
pub mod hydrator;
pub mod models;
pub mod ports;
