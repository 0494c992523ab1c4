pub mod appointment;
pub mod chat;
pub mod market;
