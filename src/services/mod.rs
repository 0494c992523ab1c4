pub mod advisor;
pub mod appointments;
pub mod market_data;
pub mod notifications;
