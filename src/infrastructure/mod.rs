pub mod gateway;
pub mod temperature;
