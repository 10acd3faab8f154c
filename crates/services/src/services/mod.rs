pub mod auth;
pub mod forecast;
pub mod geocode;
pub mod suitability;
pub mod weather_api;
pub mod weather_check;
