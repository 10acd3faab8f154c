pub mod activity;
pub mod agenda;
pub mod preference;
pub mod user;
