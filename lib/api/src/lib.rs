pub mod rest;

pub use rest::{ApiConfig, ApiState, RestApi};
