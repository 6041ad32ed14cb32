mod handler;
mod model;

pub use handler::{ping, rate_limit_status};
