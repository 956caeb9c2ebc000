pub mod health;
pub mod metrics;
pub mod proxy;

pub use health::health_check;
pub use metrics::metrics;
pub use proxy::proxy_api;
