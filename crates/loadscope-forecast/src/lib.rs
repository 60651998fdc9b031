// loadscope-forecast: client side of the external R statistics server.
//
// The appliance delegates load forecasting to an R process reachable over
// TCP. Sessions speak a line-oriented text-eval protocol: one command per
// line out, one reply line back. This crate owns the session transport,
// a bounded pool of primed sessions, and the ARIMA evaluation sequence.

pub mod arima;
pub mod error;
pub mod pool;
pub mod session;

pub use arima::{forecast_load, parse_numeric_vector};
pub use error::ForecastError;
pub use pool::{SessionLease, SessionPool};
pub use session::StatsSession;
