// ── Domain model ──

mod data_type;
mod direction;
mod display;
mod mac;
mod raw_data;

pub use data_type::DataType;
pub use direction::{Direction, TrafficState};
pub use display::DisplayTemplate;
pub use mac::MacAddress;
pub use raw_data::{FlowKey, NewRawData, RawRecord, SmoothedPoint};
