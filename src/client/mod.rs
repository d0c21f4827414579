//! HTTP boundary: configuration, request dispatch, and stream driving.

mod config;
mod request;

pub use config::ClientConfig;
pub use request::{process_stream, Callbacks, RecordHandler, SlideruleClient};
