pub mod payload;
pub mod source;
pub mod worker;

pub use payload::parse_reading;
pub use source::{BrokerEvent, BrokerSource, MqttSource};
pub use worker::IngestionWorker;
