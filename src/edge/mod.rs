//! Edge agent: local sampling, alarm control and delivery to the
//! aggregation service.

pub mod actuator;
pub mod agent;
pub mod outbox;
pub mod sensor;
pub mod uplink;

pub use actuator::{Actuator, LogActuator};
pub use agent::EdgeAgent;
pub use outbox::{Outbox, RetryPolicy};
pub use sensor::{Sensor, SimulatedSensor};
pub use uplink::{HttpUplink, Uplink};
