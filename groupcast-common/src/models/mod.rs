// File: groupcast-common/src/models/mod.rs
pub mod instance;
pub mod group;

pub use instance::{
    ConnectionSnapshot, GatewayStatus, Instance, InstanceStatus, TrackedInstance,
};
pub use group::WhatsAppGroup;
