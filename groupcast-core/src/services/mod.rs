pub mod instance_status_service;

pub use instance_status_service::InstanceStatusReconciler;
