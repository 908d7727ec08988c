pub mod status;
pub mod groups;
