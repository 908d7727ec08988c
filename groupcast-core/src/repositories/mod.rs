// src/repositories/mod.rs

pub use groupcast_common::traits::repository_traits::InstanceRepository;
pub use postgres::instances::PostgresInstanceRepository;

pub mod postgres;
