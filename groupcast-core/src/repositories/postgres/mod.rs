// src/repositories/postgres/mod.rs

pub mod instances;

pub use instances::PostgresInstanceRepository;
