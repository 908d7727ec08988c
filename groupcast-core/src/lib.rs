// src/lib.rs

pub mod db;
pub mod http;
pub mod platforms;
pub mod repositories;
pub mod services;
pub mod tasks;
pub mod test_utils;

pub use db::Database;
pub use groupcast_common::error::Error;
pub use groupcast_common::models;
pub use http::{DefaultHttpClient, HttpClient, HttpResponse};
