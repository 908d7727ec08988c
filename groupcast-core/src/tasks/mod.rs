pub mod status_polling;
