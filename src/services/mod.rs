pub mod check_service;

pub use check_service::{CheckReport, CheckService, Overrides};
