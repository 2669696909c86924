pub mod access_code;
pub mod sweep;
