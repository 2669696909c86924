pub mod create;
pub mod revoke;
pub mod sweep;
pub mod validate;
