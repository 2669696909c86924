//! sea-orm entities for the access service database.

pub mod access_codes;
pub mod estate_policies;
pub mod outbox_events;
