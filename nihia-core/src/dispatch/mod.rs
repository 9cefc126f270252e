//! Command dispatch and host-notification handling.
//!
//! Free functions over `&mut Engine`, split by direction: `normal` and
//! `edit` handle inbound surface commands (the edit table shadows the
//! normal one while the extended-edit mode is active), `notify` turns host
//! callbacks into outbound mirror traffic.

pub(crate) mod edit;
pub(crate) mod normal;
pub(crate) mod notify;
