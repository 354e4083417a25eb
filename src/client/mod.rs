//! External collaborators: the studio HTTP API and persisted client state.

pub(crate) mod api;
pub(crate) mod http;
pub(crate) mod memory;
pub(crate) mod store;
