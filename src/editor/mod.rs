//! User-facing editor actions on top of the surface, side manager, exports and API.

pub(crate) mod controller;
pub(crate) mod state;
