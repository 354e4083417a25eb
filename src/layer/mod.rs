//! Layer model: placed text and image elements with geometry, style and side affinity.

pub(crate) mod model;
