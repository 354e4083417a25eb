//! Front/back side bookkeeping on top of the single live surface.

pub(crate) mod side_manager;
