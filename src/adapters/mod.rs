// Adapters layer: concrete implementations of the domain ports (remote client, renderer).

pub mod instagram;
pub mod render;
