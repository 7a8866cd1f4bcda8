// handlers/mod.rs - HTTP handlers by access tier
//
// Public (no auth) → Protected (actor resolved from an optional bearer token)

pub mod protected;
pub mod public;
pub mod system;
