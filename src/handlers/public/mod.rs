// handlers/public/mod.rs - Token acquisition, no authentication required

pub mod token;
