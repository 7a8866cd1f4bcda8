// handlers/protected/mod.rs - Resource handlers behind the authentication middleware
//
// The middleware always attaches an `Actor`; anonymous actors may read but
// every write checks the ownership policy.

pub mod resource;
