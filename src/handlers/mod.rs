// handlers/mod.rs - HTTP handlers grouped by access level
//
// public/     no session required (login)
// protected/  any logged-in user (staff or admin)
// elevated/   admin role required

pub mod elevated;
pub mod protected;
pub mod public;
