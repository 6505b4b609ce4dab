// handlers/protected/mod.rs - Protected handlers (credential required)
//
// Every handler here takes a `Credential`, so a request without an
// Authorization header is rejected with 401 before any upstream call.
//
// Route Prefix: /api/* (e.g., /api/auth/whoami, /api/tenants, /api/gateways/:id/events)

pub mod auth;
pub mod events;
pub mod records;
