// handlers/public/mod.rs - Public handlers (no credential required)
//
// Route Prefix: /api/auth/{login,sso,refresh}

pub mod auth;
