// handlers/mod.rs - 2-Tier Handler Architecture
//
// Public (no credential) → Protected (opaque credential, resolved into
// upstream headers per request). Authorization itself is left to ERPNext.
pub mod public;    // Tier 1: credential acquisition (/api/auth/login, /sso, /refresh)
pub mod protected; // Tier 2: proxied ERP operations (/api/*)
