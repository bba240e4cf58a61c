// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth or optional bearer) → Protected (bearer required) → Elevated (super admin bearer)
pub mod public;    // Tier 1: login, role resolution, provisioning, health
pub mod protected; // Tier 2: bearer authentication required (/api/auth/whoami)
pub mod elevated;  // Tier 3: super admin only (/api/admin/*)
