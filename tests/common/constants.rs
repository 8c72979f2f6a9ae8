//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (profiles, secrets, CMS ids, etc.),
//! update only this file.

// ============================================================================
// Secrets
// ============================================================================

/// Secret the test server verifies webhook signatures with
pub const WEBHOOK_SECRET: &str = "whsec-e2e";

/// Admin key accepted by the sync endpoints in production mode
pub const ADMIN_KEY: &str = "admin-key-e2e";

// ============================================================================
// Seeded Profiles
// ============================================================================

/// Email of the seeded admin profile
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Email of the seeded regular profile
pub const USER_EMAIL: &str = "member@example.com";

// ============================================================================
// CMS Documents
// ============================================================================

pub const BLOG_DOC_ID: &str = "blog-post-1";

pub const EVENT_DOC_ID: &str = "event-1";

/// CMS user document linked to the seeded admin profile
pub const ADMIN_CMS_USER_ID: &str = "cms-user-admin";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to accept requests
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Per-request timeout of the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Delay between readiness probes
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
