//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, parties, rooms),
//! update only this file.

// ============================================================================
// Test Users
// ============================================================================

/// Regular test user handle, member of PARTY_1
pub const TEST_USER: &str = "testuser";

/// Regular test user password
pub const TEST_PASS: &str = "testpass123";

/// Second member of PARTY_1
pub const SECOND_USER: &str = "seconduser";

pub const SECOND_PASS: &str = "secondpass123";

/// Member of PARTY_2
pub const OTHER_PARTY_USER: &str = "otheruser";

pub const OTHER_PARTY_PASS: &str = "otherpass123";

// ============================================================================
// Parties and hotel rooms
// ============================================================================

pub const PARTY_1_NAME: &str = "Bride's family";

pub const PARTY_2_NAME: &str = "Groom's friends";

/// Room of PARTY_1 fitting two guests
pub const DOUBLE_ROOM_NAME: &str = "Double";

/// Room of PARTY_1 fitting one guest
pub const SINGLE_ROOM_NAME: &str = "Single";

/// Room of PARTY_2
pub const ATTIC_ROOM_NAME: &str = "Attic";

// ============================================================================
// Server settings
// ============================================================================

/// Music requests allowed per kind and user on the test server
pub const TEST_MAX_MUSIC_REQUESTS: usize = 3;

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Timeout of every request made by the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
