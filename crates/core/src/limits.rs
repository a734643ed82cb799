//! Size limits and validation constants.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so field limits are duplicated there. Keep both in sync when modifying.

// === Request Limits ===

/// Maximum tracking payload size in bytes (64KB).
pub const MAX_TRACKING_PAYLOAD_BYTES: usize = 64 * 1024;

/// Maximum lead form payload size in bytes (16KB).
pub const MAX_LEAD_PAYLOAD_BYTES: usize = 16 * 1024;

// === String Field Limits (chars) ===

/// Event type / event name max length.
pub const MAX_EVENT_TYPE_LEN: usize = 64;

/// UTM parameter and click identifier max length.
pub const MAX_UTM_LEN: usize = 256;

/// Page URL and referrer max length.
/// Matches HTTP Referer header limit.
pub const MAX_URL_LEN: usize = 2048;

/// User agent string max length.
pub const MAX_USER_AGENT_LEN: usize = 512;

/// Session ID max length.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Client timestamp string max length.
pub const MAX_TIMESTAMP_LEN: usize = 64;

// === Analytics ===

/// Default lookback window for analytics queries.
pub const DEFAULT_ANALYTICS_DAYS: u32 = 7;

/// Largest accepted lookback window.
pub const MAX_ANALYTICS_DAYS: u32 = 365;

/// Number of events returned in `recent_events`.
pub const RECENT_EVENTS_LIMIT: usize = 10;

/// Number of buckets returned in top-N groupings.
pub const TOP_GROUPS_LIMIT: usize = 5;

// === Lead Form ===

/// Phone number digit bounds (after stripping formatting).
pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_PHONE_DIGITS: usize = 15;

/// Area code range checked for 10-11 digit numbers.
pub const MIN_AREA_CODE: u32 = 11;
pub const MAX_AREA_CODE: u32 = 99;

/// Earliest accepted birth year.
pub const MIN_BIRTH_YEAR: i32 = 1900;

/// Minimum age in years for a lead.
pub const MIN_AGE_YEARS: i32 = 5;
