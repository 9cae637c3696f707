/// Maximum credential age before a connected account is considered expired.
pub const CREDENTIAL_MAX_AGE_DAYS: i64 = 30;

/// Capacity of the per-entity error ring.
pub const ERROR_RING_CAPACITY: usize = 100;

/// Minor units per major currency unit expected by the remote budget fields.
pub const MICROS_PER_UNIT: i64 = 1_000_000;

/// Decimal places kept when converting minor units back to major units.
pub const CURRENCY_DECIMAL_PRECISION: u32 = 2;

/// Currency used when a request does not name one.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Timezone used when a request does not name one.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Campaign name length bounds (after trimming).
pub const CAMPAIGN_NAME_MIN_LEN: usize = 3;
pub const CAMPAIGN_NAME_MAX_LEN: usize = 100;

/// Lowest daily budget accepted on campaign creation, in major units.
pub const MIN_DAILY_BUDGET: i64 = 1;

/// Audience age bounds accepted by the remote targeting API.
pub const MIN_TARGET_AGE: u8 = 18;
pub const MAX_TARGET_AGE: u8 = 65;

/// Retry hint used when a rate-limit response carries no `Retry-After` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
