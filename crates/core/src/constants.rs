/// Decimal precision for valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Quantity threshold for significant positions
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// Decimal precision used when storing share prices and share counts
pub const SHARE_PRECISION: u32 = 10;

/// Share price a vault starts with when none is given
pub const DEFAULT_INITIAL_SHARE_PRICE: &str = "1";

/// How many calendar days back the price feed looks for the last trading
/// close when the requested day has no quote (weekends, holidays)
pub const PRICE_LOOKBACK_DAYS: i64 = 7;
