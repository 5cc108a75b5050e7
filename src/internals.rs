use std::time::Duration;

/// Minimum gap between the end of one exchange and the next transmission.
pub const WBUS_DEFAULT_QUEUE_INTERVAL: Duration = Duration::from_millis(150);

/// Time to wait for the heater's reply before a BREAK reset.
pub const WBUS_DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(2000);

/// How long the line is held in BREAK, and the recovery pause after release.
pub const WBUS_DEFAULT_BREAK_DURATION: Duration = Duration::from_millis(50);

/// Consecutive timeouts before a command is given up.
pub const WBUS_DEFAULT_MAX_RETRIES: u32 = 10;

/// Capacity of each of the two command queues.
pub const WBUS_DEFAULT_QUEUE_CAPACITY: usize = 30;

/// Period of the keep-alive command while a heating mode runs.
pub const WBUS_DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(25);

/// Silence from the heater after which a connection counts as lost.
pub const WBUS_DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default runtime of a started heating mode in minutes.
pub const WBUS_DEFAULT_RUNTIME_MINUTES: u8 = 59;
