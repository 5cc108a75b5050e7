use crate::internals::*;
use std::time::Duration;

/// Timing and sizing of a bus session.
///
/// All values can be changed on a running engine; deadlines that are already
/// armed keep their old value and the new one applies from the next
/// transition.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use wbus::BusConfig;
///
/// let config = BusConfig::default()
///     .with_response_timeout(Duration::from_millis(1500))
///     .with_max_retries(3);
/// assert_eq!(config.queue_interval, Duration::from_millis(150));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub queue_interval: Duration,
    pub response_timeout: Duration,
    pub break_duration: Duration,
    pub max_retries: u32,
    pub priority_capacity: usize,
    pub normal_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            queue_interval: WBUS_DEFAULT_QUEUE_INTERVAL,
            response_timeout: WBUS_DEFAULT_RESPONSE_TIMEOUT,
            break_duration: WBUS_DEFAULT_BREAK_DURATION,
            max_retries: WBUS_DEFAULT_MAX_RETRIES,
            priority_capacity: WBUS_DEFAULT_QUEUE_CAPACITY,
            normal_capacity: WBUS_DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl BusConfig {
    pub fn with_queue_interval(mut self, interval: Duration) -> Self {
        self.queue_interval = interval;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_break_duration(mut self, duration: Duration) -> Self {
        self.break_duration = duration;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_capacity(mut self, priority: usize, normal: usize) -> Self {
        self.priority_capacity = priority;
        self.normal_capacity = normal;
        self
    }
}

/// Settings of the [`crate::HeaterController`] on top of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub keepalive_interval: Duration,
    /// A connected heater silent for longer than this is marked failed.
    pub connection_timeout: Duration,
    /// Runtime sent with start commands, 1..=59 minutes.
    pub runtime_minutes: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            keepalive_interval: WBUS_DEFAULT_KEEPALIVE_INTERVAL,
            connection_timeout: WBUS_DEFAULT_CONNECTION_TIMEOUT,
            runtime_minutes: WBUS_DEFAULT_RUNTIME_MINUTES,
        }
    }
}
