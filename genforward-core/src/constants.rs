//! Bus names, object paths, state codes and timing.
//!
//! All of these are fixed at compile time.

use std::time::Duration;

/// Bus name prefix shared by every digital input service.
pub const DIGITAL_INPUT_PREFIX: &str = "com.victronenergy.digitalinput";

/// Digital input path holding the configured input type.
pub const INPUT_TYPE_PATH: &str = "/Type";

/// `/Type` value of an input configured as "generator start/stop".
pub const GENERATOR_INPUT_TYPE: i64 = 9;

/// Digital input path holding the current state code.
pub const INPUT_STATE_PATH: &str = "/State";

/// Bus name prefix of the generator start/stop controller.
pub const GENERATOR_PREFIX: &str = "com.victronenergy.generator.startstop";

/// Controller flag requesting a manual run. The only path this process writes.
pub const MANUAL_START_PATH: &str = "/Generator0/ManualStart";

/// Controller code naming the active run condition, 0 when none.
pub const RUNNING_CONDITION_PATH: &str = "/Generator0/RunningByConditionCode";

/// Input state reported while the switch says "run".
pub const INPUT_STARTING: i64 = 10;

/// Input state reported while the switch says "stop".
pub const INPUT_STOPPING: i64 = 11;

/// Discovery is refreshed once every this many ticks.
pub const DISCOVERY_INTERVAL_TICKS: u32 = 10;

/// The stop mismatch must persist for more than this many ticks before it is
/// reported.
pub const SYNC_ERROR_DEBOUNCE_TICKS: u32 = 5;

/// Bus name under which this process publishes its own status.
pub const FORWARDING_SERVICE_NAME: &str = "com.victronenergy.generator.Forwarding";

/// Period of the sync loop.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound for a single bus call. Exceeding it counts as a transport fault.
pub const IPC_TIMEOUT: Duration = Duration::from_millis(500);
