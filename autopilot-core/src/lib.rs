pub mod agent;
pub mod clock;
pub mod config;
pub mod driver;
pub mod event;
pub mod paths;
pub mod snapshot;
pub mod tmux;

// Re-export commonly used types at crate root
pub use clock::{Clock, Cooldowns, SystemClock};
pub use config::Config;
pub use driver::{Driver, DriverSettings, DriverState, PollOutcome};
pub use event::DriverEvent;
pub use snapshot::PaneSnapshot;
pub use tmux::{PaneBridge, TmuxProvider};
