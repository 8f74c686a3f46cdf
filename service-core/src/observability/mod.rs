pub mod logging;
pub mod metrics;

pub use self::logging::{contain_panics, init_tracing, install_panic_hook, panics_are_contained};
pub use self::metrics::{init_metrics, render_metrics};
