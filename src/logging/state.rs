use once_cell::sync::OnceCell;
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;

// Keep the non-blocking worker guards alive for the entire process lifetime
pub static LOG_GUARDS: OnceCell<Vec<WorkerGuard>> = OnceCell::new();
pub static INIT_ONCE: Once = Once::new();
pub static INIT_ERROR: OnceCell<String> = OnceCell::new();
