use env_logger::Env;

pub mod config;

/// Initializes the global logger.
///
/// Call this first!
///
/// # Example
///
/// ```
/// use runstats_agent::init_logger;
///
/// fn main() {
///     init_logger();
///     log::info!("I can log now!");
/// }
/// ```
pub fn init_logger() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
