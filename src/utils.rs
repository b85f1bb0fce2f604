pub mod log;

/// One-time logger set-up for test binaries.
pub mod test_env {

    use crate::utils::log::setup_logger;
    use std::sync::Once;

    static INIT: Once = Once::new();

    /// Install the logger once per process. A logger installed by someone
    /// else is kept.
    pub fn setup() {
        INIT.call_once(|| {
            if let Err(fern::InitError::Io(e)) = setup_logger() {
                eprintln!("Logger couldn't be initialized: {e}");
            }
        });
    }
}
