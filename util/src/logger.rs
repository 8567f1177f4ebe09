/// You can adjust the log level without recompiling with the RUST_LOG env variable.
///
///     RUST_LOG=debug cargo test -p sim
///
/// This can be done on a per-crate basis:
///
///     RUST_LOG=citymap=debug,sim=info cargo test
///
/// Intended for test binaries and downstream consumers (a renderer, a
/// headless driver); the engine crates themselves never call this.
pub fn setup() {
    use env_logger::{Builder, Env};
    let _ = Builder::from_env(Env::default().default_filter_or("info")).try_init();
}

#[cfg(test)]
mod tests {
    use super::setup;

    #[test]
    fn setup_is_idempotent() {
        setup();
        setup();
    }
}
