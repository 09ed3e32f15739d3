use tracing::Level;

/// Install the global fmt subscriber. Returns `false` when one was already
/// installed, in which case `level` is ignored.
pub fn init_tracing(level: Level) -> bool {
    let initialised = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .try_init()
        .is_ok();

    if initialised {
        tracing::debug!(%level, "tracing initialised");
    }
    initialised
}
