/// Re-export `Config` from `tally-core` for use within this crate.
///
/// All environment-variable parsing lives in `tally-core` so it can be shared
/// with integration tests without depending on the full server.
pub use tally_core::config::{AuthMode, Config};
