mod fingerprint;
mod info;
mod resolve;
mod store;

pub use fingerprint::cmd_fingerprint;
pub use info::cmd_info;
pub use resolve::cmd_resolve;
pub use store::cmd_store;
