mod fallback;
mod primary;
mod remote;

pub use fallback::FallbackBackend;
pub use primary::PrimaryBackend;
pub use remote::{RemoteBackend, RemoteIndex};
