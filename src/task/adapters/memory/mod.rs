//! In-memory adapters for tests and local runs.

mod identity;
mod notifier;
mod store;

pub use identity::InMemoryIdentityDirectory;
pub use notifier::RecordingNotifier;
pub use store::InMemoryDispatchStore;
