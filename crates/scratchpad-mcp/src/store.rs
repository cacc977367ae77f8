//! Shared scratchpad state handed to tools, resources, and prompts.

use std::sync::Arc;
use tokio::sync::Mutex;

use scratchpad::ScratchpadStore;

/// The single lock guarding all scratchpad mutations.
pub type SharedStore = Arc<Mutex<ScratchpadStore>>;

/// Create a fresh, empty shared store.
pub fn shared_store() -> SharedStore {
    Arc::new(Mutex::new(ScratchpadStore::new()))
}
