//! Session lifecycle: restore, sign in, sign out.

mod state;
mod store;

pub use state::SessionState;
pub use store::SessionStore;
