//! Engine-side state: the visible bank window, the last-sent mirror cache,
//! the connection lifecycle, the extended-edit mode and the FX container
//! tree. All of it is plain data; I/O stays in the engine.

pub mod bank;
pub mod connection;
pub mod edit;
pub mod fx_tree;
pub mod mirror;

pub use bank::Bank;
pub use connection::{ConnectionManager, ConnectionState, HANDSHAKE_RETRY_LIMIT};
pub use edit::{EditController, EditFeedback, EditMode};
pub use fx_tree::FxTree;
pub use mirror::MirrorCache;
