//! # pylon server
//!
//! The admin surface a host process mounts next to its UI: it receives
//! publisher configuration and tells the page renderer which prefix to put
//! in front of asset links.

mod api;
pub mod server;
pub mod state;

pub mod prelude {
    pub use crate::api::StaticPrefix;
    pub use crate::server::*;
    pub use crate::state::*;
}
