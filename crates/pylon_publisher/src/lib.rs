//! # pylon publisher
//!
//! Publishes a compiled web UI build to an object storage bucket that backs a
//! CDN.
//!
//! A pass walks the build depth-first, skips files the CDN should not serve,
//! repoints `/static` references in the bundle entry points at the CDN,
//! uploads every remaining file and reads it back through the public URL.
//! The first upload or read-back failure aborts the pass and withdraws the
//! CDN prefix until a later pass succeeds.
//!
//! ## Usage
//!
//! ```no_run
//! use pylon_core::prelude::*;
//! use pylon_publisher::prelude::*;
//!
//! # async fn run(store: impl ObjectStore, config: PublishConfig) {
//! let source = AssetRoot::select(Some("/srv/ui/build"), EmbeddedSource::default());
//! let handle = Publisher::new(source, move |_: &PublishConfig| {
//!     Ok::<_, StorageError>(store.clone())
//! })
//! .spawn();
//!
//! let ticket = handle.update_config(config);
//! let state = handle.wait_for(ticket).await;
//! println!("assets served from {:?}", state.static_prefix());
//! # }
//! ```

pub mod publisher;
pub mod rewrite;
pub mod source;
pub mod upload;
pub mod validate;
pub mod verify;
pub mod walk;

#[cfg(test)]
mod testing;

pub mod prelude {
    pub use crate::publisher::*;
    pub use crate::rewrite::*;
    pub use crate::source::*;
    pub use crate::upload::*;
    pub use crate::validate::*;
    pub use crate::verify::*;
    pub use crate::walk::*;
}
