pub mod config;
pub mod embedded;
pub mod error;
pub mod report;
pub mod state;
pub mod traits;

pub mod prelude {
    pub use super::config::*;
    pub use super::embedded::*;
    pub use super::error::*;
    pub use super::report::*;
    pub use super::state::*;
    pub use super::traits::*;
}
