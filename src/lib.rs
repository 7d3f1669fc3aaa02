pub use pylon_core::*;

pub mod fs {
    pub use pylon_fs::*;
}

pub mod publisher {
    pub use pylon_publisher::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use pylon_server::*;
}

#[cfg(feature = "s3")]
pub mod s3 {
    pub use pylon_s3::*;
}

#[cfg(feature = "opendal")]
pub mod opendal {
    pub use pylon_opendal::*;
}

pub mod prelude {
    pub use pylon_core::prelude::*;
    pub use pylon_fs::DiskSource;
    pub use pylon_publisher::prelude::*;

    #[cfg(feature = "server")]
    pub use pylon_server::prelude::*;

    #[cfg(feature = "s3")]
    pub use pylon_s3::S3Store;

    #[cfg(feature = "opendal")]
    pub use pylon_opendal::OpendalStore;
}
