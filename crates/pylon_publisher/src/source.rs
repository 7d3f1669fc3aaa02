use pylon_core::prelude::*;
use pylon_fs::DiskSource;

/// The build tree a publisher walks, chosen once at startup.
#[derive(Debug, Clone)]
pub enum AssetRoot {
    Disk(DiskSource),
    Embedded(EmbeddedSource),
}

impl AssetRoot {
    /// A non-empty static path override wins over the bundled build.
    pub fn select(static_path: Option<&str>, bundle: EmbeddedSource) -> Self {
        match static_path.map(str::trim).filter(|path| !path.is_empty()) {
            Some(path) => AssetRoot::Disk(DiskSource::new(path)),
            None => AssetRoot::Embedded(bundle),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AssetRoot::Disk(_) => "disk",
            AssetRoot::Embedded(_) => "embedded",
        }
    }
}

impl AssetSource for AssetRoot {
    fn root(&self) -> &str {
        match self {
            AssetRoot::Disk(s) => s.root(),
            AssetRoot::Embedded(s) => s.root(),
        }
    }

    async fn list(&self, dir: &str) -> Result<Vec<SourceEntry>, std::io::Error> {
        match self {
            AssetRoot::Disk(s) => s.list(dir).await,
            AssetRoot::Embedded(s) => s.list(dir).await,
        }
    }

    async fn open(&self, path: &str) -> Result<ByteStream, std::io::Error> {
        match self {
            AssetRoot::Disk(s) => s.open(path).await,
            AssetRoot::Embedded(s) => s.open(path).await,
        }
    }

    fn relative_path(&self, path: &str) -> String {
        match self {
            AssetRoot::Disk(s) => s.relative_path(path),
            AssetRoot::Embedded(s) => s.relative_path(path),
        }
    }
}
