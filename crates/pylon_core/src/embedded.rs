use crate::traits::{AssetSource, ByteStream, SourceEntry};
use bytes::Bytes;
use futures::stream;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::Arc;

/// Root directory of a bundled UI build.
pub const EMBEDDED_ROOT: &str = "build";

/// A UI build compiled into the host binary, e.g. with `include_bytes!`.
///
/// ```
/// use pylon_core::embedded::EmbeddedSource;
///
/// let bundle = EmbeddedSource::new([
///     ("asset-manifest.json", &b"{}"[..]),
///     ("static/js/main.3f2a.js", &b"console.log(1)"[..]),
/// ]);
/// assert_eq!(bundle.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmbeddedSource {
    files: Arc<BTreeMap<String, Bytes>>,
}

impl EmbeddedSource {
    /// `files` are paths relative to the build root.
    pub fn new<I, P, B>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: AsRef<str>,
        B: Into<Bytes>,
    {
        let files = files
            .into_iter()
            .map(|(path, data)| {
                let path = path.as_ref().trim_start_matches('/');
                (format!("{EMBEDDED_ROOT}/{path}"), data.into())
            })
            .collect();
        Self {
            files: Arc::new(files),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{path} is not in the bundle"),
    )
}

impl AssetSource for EmbeddedSource {
    fn root(&self) -> &str {
        EMBEDDED_ROOT
    }

    async fn list(&self, dir: &str) -> Result<Vec<SourceEntry>, io::Error> {
        let dir = dir.trim_end_matches('/');
        let prefix = format!("{dir}/");

        let mut dirs = BTreeSet::new();
        let mut entries = Vec::new();
        for (path, data) in self.files.range(prefix.clone()..) {
            let Some(rest) = path.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    dirs.insert(child.to_string());
                }
                None => entries.push(SourceEntry {
                    name: rest.to_string(),
                    path: path.clone(),
                    is_dir: false,
                    size: data.len() as u64,
                }),
            }
        }

        if entries.is_empty() && dirs.is_empty() && dir != EMBEDDED_ROOT {
            return Err(not_found(dir));
        }

        entries.extend(dirs.into_iter().map(|name| SourceEntry {
            path: format!("{prefix}{name}"),
            name,
            is_dir: true,
            size: 0,
        }));
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn open(&self, path: &str) -> Result<ByteStream, io::Error> {
        let data = self.files.get(path).cloned().ok_or_else(|| not_found(path))?;
        Ok(Box::pin(stream::once(async move { Ok(data) })))
    }

    fn relative_path(&self, path: &str) -> String {
        path.strip_prefix(EMBEDDED_ROOT)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(path)
            .to_string()
    }
}
