use pylon_core::prelude::*;
use std::vec;

/// Depth-first walk over an [`AssetSource`].
///
/// Directories are entered the moment they come up in their parent's
/// listing, so a directory's whole subtree is yielded before its next
/// sibling. Listing happens lazily; a fresh walker lists the source again.
/// The first listing error ends the walk.
pub struct Walker<'a, A: AssetSource> {
    source: &'a A,
    stack: Vec<vec::IntoIter<SourceEntry>>,
    started: bool,
}

impl<'a, A: AssetSource> Walker<'a, A> {
    pub fn new(source: &'a A) -> Self {
        Self {
            source,
            stack: Vec::new(),
            started: false,
        }
    }

    async fn descend(&mut self, dir: &str) -> Result<(), PublishError> {
        match self.source.list(dir).await {
            Ok(children) => {
                self.stack.push(children.into_iter());
                Ok(())
            }
            Err(source) => {
                self.stack.clear();
                Err(PublishError::SourceUnreadable {
                    path: dir.to_string(),
                    source,
                })
            }
        }
    }

    pub async fn next(&mut self) -> Option<Result<AssetEntry, PublishError>> {
        if !self.started {
            self.started = true;
            let root = self.source.root().to_string();
            if let Err(e) = self.descend(&root).await {
                return Some(Err(e));
            }
        }

        loop {
            let next = self.stack.last_mut()?.next();
            match next {
                None => {
                    self.stack.pop();
                }
                Some(entry) if entry.is_dir => {
                    if let Err(e) = self.descend(&entry.path).await {
                        return Some(Err(e));
                    }
                }
                Some(entry) => {
                    return Some(Ok(AssetEntry {
                        relative_path: self.source.relative_path(&entry.path),
                        name: entry.name,
                        source_path: entry.path,
                        size: entry.size,
                    }));
                }
            }
        }
    }
}
