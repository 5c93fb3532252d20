use std::io;
use std::path::{Component, Path, PathBuf};

/// Current on-disk content of repository files.
pub trait WorkingTree: Send + Sync {
    /// `Ok(None)` when the file does not exist locally.
    fn read_file(&self, path: &str) -> io::Result<Option<String>>;
}

impl<T: WorkingTree + ?Sized> WorkingTree for &T {
    fn read_file(&self, path: &str) -> io::Result<Option<String>> {
        (**self).read_file(path)
    }
}

/// Reads files relative to a root directory. Paths may not escape the root.
#[derive(Debug, Clone)]
pub struct FsWorkingTree {
    root: PathBuf,
}

impl FsWorkingTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path.trim());
        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path `{path}` escapes the working tree"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl WorkingTree for FsWorkingTree {
    fn read_file(&self, path: &str) -> io::Result<Option<String>> {
        let full = self.resolve(path)?;
        match std::fs::read(&full) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}
