use crate::util::write_atomic;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// The container results and errors are rendered into. Every write replaces
/// the whole content; when a mirror path is set the file is replaced too.
#[derive(Debug, Default)]
pub struct DisplayRegion {
    content: String,
    mirror: Option<PathBuf>,
}

impl DisplayRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mirrored_to(path: &Path) -> Self {
        Self {
            content: String::new(),
            mirror: Some(path.to_path_buf()),
        }
    }

    /// The in-memory content is replaced even when the mirror write fails.
    pub fn replace(&mut self, content: String) -> Result<()> {
        self.content = content;
        if let Some(path) = &self.mirror {
            write_atomic(path, self.content.as_bytes())?;
        }
        Ok(())
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
