use std::path::{Component, Path, PathBuf};

/// File name of the consolidated index inside the output directory
pub const INDEX_FILE: &str = "info.csv";

/// File extension given to every extracted image
pub const IMAGE_EXTENSION: &str = "jpg";

/// Paths making up the on-disk output layout of one run
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub index: PathBuf,
}

impl OutputLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let index = root.join(INDEX_FILE);
        Self { root, index }
    }

    /// Directory holding every image of one label: "<root>/<label_text>"
    ///
    /// Only the plain name components of the label are used, so root, prefix
    /// and ".." components can never move the directory outside `root`.
    pub fn label_dir(&self, label_text: &str) -> PathBuf {
        let mut dir = self.root.clone();
        for component in Path::new(label_text).components() {
            if let Component::Normal(name) = component {
                dir.push(name);
            }
        }
        dir
    }

    /// "<root>/<label_text>/<id>.jpg"
    pub fn image_path(&self, label_text: &str, id: i64) -> PathBuf {
        self.label_dir(label_text)
            .join(format!("{}.{}", id, IMAGE_EXTENSION))
    }

    /// Hidden staging file the index is streamed into before it is renamed into place
    /// "<root>/info.csv" -> "<root>/.info.csv.<run_id>.tmp"
    pub fn staging_index(&self, run_id: &str) -> PathBuf {
        self.root.join(format!(".{}.{}.tmp", INDEX_FILE, run_id))
    }
}
