// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Labeled dataset discovery.
//!
//! A dataset root is laid out as `root/subject/label/image`. Subjects and
//! labels are directories; images are recognised by extension. Everything is
//! listed in sorted order so image indices, and therefore output names, are
//! stable across runs.

use std::path::{Path, PathBuf};

use crate::error::{PostureError, Result};
use crate::label::Label;

/// Extensions treated as source images.
pub const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff", "tif"];

/// Check if a path is an image file based on extension.
#[must_use]
pub fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy().to_lowercase();
        IMAGE_EXTENSIONS.contains(&ext.as_str())
    })
}

/// One label directory of one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDir {
    /// Directory name, e.g. `hunched`.
    pub name: String,
    /// Image files in sorted order.
    pub images: Vec<PathBuf>,
}

/// One subject directory and its labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Directory name.
    pub name: String,
    /// Label directories in sorted order.
    pub labels: Vec<LabelDir>,
}

/// A single image to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Subject directory name.
    pub subject: String,
    /// Label directory name.
    pub label: String,
    /// Source image path.
    pub path: PathBuf,
    /// Position of the image in its sorted label listing.
    pub index: usize,
}

impl WorkItem {
    /// Output directory for this item below `output_root`.
    #[must_use]
    pub fn output_dir(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.subject).join(&self.label)
    }
}

/// The scanned `subject/label/image` tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
    subjects: Vec<Subject>,
}

/// Sorted directory entries matching `keep`.
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(PostureError::Io)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| keep(path))
        .collect();
    paths.sort();
    Ok(paths)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

impl DatasetLayout {
    /// Scan a dataset root.
    ///
    /// Non-directories at the subject and label levels and non-image files at
    /// the image level are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::ConfigError`] if `root` is not a directory, or
    /// [`PostureError::Io`] if a listing fails.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(PostureError::ConfigError(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        let mut subjects = Vec::new();
        for subject_dir in sorted_entries(root, Path::is_dir)? {
            let mut labels = Vec::new();
            for label_dir in sorted_entries(&subject_dir, Path::is_dir)? {
                let images = sorted_entries(&label_dir, |p| p.is_file() && is_image_file(p))?;
                labels.push(LabelDir {
                    name: dir_name(&label_dir),
                    images,
                });
            }
            subjects.push(Subject {
                name: dir_name(&subject_dir),
                labels,
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            subjects,
        })
    }

    /// Dataset root that was scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Subjects in sorted order.
    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Total number of images.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.subjects
            .iter()
            .flat_map(|s| &s.labels)
            .map(|l| l.images.len())
            .sum()
    }

    /// `(subject, label)` pairs in sorted order.
    pub fn label_dirs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.subjects.iter().flat_map(|s| {
            s.labels
                .iter()
                .map(move |l| (s.name.as_str(), l.name.as_str()))
        })
    }

    /// `(subject, label)` pairs whose label is not a known posture [`Label`].
    ///
    /// Such directories are still processed, but the classifier cannot learn
    /// them.
    pub fn unknown_labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.label_dirs()
            .filter(|(_, label)| label.parse::<Label>().is_err())
    }

    /// Create `output_root/subject/label` for every label directory.
    ///
    /// Existing directories are left alone, so calling this twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::PersistenceError`] if a directory cannot be created.
    pub fn mirror_into(&self, output_root: impl AsRef<Path>) -> Result<()> {
        let output_root = output_root.as_ref();
        let create = |dir: &Path| {
            std::fs::create_dir_all(dir).map_err(|e| {
                PostureError::PersistenceError(format!(
                    "Failed to create directory {}: {e}",
                    dir.display()
                ))
            })
        };

        create(output_root)?;
        for subject in &self.subjects {
            create(&output_root.join(&subject.name))?;
            for label in &subject.labels {
                create(&output_root.join(&subject.name).join(&label.name))?;
            }
        }
        Ok(())
    }

    /// Flatten the tree into work items, in sorted order.
    #[must_use]
    pub fn work_items(&self) -> Vec<WorkItem> {
        self.subjects
            .iter()
            .flat_map(|s| {
                s.labels.iter().flat_map(move |l| {
                    l.images.iter().enumerate().map(move |(index, path)| WorkItem {
                        subject: s.name.clone(),
                        label: l.name.clone(),
                        path: path.clone(),
                        index,
                    })
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    fn build_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for (subject, label) in [("alice", "good"), ("alice", "hunched"), ("bob", "left")] {
            fs::create_dir_all(root.join(subject).join(label)).unwrap();
        }
        touch(&root.join("alice/good/b.jpg"));
        touch(&root.join("alice/good/a.PNG"));
        touch(&root.join("alice/good/notes.txt"));
        touch(&root.join("alice/hunched/0.jpeg"));
        touch(&root.join("bob/left/x.webp"));
        touch(&root.join("stray.jpg"));
        touch(&root.join("alice/loose.jpg"));
        dir
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a.jpg")));
        assert!(is_image_file(Path::new("a.TIF")));
        assert!(!is_image_file(Path::new("a.txt")));
        assert!(!is_image_file(Path::new("jpg")));
    }

    #[test]
    fn test_scan_sorted_and_filtered() {
        let dir = build_tree();
        let layout = DatasetLayout::scan(dir.path()).unwrap();

        let names: Vec<&str> = layout.subjects().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(layout.image_count(), 4);

        let good = &layout.subjects()[0].labels[0];
        assert_eq!(good.name, "good");
        let files: Vec<String> = good.images.iter().map(|p| dir_name(p)).collect();
        assert_eq!(files, vec!["a.PNG", "b.jpg"]);
    }

    #[test]
    fn test_work_items_carry_listing_index() {
        let dir = build_tree();
        let items = DatasetLayout::scan(dir.path()).unwrap().work_items();
        assert_eq!(items.len(), 4);
        assert_eq!((items[0].label.as_str(), items[0].index), ("good", 0));
        assert_eq!((items[1].label.as_str(), items[1].index), ("good", 1));
        assert_eq!((items[2].label.as_str(), items[2].index), ("hunched", 0));
        assert_eq!(items[3].subject, "bob");
        assert_eq!(
            items[3].output_dir(Path::new("/out")),
            PathBuf::from("/out/bob/left")
        );
    }

    #[test]
    fn test_mirror_is_idempotent() {
        let dir = build_tree();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("processed");
        let layout = DatasetLayout::scan(dir.path()).unwrap();

        layout.mirror_into(&target).unwrap();
        layout.mirror_into(&target).unwrap();

        assert!(target.join("alice/good").is_dir());
        assert!(target.join("alice/hunched").is_dir());
        assert!(target.join("bob/left").is_dir());
        assert_eq!(layout.label_dirs().count(), 3);
    }

    #[test]
    fn test_unknown_labels() {
        let dir = build_tree();
        fs::create_dir_all(dir.path().join("bob/Slouch")).unwrap();
        touch(&dir.path().join("bob/Slouch/s.jpg"));
        fs::create_dir_all(dir.path().join("bob/GOOD")).unwrap();
        let layout = DatasetLayout::scan(dir.path()).unwrap();

        let unknown: Vec<(&str, &str)> = layout.unknown_labels().collect();
        assert_eq!(unknown, vec![("bob", "Slouch")]);
    }

    #[test]
    fn test_scan_rejects_missing_root() {
        assert!(matches!(
            DatasetLayout::scan("/definitely/not/here"),
            Err(PostureError::ConfigError(_))
        ));
    }
}
