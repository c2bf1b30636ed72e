//! Extension-based file classification.
//!
//! Maps a file's extension to a category name using an ordered table.
//! The first category whose extension list contains the extension wins;
//! anything unmatched lands in [`FALLBACK_CATEGORY`].
//!
//! # Examples
//!
//! ```
//! use sortbox::file_category::ExtensionTable;
//! use std::path::Path;
//!
//! let table = ExtensionTable::default();
//! assert_eq!(table.classify(Path::new("report.PDF")), "Documents");
//! assert_eq!(table.classify(Path::new("photo.jpg")), "Images");
//! assert_eq!(table.classify(Path::new("mystery.xyz")), "Others");
//! ```

use std::path::Path;

/// Category that receives every file no configured category claims.
pub const FALLBACK_CATEGORY: &str = "Others";

/// A named bucket of extensions. The name doubles as the destination
/// folder name directly under the organized root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    extensions: Vec<String>,
}

impl Category {
    /// Creates a category. Extensions are lowercased; they are expected to
    /// carry their leading dot (`".pdf"`).
    pub fn new<I, S>(name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn claims(&self, extension: &str) -> bool {
        self.extensions.iter().any(|ext| ext == extension)
    }
}

/// An extension claimed by more than one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub extension: String,
    /// The category that wins lookups (earlier in table order).
    pub winner: String,
    /// The later category that never sees this extension.
    pub shadowed: String,
}

/// Ordered extension-to-category lookup table.
///
/// Order is insertion order of the categories and is never re-sorted, so
/// overlapping extensions resolve the same way on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionTable {
    categories: Vec<Category>,
}

impl ExtensionTable {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Configured categories in lookup order. The implicit fallback is not
    /// included unless it was configured explicitly.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Returns the category for a file path, based on its final extension.
    pub fn classify(&self, path: &Path) -> &str {
        self.classify_extension(&extension_of(path))
    }

    /// Returns the category for an extension such as `".PDF"`.
    ///
    /// Matching is case-insensitive. Never fails: the empty extension and
    /// unknown extensions resolve to [`FALLBACK_CATEGORY`].
    pub fn classify_extension(&self, extension: &str) -> &str {
        let extension = extension.to_lowercase();
        if extension.is_empty() {
            return FALLBACK_CATEGORY;
        }

        self.categories
            .iter()
            .find(|category| category.claims(&extension))
            .map(Category::name)
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// Every category folder name, in table order, with the fallback last.
    pub fn category_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.iter().map(Category::name).collect();
        if !names.contains(&FALLBACK_CATEGORY) {
            names.push(FALLBACK_CATEGORY);
        }
        names
    }

    /// True if `name` is a configured category or the fallback.
    pub fn is_category_name(&self, name: &str) -> bool {
        name == FALLBACK_CATEGORY || self.categories.iter().any(|c| c.name == name)
    }

    /// Lists extensions that appear in more than one category.
    pub fn overlaps(&self) -> Vec<Overlap> {
        let mut overlaps = Vec::new();
        for (index, later) in self.categories.iter().enumerate() {
            for extension in &later.extensions {
                if let Some(winner) = self.categories[..index].iter().find(|c| c.claims(extension)) {
                    overlaps.push(Overlap {
                        extension: extension.clone(),
                        winner: winner.name.clone(),
                        shadowed: later.name.clone(),
                    });
                }
            }
        }
        overlaps
    }
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self::new(vec![
            Category::new(
                "Documents",
                [
                    ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ods",
                    ".ppt", ".pptx", ".odp", ".md", ".csv",
                ],
            ),
            Category::new(
                "Images",
                [
                    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp", ".heic",
                ],
            ),
            Category::new(
                "Audio",
                [".mp3", ".wav", ".aac", ".flac", ".ogg", ".m4a", ".wma"],
            ),
            Category::new(
                "Videos",
                [
                    ".mp4", ".mov", ".avi", ".mkv", ".flv", ".wmv", ".webm", ".mpeg", ".mpg",
                ],
            ),
            Category::new(
                "Archives",
                [".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz"],
            ),
            Category::new(
                "Scripts",
                [
                    ".py", ".js", ".ts", ".sh", ".bat", ".ps1", ".rb", ".php", ".pl", ".java",
                    ".c", ".cpp", ".cs",
                ],
            ),
            Category::new("Ebooks", [".epub", ".mobi", ".azw3"]),
            Category::new("Fonts", [".ttf", ".otf", ".woff", ".woff2"]),
        ])
    }
}

/// Returns the lowercase final extension of `path` including the dot, or
/// an empty string when there is none.
///
/// Dotfiles such as `.bashrc` and names ending in a bare dot have no
/// extension.
pub fn extension_of(path: &Path) -> String {
    match path.extension() {
        Some(ext) if !ext.is_empty() => format!(".{}", ext.to_string_lossy().to_lowercase()),
        _ => String::new(),
    }
}
