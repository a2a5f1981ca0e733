use crate::models::{Document, Page};
use crate::processing::ImageProcessor;
use crate::utils::ExtractionError;
use image::GrayImage;
use std::fs;
use std::path::{Path, PathBuf};

const PAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// A rasterized document the scheduler can pull pages from.
pub trait PageSource {
    /// Stable tag carried by every entry of this document.
    fn name(&self) -> &str;

    fn page_count(&self) -> Result<u32, ExtractionError>;

    /// Pages `first_page..=last_page`, 1-based.
    fn load_pages(&self, first_page: u32, last_page: u32) -> Result<Vec<Page>, ExtractionError>;
}

impl<P: PageSource + ?Sized> PageSource for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn page_count(&self) -> Result<u32, ExtractionError> {
        (**self).page_count()
    }

    fn load_pages(&self, first_page: u32, last_page: u32) -> Result<Vec<Page>, ExtractionError> {
        (**self).load_pages(first_page, last_page)
    }
}

fn check_range(name: &str, first_page: u32, last_page: u32, count: u32) -> Result<(), ExtractionError> {
    if first_page == 0 || first_page > last_page || last_page > count {
        return Err(ExtractionError::DocumentLoad(format!(
            "{}: page range {}..={} outside 1..={}",
            name, first_page, last_page, count
        )));
    }
    Ok(())
}

/// One document as a directory of page images, ordered by file name.
#[derive(Debug, Clone)]
pub struct ImageDirectorySource {
    name: String,
    files: Vec<PathBuf>,
}

impl ImageDirectorySource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, ExtractionError> {
        let dir = dir.as_ref();
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && Self::is_page_image(path))
            .collect();
        files.sort();

        Ok(ImageDirectorySource { name, files })
    }

    fn is_page_image(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl PageSource for ImageDirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> Result<u32, ExtractionError> {
        Ok(self.files.len() as u32)
    }

    fn load_pages(&self, first_page: u32, last_page: u32) -> Result<Vec<Page>, ExtractionError> {
        check_range(&self.name, first_page, last_page, self.page_count()?)?;
        (first_page..=last_page)
            .map(|number| {
                let index = (number - 1) as usize;
                let image = ImageProcessor::load_page(&self.files[index])?;
                Ok(Page::new(index, image))
            })
            .collect()
    }
}

/// Pages already in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    document: Document,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, pages: Vec<GrayImage>) -> Self {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(index, image)| Page::new(index, image))
            .collect();
        InMemorySource {
            document: Document { name: name.into(), pages },
        }
    }
}

impl From<Document> for InMemorySource {
    fn from(document: Document) -> Self {
        InMemorySource { document }
    }
}

impl PageSource for InMemorySource {
    fn name(&self) -> &str {
        &self.document.name
    }

    fn page_count(&self) -> Result<u32, ExtractionError> {
        Ok(self.document.pages.len() as u32)
    }

    fn load_pages(&self, first_page: u32, last_page: u32) -> Result<Vec<Page>, ExtractionError> {
        check_range(&self.document.name, first_page, last_page, self.page_count()?)?;
        Ok(self.document.pages[(first_page - 1) as usize..last_page as usize].to_vec())
    }
}

/// Every sub-directory of `root` is a document; a root without
/// sub-directories is itself the only document.
pub fn discover_documents<P: AsRef<Path>>(root: P) -> Result<Vec<ImageDirectorySource>, ExtractionError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(ExtractionError::DocumentLoad(format!("{} is not a directory", root.display())));
    }

    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    if dirs.is_empty() {
        return Ok(vec![ImageDirectorySource::open(root)?]);
    }
    dirs.iter().map(ImageDirectorySource::open).collect()
}
