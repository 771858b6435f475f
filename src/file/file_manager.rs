use std::fs::{File, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::error::{FileError, FileResult};
use super::page_store::{PageStore, check_buffer_len};
use super::{PAGE_SIZE, PageId};

/// A paged file on disk
pub struct PageFile {
    file: File,
    path: PathBuf,
}

impl PageFile {
    /// Create a new file holding a single zeroed page
    pub fn create<P: AsRef<Path>>(path: P) -> FileResult<()> {
        let path = path.as_ref();

        if path.exists() {
            return Err(FileError::FileAlreadyExists(path.display().to_string()));
        }

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        file.write_all(&[0u8; PAGE_SIZE])?;
        file.sync_data()?;
        Ok(())
    }

    /// Open an existing file
    pub fn open<P: AsRef<Path>>(path: P) -> FileResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| match e.kind() {
                IoErrorKind::NotFound => FileError::FileNotFound(path.display().to_string()),
                _ => FileError::Io(e),
            })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Flush and close the file
    pub fn close(self) -> FileResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Remove (delete) a file
    pub fn destroy<P: AsRef<Path>>(path: P) -> FileResult<()> {
        let path = path.as_ref();
        std::fs::remove_file(path).map_err(|e| match e.kind() {
            IoErrorKind::NotFound => FileError::FileNotFound(path.display().to_string()),
            _ => FileError::Io(e),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageStore for PageFile {
    fn read_block(&mut self, page_id: PageId, buffer: &mut [u8]) -> FileResult<()> {
        check_buffer_len(buffer.len())?;

        let page_count = self.page_count()?;
        if page_id >= page_count {
            return Err(FileError::ReadNonExistingPage {
                page_id,
                page_count,
            });
        }

        let offset = (page_id * PAGE_SIZE) as u64;
        self.file.seek(SeekFrom::Start(offset))?;

        let bytes_read = self.file.read(buffer)?;

        // A trailing partial page reads as zero-padded
        if bytes_read < PAGE_SIZE {
            buffer[bytes_read..].fill(0);
        }

        Ok(())
    }

    fn write_block(&mut self, page_id: PageId, buffer: &[u8]) -> FileResult<()> {
        check_buffer_len(buffer.len())?;

        let offset = (page_id * PAGE_SIZE) as u64;
        let required_size = offset + PAGE_SIZE as u64;

        // Extend file if necessary to ensure we can write at this offset
        let current_size = self.file.metadata()?.len();
        if current_size < required_size {
            self.file.set_len(required_size)?;
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buffer)?;
        // Don't sync on every write; the buffer pool syncs on flush and shutdown

        Ok(())
    }

    fn page_count(&mut self) -> FileResult<usize> {
        let file_size = self.file.metadata()?.len();
        Ok(file_size.div_ceil(PAGE_SIZE as u64) as usize)
    }

    fn sync(&mut self) -> FileResult<()> {
        self.file.sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_create_file() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");

        PageFile::create(&test_file).unwrap();
        assert!(test_file.exists());

        let mut file = PageFile::open(&test_file).unwrap();
        assert_eq!(file.page_count().unwrap(), 1);

        let mut buffer = vec![1u8; PAGE_SIZE];
        file.read_block(0, &mut buffer).unwrap();
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_create_file_already_exists() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");

        PageFile::create(&test_file).unwrap();
        let result = PageFile::create(&test_file);
        assert!(matches!(result, Err(FileError::FileAlreadyExists(_))));
    }

    #[test]
    fn test_open_nonexistent_file() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("nonexistent.db");

        let result = PageFile::open(&test_file);
        assert!(matches!(result, Err(FileError::FileNotFound(_))));
    }

    #[test]
    fn test_read_write_block() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");
        PageFile::create(&test_file).unwrap();
        let mut file = PageFile::open(&test_file).unwrap();

        let mut write_buffer = vec![0u8; PAGE_SIZE];
        write_buffer[0] = 42;
        write_buffer[100] = 99;
        write_buffer[PAGE_SIZE - 1] = 255;
        file.write_block(0, &write_buffer).unwrap();

        let mut read_buffer = vec![0u8; PAGE_SIZE];
        file.read_block(0, &mut read_buffer).unwrap();
        assert_eq!(read_buffer, write_buffer);
    }

    #[test]
    fn test_write_extends_file() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");
        PageFile::create(&test_file).unwrap();
        let mut file = PageFile::open(&test_file).unwrap();

        let buffer = vec![3u8; PAGE_SIZE];
        file.write_block(5, &buffer).unwrap();
        assert_eq!(file.page_count().unwrap(), 6);

        let mut read_buffer = vec![0u8; PAGE_SIZE];
        file.read_block(5, &mut read_buffer).unwrap();
        assert_eq!(read_buffer[17], 3);
    }

    #[test]
    fn test_read_nonexistent_page() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");
        PageFile::create(&test_file).unwrap();
        let mut file = PageFile::open(&test_file).unwrap();

        let mut buffer = vec![0u8; PAGE_SIZE];
        let result = file.read_block(100, &mut buffer);
        assert!(matches!(
            result,
            Err(FileError::ReadNonExistingPage { page_id: 100, .. })
        ));
    }

    #[test]
    fn test_ensure_capacity_and_reopen() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");
        PageFile::create(&test_file).unwrap();

        let mut file = PageFile::open(&test_file).unwrap();
        file.ensure_capacity(4).unwrap();
        file.close().unwrap();

        let mut file = PageFile::open(&test_file).unwrap();
        assert_eq!(file.page_count().unwrap(), 4);
    }

    #[test]
    fn test_destroy_file() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");

        PageFile::create(&test_file).unwrap();
        PageFile::destroy(&test_file).unwrap();
        assert!(!test_file.exists());

        let result = PageFile::destroy(&test_file);
        assert!(matches!(result, Err(FileError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_buffer_size() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");
        PageFile::create(&test_file).unwrap();
        let mut file = PageFile::open(&test_file).unwrap();

        let mut small_buffer = vec![0u8; PAGE_SIZE - 1];
        let result = file.read_block(0, &mut small_buffer);
        assert!(matches!(result, Err(FileError::InvalidPageSize { .. })));

        let large_buffer = vec![0u8; PAGE_SIZE + 1];
        let result = file.write_block(0, &large_buffer);
        assert!(matches!(result, Err(FileError::InvalidPageSize { .. })));
    }
}
