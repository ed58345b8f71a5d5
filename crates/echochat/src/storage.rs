use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct DataPath {
    base: PathBuf,
}

impl DataPath {
    pub fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref().to_path_buf();
        Self { base }
    }

    pub fn default_base() -> Option<PathBuf> {
        dirs::data_local_dir().map(|pb| pb.join("echochat"))
    }

    pub fn default_base_or_cwd() -> PathBuf {
        Self::default_base().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn rel_path(&self, typ: DataPathType) -> PathBuf {
        match typ {
            DataPathType::Log => PathBuf::from("logs"),
            DataPathType::Identity => PathBuf::from("identity"),
        }
    }

    pub fn path(&self, typ: DataPathType) -> PathBuf {
        self.base.join(self.rel_path(typ))
    }
}

impl Default for DataPath {
    fn default() -> Self {
        Self::new(Self::default_base_or_cwd())
    }
}

pub enum DataPathType {
    Log,
    Identity,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Directory {
    pub file_path: PathBuf,
}

impl Directory {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn get_file(&self, file_name: &str) -> Result<String> {
        let filepath = self.file_path.join(file_name);

        if filepath.is_file() {
            Ok(fs::read_to_string(filepath)?)
        } else {
            Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Requested file was not found: {file_name}"),
            )))
        }
    }
}

/// Write the file to the directory
pub fn write_file(directory: &Path, file_name: &str, data: &str) -> Result<()> {
    if !directory.exists() {
        fs::create_dir_all(directory)?
    }

    fs::write(directory.join(file_name), data)?;
    Ok(())
}

pub fn delete_file(directory: &Path, file_name: &str) -> Result<()> {
    let file_to_delete = directory.join(file_name);
    if file_to_delete.is_file() {
        fs::remove_file(file_to_delete).map_err(Error::Io)
    } else {
        Err(Error::Generic(format!(
            "Requested file to delete was not found: {file_name}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_get_delete() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let directory = Directory::new(tmp.path().join("nested"));
        let file_name = "file_test_name.txt";

        write_file(&directory.file_path, file_name, "test").expect("write");
        assert_eq!(directory.get_file(file_name).expect("read"), "test");

        delete_file(&directory.file_path, file_name).expect("delete");
        assert!(directory.get_file(file_name).is_err());
        assert!(delete_file(&directory.file_path, file_name).is_err());
    }

    #[test]
    fn data_path_layout() {
        let path = DataPath::new("/tmp/echo");
        assert_eq!(
            path.path(DataPathType::Identity),
            PathBuf::from("/tmp/echo/identity")
        );
        assert_eq!(path.path(DataPathType::Log), PathBuf::from("/tmp/echo/logs"));
    }
}
