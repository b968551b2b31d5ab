// ABOUTME: Sandboxed filesystem access for the `load` primitive and prelude loading
// Provides safe filesystem access with capability-based security using cap-std

use crate::config::FsConfig;
use cap_std::fs::Dir;

/// Error type for sandbox operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SandboxError {
    PathNotAllowed(String),
    FileNotFound(String),
    FileTooLarge(String),
    IoError(String),
}

impl std::fmt::Display for SandboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxError::PathNotAllowed(path) => {
                write!(f, "access denied: {} is not in allowed paths", path)
            }
            SandboxError::FileNotFound(path) => write!(f, "file not found: {}", path),
            SandboxError::FileTooLarge(msg) => write!(f, "file too large: {}", msg),
            SandboxError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SandboxError {}

/// Capability-scoped filesystem access backing the `load` primitive (§4.4)
/// and the facade's prelude loader (§6 "Persisted state").
pub struct Sandbox {
    fs_roots: Vec<Dir>,
    fs_config: FsConfig,
}

impl Sandbox {
    pub fn new(fs_config: FsConfig) -> Result<Self, SandboxError> {
        let mut fs_roots = Vec::new();

        for path in &fs_config.allowed_paths {
            std::fs::create_dir_all(path).map_err(|e| {
                SandboxError::IoError(format!("cannot create {}: {}", path.display(), e))
            })?;

            let dir = Dir::open_ambient_dir(path, cap_std::ambient_authority()).map_err(|e| {
                SandboxError::IoError(format!("cannot open {}: {}", path.display(), e))
            })?;

            fs_roots.push(dir);
        }

        Ok(Self {
            fs_roots,
            fs_config,
        })
    }

    fn validate_path(path: &str) -> Result<(), SandboxError> {
        if path.starts_with('/') || path.starts_with('\\') {
            return Err(SandboxError::PathNotAllowed(path.to_string()));
        }
        if path.contains("..") {
            return Err(SandboxError::PathNotAllowed(path.to_string()));
        }
        Ok(())
    }

    fn find_root_for_read(&self, path: &str) -> Result<&Dir, SandboxError> {
        for root in &self.fs_roots {
            if root.metadata(path).is_ok() {
                return Ok(root);
            }
        }
        self.fs_roots
            .first()
            .ok_or_else(|| SandboxError::PathNotAllowed(path.to_string()))
    }

    /// Reads file contents for the `load` primitive (§4.4) via cap-std's
    /// capability-scoped `Dir`, which rejects `..`/absolute escapes by
    /// construction.
    pub fn read_file(&self, path: &str) -> Result<String, SandboxError> {
        Self::validate_path(path)?;
        let root = self.find_root_for_read(path)?;

        root.read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SandboxError::FileNotFound(path.to_string())
            } else {
                SandboxError::IoError(format!("cannot read {}: {}", path, e))
            }
        })
    }

    /// Writes file contents, used by the `write-file`-shaped needs of the
    /// ambient stack (SPEC_FULL.md §10); always targets the first root.
    pub fn write_file(&self, path: &str, contents: &str) -> Result<(), SandboxError> {
        Self::validate_path(path)?;

        if contents.len() > self.fs_config.max_file_size {
            return Err(SandboxError::FileTooLarge(format!(
                "{} bytes exceeds limit of {} bytes",
                contents.len(),
                self.fs_config.max_file_size
            )));
        }

        let root = self
            .fs_roots
            .first()
            .ok_or_else(|| SandboxError::PathNotAllowed(path.to_string()))?;

        root.write(path, contents)
            .map_err(|e| SandboxError::IoError(format!("cannot write {}: {}", path, e)))
    }

    pub fn file_exists(&self, path: &str) -> bool {
        if Self::validate_path(path).is_err() {
            return false;
        }
        self.fs_roots.iter().any(|root| root.metadata(path).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn unique_test_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "lisp-eval-core-sandbox-test-{}-{}",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn read_file_success() {
        let dir = unique_test_dir("read");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("test.txt"), "hello world").unwrap();

        let sandbox = Sandbox::new(FsConfig {
            allowed_paths: vec![dir.clone()],
            ..Default::default()
        })
        .unwrap();

        assert_eq!(sandbox.read_file("test.txt").unwrap(), "hello world");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = unique_test_dir("write");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let sandbox = Sandbox::new(FsConfig {
            allowed_paths: vec![dir.clone()],
            ..Default::default()
        })
        .unwrap();

        sandbox.write_file("out.txt", "payload").unwrap();
        assert_eq!(sandbox.read_file("out.txt").unwrap(), "payload");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn path_traversal_rejected() {
        let dir = unique_test_dir("traversal");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let sandbox = Sandbox::new(FsConfig {
            allowed_paths: vec![dir.clone()],
            ..Default::default()
        })
        .unwrap();

        let result = sandbox.read_file("../../../etc/passwd");
        assert!(matches!(result, Err(SandboxError::PathNotAllowed(_))));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn absolute_path_rejected() {
        let dir = unique_test_dir("absolute");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let sandbox = Sandbox::new(FsConfig {
            allowed_paths: vec![dir.clone()],
            ..Default::default()
        })
        .unwrap();

        let result = sandbox.read_file("/etc/passwd");
        assert!(matches!(result, Err(SandboxError::PathNotAllowed(_))));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_exists_reports_presence() {
        let dir = unique_test_dir("exists");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("here.txt"), "x").unwrap();

        let sandbox = Sandbox::new(FsConfig {
            allowed_paths: vec![dir.clone()],
            ..Default::default()
        })
        .unwrap();

        assert!(sandbox.file_exists("here.txt"));
        assert!(!sandbox.file_exists("missing.txt"));
        let _ = fs::remove_dir_all(&dir);
    }
}
