//! Configuration for the cartridge CLI.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CARTRIDGE_COURSE_TITLE, CARTRIDGE_COURSE_CODE,
//!    CARTRIDGE_PACKAGE)
//! 2. Config file (.cartridge/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .cartridge/config.yaml
//! - Falls back to the user config directory (cartridge/config.yaml)
//! - The package path in a config file is relative to the project root
//!   (the parent of .cartridge/)

pub mod paths;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const ENV_COURSE_TITLE: &str = "CARTRIDGE_COURSE_TITLE";
pub const ENV_COURSE_CODE: &str = "CARTRIDGE_COURSE_CODE";
pub const ENV_PACKAGE: &str = "CARTRIDGE_PACKAGE";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    /// Package directory (relative to the project root)
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub course: CourseConfig,
    #[serde(default)]
    pub defaults: Option<DefaultsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseConfig {
    pub title: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    pub assignment_points: Option<f64>,
    pub quiz_points: Option<f64>,
    pub published: Option<bool>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub course_title: String,
    pub course_code: String,
    /// Package used when a command names none
    pub package_dir: Option<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub defaults: ContentDefaults,
}

/// Values applied when a command leaves a field out
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDefaults {
    pub assignment_points: f64,
    pub quiz_points: f64,
    pub published: bool,
}

impl Default for ContentDefaults {
    fn default() -> Self {
        Self {
            assignment_points: 100.0,
            quiz_points: 1.0,
            published: true,
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".cartridge").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let user_config = dirs::config_dir()?.join("cartridge").join("config.yaml");
    user_config.exists().then_some(user_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge a parsed config file with environment overrides
fn resolve(
    config_file: Option<(PathBuf, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let defaults = ContentDefaults::default();

    let (config_path, course, package, file_defaults) = match config_file {
        Some((path, config)) => {
            // Project root is the parent of .cartridge/
            let base_dir = path
                .parent()
                .and_then(|p| p.parent())
                .unwrap_or(Path::new("."));
            let package = config.package.as_deref().map(|p| resolve_path(base_dir, p));
            (Some(path), config.course, package, config.defaults)
        }
        None => (None, CourseConfig::default(), None, None),
    };

    let course_title = env(ENV_COURSE_TITLE)
        .or(course.title)
        .unwrap_or_else(|| "Untitled Course".to_string());
    let course_code = env(ENV_COURSE_CODE)
        .or(course.code)
        .unwrap_or_else(|| "COURSE".to_string());
    let package_dir = env(ENV_PACKAGE).map(PathBuf::from).or(package);

    let defaults = ContentDefaults {
        assignment_points: file_defaults
            .as_ref()
            .and_then(|d| d.assignment_points)
            .unwrap_or(defaults.assignment_points),
        quiz_points: file_defaults
            .as_ref()
            .and_then(|d| d.quiz_points)
            .unwrap_or(defaults.quiz_points),
        published: file_defaults
            .as_ref()
            .and_then(|d| d.published)
            .unwrap_or(defaults.published),
    };

    ResolvedConfig {
        course_title,
        course_code,
        package_dir,
        config_file: config_path,
        defaults,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = match find_config_file() {
        Some(path) => {
            let config = load_config_file(&path)?;
            Some((path, config))
        }
        None => None,
    };

    Ok(resolve(config_file, |key| std::env::var(key).ok()))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (bypasses the cache)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, no_env);

        assert_eq!(config.course_title, "Untitled Course");
        assert_eq!(config.course_code, "COURSE");
        assert!(config.package_dir.is_none());
        assert!(config.config_file.is_none());
        assert_eq!(config.defaults, ContentDefaults::default());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(".cartridge");
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
package: ./export
course:
  title: Intro to Rust
  code: RUST-101
defaults:
  assignment_points: 25
  published: false
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.version, "1.0");
        assert_eq!(parsed.course.title.as_deref(), Some("Intro to Rust"));

        let config = resolve(Some((config_path.clone(), parsed)), no_env);
        assert_eq!(config.course_title, "Intro to Rust");
        assert_eq!(config.course_code, "RUST-101");
        assert_eq!(config.package_dir, Some(temp.path().join("export")));
        assert_eq!(config.config_file, Some(config_path));
        assert_eq!(config.defaults.assignment_points, 25.0);
        assert_eq!(config.defaults.quiz_points, 1.0);
        assert!(!config.defaults.published);
    }

    #[test]
    fn test_env_overrides_file() {
        let parsed: ConfigFile = serde_yaml::from_str(
            r#"
version: "1.0"
course:
  title: From File
  code: FILE-1
"#,
        )
        .unwrap();

        let env = |key: &str| match key {
            ENV_COURSE_TITLE => Some("From Env".to_string()),
            ENV_PACKAGE => Some("/srv/course".to_string()),
            _ => None,
        };
        let config = resolve(Some((PathBuf::from("/p/.cartridge/config.yaml"), parsed)), env);

        assert_eq!(config.course_title, "From Env");
        assert_eq!(config.course_code, "FILE-1");
        assert_eq!(config.package_dir, Some(PathBuf::from("/srv/course")));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
