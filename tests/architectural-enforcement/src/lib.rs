//! Architectural Enforcement
//!
//! Source scanners behind the workspace policy tests:
//! - No blocking I/O inside async functions
//! - No sleep() calls in production code
//!
//! The scanners are line based. Anything after a `#[cfg(test)]` line is test
//! code and is skipped.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["chat/core/src", "chat/cli/src", "tui/src"];

/// A policy breach found in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub line_number: usize,
    pub reason: &'static str,
    pub line: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line_number,
            self.reason,
            self.line
        )
    }
}

/// Kind of function enclosing a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enclosing {
    Async,
    Sync,
    /// Module level, or a boundary was hit first
    None,
}

/// Workspace root, two levels above this package
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from("../.."))
}

/// All `.rs` files under the production directories
pub fn production_files() -> Vec<PathBuf> {
    let root = workspace_root();
    PRODUCTION_DIRS
        .iter()
        .map(|dir| root.join(dir))
        .filter(|dir| dir.exists())
        .flat_map(|dir| {
            walkdir::WalkDir::new(dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
                .map(|e| e.into_path())
        })
        .collect()
}

/// Lines of a file up to (not including) its `#[cfg(test)]` module
pub fn production_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .take_while(|line| !line.trim().starts_with("#[cfg(test)]"))
        .collect()
}

/// Strip a trailing `//` comment
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Whether a trimmed line opens a function, and if so which kind
pub fn function_kind(line: &str) -> Option<Enclosing> {
    let mut rest = line.trim();
    for prefix in ["pub(crate) ", "pub(super) ", "pub "] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }
    if rest.starts_with("async fn ") {
        Some(Enclosing::Async)
    } else if rest.starts_with("fn ") || rest.starts_with("const fn ") {
        Some(Enclosing::Sync)
    } else {
        None
    }
}

/// Find the function enclosing `current_idx` by scanning backwards
pub fn enclosing_function(lines: &[&str], current_idx: usize) -> Enclosing {
    for i in (0..current_idx).rev() {
        if let Some(kind) = function_kind(lines[i]) {
            return kind;
        }
        let line = lines[i].trim();
        if line.starts_with("mod ") || line.starts_with("pub mod ") {
            return Enclosing::None;
        }
    }
    Enclosing::None
}

/// Blocking calls that must not appear inside async functions
const BLOCKING_PATTERNS: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("reqwest::blocking", "Blocking HTTP client"),
    ("std::io::stdin()", "Blocking stdin in async"),
    ("std::io::stdout()", "Blocking stdout in async"),
    ("io::stdin().read_line", "Blocking stdin in async"),
];

/// Blocking I/O inside async functions
pub fn blocking_io_violations(path: &Path, content: &str) -> Vec<Violation> {
    let lines = production_lines(content);
    let mut violations = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let code = code_part(line);
        let Some(&(_, reason)) = BLOCKING_PATTERNS.iter().find(|(p, _)| code.contains(p)) else {
            continue;
        };
        if enclosing_function(&lines, idx + 1) == Enclosing::Async {
            violations.push(Violation {
                path: path.to_path_buf(),
                line_number: idx + 1,
                reason,
                line: line.trim().to_string(),
            });
        }
    }
    violations
}

/// Any sleep call outside test code
pub fn sleep_violations(path: &Path, content: &str) -> Vec<Violation> {
    production_lines(content)
        .iter()
        .enumerate()
        .filter(|(_, line)| {
            let code = code_part(line);
            code.contains("::sleep(") || code.contains(".sleep(")
        })
        .map(|(idx, line)| Violation {
            path: path.to_path_buf(),
            line_number: idx + 1,
            reason: "Sleep in production code",
            line: line.trim().to_string(),
        })
        .collect()
}

/// Run a scanner over every production file
pub fn scan_production<F>(scanner: F) -> Vec<Violation>
where
    F: Fn(&Path, &str) -> Vec<Violation>,
{
    production_files()
        .iter()
        .filter_map(|path| fs::read_to_string(path).ok().map(|c| scanner(path, &c)))
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(code: &str) -> Vec<Violation> {
        blocking_io_violations(Path::new("sample.rs"), code)
    }

    #[test]
    fn test_blocking_io_in_async_fn_detected() {
        let violations = scan(
            "pub async fn load() {\n    let text = std::fs::read_to_string(\"a\");\n}\n",
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line_number, 2);
        assert_eq!(violations[0].reason, "Blocking file I/O");
    }

    #[test]
    fn test_blocking_io_in_sync_fn_allowed() {
        let code = "pub(crate) fn load() {\n    let text = std::fs::read_to_string(\"a\");\n}\n";
        assert!(scan(code).is_empty());
    }

    #[test]
    fn test_test_module_skipped() {
        let code = "fn a() {}\n#[cfg(test)]\nmod tests {\n    async fn t() { std::fs::File::create(\"x\"); }\n}\n";
        assert!(scan(code).is_empty());
    }

    #[test]
    fn test_comments_ignored() {
        let code = "async fn a() {\n    // std::fs::read is forbidden here\n}\n";
        assert!(scan(code).is_empty());
    }

    #[test]
    fn test_function_kind() {
        assert_eq!(function_kind("    pub async fn run(&mut self)"), Some(Enclosing::Async));
        assert_eq!(function_kind("fn main() {"), Some(Enclosing::Sync));
        assert_eq!(function_kind("let f = 1;"), None);
    }

    #[test]
    fn test_sleep_detected() {
        let code = "async fn wait() {\n    tokio::time::sleep(d).await;\n}\n";
        assert_eq!(sleep_violations(Path::new("s.rs"), code).len(), 1);
    }
}
