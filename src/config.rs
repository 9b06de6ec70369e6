use std::env;
use std::path::{Path, PathBuf};

/// Default limit on chained expansions of a single token
pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 100;

/// Settings for one preprocessing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directories searched, in order, when resolving `!include`
    pub search_roots: Vec<PathBuf>,
    /// Render a report of the definitions and the output text
    pub debug: bool,
    pub max_expansion_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_roots: vec![PathBuf::from(".")],
            debug: false,
            max_expansion_depth: DEFAULT_MAX_EXPANSION_DEPTH,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config with the given roots and nothing else
    pub fn with_roots<P: AsRef<Path>>(roots: impl IntoIterator<Item = P>) -> Self {
        Self {
            search_roots: roots.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
            ..Self::default()
        }
    }

    pub fn with_search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.search_roots.push(root.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = depth;
        self
    }

    /// Config from `PYPATH` and `PYPP_DEBUG`
    ///
    /// The current directory comes first, followed by every non-empty
    /// entry of `PYPATH`. Debug mode is on when `PYPP_DEBUG` is non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(cwd) = env::current_dir() {
            config.search_roots = vec![cwd];
        }
        if let Some(paths) = env::var_os("PYPATH") {
            config.search_roots.extend(
                env::split_paths(&paths)
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(|p| expand_home(&p)),
            );
        }
        config.debug = env::var_os("PYPP_DEBUG").is_some_and(|v| !v.is_empty());
        config
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}
