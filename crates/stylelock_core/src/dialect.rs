use std::fmt;
use std::path::Path;

/// Stylesheet syntax variant governing how raw text is parsed into rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Css,
    Scss,
    Sass,
    Less,
}

impl Dialect {
    /// Map a file extension (without dot) to its dialect.
    pub fn from_extension(ext: &str) -> Option<Dialect> {
        match ext {
            "css" | "pcss" | "postcss" => Some(Dialect::Css),
            "scss" => Some(Dialect::Scss),
            "sass" => Some(Dialect::Sass),
            "less" => Some(Dialect::Less),
            _ => None,
        }
    }

    /// Dialect for a file path, defaulting to plain CSS.
    pub fn for_path(path: &Path) -> Dialect {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Dialect::from_extension)
            .unwrap_or(Dialect::Css)
    }

    /// Preprocessor sources are parsed with error recovery: the CSS parser
    /// skips constructs it does not understand and still yields every
    /// CSS-compatible rule. Plain CSS parses strictly so that a broken
    /// candidate file surfaces as a hard error.
    pub fn error_recovery(self) -> bool {
        !matches!(self, Dialect::Css)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Css => "css",
            Dialect::Scss => "scss",
            Dialect::Sass => "sass",
            Dialect::Less => "less",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_extension() {
        assert_eq!(Dialect::from_extension("css"), Some(Dialect::Css));
        assert_eq!(Dialect::from_extension("pcss"), Some(Dialect::Css));
        assert_eq!(Dialect::from_extension("postcss"), Some(Dialect::Css));
        assert_eq!(Dialect::from_extension("scss"), Some(Dialect::Scss));
        assert_eq!(Dialect::from_extension("sass"), Some(Dialect::Sass));
        assert_eq!(Dialect::from_extension("less"), Some(Dialect::Less));
        assert_eq!(Dialect::from_extension("js"), None);
    }

    #[test]
    fn test_for_path_defaults_to_css() {
        assert_eq!(Dialect::for_path(&PathBuf::from("a/b/theme.scss")), Dialect::Scss);
        assert_eq!(Dialect::for_path(&PathBuf::from("a/b/theme")), Dialect::Css);
        assert_eq!(Dialect::for_path(&PathBuf::from("a/b/readme.md")), Dialect::Css);
    }

    #[test]
    fn test_error_recovery_polarity() {
        assert!(!Dialect::Css.error_recovery());
        assert!(Dialect::Scss.error_recovery());
        assert!(Dialect::Sass.error_recovery());
        assert!(Dialect::Less.error_recovery());
    }
}
