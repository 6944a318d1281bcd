//! File classification from the file name alone

use docgen_core::FileCategory;

/// Manifests and readmes, matched exactly
pub const MAIN_FILES: &[&str] = &[
    "README.md",
    "README.rst",
    "README.txt",
    "README",
    "readme.md",
    "LICENSE",
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "Pipfile",
    "Cargo.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "Gemfile",
    "composer.json",
];

/// Source extensions, without the dot
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "pyi", "js", "jsx", "mjs", "cjs", "ts", "tsx", "java", "kt", "go", "rs", "rb", "php",
    "cs", "cpp", "cc", "cxx", "hpp", "c", "h", "swift", "scala", "vue", "html", "htm", "css",
    "scss", "sh",
];

/// Configuration files matched exactly
pub const CONFIG_FILES: &[&str] = &[
    ".gitignore",
    ".dockerignore",
    ".editorconfig",
    ".env.example",
    ".babelrc",
    ".eslintrc",
    ".prettierrc",
    "Dockerfile",
    "Makefile",
    "tsconfig.json",
    "jest.config.json",
    "setup.cfg",
    "tox.ini",
    "rustfmt.toml",
    "clippy.toml",
];

/// Configuration extensions, without the dot
pub const CONFIG_EXTENSIONS: &[&str] = &["yml", "yaml", "ini", "cfg", "conf", "env", "properties"];

const LANGUAGES: &[(&str, &str)] = &[
    ("py", "Python"),
    ("pyi", "Python"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("mjs", "JavaScript"),
    ("cjs", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("go", "Go"),
    ("rs", "Rust"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("cs", "C#"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("cxx", "C++"),
    ("hpp", "C++"),
    ("c", "C"),
    ("h", "C"),
    ("swift", "Swift"),
    ("scala", "Scala"),
    ("vue", "Vue"),
    ("html", "HTML"),
    ("htm", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("sh", "Shell"),
];

/// Bucket for `filename`, checked main, then source, then config
pub fn classify(filename: &str) -> Option<FileCategory> {
    if MAIN_FILES.contains(&filename) {
        return Some(FileCategory::Main);
    }

    let extension = extension_of(filename);
    let has_extension = |table: &[&str]| {
        extension
            .as_deref()
            .is_some_and(|ext| table.contains(&ext))
    };

    if has_extension(SOURCE_EXTENSIONS) {
        return Some(FileCategory::Source);
    }

    if CONFIG_FILES.contains(&filename) || has_extension(CONFIG_EXTENSIONS) {
        return Some(FileCategory::Config);
    }

    None
}

/// Lowercased extension; dotfiles such as `.gitignore` have none
pub fn extension_of(filename: &str) -> Option<String> {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_lowercase()),
        _ => None,
    }
}

pub fn language_for_extension(extension: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, language)| *language)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets_matching(name: &str) -> usize {
        let ext = extension_of(name);
        let in_ext = |table: &[&str]| ext.as_deref().is_some_and(|e| table.contains(&e));

        [
            MAIN_FILES.contains(&name),
            in_ext(SOURCE_EXTENSIONS),
            CONFIG_FILES.contains(&name) || in_ext(CONFIG_EXTENSIONS),
        ]
        .iter()
        .filter(|matched| **matched)
        .count()
    }

    #[test]
    fn test_main_files_classify_as_main() {
        for name in MAIN_FILES {
            assert_eq!(classify(name), Some(FileCategory::Main), "{name}");
        }
    }

    #[test]
    fn test_tables_are_disjoint() {
        let sample_names = MAIN_FILES
            .iter()
            .map(|name| name.to_string())
            .chain(CONFIG_FILES.iter().map(|name| name.to_string()))
            .chain(SOURCE_EXTENSIONS.iter().map(|ext| format!("file.{ext}")))
            .chain(CONFIG_EXTENSIONS.iter().map(|ext| format!("file.{ext}")));

        for name in sample_names {
            assert_eq!(buckets_matching(&name), 1, "{name} matches several buckets");
        }
    }

    #[test]
    fn test_classify_examples() {
        assert_eq!(classify("app.py"), Some(FileCategory::Source));
        assert_eq!(classify("Index.TSX"), Some(FileCategory::Source));
        assert_eq!(classify(".gitignore"), Some(FileCategory::Config));
        assert_eq!(classify("docker-compose.yml"), Some(FileCategory::Config));
        assert_eq!(classify("logo.png"), None);
        assert_eq!(classify("notes"), None);
    }

    #[test]
    fn test_extension_and_language() {
        assert_eq!(extension_of("main.RS").as_deref(), Some("rs"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of(".env"), None);
        assert_eq!(extension_of("Makefile"), None);

        assert_eq!(language_for_extension("py"), Some("Python"));
        assert_eq!(language_for_extension("TS"), Some("TypeScript"));
        assert_eq!(language_for_extension("png"), None);
    }
}
