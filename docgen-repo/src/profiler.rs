//! Project type, tech stack and complexity from the walked structure

use docgen_core::{LanguageStats, ProjectType, RepositoryStructure};
use serde::{Deserialize, Serialize};

/// Characteristic source extensions in priority order
const EXTENSION_PRIORITY: &[(&str, ProjectType)] = &[
    ("py", ProjectType::Python),
    ("java", ProjectType::Java),
    ("go", ProjectType::Go),
    ("rs", ProjectType::Rust),
    ("rb", ProjectType::Ruby),
    ("php", ProjectType::Php),
    ("cs", ProjectType::CSharp),
    ("cpp", ProjectType::Cpp),
    ("ts", ProjectType::TypeScript),
    ("js", ProjectType::JavaScript),
];

const PYTHON_MANIFESTS: &[&str] = &["requirements.txt", "pyproject.toml", "Pipfile"];

const MAX_COMPLEXITY: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectProfile {
    pub project_type: Option<ProjectType>,
    pub tech_stack: Vec<String>,
    pub complexity_score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectProfiler {
    tech_stack_size: usize,
}

impl Default for ProjectProfiler {
    fn default() -> Self {
        Self { tech_stack_size: 3 }
    }
}

impl ProjectProfiler {
    pub fn new(tech_stack_size: usize) -> Self {
        Self { tech_stack_size }
    }

    pub fn infer_project_type(
        &self,
        structure: &RepositoryStructure,
        _languages: &LanguageStats,
    ) -> Option<ProjectType> {
        if structure.has_file_named("package.json") {
            let has_html = structure.has_extension("html") || structure.has_extension("htm");
            return Some(if has_html {
                ProjectType::Web
            } else {
                ProjectType::Node
            });
        }

        let has_python_manifest = PYTHON_MANIFESTS
            .iter()
            .any(|name| structure.has_file_named(name));
        let has_python_source = structure
            .source_files
            .iter()
            .any(|file| file.extension.as_deref() == Some("py"));
        if has_python_manifest && has_python_source {
            return Some(ProjectType::Python);
        }

        EXTENSION_PRIORITY
            .iter()
            .find(|(extension, _)| structure.has_extension(extension))
            .map(|(_, project_type)| *project_type)
    }

    /// Heaviest languages first, ties broken by name
    pub fn rank_tech_stack(&self, languages: &LanguageStats) -> Vec<String> {
        let mut ranked: Vec<(&String, &u64)> = languages.iter().collect();
        ranked.sort_by(|(name_a, weight_a), (name_b, weight_b)| {
            weight_b.cmp(weight_a).then_with(|| name_a.cmp(name_b))
        });

        ranked
            .into_iter()
            .take(self.tech_stack_size)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Weighted size score clamped to `[0, 10]`
    pub fn complexity_score(
        &self,
        structure: &RepositoryStructure,
        languages: &LanguageStats,
    ) -> f64 {
        let score = structure.files.len() as f64 * 0.1
            + languages.len() as f64 * 0.2
            + structure.max_depth() as f64 * 0.15
            + structure.config_files.len() as f64 * 0.1;

        score.clamp(0.0, MAX_COMPLEXITY)
    }

    pub fn profile(
        &self,
        structure: &RepositoryStructure,
        languages: &LanguageStats,
    ) -> ProjectProfile {
        ProjectProfile {
            project_type: self.infer_project_type(structure, languages),
            tech_stack: self.rank_tech_stack(languages),
            complexity_score: self.complexity_score(structure, languages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgen_core::{FileInfo, FileKind};

    fn file(path: &str) -> FileInfo {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let extension = crate::classifier::extension_of(&name);
        FileInfo {
            name,
            path: path.to_string(),
            kind: FileKind::File,
            size: None,
            extension,
            language: None,
            content: None,
        }
    }

    fn structure(paths: &[&str]) -> RepositoryStructure {
        let mut structure = RepositoryStructure::default();
        for path in paths {
            let file = file(path);
            match crate::classifier::classify(&file.name) {
                Some(docgen_core::FileCategory::Main) => structure.main_files.push(file.clone()),
                Some(docgen_core::FileCategory::Source) => {
                    structure.source_files.push(file.clone())
                }
                Some(docgen_core::FileCategory::Config) => {
                    structure.config_files.push(file.clone())
                }
                None => {}
            }
            structure.files.push(file);
        }
        structure
    }

    fn languages(pairs: &[(&str, u64)]) -> LanguageStats {
        pairs
            .iter()
            .map(|(name, weight)| (name.to_string(), *weight))
            .collect()
    }

    #[test]
    fn test_project_type_rules() {
        let profiler = ProjectProfiler::default();
        let none = LanguageStats::new();

        let web = structure(&["package.json", "public/index.html", "src/app.js"]);
        assert_eq!(profiler.infer_project_type(&web, &none), Some(ProjectType::Web));

        let node = structure(&["package.json", "index.js"]);
        assert_eq!(profiler.infer_project_type(&node, &none), Some(ProjectType::Node));

        let python = structure(&["requirements.txt", "app/main.py"]);
        assert_eq!(
            profiler.infer_project_type(&python, &none),
            Some(ProjectType::Python)
        );

        // Java outranks JavaScript in the fallback order
        let mixed = structure(&["web/app.js", "src/Main.java"]);
        assert_eq!(profiler.infer_project_type(&mixed, &none), Some(ProjectType::Java));

        let docs = structure(&["README.md", "notes.txt"]);
        assert_eq!(profiler.infer_project_type(&docs, &none), None);
    }

    #[test]
    fn test_rank_tech_stack() {
        let profiler = ProjectProfiler::default();
        let stats = languages(&[("Python", 500), ("Shell", 20), ("JavaScript", 900), ("Go", 20)]);

        assert_eq!(
            profiler.rank_tech_stack(&stats),
            vec!["JavaScript", "Python", "Go"]
        );
        assert!(profiler.rank_tech_stack(&LanguageStats::new()).is_empty());
    }

    #[test]
    fn test_complexity_of_empty_repository() {
        let profiler = ProjectProfiler::default();
        let score = profiler.complexity_score(&RepositoryStructure::default(), &LanguageStats::new());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_complexity_of_single_deep_file() {
        let profiler = ProjectProfiler::default();
        let score = profiler.complexity_score(
            &structure(&["a/b/c.py"]),
            &languages(&[("Python", 100)]),
        );
        assert!((score - 0.75).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_complexity_is_clamped() {
        let profiler = ProjectProfiler::default();
        let paths: Vec<String> = (0..500).map(|i| format!("src/file{i}.py")).collect();
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();

        let score = profiler.complexity_score(&structure(&paths), &LanguageStats::new());
        assert_eq!(score, 10.0);
    }
}
