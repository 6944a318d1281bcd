//! Core data type definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Supported repository host types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    GitHub,
    GitLab,
    Bitbucket,
    Gitea,
}

impl HostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostType::GitHub => "github",
            HostType::GitLab => "gitlab",
            HostType::Bitbucket => "bitbucket",
            HostType::Gitea => "gitea",
        }
    }
}

impl std::fmt::Display for HostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a remote repository, its host type and the ref to analyze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryReference {
    pub url: String,
    pub host_type: HostType,
    /// Branch, tag or commit. `None` means the repository default branch.
    pub branch: Option<String>,
}

impl RepositoryReference {
    pub fn github(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            host_type: HostType::GitHub,
            branch: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

/// Owner and name of a repository on its host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCoordinates {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Repository metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    /// Repository name
    pub name: String,
    /// Repository description
    pub description: Option<String>,
    /// Default branch name
    pub default_branch: String,
    /// Primary repository language
    pub language: Option<String>,
    /// Repository topics/tags
    pub topics: Vec<String>,
    /// Repository size in KB
    pub size: Option<u64>,
    /// Whether the repository is private
    pub private: bool,
}

/// Kind of a row in a host directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// One row of a host directory listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    /// Path relative to the repository root
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
}

/// Classification bucket of a file, decided from its name alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// Manifests and readmes
    Main,
    Source,
    Config,
}

/// A file or directory discovered by the tree walk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    /// Slash-separated path relative to the repository root; unique per analysis
    pub path: String,
    pub kind: FileKind,
    pub size: Option<u64>,
    /// Lowercased extension without the leading dot
    pub extension: Option<String>,
    pub language: Option<String>,
    /// Raw text, only present once somebody asked for it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileInfo {
    /// Number of path segments, `a/b/c.py` has depth 3
    pub fn depth(&self) -> usize {
        path_depth(&self.path)
    }

    pub fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }
}

/// Count the non-empty segments of a slash-separated path
pub fn path_depth(path: &str) -> usize {
    path.split('/').filter(|segment| !segment.is_empty()).count()
}

/// Classified inventory produced by the tree walk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryStructure {
    pub files: Vec<FileInfo>,
    pub directories: Vec<FileInfo>,
    pub main_files: Vec<FileInfo>,
    pub source_files: Vec<FileInfo>,
    pub config_files: Vec<FileInfo>,
}

impl RepositoryStructure {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }

    /// Deepest file path measured in segments
    pub fn max_depth(&self) -> usize {
        self.files.iter().map(FileInfo::depth).max().unwrap_or(0)
    }

    pub fn has_file_named(&self, name: &str) -> bool {
        self.files.iter().any(|file| file.name == name)
    }

    pub fn has_extension(&self, extension: &str) -> bool {
        self.files
            .iter()
            .any(|file| file.extension.as_deref() == Some(extension))
    }
}

/// Language name to weight (bytes) as reported by the host
pub type LanguageStats = BTreeMap<String, u64>;

/// Manifest family a dependency list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Python,
    Node,
    Rust,
}

/// Dependency names per ecosystem, version constraints stripped
pub type DependencyMap = BTreeMap<Ecosystem, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Web,
    Node,
    Python,
    Java,
    Go,
    Rust,
    Ruby,
    Php,
    CSharp,
    Cpp,
    TypeScript,
    JavaScript,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Web => "web",
            ProjectType::Node => "node",
            ProjectType::Python => "python",
            ProjectType::Java => "java",
            ProjectType::Go => "go",
            ProjectType::Rust => "rust",
            ProjectType::Ruby => "ruby",
            ProjectType::Php => "php",
            ProjectType::CSharp => "csharp",
            ProjectType::Cpp => "cpp",
            ProjectType::TypeScript => "typescript",
            ProjectType::JavaScript => "javascript",
        }
    }
}

/// A function or method found in source text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub params: Vec<String>,
    pub docstring: Option<String>,
    pub return_type: Option<String>,
    /// Raw body text, only captured by pattern-based extraction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub docstring: Option<String>,
    pub methods: Vec<FunctionInfo>,
}

/// Structural facts extracted from one source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub name: String,
    pub path: String,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub imports: Vec<String>,
}

/// Everything the documentation generator gets to see about a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryAnalysis {
    pub reference: RepositoryReference,
    pub coordinates: RepoCoordinates,
    /// Ref the tree was walked at
    pub branch: String,
    pub metadata: RepositoryMetadata,
    pub structure: RepositoryStructure,
    pub languages: LanguageStats,
    pub dependencies: DependencyMap,
    pub project_type: Option<ProjectType>,
    /// Top languages by weight
    pub tech_stack: Vec<String>,
    /// Bounded to `[0, 10]`
    pub complexity_score: f64,
    pub parsed_files: Vec<ParsedFile>,
}

/// Which documentation sections to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationSections {
    pub readme: bool,
    pub comments: bool,
    pub architecture: bool,
    pub checklist: bool,
}

impl Default for DocumentationSections {
    fn default() -> Self {
        Self {
            readme: true,
            comments: true,
            architecture: true,
            checklist: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentationRequest {
    pub repository: RepositoryReference,
    #[serde(default)]
    pub sections: DocumentationSections,
}

/// Output of the documentation generator, opaque to the analysis core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentationResponse {
    pub readme: Option<String>,
    pub comments: Option<Vec<serde_json::Value>>,
    pub architecture: Option<String>,
    pub checklist: Option<Vec<String>>,
}
