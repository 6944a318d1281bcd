//! Dependency names from manifest files
//!
//! Each manifest is resolved independently. A manifest that cannot be fetched
//! or parsed leaves its ecosystem with an empty list.

use crate::api::{decode_utf8, RepositoryHost};
use docgen_core::{
    process_concurrently, DependencyMap, DocgenError, DocgenResult, Ecosystem, ErrorContext,
    FileInfo, RepoCoordinates, RepositoryStructure,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Comparison operators that may follow a requirement name
const VERSION_OPERATOR_CHARS: &[char] = &['=', '>', '<', '~', '!'];

pub fn manifest_ecosystem(filename: &str) -> Option<Ecosystem> {
    match filename {
        "requirements.txt" => Some(Ecosystem::Python),
        "package.json" => Some(Ecosystem::Node),
        "Cargo.toml" => Some(Ecosystem::Rust),
        _ => None,
    }
}

/// Requirement names from a pip requirements file
pub fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
                return None;
            }

            let requirement = line
                .split('#')
                .next()
                .unwrap_or_default()
                .split(';')
                .next()
                .unwrap_or_default();
            let name = requirement
                .split(VERSION_OPERATOR_CHARS)
                .next()
                .unwrap_or_default()
                .split(['[', '@'])
                .next()
                .unwrap_or_default()
                .trim();

            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

/// Keys of `dependencies` followed by keys of `devDependencies`
pub fn parse_package_json(content: &str) -> DocgenResult<Vec<String>> {
    let manifest: PackageManifest = serde_json::from_str(content)?;
    Ok(manifest
        .dependencies
        .into_keys()
        .chain(manifest.dev_dependencies.into_keys())
        .collect())
}

#[derive(Debug, Deserialize)]
struct CargoManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, toml::Value>,
    #[serde(default, rename = "dev-dependencies")]
    dev_dependencies: BTreeMap<String, toml::Value>,
    #[serde(default, rename = "build-dependencies")]
    build_dependencies: BTreeMap<String, toml::Value>,
}

/// Keys of the dependency tables of a Cargo manifest
pub fn parse_cargo_toml(content: &str) -> DocgenResult<Vec<String>> {
    let manifest: CargoManifest = toml::from_str(content).map_err(|e| DocgenError::Internal {
        message: format!("Failed to parse Cargo.toml: {}", e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("dependency_resolver").with_operation("parse_cargo_toml"),
    })?;

    Ok(manifest
        .dependencies
        .into_keys()
        .chain(manifest.dev_dependencies.into_keys())
        .chain(manifest.build_dependencies.into_keys())
        .collect())
}

pub fn parse_manifest(ecosystem: Ecosystem, content: &str) -> DocgenResult<Vec<String>> {
    match ecosystem {
        Ecosystem::Python => Ok(parse_requirements(content)),
        Ecosystem::Node => parse_package_json(content),
        Ecosystem::Rust => parse_cargo_toml(content),
    }
}

pub struct DependencyResolver {
    host: Arc<dyn RepositoryHost>,
    max_concurrent: usize,
}

impl DependencyResolver {
    pub fn new(host: Arc<dyn RepositoryHost>, max_concurrent: usize) -> Self {
        Self {
            host,
            max_concurrent,
        }
    }

    /// Resolve every known manifest among the main files
    ///
    /// When one ecosystem has several manifests the one sorting last by path
    /// wins.
    pub async fn resolve(
        &self,
        coords: &RepoCoordinates,
        git_ref: &str,
        structure: &RepositoryStructure,
    ) -> DependencyMap {
        let manifests: Vec<(usize, FileInfo, Ecosystem)> = structure
            .main_files
            .iter()
            .filter_map(|file| Some((file, manifest_ecosystem(&file.name)?)))
            .enumerate()
            .map(|(index, (file, ecosystem))| (index, file.clone(), ecosystem))
            .collect();

        let mut resolved = process_concurrently(
            manifests,
            self.max_concurrent,
            |(index, file, ecosystem)| async move {
                (index, ecosystem, self.fetch_and_parse(coords, git_ref, &file, ecosystem).await)
            },
        )
        .await;
        resolved.sort_by_key(|(index, _, _)| *index);

        let mut dependencies = DependencyMap::new();
        for (_, ecosystem, names) in resolved {
            match names {
                Some(names) => {
                    dependencies.insert(ecosystem, names);
                }
                None => {
                    dependencies.entry(ecosystem).or_default();
                }
            }
        }

        debug!(ecosystems = dependencies.len(), "Dependencies resolved");
        dependencies
    }

    async fn fetch_and_parse(
        &self,
        coords: &RepoCoordinates,
        git_ref: &str,
        file: &FileInfo,
        ecosystem: Ecosystem,
    ) -> Option<Vec<String>> {
        let bytes = match self
            .host
            .get_file_content(&coords.owner, &coords.name, &file.path, git_ref)
            .await
        {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                warn!(path = %file.path, "Manifest listed but not found");
                return None;
            }
            Err(e) => {
                warn!(path = %file.path, error = %e, "Failed to fetch manifest");
                return None;
            }
        };

        let Some(content) = decode_utf8(bytes) else {
            warn!(path = %file.path, "Manifest is not valid UTF-8");
            return None;
        };

        match parse_manifest(ecosystem, &content) {
            Ok(names) => Some(names),
            Err(e) => {
                warn!(path = %file.path, error = %e, "Failed to parse manifest");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HostFailure, InMemoryHost};
    use crate::walker::{CrawlLimits, TreeWalker};

    #[test]
    fn test_parse_requirements() {
        assert_eq!(
            parse_requirements("requests==2.28.0\n# comment\nflask"),
            vec!["requests", "flask"]
        );

        let content = "\n-r base.txt\n--index-url https://example.org\nDjango >= 4.0 # web\n\
                       uvicorn[standard]~=0.20\npywin32; sys_platform == 'win32'\n\
                       numpy!=1.0\nmypkg @ https://example.org/mypkg.whl\n";
        assert_eq!(
            parse_requirements(content),
            vec!["Django", "uvicorn", "pywin32", "numpy", "mypkg"]
        );
    }

    #[test]
    fn test_parse_package_json() {
        let content = r#"{
            "name": "app",
            "dependencies": { "react": "^18.0.0" },
            "devDependencies": { "jest": "^29.0.0" }
        }"#;
        assert_eq!(parse_package_json(content).unwrap(), vec!["react", "jest"]);

        assert!(parse_package_json(r#"{"name": "bare"}"#).unwrap().is_empty());
        assert!(parse_package_json("{ not json").is_err());
    }

    #[test]
    fn test_parse_cargo_toml() {
        let content = r#"
[package]
name = "demo"

[dependencies]
serde = { version = "1", features = ["derive"] }
tokio = "1"

[dev-dependencies]
tempfile = "3"
"#;
        assert_eq!(
            parse_cargo_toml(content).unwrap(),
            vec!["serde", "tokio", "tempfile"]
        );
        assert!(parse_cargo_toml("[dependencies\n").is_err());
    }

    async fn resolve(host: InMemoryHost) -> DependencyMap {
        let host: Arc<dyn RepositoryHost> = Arc::new(host);
        let coords = RepoCoordinates {
            owner: "acme".to_string(),
            name: "demo".to_string(),
        };
        let structure = TreeWalker::new(host.clone(), CrawlLimits::default())
            .walk(&coords, "main")
            .await
            .unwrap();

        DependencyResolver::new(host, 4)
            .resolve(&coords, "main", &structure)
            .await
    }

    #[tokio::test]
    async fn test_resolve_manifests() {
        let dependencies = resolve(
            InMemoryHost::named("demo")
                .with_file(
                    "package.json",
                    r#"{"dependencies":{"react":"18"},"devDependencies":{"jest":"29"}}"#,
                )
                .with_file("requirements.txt", "requests==2.28.0\nflask")
                .with_file("README.md", "# demo"),
        )
        .await;

        assert_eq!(dependencies[&Ecosystem::Node], vec!["react", "jest"]);
        assert_eq!(dependencies[&Ecosystem::Python], vec!["requests", "flask"]);
        assert!(!dependencies.contains_key(&Ecosystem::Rust));
    }

    #[tokio::test]
    async fn test_failed_manifest_leaves_entry_empty() {
        let dependencies = resolve(
            InMemoryHost::named("demo")
                .with_file("package.json", "{ broken")
                .with_file("requirements.txt", "flask")
                .with_file("Cargo.toml", "[dependencies]\nserde = \"1\"\n")
                .fail_content("Cargo.toml", HostFailure::Unavailable),
        )
        .await;

        assert!(dependencies[&Ecosystem::Node].is_empty());
        assert!(dependencies[&Ecosystem::Rust].is_empty());
        assert_eq!(dependencies[&Ecosystem::Python], vec!["flask"]);
    }

    #[tokio::test]
    async fn test_later_manifest_wins() {
        let dependencies = resolve(
            InMemoryHost::named("mono")
                .with_file("api/requirements.txt", "fastapi")
                .with_file("worker/requirements.txt", "celery"),
        )
        .await;

        assert_eq!(dependencies[&Ecosystem::Python], vec!["celery"]);
    }

    #[tokio::test]
    async fn test_resolution_runs_as_boxed_send_future() {
        use futures::future::{BoxFuture, FutureExt};

        let host: Arc<dyn RepositoryHost> =
            Arc::new(InMemoryHost::named("demo").with_file("requirements.txt", "flask"));
        let coords = RepoCoordinates {
            owner: "acme".to_string(),
            name: "demo".to_string(),
        };
        let structure = TreeWalker::new(host.clone(), CrawlLimits::default())
            .walk(&coords, "main")
            .await
            .unwrap();
        let resolver = DependencyResolver::new(host, 4);

        let resolution: BoxFuture<'static, DependencyMap> =
            async move { resolver.resolve(&coords, "main", &structure).await }.boxed();

        assert_eq!(resolution.await[&Ecosystem::Python], vec!["flask"]);
    }
}
