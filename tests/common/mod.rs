//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file and `use common::prelude::*;` to get the
//! fixture and the usual assertion crates.

use assert_fs::prelude::*;
use serde_json::{Map, Value};
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
}

/// Unit manifests used across tests.
#[allow(dead_code)]
pub mod manifests {
    /// Copies a config file (ignored), sets a composer value, adds an env
    /// entry and registers a bundle.
    pub const ACME_CACHE: &str = r#"
- copy:
    target: copycat-config
    file: resources/acme_cache.yaml
    ignore: true
    create-dir: true
- document:
    target: composer-json
    path: extra.acme-cache
    value: { ttl: 300 }
    overwrite: true
- env:
    target: local
    entries:
      ACME_CACHE_TTL: 300
- registry:
    name: Acme\Cache\AcmeCacheBundle
"#;

    /// Not a list of directives.
    pub const BROKEN: &str = "copy: nope\n";
}

#[allow(dead_code)]
pub const COMPOSER_JSON: &str = "{\n    \"name\": \"acme/app\"\n}\n";
#[allow(dead_code)]
pub const BUNDLES_PHP: &str =
    "<?php\n\nreturn [\n    Symfony\\Bundle\\FrameworkBundle\\FrameworkBundle::class => ['all' => true],\n];\n";
#[allow(dead_code)]
pub const SERVICES_YAML: &str = "services:\n    _defaults:\n        autowire: true\n";

/// A temporary host project.
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_host_project()
///     .with_package("acme/cache", "Acme\\Cache\\", Some(manifests::ACME_CACHE));
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// A git + composer + symfony project with an empty `vendor/`.
    pub fn with_host_project(self) -> Self {
        self.temp_dir
            .child(".git")
            .create_dir_all()
            .expect("Failed to create .git");
        self.temp_dir
            .child("vendor")
            .create_dir_all()
            .expect("Failed to create vendor");
        self.with_file("composer.json", COMPOSER_JSON)
            .with_file("config/bundles.php", BUNDLES_PHP)
            .with_file("config/services.yaml", SERVICES_YAML)
            .with_file(".gitignore", "/vendor/\n")
    }

    /// Install a package under `vendor/` declaring one PSR-4 namespace, with
    /// an optional `copycat.yaml` manifest and one shipped resource file.
    pub fn with_package(self, name: &str, namespace: &str, manifest: Option<&str>) -> Self {
        let mut psr4 = Map::new();
        psr4.insert(namespace.to_string(), Value::String("src/".to_string()));
        let mut autoload = Map::new();
        autoload.insert("psr-4".to_string(), Value::Object(psr4));
        let mut composer = Map::new();
        composer.insert("name".to_string(), Value::String(name.to_string()));
        composer.insert("autoload".to_string(), Value::Object(autoload));

        let package = format!("vendor/{}", name);
        let fixture = self
            .with_file(
                &format!("{}/composer.json", package),
                &Value::Object(composer).to_string(),
            )
            .with_file(
                &format!("{}/resources/acme_cache.yaml", package),
                "acme_cache: ~\n",
            );
        match manifest {
            Some(manifest) => fixture.with_file(&format!("{}/copycat.yaml", package), manifest),
            None => fixture,
        }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Read a project file.
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A `copycat` command pointed at this project, without colors.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("copycat");
        cmd.env_remove("COPYCAT_PROJECT_ROOT")
            .arg("--project-root")
            .arg(self.path())
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
