//! Integration tests for install and uninstall runs through the library API.
//!
//! Each test builds a host project in a temporary directory with packages
//! under `vendor/`, then drives `phases::orchestrator` end to end and checks
//! the files on disk.

#[allow(dead_code)]
mod common;

use common::prelude::*;
use common::{BUNDLES_PHP, SERVICES_YAML};
use copycat::context::PatchContext;
use copycat::phases::orchestrator::{execute_install, execute_uninstall, RunOptions};
use copycat::unit::UnitRegistry;
use serde_json::{json, Map};

fn fixture() -> TestFixture {
    TestFixture::new()
        .with_host_project()
        .with_package("acme/cache", "Acme\\Cache\\", Some(manifests::ACME_CACHE))
        .with_package("zeta/tools", "Zeta\\Tools\\", None)
        .with_package("idle/pkg", "Idle\\Pkg\\", None)
}

fn registry() -> UnitRegistry {
    let mut registry = UnitRegistry::new();
    registry.register("Zeta\\Tools", |ctx: &mut dyn PatchContext| {
        let mut arguments = Map::new();
        arguments.insert("$ttl".to_string(), json!(300));
        ctx.settings_add("Zeta\\Tools\\Warmer", &arguments);
        ctx.ignore_add(&["var/zeta/".to_string()]);
    });
    registry
}

#[test]
fn test_install_patches_every_file() {
    let fixture = fixture();

    let summary = execute_install(fixture.path(), &registry(), RunOptions::default()).unwrap();
    assert_eq!(summary.units_run, 2);
    assert_eq!(summary.units_without_directives, 1);
    assert_eq!(summary.directives_failed, 0, "{:?}", summary.failures);
    assert_eq!(summary.files_written, 6);

    assert_eq!(fixture.read(".copycat/acme_cache.yaml"), "acme_cache: ~\n");
    assert_eq!(
        fixture.read(".gitignore"),
        "/vendor/\n\n###> Acme\\Cache\n.copycat/acme_cache.yaml\n###< Acme\\Cache\n\n###> Zeta\\Tools\nvar/zeta/\n###< Zeta\\Tools\n"
    );
    assert_eq!(
        fixture.read("composer.json"),
        "{\n    \"name\": \"acme/app\",\n    \"extra\": {\n        \"acme-cache\": {\n            \"ttl\": 300\n        }\n    }\n}\n"
    );
    assert_eq!(
        fixture.read(".env.local"),
        "###> Acme\\Cache\nACME_CACHE_TTL=300\n###< Acme\\Cache\n"
    );
    assert_eq!(
        fixture.read("config/bundles.php"),
        "<?php\n\nreturn [\n    Acme\\Cache\\AcmeCacheBundle::class => ['all' => true],\n    Symfony\\Bundle\\FrameworkBundle\\FrameworkBundle::class => ['all' => true],\n];\n"
    );
    assert_eq!(
        fixture.read("config/services.yaml"),
        format!("{}\n    Zeta\\Tools\\Warmer:\n        arguments:\n            $ttl: 300\n", SERVICES_YAML)
    );
}

#[test]
fn test_second_install_changes_nothing() {
    let fixture = fixture();
    execute_install(fixture.path(), &registry(), RunOptions::default()).unwrap();
    let gitignore = fixture.read(".gitignore");
    let services = fixture.read("config/services.yaml");

    let summary = execute_install(fixture.path(), &registry(), RunOptions::default()).unwrap();
    assert_eq!(summary.directives_failed, 0, "{:?}", summary.failures);
    assert_eq!(summary.files_written, 0);
    assert_eq!(summary.stats.added, 0);
    assert_eq!(fixture.read(".gitignore"), gitignore);
    assert_eq!(fixture.read("config/services.yaml"), services);
}

#[test]
fn test_dry_run_leaves_disk_untouched() {
    let fixture = fixture();

    let summary =
        execute_install(fixture.path(), &registry(), RunOptions { dry_run: true }).unwrap();
    assert_eq!(summary.pending_files.len(), 6);
    assert_eq!(summary.files_written, 0);

    fixture.child(".copycat").assert(predicate::path::missing());
    fixture.child(".env.local").assert(predicate::path::missing());
    assert_eq!(fixture.read(".gitignore"), "/vendor/\n");
}

#[test]
fn test_uninstall_restores_package_files() {
    let fixture = fixture();
    execute_install(fixture.path(), &registry(), RunOptions::default()).unwrap();

    let summary =
        execute_uninstall(fixture.path(), &registry(), "acme/cache", RunOptions::default())
            .unwrap();
    assert_eq!(summary.units_run, 1);
    assert_eq!(summary.directives_failed, 0, "{:?}", summary.failures);
    assert_eq!(summary.files_removed, 2);

    fixture
        .child(".copycat/acme_cache.yaml")
        .assert(predicate::path::missing());
    assert_eq!(
        fixture.read(".gitignore"),
        "/vendor/\n\n###> Zeta\\Tools\nvar/zeta/\n###< Zeta\\Tools\n"
    );
    fixture.child(".env.local").assert(predicate::path::missing());
    assert_eq!(fixture.read("config/bundles.php"), BUNDLES_PHP);
    // the emptied parent map stays behind
    assert_eq!(
        fixture.read("composer.json"),
        "{\n    \"name\": \"acme/app\",\n    \"extra\": {}\n}\n"
    );
}

#[test]
fn test_uninstall_reports_unsupported_settings_removal() {
    let fixture = fixture();
    execute_install(fixture.path(), &registry(), RunOptions::default()).unwrap();
    let services = fixture.read("config/services.yaml");

    let summary =
        execute_uninstall(fixture.path(), &registry(), "zeta/tools", RunOptions::default())
            .unwrap();
    assert_eq!(summary.directives_failed, 1);
    assert_eq!(summary.failures[0].directive, "settings_add");
    assert_eq!(fixture.read("config/services.yaml"), services);
    assert_eq!(
        fixture.read(".gitignore"),
        "/vendor/\n\n###> Acme\\Cache\n.copycat/acme_cache.yaml\n###< Acme\\Cache\n"
    );
}

#[test]
fn test_whitelist_limits_units() {
    let fixture = fixture().with_file(".copycat/config.json", r#"{"whitelistedNamespaces": ["Zeta\\"]}"#);

    let summary = execute_install(fixture.path(), &registry(), RunOptions::default()).unwrap();
    assert_eq!(summary.units_run, 1);
    assert_eq!(summary.units_without_directives, 0);
    fixture.child(".env.local").assert(predicate::path::missing());
}

#[test]
fn test_broken_manifest_skips_only_that_unit() {
    let fixture = fixture().with_package("bad/pkg", "Bad\\Pkg\\", Some(manifests::BROKEN));

    let summary = execute_install(fixture.path(), &registry(), RunOptions::default()).unwrap();
    assert_eq!(summary.units_run, 2);
    assert_eq!(summary.units_without_directives, 2);
    assert_eq!(summary.directives_failed, 0);
}

#[test]
fn test_malformed_settings_abort_before_writing() {
    let fixture = fixture().with_file(".copycat/config.json", "{ nope");

    assert!(execute_install(fixture.path(), &registry(), RunOptions::default()).is_err());
    fixture.child(".env.local").assert(predicate::path::missing());
    assert_eq!(fixture.read(".gitignore"), "/vendor/\n");
}
