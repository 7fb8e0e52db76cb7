//! Default values for copycat.
//!
//! Well-known file names and directories shared by the resolver, the
//! discovery phase and the patch contexts.

/// Dependency directory of the host project. Patches never write below it.
pub const VENDOR_DIR: &str = "vendor";

/// Package manifest read from every installed package during discovery.
pub const PACKAGE_MANIFEST: &str = "composer.json";

/// Declarative directive file a unit can ship in its root directory.
pub const UNIT_MANIFEST: &str = "copycat.yaml";

/// Key of the settings object inside the project's `composer.json` `extra` block.
pub const SETTINGS_EXTRA_KEY: &str = "copycat";

/// Standalone settings file, used when `composer.json` has no settings object.
pub const SETTINGS_FILE: &str = ".copycat/config.json";

/// Ignore-list file in the project root.
pub const IGNORE_FILE: &str = ".gitignore";

/// Module-registry file of a Symfony project.
pub const REGISTRY_FILE: &str = "config/bundles.php";

/// Service settings file of a Symfony project.
pub const SERVICES_FILE: &str = "config/services.yaml";

/// Top-level block header in the service settings file.
pub const SERVICES_HEADER: &str = "services:";
