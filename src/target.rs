//! # Patch Targets
//!
//! Closed sets of named destinations a unit may patch. Each target knows the
//! project-relative location it stands for, the host system it requires (if
//! any) and, for structured documents, which paths units may touch and
//! whether reverse patches are allowed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A host system whose presence can be verified through an indicator path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KnownSystem {
    Symfony,
    Ddev,
    Git,
    Composer,
}

/// What kind of filesystem entry marks a system as present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    File,
    Directory,
}

impl KnownSystem {
    /// Project-relative path whose presence marks this system.
    pub fn indicator(&self) -> &'static str {
        match self {
            KnownSystem::Symfony => "config/bundles.php",
            KnownSystem::Ddev => ".ddev",
            KnownSystem::Git => ".git",
            KnownSystem::Composer => "composer.json",
        }
    }

    pub fn indicator_kind(&self) -> IndicatorKind {
        match self {
            KnownSystem::Symfony | KnownSystem::Composer => IndicatorKind::File,
            KnownSystem::Ddev | KnownSystem::Git => IndicatorKind::Directory,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KnownSystem::Symfony => "symfony",
            KnownSystem::Ddev => "ddev",
            KnownSystem::Git => "git",
            KnownSystem::Composer => "composer",
        }
    }
}

impl fmt::Display for KnownSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Directories files can be copied into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CopyTarget {
    DdevCommandsWeb,
    DdevCommandsHost,
    SymfonyBin,
    SymfonyConfigPackages,
    SymfonyConfigRoutes,
    Public,
    CopycatConfig,
}

impl CopyTarget {
    /// Project-relative directory
    pub fn dir(&self) -> &'static str {
        match self {
            CopyTarget::DdevCommandsWeb => ".ddev/commands/web",
            CopyTarget::DdevCommandsHost => ".ddev/commands/host",
            CopyTarget::SymfonyBin => "bin",
            CopyTarget::SymfonyConfigPackages => "config/packages",
            CopyTarget::SymfonyConfigRoutes => "config/routes",
            CopyTarget::Public => "public",
            CopyTarget::CopycatConfig => ".copycat",
        }
    }

    pub fn system(&self) -> Option<KnownSystem> {
        match self {
            CopyTarget::DdevCommandsWeb | CopyTarget::DdevCommandsHost => Some(KnownSystem::Ddev),
            CopyTarget::SymfonyBin
            | CopyTarget::SymfonyConfigPackages
            | CopyTarget::SymfonyConfigRoutes => Some(KnownSystem::Symfony),
            CopyTarget::Public | CopyTarget::CopycatConfig => None,
        }
    }
}

/// Serialization format of a structured document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

/// Structured documents that accept values at addressed paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentTarget {
    ComposerJson,
    DdevConfig,
}

impl DocumentTarget {
    /// Project-relative file
    pub fn file(&self) -> &'static str {
        match self {
            DocumentTarget::ComposerJson => "composer.json",
            DocumentTarget::DdevConfig => ".ddev/config.yaml",
        }
    }

    pub fn format(&self) -> DocumentFormat {
        match self {
            DocumentTarget::ComposerJson => DocumentFormat::Json,
            DocumentTarget::DdevConfig => DocumentFormat::Yaml,
        }
    }

    pub fn system(&self) -> Option<KnownSystem> {
        match self {
            DocumentTarget::ComposerJson => Some(KnownSystem::Composer),
            DocumentTarget::DdevConfig => Some(KnownSystem::Ddev),
        }
    }

    /// Path prefixes units may write below. `None` means unrestricted.
    pub fn allowed_prefixes(&self) -> Option<&'static [&'static str]> {
        match self {
            DocumentTarget::ComposerJson => Some(&["extra"]),
            DocumentTarget::DdevConfig => Some(&["hooks", "web_environment"]),
        }
    }

    /// Whether reverse patches may delete values from this document.
    pub fn is_removable(&self) -> bool {
        match self {
            DocumentTarget::ComposerJson => true,
            DocumentTarget::DdevConfig => false,
        }
    }
}

/// Environment-style `KEY=value` files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvTarget {
    Local,
    Test,
    Example,
}

impl EnvTarget {
    pub fn file(&self) -> &'static str {
        match self {
            EnvTarget::Local => ".env.local",
            EnvTarget::Test => ".env.test",
            EnvTarget::Example => ".env.example",
        }
    }

    pub fn system(&self) -> Option<KnownSystem> {
        None
    }
}
