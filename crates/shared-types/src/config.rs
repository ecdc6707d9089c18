use serde::Deserialize;

/// Top-level shape of `config.toml`. Everything defaults so a missing or
/// partial file still yields a working configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub roles: RolesConfig,
}

/// Optional subsystems toggled at startup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeatureFlags {
    /// Serve the interactive API reference at `/docs`.
    #[serde(default)]
    pub docs: bool,
}

/// How `RoleRef`s in user payloads are resolved against the role table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleLookup {
    /// Resolve by numeric role id.
    #[default]
    Id,
    /// Resolve by authority name (e.g. "ROLE_STUDENT").
    Authority,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RolesConfig {
    #[serde(default)]
    pub lookup: RoleLookup,
}
