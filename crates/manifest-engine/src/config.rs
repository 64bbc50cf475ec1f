//! Engine configuration

use std::str::FromStr;
use std::time::Duration;

/// Field manager recorded on objects written by the engine
pub const DEFAULT_FIELD_MANAGER: &str = "manifest-controller";

/// How objects are written to the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyStrategy {
    /// Server-side apply with a fixed field manager
    #[default]
    ServerSide,
    /// Get, then create when absent or update with the live resourceVersion
    CreateOrUpdate,
}

impl FromStr for ApplyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server-side" | "ssa" => Ok(Self::ServerSide),
            "create-or-update" => Ok(Self::CreateOrUpdate),
            other => Err(format!(
                "unknown apply strategy '{other}', expected 'server-side' or 'create-or-update'"
            )),
        }
    }
}

/// Which unknown kinds justify rebuilding the client handle and retrying once
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StaleKindPolicy {
    /// Never rebuild; `NoKindMatch` is returned as is
    Never,
    /// Rebuild for any unknown kind
    Any,
    /// Rebuild only for kinds served by an extension API group: a dotted group
    /// outside `k8s.io`. Built-in groups (core, `apps`, `*.k8s.io`) never
    /// appear after startup, so an unknown kind there is a typo.
    #[default]
    Extensions,
    /// Rebuild only for kinds starting with one of these prefixes
    KindPrefixes(Vec<String>),
}

impl StaleKindPolicy {
    pub fn should_reinit(&self, group: &str, kind: &str) -> bool {
        match self {
            Self::Never => false,
            Self::Any => true,
            Self::Extensions => is_extension_group(group),
            Self::KindPrefixes(prefixes) => prefixes.iter().any(|p| kind.starts_with(p.as_str())),
        }
    }
}

fn is_extension_group(group: &str) -> bool {
    group.contains('.') && group != "k8s.io" && !group.ends_with(".k8s.io")
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub field_manager: String,
    pub apply_strategy: ApplyStrategy,
    /// Take ownership of fields held by other managers on server-side apply
    pub force_conflicts: bool,
    pub stale_kinds: StaleKindPolicy,
    /// Interval between checks in [`crate::Reconciler::wait_for_objects`]
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            apply_strategy: ApplyStrategy::default(),
            force_conflicts: true,
            stale_kinds: StaleKindPolicy::default(),
            poll_interval: crate::poll::POLL_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.field_manager, "manifest-controller");
        assert_eq!(config.apply_strategy, ApplyStrategy::ServerSide);
        assert!(config.force_conflicts);
        assert_eq!(config.stale_kinds, StaleKindPolicy::Extensions);
        assert_eq!(config.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("server-side".parse(), Ok(ApplyStrategy::ServerSide));
        assert_eq!("Create-Or-Update".parse(), Ok(ApplyStrategy::CreateOrUpdate));
        assert!("replace".parse::<ApplyStrategy>().is_err());
    }

    #[test]
    fn test_kind_prefix_policy() {
        let policy = StaleKindPolicy::KindPrefixes(vec!["ClickHouse".to_string()]);
        assert!(policy.should_reinit("clickhouse.altinity.com", "ClickHouseInstallation"));
        assert!(!policy.should_reinit("apps", "Deployment"));
        assert!(!StaleKindPolicy::Never.should_reinit("clickhouse.altinity.com", "ClickHouseInstallation"));
    }

    #[test]
    fn test_extension_policy_skips_builtin_groups() {
        let policy = StaleKindPolicy::Extensions;
        assert!(policy.should_reinit("clickhouse.altinity.com", "ClickHouseInstallation"));
        assert!(policy.should_reinit("cert-manager.io", "Certificate"));
        assert!(!policy.should_reinit("", "ConfigMapp"));
        assert!(!policy.should_reinit("apps", "Deploymnet"));
        assert!(!policy.should_reinit("rbac.authorization.k8s.io", "ClusterRol"));
        assert!(!policy.should_reinit("k8s.io", "Anything"));
        assert!(StaleKindPolicy::Any.should_reinit("", "ConfigMapp"));
    }
}
