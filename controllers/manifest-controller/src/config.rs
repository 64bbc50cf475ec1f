//! Controller configuration
//!
//! Read from environment variables at startup.

use crate::error::ControllerError;
use manifest_engine::{ApplyStrategy, EngineConfig, StaleKindPolicy};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default deadline for the post-apply wait
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(15);

/// What to do with the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestAction {
    Apply,
    Delete,
}

/// Wait for Deployments matching a label selector after applying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitConfig {
    pub label_selector: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Explicit kubeconfig; inferred when absent
    pub kubeconfig: Option<PathBuf>,
    pub manifest_path: PathBuf,
    pub action: ManifestAction,
    pub namespace: Option<String>,
    /// Values for `${NAME}` placeholders in the manifest
    pub vars: BTreeMap<String, String>,
    pub wait: Option<WaitConfig>,
    pub engine: EngineConfig,
}

impl ControllerConfig {
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let manifest_path = var("MANIFEST_PATH").map(PathBuf::from).ok_or_else(|| {
            ControllerError::InvalidConfig("MANIFEST_PATH environment variable is required".to_string())
        })?;

        let action = match var("MANIFEST_ACTION").as_deref() {
            None | Some("apply") => ManifestAction::Apply,
            Some("delete") => ManifestAction::Delete,
            Some(other) => {
                return Err(ControllerError::InvalidConfig(format!(
                    "MANIFEST_ACTION must be 'apply' or 'delete', got '{other}'"
                )));
            }
        };

        let mut engine = EngineConfig::default();
        if let Some(strategy) = var("APPLY_STRATEGY") {
            engine.apply_strategy = strategy
                .parse::<ApplyStrategy>()
                .map_err(ControllerError::InvalidConfig)?;
        }
        if let Some(field_manager) = var("FIELD_MANAGER") {
            engine.field_manager = field_manager;
        }
        if let Some(prefixes) = var("REINIT_KIND_PREFIXES") {
            engine.stale_kinds = StaleKindPolicy::KindPrefixes(split_list(&prefixes).map(str::to_string).collect());
        }

        let wait = match var("WAIT_LABEL_SELECTOR") {
            Some(label_selector) => {
                let timeout = match var("WAIT_TIMEOUT_SECS") {
                    Some(secs) => Duration::from_secs(secs.parse().map_err(|_| {
                        ControllerError::InvalidConfig(format!("WAIT_TIMEOUT_SECS must be a number of seconds, got '{secs}'"))
                    })?),
                    None => DEFAULT_WAIT_TIMEOUT,
                };
                Some(WaitConfig { label_selector, timeout })
            }
            None => None,
        };

        Ok(Self {
            kubeconfig: var("KUBECONFIG_PATH").map(PathBuf::from),
            manifest_path,
            action,
            namespace: var("TARGET_NAMESPACE"),
            vars: var("MANIFEST_VARS").map(|v| parse_vars(&v)).transpose()?.unwrap_or_default(),
            wait,
            engine,
        })
    }
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// Parse `KEY=VALUE,KEY2=VALUE2`
fn parse_vars(s: &str) -> Result<BTreeMap<String, String>, ControllerError> {
    split_list(s)
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.trim().to_string())),
            _ => Err(ControllerError::InvalidConfig(format!(
                "MANIFEST_VARS entries must look like KEY=VALUE, got '{pair}'"
            ))),
        })
        .collect()
}
