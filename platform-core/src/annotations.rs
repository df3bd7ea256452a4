//! The annotation surface operators and cluster admins use to steer reconciliation.
//!
//! Every key lives under the reserved prefix [`PREFIX`]; everything else on the object is left
//! alone. This module only parses and validates — applying `patch`/`ignore-fields` to a tree is
//! [`crate::override_engine`]'s job.
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Reserved annotation/label prefix.
pub const PREFIX: &str = "virt-platform.io/";

pub const PATCH: &str = "virt-platform.io/patch";
pub const IGNORE_FIELDS: &str = "virt-platform.io/ignore-fields";
pub const MODE: &str = "virt-platform.io/mode";
pub const RECONCILE_PAUSED: &str = "virt-platform.io/reconcile-paused";

/// The label the applier stamps on every object it manages, so ownership survives restarts
/// without relying on in-memory state.
pub const MANAGED_BY_LABEL: &str = "virt-platform.io/managed-by";
pub const MANAGED_BY_VALUE: &str = "virt-platform-operator";

/// `virt-platform.io/mode` values. `Enforce` is the default when the annotation is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Drift is corrected every reconcile (the default).
    Enforce,
    /// Drift is reported via `compliance_status` but never corrected.
    Observe,
}

impl InstallMode {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "enforce" => Ok(Self::Enforce),
            "observe" => Ok(Self::Observe),
            other => Err(Error::Validation(format!("unknown {MODE} value {other:?}"))),
        }
    }
}

/// The override annotations present on one managed object, already parsed and validated.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Parsed `patch` — an RFC 6902 document applied after rendering, before drift comparison.
    pub patch: Option<json_patch::Patch>,
    /// Parsed `ignore-fields` — RFC 6901 pointers masked out of the drift comparison.
    pub ignore_fields: Vec<String>,
    pub mode: InstallMode,
    pub reconcile_paused: bool,
}

impl Overrides {
    /// Parses the subset of `annotations` under [`PREFIX`] into a validated [`Overrides`].
    ///
    /// Unknown keys under the prefix are rejected rather than silently ignored, since a typo'd
    /// key (`virt-platform.io/ignor-fields`) would otherwise fail open.
    pub fn from_annotations(annotations: &BTreeMap<String, String>) -> Result<Self> {
        let mut overrides = Overrides { mode: InstallMode::Enforce, ..Default::default() };

        for (key, value) in annotations {
            if !key.starts_with(PREFIX) {
                continue;
            }
            match key.as_str() {
                PATCH => {
                    let patch: json_patch::Patch = serde_json::from_str(value)
                        .map_err(|e| Error::PatchApply(format!("{PATCH} is not valid RFC 6902: {e}")))?;
                    overrides.patch = Some(patch);
                }
                IGNORE_FIELDS => {
                    overrides.ignore_fields =
                        value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
                    for pointer in &overrides.ignore_fields {
                        if !pointer.starts_with('/') {
                            return Err(Error::Validation(format!(
                                "{IGNORE_FIELDS} entry {pointer:?} is not an RFC 6901 pointer"
                            )));
                        }
                    }
                }
                MODE => overrides.mode = InstallMode::parse(value)?,
                RECONCILE_PAUSED => {
                    overrides.reconcile_paused = value
                        .parse::<bool>()
                        .map_err(|_| Error::Validation(format!("{RECONCILE_PAUSED} must be \"true\" or \"false\"")))?;
                }
                other => return Err(Error::Validation(format!("unrecognized annotation {other:?}"))),
            }
        }

        Ok(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_no_annotations_present() {
        let overrides = Overrides::from_annotations(&BTreeMap::new()).unwrap();
        assert!(overrides.patch.is_none());
        assert!(overrides.ignore_fields.is_empty());
        assert_eq!(overrides.mode, InstallMode::Enforce);
        assert!(!overrides.reconcile_paused);
    }

    #[test]
    fn ignores_annotations_outside_prefix() {
        let annotations = annotations(&[("kubectl.kubernetes.io/last-applied-configuration", "{}")]);
        assert!(Overrides::from_annotations(&annotations).is_ok());
    }

    #[test]
    fn parses_ignore_fields_csv() {
        let annotations = annotations(&[(IGNORE_FIELDS, "/spec/replicas, /metadata/labels/foo")]);
        let overrides = Overrides::from_annotations(&annotations).unwrap();
        assert_eq!(overrides.ignore_fields, vec!["/spec/replicas", "/metadata/labels/foo"]);
    }

    #[test]
    fn rejects_ignore_fields_without_leading_slash() {
        let annotations = annotations(&[(IGNORE_FIELDS, "spec.replicas")]);
        assert!(Overrides::from_annotations(&annotations).is_err());
    }

    #[test]
    fn rejects_malformed_patch_json() {
        let annotations = annotations(&[(PATCH, "not json")]);
        assert!(Overrides::from_annotations(&annotations).is_err());
    }

    #[test]
    fn rejects_unknown_key_under_prefix() {
        let annotations = annotations(&[("virt-platform.io/typo-field", "x")]);
        assert!(Overrides::from_annotations(&annotations).is_err());
    }

    #[test]
    fn parses_reconcile_paused_bool() {
        let annotations = annotations(&[(RECONCILE_PAUSED, "true")]);
        let overrides = Overrides::from_annotations(&annotations).unwrap();
        assert!(overrides.reconcile_paused);
    }

    #[test]
    fn observe_mode_parses() {
        let annotations = annotations(&[(MODE, "observe")]);
        let overrides = Overrides::from_annotations(&annotations).unwrap();
        assert_eq!(overrides.mode, InstallMode::Observe);
    }
}
