//! Applies the `patch`/`ignore-fields` overrides to a rendered tree before it's compared against
//! cluster state.
use std::collections::HashSet;

use crate::annotations::Overrides;
use crate::error::{Error, Result};
use crate::tree::DynTree;

/// Kinds whose `patch` annotation is refused outright, regardless of content.
///
/// A patch targeting a `Secret`'s `data` could otherwise let anyone with annotate-but-not-write
/// RBAC exfiltrate or tamper with sensitive material through the reconciler's own service account.
const SENSITIVE_KINDS: &[&str] = &["Secret"];

/// Applies `overrides.patch` (if present) to `tree`, having first validated it isn't targeting a
/// sensitive kind.
///
/// Returns the tree unchanged if no `patch` annotation was set.
pub fn apply_patch(tree: &mut DynTree, overrides: &Overrides, kind: &str) -> Result<()> {
    let Some(patch) = &overrides.patch else { return Ok(()) };

    validate_patch_security(patch, kind)?;

    let mut value = tree.as_value().clone();
    json_patch::patch(&mut value, patch).map_err(|e| Error::PatchApply(e.to_string()))?;
    *tree = DynTree::new(value);
    Ok(())
}

/// Refuses a `patch` annotation on a [`SENSITIVE_KINDS`] member.
fn validate_patch_security(_patch: &json_patch::Patch, kind: &str) -> Result<()> {
    if SENSITIVE_KINDS.contains(&kind) {
        return Err(Error::SensitiveKindPatch(kind.to_string()));
    }
    Ok(())
}

/// Validates that every `ignore-fields` pointer is syntactically well-formed (starts with `/`)
/// and has no duplicate entries, before it's used to mask the drift comparison.
pub fn validate_pointers(overrides: &Overrides) -> Result<()> {
    let mut seen = HashSet::new();
    for pointer in &overrides.ignore_fields {
        if !pointer.starts_with('/') {
            return Err(Error::Validation(format!("ignore-fields pointer {pointer:?} must start with '/'")));
        }
        if !seen.insert(pointer.as_str()) {
            return Err(Error::Validation(format!("ignore-fields pointer {pointer:?} is duplicated")));
        }
    }
    Ok(())
}

/// Removes every `ignore-fields` pointer from both `desired` and `live` so that neither
/// contributes to the drift diff. Masking both sides (rather than just the live side) means a
/// field the operator doesn't render can still be ignored if some other controller injects it.
pub fn mask_ignored_fields(desired: &mut DynTree, live: &mut DynTree, overrides: &Overrides) -> Result<()> {
    validate_pointers(overrides)?;
    for pointer in &overrides.ignore_fields {
        desired.remove(pointer).map_err(|e| Error::Mask(e.to_string()))?;
        live.remove(pointer).map_err(|e| Error::Mask(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::Overrides;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn overrides_with(pairs: &[(&str, &str)]) -> Overrides {
        let map: BTreeMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Overrides::from_annotations(&map).unwrap()
    }

    #[test]
    fn apply_patch_is_noop_without_annotation() {
        let mut tree = DynTree::new(json!({"spec": {"replicas": 1}}));
        let overrides = Overrides::default();
        apply_patch(&mut tree, &overrides, "Deployment").unwrap();
        assert_eq!(tree.get("/spec/replicas").unwrap(), 1);
    }

    #[test]
    fn apply_patch_replaces_field() {
        let mut tree = DynTree::new(json!({"spec": {"replicas": 1}}));
        let overrides = overrides_with(&[(
            "virt-platform.io/patch",
            r#"[{"op":"replace","path":"/spec/replicas","value":3}]"#,
        )]);
        apply_patch(&mut tree, &overrides, "Deployment").unwrap();
        assert_eq!(tree.get("/spec/replicas").unwrap(), 3);
    }

    #[test]
    fn apply_patch_refuses_sensitive_kind() {
        let mut tree = DynTree::new(json!({"data": {"token": "abc"}}));
        let overrides = overrides_with(&[(
            "virt-platform.io/patch",
            r#"[{"op":"replace","path":"/data/token","value":"xyz"}]"#,
        )]);
        let err = apply_patch(&mut tree, &overrides, "Secret");
        assert!(matches!(err, Err(Error::SensitiveKindPatch(_))));
    }

    #[test]
    fn mask_ignored_fields_removes_from_both_sides() {
        let mut desired = DynTree::new(json!({"spec": {"replicas": 1}, "status": {}}));
        let mut live = DynTree::new(json!({"spec": {"replicas": 9}, "status": {"ready": true}}));
        let overrides = overrides_with(&[("virt-platform.io/ignore-fields", "/spec/replicas")]);
        mask_ignored_fields(&mut desired, &mut live, &overrides).unwrap();
        assert!(desired.get("/spec/replicas").is_none());
        assert!(live.get("/spec/replicas").is_none());
        assert!(live.get("/status/ready").is_some());
    }

    #[test]
    fn validate_pointers_rejects_duplicates() {
        let overrides = overrides_with(&[("virt-platform.io/ignore-fields", "/spec/replicas,/spec/replicas")]);
        assert!(validate_pointers(&overrides).is_err());
    }
}
