//! Name-level prefix codec

use flowgate_types::{GatewayError, GatewayResult};

/// Reserved namespace for resources shared across all tenants
pub const GLOBAL_NAMESPACE: &str = "GLOBAL";

/// Adds and removes a tenant prefix on shared-backend names
///
/// The separator is part of the codec value, not a crate-wide constant:
/// the engine and the scheduler each get their own instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameCodec {
    separator: String,
}

impl NameCodec {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Convention for names stored by the workflow engine
    pub fn engine() -> Self {
        Self::new("___")
    }

    /// Convention for schedule names stored by the scheduler
    pub fn scheduler() -> Self {
        Self::new("_")
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Validate a tenant id for use with this codec
    ///
    /// A tenant equal to the reserved GLOBAL token could mint shared names,
    /// and one containing the separator would make stripping ambiguous.
    pub fn check_tenant(&self, tenant: &str) -> GatewayResult<()> {
        if tenant.is_empty() {
            return Err(GatewayError::Validation("tenant id is empty".to_string()));
        }
        if tenant == GLOBAL_NAMESPACE {
            return Err(GatewayError::Validation(format!(
                "tenant id may not be the reserved namespace {}",
                GLOBAL_NAMESPACE
            )));
        }
        if tenant.contains(&self.separator) {
            return Err(GatewayError::Validation(format!(
                "tenant id {:?} contains the separator {:?}",
                tenant, self.separator
            )));
        }
        Ok(())
    }

    /// True when `name` lives in the shared GLOBAL namespace
    pub fn is_global(&self, name: &str) -> bool {
        name.starts_with(&format!("{}{}", GLOBAL_NAMESPACE, self.separator))
    }

    /// Encode a caller-supplied local name into the tenant's namespace
    ///
    /// A local name already containing the separator is rejected, never
    /// silently corrected: it would decode to a different name than the
    /// caller supplied.
    pub fn prefix(&self, tenant: &str, name: &str) -> GatewayResult<String> {
        self.check_tenant(tenant)?;
        if name.contains(&self.separator) {
            return Err(GatewayError::NamingViolation(format!(
                "name {:?} contains the reserved separator {:?}",
                name, self.separator
            )));
        }
        Ok(format!("{}{}{}", tenant, self.separator, name))
    }

    /// Prefix `name` in place
    pub fn prefix_in_place(&self, tenant: &str, name: &mut String) -> GatewayResult<()> {
        *name = self.prefix(tenant, name)?;
        Ok(())
    }

    /// Prefix `name` in place unless it already references GLOBAL
    ///
    /// Used for names nested inside a definition, where a tenant may point
    /// at shared tasks; the GLOBAL prefix is kept exactly as written.
    pub fn prefix_in_place_allow_global(&self, tenant: &str, name: &mut String) -> GatewayResult<()> {
        if self.is_global(name) {
            return Ok(());
        }
        self.prefix_in_place(tenant, name)
    }

    /// Decode a namespaced name back to the caller's local name
    ///
    /// Returns `None` when the name does not carry this tenant's prefix
    /// (and, with `allow_global`, is not GLOBAL either). Callers decide
    /// whether `None` means "drop the record" or "fail the response".
    pub fn strip(&self, tenant: &str, name: &str, allow_global: bool) -> Option<String> {
        if allow_global && self.is_global(name) {
            // Shared names stay fully qualified so callers can tell them
            // apart from their own.
            return Some(name.to_string());
        }
        name.strip_prefix(&format!("{}{}", tenant, self.separator))
            .map(str::to_string)
    }

    /// Strip in place; false when the prefix did not match
    pub fn strip_in_place(&self, tenant: &str, name: &mut String, allow_global: bool) -> bool {
        match self.strip(tenant, name, allow_global) {
            Some(local) => {
                *name = local;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_prefix_round_trip() {
        let codec = NameCodec::engine();
        let encoded = codec.prefix("acme", "fx3").unwrap();
        assert_eq!(encoded, "acme___fx3");
        assert_eq!(codec.strip("acme", &encoded, false).unwrap(), "fx3");
    }

    #[test]
    fn test_prefix_rejects_separator_in_name() {
        let codec = NameCodec::engine();
        let err = codec.prefix("acme", "fx___3").unwrap_err();
        assert!(matches!(err, GatewayError::NamingViolation(_)));
    }

    #[test]
    fn test_prefix_rejects_global_tenant() {
        let codec = NameCodec::engine();
        assert!(codec.prefix(GLOBAL_NAMESPACE, "fx3").is_err());
    }

    #[test]
    fn test_failed_prefix_leaves_input_unmodified() {
        let codec = NameCodec::engine();
        let mut name = "fx___3".to_string();
        assert!(codec.prefix_in_place("acme", &mut name).is_err());
        assert_eq!(name, "fx___3");
    }

    #[test]
    fn test_strip_foreign_tenant_fails() {
        let codec = NameCodec::engine();
        assert!(codec.strip("acme", "umbrella___fx3", false).is_none());
        assert!(codec.strip("acme", "umbrella___fx3", true).is_none());
    }

    #[test]
    fn test_strip_global_kept_verbatim_when_allowed() {
        let codec = NameCodec::engine();
        assert_eq!(
            codec.strip("acme", "GLOBAL___notify", true).unwrap(),
            "GLOBAL___notify"
        );
        assert!(codec.strip("acme", "GLOBAL___notify", false).is_none());
    }

    #[test]
    fn test_allow_global_prefix_leaves_global_untouched() {
        let codec = NameCodec::engine();
        let mut name = "GLOBAL___notify".to_string();
        codec
            .prefix_in_place_allow_global("acme", &mut name)
            .unwrap();
        assert_eq!(name, "GLOBAL___notify");
    }

    #[test]
    fn test_scheduler_convention_is_single_underscore() {
        let codec = NameCodec::scheduler();
        assert_eq!(codec.prefix("acme", "sync").unwrap(), "acme_sync");
        // Under the join convention an underscore in the local name is
        // itself a violation.
        assert!(codec.prefix("acme", "sync_all").is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip_identity(name in "[a-zA-Z0-9.-]{1,32}") {
            let codec = NameCodec::engine();
            let encoded = codec.prefix("acme", &name).unwrap();
            prop_assert_eq!(codec.strip("acme", &encoded, false).unwrap(), name);
        }

        #[test]
        fn prop_separator_always_rejected(prefix in "[a-z]{0,8}", suffix in "[a-z]{0,8}") {
            let codec = NameCodec::engine();
            let name = format!("{}___{}", prefix, suffix);
            prop_assert!(codec.prefix("acme", &name).is_err());
        }
    }
}
