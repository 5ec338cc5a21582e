//! Document-level strip codec
//!
//! Response bodies come back from the backend as JSON documents whose
//! namespaced names sit at known paths. Each path carries its own
//! allow-global flag: a workflow's own type must always be tenant-scoped,
//! while task names inside its tree may legitimately reference GLOBAL.

use crate::name::NameCodec;
use serde_json::Value;

/// One segment of a document path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seg {
    /// Descend into an object key
    Key(&'static str),
    /// Apply the remaining path to every element of an array
    Each,
}

/// A strippable location inside a response document
#[derive(Clone, Copy, Debug)]
pub struct PathRule {
    pub path: &'static [Seg],
    pub allow_global: bool,
}

impl PathRule {
    pub const fn new(path: &'static [Seg], allow_global: bool) -> Self {
        Self { path, allow_global }
    }
}

/// Result of stripping one document
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StripOutcome {
    /// Every addressed name decoded under this tenant
    Complete,
    /// Some addressed name belongs to another namespace; list endpoints
    /// drop the record, single-record endpoints fail the response
    Mismatch,
}

impl StripOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, StripOutcome::Complete)
    }
}

/// Strip every rule's names in `doc`, in place
///
/// Absent paths are skipped (not every record carries every field); a
/// present name that fails to decode stops the walk and reports a
/// mismatch.
pub fn strip_document(
    codec: &NameCodec,
    tenant: &str,
    doc: &mut Value,
    rules: &[PathRule],
) -> StripOutcome {
    for rule in rules {
        if !strip_at(codec, tenant, doc, rule.path, rule.allow_global) {
            return StripOutcome::Mismatch;
        }
    }
    StripOutcome::Complete
}

fn strip_at(codec: &NameCodec, tenant: &str, node: &mut Value, path: &[Seg], allow_global: bool) -> bool {
    match path.split_first() {
        None => match node {
            Value::String(name) => match codec.strip(tenant, name, allow_global) {
                Some(local) => {
                    *name = local;
                    true
                }
                None => false,
            },
            // A non-string at a name path is not ours to judge.
            _ => true,
        },
        Some((Seg::Key(key), rest)) => match node.get_mut(*key) {
            Some(child) => strip_at(codec, tenant, child, rest, allow_global),
            None => true,
        },
        Some((Seg::Each, rest)) => match node {
            Value::Array(items) => items
                .iter_mut()
                .all(|item| strip_at(codec, tenant, item, rest, allow_global)),
            _ => true,
        },
    }
}
