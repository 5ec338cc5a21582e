//! Tenant namespacing codecs
//!
//! One shared backend engine multiplexes many tenants, so every name that
//! crosses the gateway is encoded as `tenant + separator + local`. Two
//! separator conventions exist because the two backends have different
//! illegal-character rules: the `"___"` infix for everything the workflow
//! engine stores, and a `"_"` join for schedule names on the scheduler.
//! The two are independent [`NameCodec`] values, constructed once and
//! injected; nothing in this crate is process-global.
//!
//! A reserved `GLOBAL` namespace marks resources shared across tenants;
//! where a caller may legitimately reference them, the codec leaves the
//! `GLOBAL` prefix visible instead of stripping it.

pub mod document;
pub mod name;

pub use document::{strip_document, PathRule, Seg, StripOutcome};
pub use name::{NameCodec, GLOBAL_NAMESPACE};
