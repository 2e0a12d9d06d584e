/*!
 * Outgoing Request Rewriter
 *
 * Replaces foreign shared-content references in an outgoing request with
 * host-owned ones and keeps type, item list and grants consistent.
 * Rewriting never fails: a reference that cannot be substituted is left
 * as it was.
 */

use super::request::{ActionCategory, GrantFlags, OutgoingRequest, RequestItem};
use super::rules::ConversionRule;
use crate::cache::Record;
use crate::core::errors::Recovered;
use crate::core::limits::OCTET_STREAM;
use crate::monitoring::OperationSpan;
use crate::registry::Registry;
use crate::resolver::{guess_from_name, is_bad_mime};
use crate::uri::{HostAuthorities, ResourceRef};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Replacement chosen for one foreign reference
struct Substitution {
    reference: ResourceRef,
    /// Present when the replacement came from the registry
    record: Option<Arc<Record>>,
}

pub struct Rewriter {
    registry: Arc<Registry>,
    rules: Vec<Box<dyn ConversionRule>>,
}

impl Rewriter {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            rules: Vec::new(),
        }
    }

    /// Add a conversion rule; rules are tried in insertion order
    pub fn with_rule(mut self, rule: impl ConversionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    fn hosts(&self) -> &HostAuthorities {
        self.registry.authorities()
    }

    /// Rewrite a request in place
    pub fn rewrite(&self, request: &mut OutgoingRequest) {
        let span = OperationSpan::new("rewrite");
        let _guard = span.enter();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.rewrite_primary(request);
            self.rewrite_items(request);
        }));

        match outcome {
            Ok(()) => span.record_result(true),
            Err(_) => {
                warn!(action = %request.action, reason = %Recovered::RewriteSkipped, "rewrite aborted, granting access only");
                Self::ensure_grants(request);
                span.record_error("rewrite aborted");
            }
        }
    }

    fn rewrite_primary(&self, request: &mut OutgoingRequest) {
        let Some(original) = request.primary_ref.clone() else {
            return;
        };
        if !self.hosts().is_foreign_content(&original) {
            return;
        }
        let Some(substitution) = self.substitute(&original, request.mime_type.as_deref()) else {
            return;
        };

        let mime = self.effective_mime(request.mime_type.as_deref(), &original, &substitution);
        let reference = substitution.reference;
        match request.category() {
            ActionCategory::Send => {
                request.set_type(mime);
                request.set_data(reference.clone());
            }
            _ => request.set_data_and_type(reference.clone(), mime),
        }

        request.grant_flags.insert(GrantFlags::all());
        if request.items.is_none() {
            request.items = Some(vec![RequestItem::reference(reference)]);
        }
        debug!(
            original = %original,
            primary = ?request.primary_ref,
            mime = ?request.mime_type,
            "primary reference substituted"
        );
    }

    fn rewrite_items(&self, request: &mut OutgoingRequest) {
        let Some(items) = request.items.take() else {
            return;
        };

        let hint = request.mime_type.clone();
        let mut rebuilt = Vec::with_capacity(items.len());
        let mut substituted: Vec<Substitution> = Vec::new();

        for item in items {
            let replacement = item
                .reference
                .as_ref()
                .filter(|reference| self.hosts().is_foreign_content(reference))
                .and_then(|reference| self.substitute(reference, hint.as_deref()));

            match replacement {
                Some(substitution) => {
                    rebuilt.push(RequestItem {
                        reference: Some(substitution.reference.clone()),
                        text: item.text,
                    });
                    substituted.push(substitution);
                }
                None => rebuilt.push(item),
            }
        }
        request.items = Some(rebuilt);

        if substituted.is_empty() {
            return;
        }
        request.grant_flags.insert(GrantFlags::all());

        if is_bad_mime(request.mime_type.as_deref()) {
            if let Some(mime) = substituted
                .first()
                .and_then(|s| s.record.as_ref())
                .and_then(|record| record.mime.clone())
            {
                request.mime_type = Some(mime);
            }
        }
        debug!(count = substituted.len(), "item references substituted");
    }

    /// Current type if usable, then the provider's type for the original,
    /// then the display-name extension, then octet-stream
    fn effective_mime(
        &self,
        current: Option<&str>,
        original: &ResourceRef,
        substitution: &Substitution,
    ) -> String {
        if let Some(current) = current.filter(|m| !is_bad_mime(Some(*m))) {
            return current.to_string();
        }
        if let Some(declared) = self.registry.metadata().declared_type(original) {
            return declared;
        }

        let display_name = substitution
            .record
            .as_ref()
            .map(|record| record.display_name.clone())
            .or_else(|| self.registry.metadata().display_name(original))
            .or_else(|| original.last_path_segment());

        display_name
            .as_deref()
            .and_then(guess_from_name)
            .unwrap_or(OCTET_STREAM)
            .to_string()
    }

    /// Fast rule first, registration otherwise. `None` leaves the field as is.
    fn substitute(&self, reference: &ResourceRef, mime_hint: Option<&str>) -> Option<Substitution> {
        if !self.hosts().is_foreign_content(reference) {
            return None;
        }

        for rule in &self.rules {
            if let Some(mapped) = rule.convert(reference) {
                debug!(rule = rule.name(), from = %reference, to = %mapped, "converted by rule");
                return Some(Substitution {
                    reference: mapped,
                    record: None,
                });
            }
        }

        match self.registry.register(reference, mime_hint) {
            Ok(proxy_ref) => {
                let record = self.registry.lookup(&proxy_ref);
                Some(Substitution {
                    reference: proxy_ref,
                    record,
                })
            }
            Err(e) => {
                warn!(reference = %reference, error = %e, reason = %Recovered::RewriteSkipped, "registration failed");
                None
            }
        }
    }

    /// Host-owned equivalent of a reference, or the reference itself
    pub fn wrap_reference(&self, reference: &ResourceRef, mime_hint: Option<&str>) -> ResourceRef {
        self.substitute(reference, mime_hint)
            .map_or_else(|| reference.clone(), |s| s.reference)
    }

    pub fn is_proxy_reference(&self, reference: &ResourceRef) -> bool {
        self.registry.is_proxy_reference(reference)
    }

    /// Whether the primary reference, any item or the stream extra points
    /// at the proxy
    pub fn is_proxy_carrying_request(&self, request: &OutgoingRequest) -> bool {
        request
            .primary_ref
            .iter()
            .chain(request.item_references())
            .chain(request.stream_extra.iter())
            .any(|reference| self.is_proxy_reference(reference))
    }

    /// Give a view request without a primary reference one, taken from
    /// its first item or its stream extra
    pub fn normalize_view_request(&self, request: &mut OutgoingRequest) {
        if request.category() != ActionCategory::View || request.primary_ref.is_some() {
            return;
        }
        let Some(reference) = request
            .item_references()
            .next()
            .cloned()
            .or_else(|| request.stream_extra.clone())
        else {
            return;
        };

        if request.mime_type.is_none() {
            request.mime_type = match self.registry.lookup(&reference) {
                Some(record) => record.mime.clone(),
                None => self.registry.metadata().declared_type(&reference),
            };
        }
        if request.items.is_none() {
            request.items = Some(vec![RequestItem::reference(reference.clone())]);
        }
        request.primary_ref = Some(reference);
        request.grant_flags.insert(GrantFlags::read_only());
    }

    /// Add the full grant set regardless of what else happened
    pub fn ensure_grants(request: &mut OutgoingRequest) {
        request.grant_flags.insert(GrantFlags::all());
    }
}
