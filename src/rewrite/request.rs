/*!
 * Outgoing Request
 * Action, references, type and grant flags of a request leaving the host
 */

use crate::uri::ResourceRef;
use serde::{Deserialize, Serialize};

/// Well-known action names
pub mod actions {
    pub const VIEW: &str = "android.intent.action.VIEW";
    pub const EDIT: &str = "android.intent.action.EDIT";
    pub const SEND: &str = "android.intent.action.SEND";
    pub const SEND_MULTIPLE: &str = "android.intent.action.SEND_MULTIPLE";
}

/// How an action wants its reference and type applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    View,
    Edit,
    Send,
    Other,
}

impl ActionCategory {
    /// Classify by the last dotted component, case-insensitively, so both
    /// `send` and `android.intent.action.SEND` are sends
    pub fn of(action: &str) -> Self {
        let name = action.rsplit('.').next().unwrap_or(action);
        match name.to_ascii_lowercase().as_str() {
            "view" => ActionCategory::View,
            "edit" => ActionCategory::Edit,
            "send" | "send_multiple" => ActionCategory::Send,
            _ => ActionCategory::Other,
        }
    }
}

/// Access grants attached to a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantFlags {
    pub read: bool,
    pub write: bool,
    pub persistable: bool,
    pub prefix: bool,
}

impl GrantFlags {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    /// Read, write, persistable and prefix
    pub fn all() -> Self {
        Self {
            read: true,
            write: true,
            persistable: true,
            prefix: true,
        }
    }

    pub fn insert(&mut self, other: GrantFlags) {
        self.read |= other.read;
        self.write |= other.write;
        self.persistable |= other.persistable;
        self.prefix |= other.prefix;
    }

    pub fn contains(&self, other: GrantFlags) -> bool {
        (!other.read || self.read)
            && (!other.write || self.write)
            && (!other.persistable || self.persistable)
            && (!other.prefix || self.prefix)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::none()
    }
}

/// One entry of the request's item list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RequestItem {
    pub fn reference(reference: ResourceRef) -> Self {
        Self {
            reference: Some(reference),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            reference: None,
            text: Some(text.into()),
        }
    }
}

/// Request about to leave the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingRequest {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_ref: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// `None` when the request carries no item list at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<RequestItem>>,
    #[serde(default)]
    pub grant_flags: GrantFlags,
    /// Reference passed as the stream extra, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_extra: Option<ResourceRef>,
}

impl OutgoingRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_primary(mut self, reference: ResourceRef) -> Self {
        self.primary_ref = Some(reference);
        self
    }

    pub fn with_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    pub fn with_item(mut self, item: RequestItem) -> Self {
        self.items.get_or_insert_with(Vec::new).push(item);
        self
    }

    pub fn with_stream_extra(mut self, reference: ResourceRef) -> Self {
        self.stream_extra = Some(reference);
        self
    }

    pub fn category(&self) -> ActionCategory {
        ActionCategory::of(&self.action)
    }

    pub fn set_data_and_type(&mut self, reference: ResourceRef, mime: impl Into<String>) {
        self.primary_ref = Some(reference);
        self.mime_type = Some(mime.into());
    }

    pub fn set_type(&mut self, mime: impl Into<String>) {
        self.mime_type = Some(mime.into());
    }

    pub fn set_data(&mut self, reference: ResourceRef) {
        self.primary_ref = Some(reference);
    }

    /// References in item order, skipping text-only items
    pub fn item_references(&self) -> impl Iterator<Item = &ResourceRef> {
        self.items
            .iter()
            .flatten()
            .filter_map(|item| item.reference.as_ref())
    }
}
