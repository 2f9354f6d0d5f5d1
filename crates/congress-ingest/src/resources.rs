//! Resource descriptors
//!
//! A [`Resource`] names one listing the ingester knows how to hydrate and
//! carries everything the generic machinery needs: where to list, which
//! field identifies an entry, where its detail lives, and which tables hold
//! its pending locators and hydrated records.

use crate::error::Result;
use crate::hydration::PendingReference;
use congress_common::{Chamber, CongressNumber, Identifier};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Field holding the detail URL in every listing entry
pub const LOCATOR_FIELD: &str = "url";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    CommitteeMeetings {
        congress: CongressNumber,
        chamber: Chamber,
    },
    Committees {
        chamber: Chamber,
    },
}

impl Resource {
    pub fn committee_meetings(congress: CongressNumber, chamber: Chamber) -> Self {
        Self::CommitteeMeetings { congress, chamber }
    }

    /// Committees exist only for the House and Senate
    pub fn committees(chamber: Chamber) -> Result<Self> {
        let chamber = chamber.require_legislative("committees")?;
        Ok(Self::Committees { chamber })
    }

    /// Human-readable name for logs
    pub fn label(&self) -> String {
        match self {
            Self::CommitteeMeetings { congress, chamber } => {
                format!("{} committee meetings ({} Congress)", chamber, congress)
            },
            Self::Committees { chamber } => format!("{} committees", chamber),
        }
    }

    /// Key of the entry list in a listing response
    pub fn list_key(&self) -> &'static str {
        match self {
            Self::CommitteeMeetings { .. } => "committeeMeetings",
            Self::Committees { .. } => "committees",
        }
    }

    pub fn id_field(&self) -> &'static str {
        match self {
            Self::CommitteeMeetings { .. } => "eventId",
            Self::Committees { .. } => "systemCode",
        }
    }

    pub fn locator_field(&self) -> &'static str {
        LOCATOR_FIELD
    }

    /// Key of the record in a detail response
    pub fn detail_key(&self) -> &'static str {
        match self {
            Self::CommitteeMeetings { .. } => "committeeMeeting",
            Self::Committees { .. } => "committee",
        }
    }

    /// Table of pending locators, one per listing
    pub fn pending_table(&self) -> String {
        match self {
            Self::CommitteeMeetings { congress, chamber } => {
                format!("committee_meeting_urls_{}_{}", congress, chamber)
            },
            Self::Committees { chamber } => format!("committee_urls_{}", chamber),
        }
    }

    /// Table of hydrated records, shared by every listing of the same kind
    pub fn records_table(&self) -> &'static str {
        match self {
            Self::CommitteeMeetings { .. } => "committee_meetings",
            Self::Committees { .. } => "committees",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Collect pending references from an aggregated listing.
///
/// Entries without a usable identifier or locator are skipped with a
/// warning. Repeated identifiers keep their first occurrence.
pub fn pending_from_listing(resource: &Resource, listing: &Value) -> Vec<PendingReference> {
    let Some(entries) = listing.get(resource.list_key()).and_then(Value::as_array) else {
        warn!(resource = %resource, key = resource.list_key(), "Listing has no entries");
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut pending = Vec::with_capacity(entries.len());

    for (position, entry) in entries.iter().enumerate() {
        let identifier = entry.get(resource.id_field()).and_then(Identifier::from_json);
        let locator = entry
            .get(resource.locator_field())
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty());

        match (identifier, locator) {
            (Some(identifier), Some(locator)) => {
                if seen.insert(identifier.clone()) {
                    pending.push(PendingReference::new(identifier, locator));
                }
            },
            _ => warn!(
                resource = %resource,
                position,
                "Skipping listing entry without {} or {}",
                resource.id_field(),
                resource.locator_field()
            ),
        }
    }

    pending
}
