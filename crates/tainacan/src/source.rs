//! The remote item source seam and the records it returns.

use async_trait::async_trait;
use doccheck_core::types::DbId;
use serde::Serialize;
use serde_json::Value;

use crate::error::TainacanError;

/// An item reference from a collection listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRef {
    pub id: DbId,
    pub title: String,
}

/// One page of a collection listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemPage {
    pub items: Vec<ItemRef>,
    /// Entries from which no item id could be extracted.
    pub unidentified: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Item metadata needed for notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemInfo {
    pub id: DbId,
    pub title: String,
    pub url: Option<String>,
    pub collection_id: Option<DbId>,
    pub owner_id: Option<DbId>,
}

/// A WordPress user that owns items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Owner {
    pub id: DbId,
    pub display_name: String,
    pub login: String,
    pub email: String,
}

impl Owner {
    /// Display name, falling back to the login.
    pub fn name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.login
        } else {
            &self.display_name
        }
    }
}

/// Read access to items, attachments and users on the remote site.
///
/// Every call is a single attempt; implementations never retry.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Raw attachment entries of an item.
    async fn item_attachments(&self, item_id: DbId) -> Result<Vec<Value>, TainacanError>;

    /// One page of a collection, in ascending id order.
    async fn collection_items(
        &self,
        collection_id: DbId,
        page: u32,
        per_page: u32,
    ) -> Result<ItemPage, TainacanError>;

    async fn item_info(&self, item_id: DbId) -> Result<ItemInfo, TainacanError>;

    /// `Ok(None)` when the user does not exist.
    async fn user(&self, user_id: DbId) -> Result<Option<Owner>, TainacanError>;

    /// URL fetched by [`ItemSource::item_attachments`], for diagnostics.
    fn attachments_url(&self, item_id: DbId) -> String;
}
