use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::item::{Item, next_id, normalize_text};
use crate::removal::{REMOVE_DELAY, RemovalQueue};
use crate::rows::{RowDescriptor, render};
use crate::storage::{KeyValueStore, load_collection, save_collection};
use crate::view::{FilterMode, FilteredItems, SortMode, ViewOptions, filter_items, sort_items};

/// Emitted when the user asks to edit a row. The host answers it with an
/// [`EditResponse`] from whatever input mechanism it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub id: u64,
    pub current_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditResponse {
    Replace(String),
    Cancel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListStats {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
}

/// Owns the collection and keeps it written through to `store`.
///
/// Every mutating call writes the full next collection and only then adopts it,
/// so the in-memory and stored copies agree after success and after failure.
#[derive(Debug)]
pub struct ListController<S> {
    store: S,
    key: String,
    items: Vec<Item>,
    view: ViewOptions,
    removals: RemovalQueue,
    remove_delay: Duration,
    last_id: u64,
}

impl<S: KeyValueStore> ListController<S> {
    /// Loads whatever is stored under `key`. Missing or corrupt data starts
    /// an empty list.
    #[tracing::instrument(skip(store))]
    pub fn initialize(store: S, key: &str) -> Self {
        let items = load_collection(&store, key);
        let last_id = items.iter().map(|item| item.id).max().unwrap_or(0);
        info!(count = items.len(), "list initialized");

        Self {
            store,
            key: key.to_string(),
            items,
            view: ViewOptions::default(),
            removals: RemovalQueue::new(),
            remove_delay: REMOVE_DELAY,
            last_id,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn find(&self, id: u64) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn set_remove_delay(&mut self, delay: Duration) {
        self.remove_delay = delay;
    }

    pub fn view(&self) -> ViewOptions {
        self.view
    }

    pub fn set_view(&mut self, view: ViewOptions) {
        debug!(filter = %view.filter, sort = %view.sort, "view changed");
        self.view = view;
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        self.set_view(ViewOptions { filter, ..self.view });
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.set_view(ViewOptions { sort, ..self.view });
    }

    /// Adds `raw` at the front of the list. Blank input is rejected without
    /// touching storage and yields `None`.
    #[tracing::instrument(skip(self, raw, now))]
    pub fn add_item(&mut self, raw: &str, now: DateTime<Utc>) -> anyhow::Result<Option<u64>> {
        let Some(text) = normalize_text(raw) else {
            debug!("ignoring blank submission");
            return Ok(None);
        };

        let id = next_id(now, self.last_id);
        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.push(Item::new(id, text, now));
        next.extend(self.items.iter().cloned());
        self.commit(next)?;
        self.last_id = id;

        info!(id, count = self.items.len(), "item added");
        Ok(Some(id))
    }

    /// Returns whether an item was removed. Unknown ids are not an error.
    #[tracing::instrument(skip(self))]
    pub fn delete_item(&mut self, id: u64) -> anyhow::Result<bool> {
        let removed = self.remove_ids(&[id])?;

        debug!(removed = !removed.is_empty(), "delete processed");
        Ok(!removed.is_empty())
    }

    #[tracing::instrument(skip(self))]
    pub fn toggle_complete(&mut self, id: u64) -> anyhow::Result<bool> {
        let matched = self.replace_where(id, Item::toggled)?;

        debug!(matched, "toggle processed");
        Ok(matched)
    }

    /// Replaces the text of `id` with the trimmed `new_text`. Blank text
    /// leaves the item untouched and nothing is written.
    #[tracing::instrument(skip(self, new_text))]
    pub fn edit_item(&mut self, id: u64, new_text: &str) -> anyhow::Result<bool> {
        let Some(text) = normalize_text(new_text) else {
            debug!("ignoring blank edit");
            return Ok(false);
        };

        let matched = self.replace_where(id, |item| item.with_text(text.clone()))?;

        debug!(matched, "edit processed");
        Ok(matched)
    }

    pub fn request_edit(&self, id: u64) -> Option<EditRequest> {
        self.find(id).map(|item| EditRequest {
            id,
            current_text: item.text.clone(),
        })
    }

    pub fn resolve_edit(
        &mut self,
        request: &EditRequest,
        response: EditResponse,
    ) -> anyhow::Result<bool> {
        match response {
            EditResponse::Replace(text) => self.edit_item(request.id, &text),
            EditResponse::Cancel => {
                debug!(id = request.id, "edit cancelled");
                Ok(false)
            }
        }
    }

    pub fn filtered_items(&self) -> FilteredItems<'_> {
        filter_items(&self.items, self.view.filter)
    }

    /// Sorted copy of `items`; the canonical order is never touched.
    pub fn sorted_items<'a, I>(&self, items: I) -> Vec<Item>
    where
        I: IntoIterator<Item = &'a Item>,
    {
        sort_items(items, self.view.sort)
    }

    pub fn render(&self) -> Vec<RowDescriptor> {
        render(&self.items, self.view, |id| self.removals.is_pending(id))
    }

    /// Queues a delete of `id` one removal delay after `now` and returns the
    /// deadline. The row renders as removing until then.
    #[tracing::instrument(skip(self, now))]
    pub fn schedule_remove(&mut self, id: u64, now: DateTime<Utc>) -> DateTime<Utc> {
        let due_at = now + self.remove_delay;
        self.removals.schedule(id, due_at);
        due_at
    }

    pub fn pending_removal_deadline(&self) -> Option<DateTime<Utc>> {
        self.removals.next_due()
    }

    /// Runs every deferred delete due at `now` in one write, returning the
    /// ids that actually removed an item. When the write fails the due ids go
    /// back on the queue and the next flush retries them.
    #[tracing::instrument(skip(self, now))]
    pub fn flush_removals(&mut self, now: DateTime<Utc>) -> anyhow::Result<Vec<u64>> {
        let due = self.removals.drain_due(now);
        if due.is_empty() {
            return Ok(Vec::new());
        }

        match self.remove_ids(&due) {
            Ok(removed) => {
                debug!(due = due.len(), removed = removed.len(), "removals flushed");
                Ok(removed)
            }
            Err(err) => {
                self.removals.requeue(&due, now);
                Err(err)
            }
        }
    }

    pub fn stats(&self) -> ListStats {
        let completed = self.items.iter().filter(|item| item.completed).count();
        ListStats {
            total: self.items.len(),
            completed,
            remaining: self.items.len() - completed,
        }
    }

    /// Writes `next` and only then makes it the in-memory collection, so a
    /// failed write leaves both copies as they were.
    fn commit(&mut self, next: Vec<Item>) -> anyhow::Result<()> {
        save_collection(&mut self.store, &self.key, &next)?;
        self.items = next;
        Ok(())
    }

    fn replace_where<F>(&mut self, id: u64, change: F) -> anyhow::Result<bool>
    where
        F: Fn(&Item) -> Item,
    {
        let mut matched = false;
        let next = self
            .items
            .iter()
            .map(|item| {
                if item.id == id {
                    matched = true;
                    change(item)
                } else {
                    item.clone()
                }
            })
            .collect();
        self.commit(next)?;
        Ok(matched)
    }

    /// Drops every item whose id is in `ids` with a single write and returns
    /// the ids that matched, in collection order.
    fn remove_ids(&mut self, ids: &[u64]) -> anyhow::Result<Vec<u64>> {
        let (gone, kept): (Vec<Item>, Vec<Item>) = self
            .items
            .iter()
            .cloned()
            .partition(|item| ids.contains(&item.id));
        self.commit(kept)?;
        Ok(gone.into_iter().map(|item| item.id).collect())
    }
}
