use chrono::{
  DateTime,
  Utc
};
use serde::Serialize;

use crate::item::Item;
use crate::view::{
  ViewOptions,
  filter_items,
  sort_items
};

/// What a host may offer on a row.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
pub enum RowAction {
  ToggleComplete,
  Edit,
  Delete
}

const LIVE_ACTIONS: [RowAction; 3] = [
  RowAction::ToggleComplete,
  RowAction::Edit,
  RowAction::Delete
];

/// One visible row. Hosts bind
/// `actions` back to the controller by
/// `id`; a row on its way out offers
/// none.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct RowDescriptor {
  pub id:         u64,
  pub text:       String,
  pub completed:  bool,
  pub created_at: DateTime<Utc>,
  /// A deferred delete is queued for
  /// this row.
  pub removing:   bool,
  pub actions:    Vec<RowAction>
}

impl RowDescriptor {
  fn from_item(
    item: Item,
    removing: bool
  ) -> Self {
    Self {
      id: item.id,
      text: item.text,
      completed: item.completed,
      created_at: item.created_at,
      removing,
      actions: if removing {
        Vec::new()
      } else {
        LIVE_ACTIONS.to_vec()
      }
    }
  }

  pub fn allows(
    &self,
    action: RowAction
  ) -> bool {
    self.actions.contains(&action)
  }
}

/// Filter, then sort, then describe.
pub fn render<F>(
  items: &[Item],
  view: ViewOptions,
  is_removing: F
) -> Vec<RowDescriptor>
where
  F: Fn(u64) -> bool
{
  sort_items(
    filter_items(items, view.filter),
    view.sort
  )
  .into_iter()
  .map(|item| {
    let removing = is_removing(item.id);
    RowDescriptor::from_item(
      item, removing
    )
  })
  .collect()
}
