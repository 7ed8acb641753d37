use std::cmp::Ordering;
use std::fmt;

use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;

use crate::item::Item;

/// Which subset of the collection is
/// eligible for display.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
  #[default]
  All,
  Completed,
  Uncompleted
}

/// Display ordering. `Unsorted` keeps
/// whatever order the input had.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
  #[default]
  Newest,
  Oldest,
  #[serde(rename = "a-z")]
  AlphaAsc,
  #[serde(rename = "z-a")]
  AlphaDesc,
  Unsorted
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub struct ViewOptions {
  pub filter: FilterMode,
  pub sort:   SortMode
}

impl FilterMode {
  pub const ALL: [FilterMode; 3] = [
    FilterMode::All,
    FilterMode::Completed,
    FilterMode::Uncompleted
  ];

  /// Unrecognized values fall back to
  /// `All`.
  pub fn from_value(raw: &str) -> Self {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "completed" | "done" => {
        FilterMode::Completed
      }
      | "uncompleted" | "pending"
      | "open" => {
        FilterMode::Uncompleted
      }
      | "all" => FilterMode::All,
      | other => {
        trace!(
          value = other,
          "unrecognized filter mode, \
           showing everything"
        );
        FilterMode::All
      }
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | FilterMode::All => "all",
      | FilterMode::Completed => {
        "completed"
      }
      | FilterMode::Uncompleted => {
        "uncompleted"
      }
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | FilterMode::All => "All",
      | FilterMode::Completed => {
        "Completed"
      }
      | FilterMode::Uncompleted => {
        "Uncompleted"
      }
    }
  }

  pub fn matches(
    self,
    item: &Item
  ) -> bool {
    match self {
      | FilterMode::All => true,
      | FilterMode::Completed => {
        item.completed
      }
      | FilterMode::Uncompleted => {
        !item.completed
      }
    }
  }
}

impl SortMode {
  pub const ALL: [SortMode; 4] = [
    SortMode::Newest,
    SortMode::Oldest,
    SortMode::AlphaAsc,
    SortMode::AlphaDesc
  ];

  /// Unrecognized values map to
  /// `Unsorted`.
  pub fn from_value(raw: &str) -> Self {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "newest" => SortMode::Newest,
      | "oldest" => SortMode::Oldest,
      | "a-z" | "az"
      | "alphabetical-ascending" => {
        SortMode::AlphaAsc
      }
      | "z-a" | "za"
      | "alphabetical-descending" => {
        SortMode::AlphaDesc
      }
      | other => {
        trace!(
          value = other,
          "unrecognized sort mode, \
           keeping input order"
        );
        SortMode::Unsorted
      }
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | SortMode::Newest => "newest",
      | SortMode::Oldest => "oldest",
      | SortMode::AlphaAsc => "a-z",
      | SortMode::AlphaDesc => "z-a",
      | SortMode::Unsorted => "unsorted"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | SortMode::Newest => "Newest",
      | SortMode::Oldest => "Oldest",
      | SortMode::AlphaAsc => "A-Z",
      | SortMode::AlphaDesc => "Z-A",
      | SortMode::Unsorted => "Unsorted"
    }
  }

  pub fn compare(
    self,
    a: &Item,
    b: &Item
  ) -> Ordering {
    match self {
      | SortMode::Newest => {
        b.created_at.cmp(&a.created_at)
      }
      | SortMode::Oldest => {
        a.created_at.cmp(&b.created_at)
      }
      | SortMode::AlphaAsc => {
        locale_compare(&a.text, &b.text)
      }
      | SortMode::AlphaDesc => {
        locale_compare(&b.text, &a.text)
      }
      | SortMode::Unsorted => {
        Ordering::Equal
      }
    }
  }
}

impl fmt::Display for FilterMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl fmt::Display for SortMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Lazy view over the items passing a
/// filter. Cloning restarts it.
#[derive(Debug, Clone)]
pub struct FilteredItems<'a> {
  inner: std::slice::Iter<'a, Item>,
  mode:  FilterMode
}

impl<'a> Iterator for FilteredItems<'a> {
  type Item = &'a Item;

  fn next(&mut self) -> Option<Self::Item> {
    let mode = self.mode;
    self
      .inner
      .find(|item| mode.matches(item))
  }
}

pub fn filter_items(
  items: &[Item],
  mode: FilterMode
) -> FilteredItems<'_> {
  FilteredItems {
    inner: items.iter(),
    mode
  }
}

/// Sorts a copy; the caller's order is
/// left alone. The sort is stable, so
/// ties keep their input order.
pub fn sort_items<'a, I>(
  items: I,
  mode: SortMode
) -> Vec<Item>
where
  I: IntoIterator<Item = &'a Item>
{
  let mut snapshot: Vec<Item> =
    items.into_iter().cloned().collect();
  snapshot
    .sort_by(|a, b| mode.compare(a, b));
  snapshot
}

/// Collation approximating a browser's
/// `localeCompare`: accents and case
/// are ignored first, then lowercase
/// sorts ahead of uppercase.
pub fn locale_compare(
  a: &str,
  b: &str
) -> Ordering {
  let primary = deunicode::deunicode(a)
    .to_lowercase()
    .cmp(
      &deunicode::deunicode(b)
        .to_lowercase()
    );
  if primary != Ordering::Equal {
    return primary;
  }

  let secondary = a
    .to_lowercase()
    .cmp(&b.to_lowercase());
  if secondary != Ordering::Equal {
    return secondary;
  }

  a.chars()
    .map(|ch| (ch.is_uppercase(), ch))
    .cmp(
      b.chars().map(|ch| {
        (ch.is_uppercase(), ch)
      })
    )
}

#[cfg(test)]
mod tests {
  use std::cmp::Ordering;

  use chrono::{
    Duration,
    TimeZone,
    Utc
  };

  use super::{
    FilterMode,
    SortMode,
    filter_items,
    locale_compare,
    sort_items
  };
  use crate::item::Item;

  fn sample() -> Vec<Item> {
    let base = Utc
      .with_ymd_and_hms(
        2026, 2, 16, 5, 0, 0
      )
      .unwrap();
    let mut zebra = Item::new(
      1,
      "zebra".to_string(),
      base
    );
    zebra.completed = true;
    let apple = Item::new(
      2,
      "Apple".to_string(),
      base + Duration::minutes(1)
    );
    let mut eclair = Item::new(
      3,
      "éclair".to_string(),
      base + Duration::minutes(2)
    );
    eclair.completed = true;
    // canonical order is newest first
    vec![eclair, apple, zebra]
  }

  #[test]
  fn unknown_modes_fail_open() {
    assert_eq!(
      FilterMode::from_value("bogus"),
      FilterMode::All
    );
    assert_eq!(
      SortMode::from_value("bogus"),
      SortMode::Unsorted
    );
    assert_eq!(
      SortMode::from_value(
        "alphabetical-descending"
      ),
      SortMode::AlphaDesc
    );
  }

  #[test]
  fn completed_and_uncompleted_partition_all()
   {
    let items = sample();
    let done: Vec<u64> = filter_items(
      &items,
      FilterMode::Completed
    )
    .map(|item| item.id)
    .collect();
    let open: Vec<u64> = filter_items(
      &items,
      FilterMode::Uncompleted
    )
    .map(|item| item.id)
    .collect();

    assert_eq!(done, vec![3, 1]);
    assert_eq!(open, vec![2]);
    assert_eq!(
      filter_items(
        &items,
        FilterMode::All
      )
      .count(),
      done.len() + open.len()
    );
  }

  #[test]
  fn filtered_view_is_restartable() {
    let items = sample();
    let view = filter_items(
      &items,
      FilterMode::Completed
    );
    assert_eq!(view.clone().count(), 2);
    assert_eq!(view.count(), 2);
  }

  #[test]
  fn alphabetical_ignores_case_and_accents()
   {
    let items = sample();
    let asc: Vec<String> = sort_items(
      &items,
      SortMode::AlphaAsc
    )
    .into_iter()
    .map(|item| item.text)
    .collect();
    assert_eq!(
      asc,
      vec!["Apple", "éclair", "zebra"]
    );

    let desc: Vec<String> = sort_items(
      &items,
      SortMode::AlphaDesc
    )
    .into_iter()
    .map(|item| item.text)
    .collect();
    assert_eq!(
      desc,
      vec!["zebra", "éclair", "Apple"]
    );
  }

  #[test]
  fn chronological_orders_by_creation() {
    let items = sample();
    let oldest: Vec<u64> = sort_items(
      &items,
      SortMode::Oldest
    )
    .iter()
    .map(|item| item.id)
    .collect();
    assert_eq!(oldest, vec![1, 2, 3]);

    let newest = sort_items(
      &items,
      SortMode::Newest
    );
    assert!(newest.windows(2).all(
      |pair| pair[0].created_at
        >= pair[1].created_at
    ));
  }

  #[test]
  fn unsorted_keeps_input_order() {
    let items = sample();
    let ids: Vec<u64> = sort_items(
      &items,
      SortMode::Unsorted
    )
    .iter()
    .map(|item| item.id)
    .collect();
    assert_eq!(ids, vec![3, 2, 1]);
  }

  #[test]
  fn lowercase_sorts_before_uppercase() {
    assert_eq!(
      locale_compare("a", "A"),
      Ordering::Less
    );
    assert_eq!(
      locale_compare("b", "A"),
      Ordering::Greater
    );
    assert_eq!(
      locale_compare("same", "same"),
      Ordering::Equal
    );
  }
}
