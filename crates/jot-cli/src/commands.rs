use std::io::Write;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Utc
};
use jot_core::{
  FilterMode,
  KeyValueStore,
  ListController,
  SortMode,
  ViewOptions
};
use tracing::{
  debug,
  info,
  instrument,
  warn
};

use crate::cli::Invocation;
use crate::config::Config;
use crate::prompt::EditPrompt;
use crate::render::Renderer;

pub fn known_command_names()
-> Vec<&'static str> {
  vec![
    "add", "list", "toggle", "done",
    "edit", "delete", "show", "stats",
    "export", "_show", "help",
    "version",
  ]
}

pub fn expand_command_abbrev<'a>(
  token: &'a str,
  known: &[&'a str]
) -> Option<&'a str> {
  if known.contains(&token) {
    return Some(token);
  }

  let mut matches =
    known.iter().copied().filter(
      |name| name.starts_with(token)
    );
  let first = matches.next()?;
  if matches.next().is_some() {
    None
  } else {
    Some(first)
  }
}

#[instrument(skip(
  list, cfg, renderer, prompt, inv,
  now
))]
pub fn dispatch<S, W>(
  list: &mut ListController<S>,
  cfg: &Config,
  renderer: &mut Renderer<W>,
  prompt: &mut dyn EditPrompt,
  inv: Invocation,
  now: DateTime<Utc>
) -> anyhow::Result<()>
where
  S: KeyValueStore,
  W: Write
{
  let command = inv.command.as_str();
  let args = inv.command_args.as_slice();

  debug!(
      command,
      args = ?args,
      "dispatching command"
  );

  match command {
    | "add" => {
      cmd_add(list, renderer, args, now)
    }
    | "list" => {
      cmd_list(list, renderer, args)
    }
    | "toggle" | "done" => {
      cmd_toggle(list, renderer, args)
    }
    | "edit" => {
      cmd_edit(
        list, renderer, prompt, args
      )
    }
    | "delete" => {
      cmd_delete(
        list, renderer, args, now
      )
    }
    | "show" => {
      cmd_show(list, renderer, args)
    }
    | "stats" => {
      renderer.print_stats(list.stats())
    }
    | "export" => {
      renderer.print_json(list.items())
    }
    | "_show" => cmd_show_config(cfg, renderer),
    | "help" => cmd_help(renderer),
    | "version" => {
      renderer.line(env!(
        "CARGO_PKG_VERSION"
      ))
    }
    | other => {
      Err(anyhow!(
        "unknown command: {other}"
      ))
    }
  }
}

#[instrument(skip(
  list, renderer, args, now
))]
fn cmd_add<S, W>(
  list: &mut ListController<S>,
  renderer: &mut Renderer<W>,
  args: &[String],
  now: DateTime<Utc>
) -> anyhow::Result<()>
where
  S: KeyValueStore,
  W: Write
{
  info!("command add");

  let text = args.join(" ");
  match list.add_item(&text, now)? {
    | Some(id) => {
      renderer.line(&format!(
        "Created item {id}."
      ))
    }
    | None => {
      renderer.line("Nothing to add.")
    }
  }
}

#[instrument(skip(
  list, renderer, args
))]
fn cmd_list<S, W>(
  list: &mut ListController<S>,
  renderer: &mut Renderer<W>,
  args: &[String]
) -> anyhow::Result<()>
where
  S: KeyValueStore,
  W: Write
{
  let view =
    parse_view_args(list.view(), args)?;
  list.set_view(view);

  let rows = list.render();
  debug!(
    visible = rows.len(),
    total = list.items().len(),
    "rendering list"
  );
  renderer.print_rows(
    &rows,
    view,
    list.items().len()
  )
}

#[instrument(skip(
  list, renderer, args
))]
fn cmd_toggle<S, W>(
  list: &mut ListController<S>,
  renderer: &mut Renderer<W>,
  args: &[String]
) -> anyhow::Result<()>
where
  S: KeyValueStore,
  W: Write
{
  info!("command toggle");

  for id in parse_ids(args)? {
    if !list.toggle_complete(id)? {
      renderer.line(&format!(
        "No item {id}."
      ))?;
      continue;
    }

    let completed = list
      .find(id)
      .is_some_and(|item| item.completed);
    let verb = if completed {
      "Completed"
    } else {
      "Reopened"
    };
    renderer
      .line(&format!("{verb} item {id}."))?;
  }
  Ok(())
}

#[instrument(skip(
  list, renderer, prompt, args
))]
fn cmd_edit<S, W>(
  list: &mut ListController<S>,
  renderer: &mut Renderer<W>,
  prompt: &mut dyn EditPrompt,
  args: &[String]
) -> anyhow::Result<()>
where
  S: KeyValueStore,
  W: Write
{
  info!("command edit");

  let (raw_id, text) = args
    .split_first()
    .ok_or_else(|| {
      anyhow!("edit requires an item id")
    })?;
  let id = parse_id(raw_id)?;

  let Some(request) = list.request_edit(id)
  else {
    return renderer
      .line(&format!("No item {id}."));
  };

  let response = if text.is_empty() {
    prompt.ask(&request)?
  } else {
    jot_core::EditResponse::Replace(
      text.join(" ")
    )
  };

  if list.resolve_edit(&request, response)? {
    renderer
      .line(&format!("Updated item {id}."))
  } else {
    renderer.line(&format!(
      "Item {id} unchanged."
    ))
  }
}

#[instrument(skip(
  list, renderer, args, now
))]
fn cmd_delete<S, W>(
  list: &mut ListController<S>,
  renderer: &mut Renderer<W>,
  args: &[String],
  now: DateTime<Utc>
) -> anyhow::Result<()>
where
  S: KeyValueStore,
  W: Write
{
  info!("command delete");

  let mut scheduled = Vec::new();
  for id in parse_ids(args)? {
    if scheduled.contains(&id) {
      continue;
    }
    let Some(item) = list.find(id) else {
      renderer
        .line(&format!("No item {id}."))?;
      continue;
    };
    renderer.print_removing(item)?;
    list.schedule_remove(id, now);
    scheduled.push(id);
  }

  let removed = match list
    .pending_removal_deadline()
  {
    | Some(due) => {
      let wait = (due - Utc::now())
        .to_std()
        .unwrap_or_default();
      debug!(
        wait_ms = wait.as_millis(),
        "waiting for removal delay"
      );
      std::thread::sleep(wait);
      list.flush_removals(due)?
    }
    | None => vec![]
  };

  renderer.line(&format!(
    "Deleted {} item(s).",
    removed.len()
  ))
}

fn cmd_show<S, W>(
  list: &ListController<S>,
  renderer: &mut Renderer<W>,
  args: &[String]
) -> anyhow::Result<()>
where
  S: KeyValueStore,
  W: Write
{
  let raw_id = args.first().ok_or_else(|| {
    anyhow!("show requires an item id")
  })?;
  let id = parse_id(raw_id)?;
  let item = list.find(id).ok_or_else(|| {
    anyhow!("no item with id {id}")
  })?;
  renderer.print_item(item)
}

fn cmd_show_config<W: Write>(
  cfg: &Config,
  renderer: &mut Renderer<W>
) -> anyhow::Result<()> {
  let mut entries: Vec<_> =
    cfg.iter().collect();
  entries.sort();
  for (key, value) in entries {
    renderer
      .line(&format!("{key}={value}"))?;
  }
  Ok(())
}

fn cmd_help<W: Write>(
  renderer: &mut Renderer<W>
) -> anyhow::Result<()> {
  for line in [
    "usage: jot [options] <command> \
     [args]",
    "",
    "  add <text...>          add an \
     item at the top of the list",
    "  list [filter:M] [sort:M]  show \
     items (filter: all|completed|\
     uncompleted, sort: \
     newest|oldest|a-z|z-a)",
    "  toggle <id...>         flip \
     completion (alias: done)",
    "  edit <id> [text...]    replace \
     the text, prompting when none is \
     given",
    "  delete <id...>         remove \
     items",
    "  show <id>              show one \
     item",
    "  stats                  count \
     completed and remaining items",
    "  export                 print the \
     list as JSON",
    "  version                print the \
     version",
  ] {
    renderer.line(line)?;
  }
  Ok(())
}

fn parse_view_args(
  mut view: ViewOptions,
  args: &[String]
) -> anyhow::Result<ViewOptions> {
  for arg in args {
    if let Some(raw) =
      arg.strip_prefix("filter:")
    {
      view.filter =
        FilterMode::from_value(raw);
      if view.filter.as_str()
        != raw.trim().to_ascii_lowercase()
      {
        warn!(
          value = raw,
          resolved = %view.filter,
          "filter value normalized"
        );
      }
    } else if let Some(raw) =
      arg.strip_prefix("sort:")
    {
      view.sort =
        SortMode::from_value(raw);
      if view.sort == SortMode::Unsorted {
        warn!(
          value = raw,
          "unrecognized sort mode; \
           keeping list order"
        );
      }
    } else {
      return Err(anyhow!(
        "unexpected list argument: \
         {arg}"
      ));
    }
  }
  Ok(view)
}

fn parse_ids(
  args: &[String]
) -> anyhow::Result<Vec<u64>> {
  if args.is_empty() {
    return Err(anyhow!(
      "at least one item id is \
       required"
    ));
  }
  args
    .iter()
    .map(|raw| parse_id(raw))
    .collect()
}

fn parse_id(
  raw: &str
) -> anyhow::Result<u64> {
  raw.trim().parse::<u64>().with_context(
    || format!("invalid item id: {raw}")
  )
}

#[cfg(test)]
mod tests {
  use jot_core::{
    FilterMode,
    SortMode,
    ViewOptions
  };

  use super::{
    expand_command_abbrev,
    known_command_names,
    parse_ids,
    parse_view_args
  };

  #[test]
  fn abbreviations_must_be_unique() {
    let known = known_command_names();
    assert_eq!(
      expand_command_abbrev("ex", &known),
      Some("export")
    );
    assert_eq!(
      expand_command_abbrev("del", &known),
      Some("delete")
    );
    assert_eq!(
      expand_command_abbrev("d", &known),
      None
    );
  }

  #[test]
  fn view_args_override_defaults() {
    let view = parse_view_args(
      ViewOptions::default(),
      &[
        "filter:completed".to_string(),
        "sort:z-a".to_string()
      ]
    )
    .unwrap();
    assert_eq!(
      view.filter,
      FilterMode::Completed
    );
    assert_eq!(
      view.sort,
      SortMode::AlphaDesc
    );

    assert!(
      parse_view_args(
        view,
        &["urgent".to_string()]
      )
      .is_err()
    );
  }

  #[test]
  fn ids_are_validated() {
    assert_eq!(
      parse_ids(&[
        "3".to_string(),
        " 4".to_string()
      ])
      .unwrap(),
      vec![3, 4]
    );
    assert!(parse_ids(&[]).is_err());
    assert!(
      parse_ids(&["x".to_string()])
        .is_err()
    );
  }
}
