use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow,
  bail
};
use chrono::Duration;
use jot_core::{
  DEFAULT_STORAGE_KEY,
  FilterMode,
  SortMode,
  ViewOptions
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

/// Every setting jot reads, with the
/// value used when no jotrc sets it.
const DEFAULTS: [(&str, &str); 7] = [
  ("data.location", "~/.jot"),
  ("storage.key", DEFAULT_STORAGE_KEY),
  ("default.command", "list"),
  ("color", "on"),
  ("view.filter", "all"),
  ("view.sort", "newest"),
  ("remove.delay", "300")
];

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

/// A jotrc line that carries
/// something. Blank lines and
/// comments parse to nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RcLine<'a> {
  Setting {
    key:   &'a str,
    value: &'a str
  },
  Include(&'a str)
}

impl Config {
  pub fn defaults() -> Self {
    Config {
      map:          DEFAULTS
        .iter()
        .map(|(key, value)| {
          (
            key.to_string(),
            value.to_string()
          )
        })
        .collect(),
      loaded_files: Vec::new()
    }
  }

  /// Defaults overlaid with the jotrc
  /// named by `--jotrc`, `$JOTRC`, or
  /// `~/.jotrc`, in that order.
  #[tracing::instrument(skip(
    explicit
  ))]
  pub fn load(
    explicit: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::defaults();

    match locate_jotrc(explicit)? {
      | Some(path) => {
        info!(jotrc = %path.display(), "reading jotrc");
        cfg.read_rc(
          &path,
          &mut Vec::new()
        )?;
      }
      | None => {
        debug!(
          "no jotrc, running on \
           defaults"
        )
      }
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      let key = match key
        .strip_prefix("rc.")
      {
        | Some(bare) => bare.to_string(),
        | None => key
      };
      debug!(key = %key, value = %value, "setting override");
      self.map.insert(key, value);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  pub fn storage_key(&self) -> String {
    self
      .get("storage.key")
      .map(|key| key.trim().to_string())
      .filter(|key| !key.is_empty())
      .unwrap_or_else(|| {
        DEFAULT_STORAGE_KEY.to_string()
      })
  }

  /// Initial view, before any
  /// `filter:`/`sort:` arguments.
  pub fn view_options(
    &self
  ) -> ViewOptions {
    ViewOptions {
      filter: self
        .get("view.filter")
        .map(|raw| {
          FilterMode::from_value(&raw)
        })
        .unwrap_or_default(),
      sort:   self
        .get("view.sort")
        .map(|raw| {
          SortMode::from_value(&raw)
        })
        .unwrap_or_default()
    }
  }

  pub fn remove_delay(
    &self
  ) -> anyhow::Result<Duration> {
    let Some(raw) =
      self.get("remove.delay")
    else {
      return Ok(
        jot_core::removal::REMOVE_DELAY
      );
    };

    let millis = raw
      .trim()
      .parse::<u32>()
      .map_err(|_| {
        anyhow!(
          "invalid remove.delay \
           (milliseconds): {raw}"
        )
      })?;
    Ok(Duration::milliseconds(
      i64::from(millis)
    ))
  }

  /// Whether the `color` setting
  /// allows ANSI output. Anything but
  /// a recognised on/off word is an
  /// error.
  pub fn color_enabled(
    &self
  ) -> anyhow::Result<bool> {
    let raw = self
      .get("color")
      .unwrap_or_default()
      .trim()
      .to_ascii_lowercase();
    match raw.as_str() {
      | "" | "on" | "yes" | "true"
      | "1" => Ok(true),
      | "off" | "no" | "false" | "0" => {
        Ok(false)
      }
      | other => {
        Err(anyhow!(
          "invalid color setting: \
           {other}"
        ))
      }
    }
  }

  /// Data directory, created on first
  /// use. `--data` wins over
  /// `data.location`.
  #[tracing::instrument(skip(self))]
  pub fn data_dir(
    &self,
    explicit: Option<&Path>
  ) -> anyhow::Result<PathBuf> {
    let dir = match explicit {
      | Some(path) => path.to_path_buf(),
      | None => {
        match self
          .get("data.location")
          .filter(|value| {
            !value.trim().is_empty()
          }) {
          | Some(value) => {
            home_relative(Path::new(
              value.trim()
            ))
          }
          | None => home()?.join(".jot")
        }
      }
    };

    if !dir.is_dir() {
      info!(dir = %dir.display(), "creating data directory");
      fs::create_dir_all(&dir)
        .with_context(|| {
          format!(
            "failed to create {}",
            dir.display()
          )
        })?;
    }

    Ok(dir)
  }

  /// Reads one jotrc into the map.
  /// `open` holds the canonical paths
  /// of the files whose includes are
  /// being followed.
  fn read_rc(
    &mut self,
    path: &Path,
    open: &mut Vec<PathBuf>
  ) -> anyhow::Result<()> {
    let path = home_relative(path);
    let canonical =
      fs::canonicalize(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    if open.contains(&canonical) {
      let chain = open
        .iter()
        .chain([&canonical])
        .map(|p| {
          p.display().to_string()
        })
        .collect::<Vec<_>>()
        .join(" -> ");
      bail!("include cycle: {chain}");
    }

    let text =
      fs::read_to_string(&canonical)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    self
      .loaded_files
      .push(path.clone());
    open.push(canonical);

    let dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_default();

    for (idx, raw) in
      text.lines().enumerate()
    {
      let entry = parse_rc_line(raw)
        .with_context(|| {
          format!(
            "invalid config line \
             {}:{}",
            path.display(),
            idx + 1
          )
        })?;

      match entry {
        | None => {}
        | Some(RcLine::Setting {
          key,
          value
        }) => {
          trace!(key, value, "rc setting");
          self.map.insert(
            key.to_string(),
            value.to_string()
          );
        }
        | Some(RcLine::Include(
          target
        )) => {
          let target = dir.join(
            home_relative(Path::new(
              target
            ))
          );
          if target.exists() {
            self
              .read_rc(&target, open)?;
          } else {
            warn!(include = %target.display(), "included jotrc is missing, skipped");
          }
        }
      }
    }

    open.pop();
    Ok(())
  }
}

/// Parses `key = value`,
/// `include <path>`, blank lines and
/// `#` comments (full-line or
/// trailing).
fn parse_rc_line(
  raw: &str
) -> anyhow::Result<Option<RcLine<'_>>>
{
  let line = raw
    .split_once('#')
    .map_or(raw, |(before, _)| before)
    .trim();
  if line.is_empty() {
    return Ok(None);
  }

  if let Some(target) =
    line.strip_prefix("include ")
  {
    let target = target.trim();
    if target.is_empty() {
      bail!("include needs a path");
    }
    return Ok(Some(RcLine::Include(
      target
    )));
  }

  let (key, value) =
    line.split_once('=').ok_or_else(
      || {
        anyhow!(
          "expected `key = value`, \
           got `{}`",
          raw.trim()
        )
      }
    )?;
  let key = key.trim();
  if key.is_empty() {
    bail!("setting has no key");
  }

  Ok(Some(RcLine::Setting {
    key,
    value: value.trim()
  }))
}

fn locate_jotrc(
  explicit: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = explicit {
    return Ok(Some(path.to_path_buf()));
  }

  match std::env::var("JOTRC") {
    | Ok(value) if value == "/dev/null" => {
      Ok(None)
    }
    | Ok(value) => {
      Ok(Some(PathBuf::from(value)))
    }
    | Err(_) => {
      let candidate =
        home()?.join(".jotrc");
      Ok(
        candidate
          .exists()
          .then_some(candidate)
      )
    }
  }
}

fn home() -> anyhow::Result<PathBuf> {
  dirs::home_dir().context(
    "cannot determine home directory"
  )
}

/// Expands a leading `~` to the home
/// directory.
fn home_relative(
  path: &Path
) -> PathBuf {
  match (
    path.strip_prefix("~"),
    dirs::home_dir()
  ) {
    | (Ok(rest), Some(home)) => {
      home.join(rest)
    }
    | _ => path.to_path_buf()
  }
}
