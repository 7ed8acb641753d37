pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod prompt;
pub mod render;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use jot_core::{
  KeyValueStore,
  ListController
};
use tracing::{
  debug,
  info
};

/// Loads the list stored under the
/// configured key and applies the
/// configured view and removal delay.
#[tracing::instrument(skip_all)]
pub fn open_list<S: KeyValueStore>(
  store: S,
  cfg: &config::Config
) -> anyhow::Result<ListController<S>> {
  let key = cfg.storage_key();
  let mut list =
    ListController::initialize(
      store, &key
    );
  list.set_view(cfg.view_options());
  list.set_remove_delay(
    cfg.remove_delay()?
  );
  Ok(list)
}

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let split = cli::split_args(&raw_args);
  let args =
    cli::Args::parse_from(split.clap_args);

  cli::init_tracing(
    args.verbose,
    args.quiet
  )?;

  info!(
    verbose = args.verbose,
    quiet = args.quiet,
    "starting jot CLI"
  );
  debug!(?split.rc_overrides, "positional rc settings");

  let mut cfg = config::Config::load(
    args.jotrc.as_deref()
  )?;
  cfg.apply_overrides(
    split.rc_overrides.into_iter().chain(
      args
        .rc
        .into_iter()
        .map(|pair| (pair.key, pair.value))
    )
  );

  let data_dir = cfg
    .data_dir(args.data.as_deref())
    .context(
      "failed to resolve data \
       directory"
    )?;

  let store =
    datastore::FileStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open data \
         directory {}",
        data_dir.display()
      )
    })?;

  let mut list =
    open_list(store, &cfg)?;
  let mut renderer =
    render::Renderer::new(&cfg)?;
  let mut prompt =
    prompt::LinePrompt::new(
      io::stdin().lock(),
      io::stderr()
    );
  let inv = cli::Invocation::parse(
    &cfg, args.rest
  )?;

  commands::dispatch(
    &mut list,
    &cfg,
    &mut renderer,
    &mut prompt,
    inv,
    Utc::now()
  )?;

  info!("done");
  Ok(())
}
