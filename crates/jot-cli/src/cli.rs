use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Raw arguments with positional `rc.` settings taken out.
#[derive(Debug, Clone)]
pub struct SplitArgs {
    pub clap_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

/// A `key=value` (or `key:value`) setting given to `--rc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcPair {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for RcPair {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) =
            split_pair(s).ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "jot",
    version,
    about = "jot: a small persistent todo list",
    disable_help_subcommand = true
)]
pub struct Args {
    /// More log output on stderr (repeat for debug and trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Less log output on stderr.
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// Override one setting for this run.
    #[arg(long = "rc", value_name = "KEY=VALUE", action = ArgAction::Append)]
    pub rc: Vec<RcPair>,

    /// Read settings from this file instead of ~/.jotrc.
    #[arg(long = "jotrc", value_name = "FILE")]
    pub jotrc: Option<PathBuf>,

    /// Keep the list in this directory.
    #[arg(long = "data", value_name = "DIR")]
    pub data: Option<PathBuf>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

/// Log level used when `RUST_LOG` is unset. Quiet flags win over verbose ones.
fn default_level(verbose: u8, quiet: u8) -> &'static str {
    match (quiet, verbose) {
        (2.., _) => "error",
        (1, _) | (0, 0) => "warn",
        (0, 1) => "info",
        (0, 2) => "debug",
        _ => "trace",
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level(verbose, quiet))
            .context("invalid log filter")?,
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init();
    if installed.is_err() {
        debug!("tracing subscriber already installed");
    }

    Ok(())
}

fn split_pair(s: &str) -> Option<(&str, &str)> {
    let at = s.find(['=', ':'])?;
    Some((&s[..at], &s[at + 1..]))
}

/// `rc.key=value` or `rc.key:value` as a positional argument.
fn positional_rc(arg: &OsString) -> Option<(String, String)> {
    let rest = arg.to_str()?.strip_prefix("rc.")?;
    let (key, value) = split_pair(rest)?;
    Some((format!("rc.{key}"), value.to_string()))
}

/// Takes positional `rc.` settings out of the argument list; clap never sees
/// them. The binary name in position zero is passed through untouched.
#[tracing::instrument(skip_all)]
pub fn split_args(raw: &[OsString]) -> SplitArgs {
    let mut split = SplitArgs {
        clap_args: Vec::with_capacity(raw.len()),
        rc_overrides: Vec::new(),
    };

    for (idx, arg) in raw.iter().enumerate() {
        match positional_rc(arg).filter(|_| idx > 0) {
            Some((key, value)) => {
                debug!(key = %key, value = %value, "positional rc setting");
                split.rc_overrides.push((key, value));
            }
            None => split.clap_args.push(arg.clone()),
        }
    }

    split
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub command_args: Vec<String>,
}

impl Invocation {
    #[tracing::instrument(skip(cfg, rest))]
    pub fn parse(cfg: &Config, rest: Vec<OsString>) -> anyhow::Result<Self> {
        let tokens: Vec<String> = rest
            .into_iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();

        let Some((first, args)) = tokens.split_first() else {
            let cmd = cfg
                .get("default.command")
                .unwrap_or_else(|| "list".to_string());
            debug!(command = %cmd, "no explicit command, using default");
            return Ok(Self {
                command: cmd,
                command_args: vec![],
            });
        };

        if args.is_empty() && first.parse::<u64>().is_ok() {
            debug!(token = %first, "single numeric token interpreted as show");
            return Ok(Self {
                command: "show".to_string(),
                command_args: vec![first.clone()],
            });
        }

        let known = crate::commands::known_command_names();
        let command = crate::commands::expand_command_abbrev(first, &known)
            .ok_or_else(|| anyhow!("unknown or ambiguous command: {first}"))?;
        debug!(token = %first, expanded = %command, "resolved command token");

        Ok(Self {
            command: command.to_string(),
            command_args: args.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use clap::Parser;

    use super::{Args, Invocation, RcPair, default_level, split_args};
    use crate::config::Config;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let split = split_args(&os(&["jot", "rc.color:off", "list", "rc.view.sort=a-z"]));
        assert_eq!(split.clap_args, os(&["jot", "list"]));
        assert_eq!(
            split.rc_overrides,
            vec![
                ("rc.color".to_string(), "off".to_string()),
                ("rc.view.sort".to_string(), "a-z".to_string()),
            ]
        );
    }

    #[test]
    fn rc_flag_and_plain_args_reach_clap() {
        let split = split_args(&os(&["jot", "--rc", "color=off", "add", "rc", "car"]));
        assert!(split.rc_overrides.is_empty());

        let args = Args::parse_from(split.clap_args);
        assert_eq!(
            args.rc,
            vec![RcPair {
                key: "color".to_string(),
                value: "off".to_string(),
            }]
        );
        assert_eq!(args.rest, os(&["add", "rc", "car"]));
    }

    #[test]
    fn quiet_outranks_verbose() {
        assert_eq!(default_level(0, 0), "warn");
        assert_eq!(default_level(1, 0), "info");
        assert_eq!(default_level(3, 0), "trace");
        assert_eq!(default_level(3, 1), "warn");
        assert_eq!(default_level(0, 2), "error");
    }

    #[test]
    fn commands_expand_from_unique_prefixes() {
        let cfg = Config::defaults();
        let inv = Invocation::parse(&cfg, os(&["tog", "12"])).expect("parse");
        assert_eq!(inv.command, "toggle");
        assert_eq!(inv.command_args, vec!["12".to_string()]);

        assert!(Invocation::parse(&cfg, os(&["e"])).is_err());
    }

    #[test]
    fn bare_id_and_empty_args() {
        let cfg = Config::defaults();
        let show = Invocation::parse(&cfg, os(&["42"])).expect("parse");
        assert_eq!(show.command, "show");
        assert_eq!(show.command_args, vec!["42".to_string()]);

        let default = Invocation::parse(&cfg, vec![]).expect("parse");
        assert_eq!(default.command, "list");
    }
}
