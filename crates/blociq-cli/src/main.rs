//! `blociq`: command-line companion to the BlocIQ inbox triage server.
//!
//! # Usage
//!
//! ```
//! blociq classify --subject "Leak from flat above"
//! echo "AGM on 12 March 2025 3pm" | blociq event --ics > agm.ics
//! blociq --url http://localhost:8080 --user agent --password secret triage
//! ```

mod client;
mod offline;

use std::io::Read as _;

use anyhow::{Context, Result, bail};
use blociq_core::event::EventContext;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "blociq", about = "Inbox triage tools for BlocIQ")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<std::path::PathBuf>,

  /// Base URL of the BlocIQ server (default: http://localhost:8080).
  #[arg(long, env = "BLOCIQ_URL", global = true)]
  url: Option<String>,

  #[arg(long, env = "BLOCIQ_USER", global = true)]
  user: Option<String>,

  #[arg(long, env = "BLOCIQ_PASSWORD", global = true, hide_env_values = true)]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Classify a subject line and print the drafted reply.
  Classify {
    #[arg(long)]
    subject: String,
    #[arg(long)]
    preview: Option<String>,
    /// Sender name used in the greeting.
    #[arg(long)]
    from: Option<String>,
  },
  /// Extract a calendar event from text (stdin when TEXT is omitted).
  Event {
    text:     Option<String>,
    #[arg(long)]
    address:  Option<String>,
    #[arg(long)]
    duration: Option<i64>,
    #[arg(long)]
    title:    Option<String>,
    /// Print an iCalendar file instead of JSON.
    #[arg(long)]
    ics:      bool,
  },
  /// Extract a works order from text and print the contractor email.
  WorksOrder {
    text:       Option<String>,
    #[arg(long)]
    contractor: Option<String>,
  },
  /// Extract a tender from text and print the invitation email.
  Tender {
    text:       Option<String>,
    #[arg(long)]
    contractor: Option<String>,
  },
  /// Run batch triage on the server.
  Triage {
    #[arg(long, default_value_t = 50)]
    limit: usize,
  },
  /// List stored emails.
  Inbox {
    /// Only emails not yet handled.
    #[arg(long)]
    unhandled: bool,
    #[arg(long, default_value_t = 25)]
    limit:     usize,
  },
  /// Pull the newest Outlook messages into the store.
  Sync {
    #[arg(long, default_value_t = 50)]
    top: u32,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

/// Flags override the config file, which overrides defaults.
fn api_config(
  url: Option<String>,
  user: Option<String>,
  password: Option<String>,
  file: &ConfigFile,
) -> ApiConfig {
  let pick = |flag: Option<String>, from_file: &str| {
    flag.or_else(|| (!from_file.is_empty()).then(|| from_file.to_string()))
  };
  ApiConfig {
    base_url: pick(url, &file.url).unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: pick(user, &file.username).unwrap_or_default(),
    password: pick(password, &file.password).unwrap_or_default(),
  }
}

fn text_or_stdin(text: Option<String>) -> Result<String> {
  let text = match text {
    Some(t) => t,
    None => {
      let mut buf = String::new();
      std::io::stdin()
        .read_to_string(&mut buf)
        .context("reading stdin")?;
      buf
    }
  };
  if text.trim().is_empty() {
    bail!("no text given");
  }
  Ok(text)
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };
  let online = || {
    ApiClient::new(api_config(
      args.url.clone(),
      args.user.clone(),
      args.password.clone(),
      &file_cfg,
    ))
  };

  match args.command {
    Command::Classify {
      ref subject,
      ref preview,
      ref from,
    } => {
      let report = offline::classify_report(subject, preview.as_deref(), from.clone());
      print!("{report}");
    }
    Command::Event {
      ref text,
      ref address,
      duration,
      ref title,
      ics,
    } => {
      let text = text_or_stdin(text.clone())?;
      let ctx = EventContext {
        address: address.clone(),
        duration_minutes: duration,
        title: title.clone(),
        reference: None,
      };
      if ics {
        match offline::event_ics(&text, &ctx)? {
          Some(cal) => print!("{cal}"),
          None => bail!("no date found in text"),
        }
      } else {
        println!("{}", offline::event_json(&text, &ctx)?);
      }
    }
    Command::WorksOrder {
      ref text,
      ref contractor,
    } => {
      let text = text_or_stdin(text.clone())?;
      print!("{}", offline::works_order_report(&text, contractor.as_deref())?);
    }
    Command::Tender {
      ref text,
      ref contractor,
    } => {
      let text = text_or_stdin(text.clone())?;
      print!("{}", offline::tender_report(&text, contractor.as_deref())?);
    }
    Command::Triage { limit } => {
      let summary = online()?.run_triage(limit).await?;
      println!(
        "Run {} triaged {} email(s)",
        summary.run.run_id, summary.run.email_count
      );
      for a in &summary.actions {
        println!(
          "  {}  {:<20} {:<7} due {}  ({})",
          a.email_id, a.category, a.urgency, a.due_date, a.reason
        );
      }
    }
    Command::Inbox { unhandled, limit } => {
      let emails = online()?
        .list_emails(unhandled.then_some(false), limit)
        .await?;
      for e in &emails {
        let marker = if e.unread { '*' } else { ' ' };
        println!(
          "{marker} {}  {}  {:<30}  {}",
          e.email_id,
          e.received_at.format("%Y-%m-%d %H:%M"),
          e.from_name.as_deref().or(e.from_email.as_deref()).unwrap_or("-"),
          e.subject_str(),
        );
      }
    }
    Command::Sync { top } => {
      let s = online()?.sync(top).await?;
      println!(
        "Fetched {}: {} new, {} refreshed",
        s.fetched, s.created, s.updated
      );
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_override_config_file() {
    let file = ConfigFile {
      url:      "http://blociq.internal:9000".into(),
      username: "file-user".into(),
      password: "file-pass".into(),
    };
    let cfg = api_config(None, Some("flag-user".into()), None, &file);
    assert_eq!(cfg.base_url, "http://blociq.internal:9000");
    assert_eq!(cfg.username, "flag-user");
    assert_eq!(cfg.password, "file-pass");

    let defaults = api_config(None, None, None, &ConfigFile::default());
    assert_eq!(defaults.base_url, "http://localhost:8080");
    assert!(defaults.username.is_empty());
  }

  #[test]
  fn args_parse_subcommands() {
    let args = Args::try_parse_from(["blociq", "event", "--ics", "AGM tomorrow"]).unwrap();
    assert!(matches!(args.command, Command::Event { ics: true, .. }));

    let args = Args::try_parse_from(["blociq", "inbox", "--unhandled"]).unwrap();
    assert!(matches!(
      args.command,
      Command::Inbox {
        unhandled: true,
        limit: 25
      }
    ));
  }
}
