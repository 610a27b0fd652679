//! `opsdash` command line
//!
//! Operates the knowledge base and reporting services on a file-backed
//! store. Argument parsing and dispatch live here so they can be driven
//! from tests; `main.rs` only installs logging.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use opsdash_core::{CascadeOutcome, DashConfig, KnowledgeBase, ReportDesk};
use opsdash_model::{ArticleDraft, ArticlePatch, RecordId};
use opsdash_store::{FileStore, KeyValueStore};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "opsdash")]
#[command(version, about = "Ops dashboard knowledge base and reporting data")]
pub struct Cli {
    /// Configuration file (.toml, .yaml or .yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data file, overriding the configured one
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List shelves
    Shelves,

    /// List books of a shelf
    Books { shelf: String },

    /// List articles of a book
    Articles { book: String },

    /// Print an article and count the view
    ViewArticle {
        #[arg(long)]
        book: String,
        id: String,
    },

    /// Add an article to a book
    AddArticle {
        #[arg(long)]
        shelf: String,
        #[arg(long)]
        book: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Defaults to the configured author
        #[arg(long)]
        author: Option<String>,
    },

    /// Change title and/or content of an article
    EditArticle {
        #[arg(long)]
        book: String,
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },

    /// Remove an article from a book
    DeleteArticle {
        #[arg(long)]
        shelf: String,
        #[arg(long)]
        book: String,
        id: String,
    },

    /// Recount articles for every book of a shelf
    Reconcile { shelf: String },

    /// List KPI reports
    Reports,

    /// Show a KPI report without its blank rows
    Report {
        id: String,
        #[arg(long)]
        json: bool,
    },

    /// Remove a KPI report
    DeleteReport { id: String },

    /// Per-employee quality analysis
    Quality {
        /// Only this employee
        #[arg(long)]
        employee: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Store a JSON file verbatim under a key
    Import { key: String, file: PathBuf },
}

impl Cli {
    /// Configuration from `--config` (or defaults), environment, then `--data`
    ///
    /// # Errors
    /// Returns error if the configuration file cannot be loaded
    pub fn resolve_config(&self) -> anyhow::Result<DashConfig> {
        let mut config = match &self.config {
            Some(path) => DashConfig::load(path)?,
            None => DashConfig::default().with_env_overrides(),
        };
        if let Some(data) = &self.data {
            config.data_path.clone_from(data);
        }
        Ok(config)
    }

    /// Default log filter for the verbosity count
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Services over one opened data file
#[derive(Debug)]
pub struct App {
    store: Arc<FileStore>,
    kb: KnowledgeBase,
    desk: ReportDesk,
}

impl App {
    /// Open the data file named by `config`
    ///
    /// # Errors
    /// Returns error if the data file exists but cannot be read
    pub fn open(config: &DashConfig) -> anyhow::Result<Self> {
        let store = Arc::new(
            FileStore::open(&config.data_path)
                .with_context(|| format!("opening {}", config.data_path.display()))?,
        );
        Ok(Self {
            kb: KnowledgeBase::new(store.clone(), config),
            desk: ReportDesk::new(store.clone(), config),
            store,
        })
    }

    /// Run one command, writing its output to `out`
    ///
    /// # Errors
    /// Returns error if the command fails
    pub fn run(&self, command: &Command, out: &mut impl Write) -> anyhow::Result<()> {
        match command {
            Command::Shelves => {
                for shelf in self.kb.shelves()? {
                    writeln!(out, "{}\t{}", shelf.id, shelf.title)?;
                }
            }
            Command::Books { shelf } => {
                for book in self.kb.list_books(&RecordId::new(shelf.as_str()))? {
                    writeln!(out, "{}\t{}\t{} articles", book.id, book.title, book.article_count)?;
                }
            }
            Command::Articles { book } => {
                for article in self.kb.list_articles(&RecordId::new(book.as_str()))? {
                    writeln!(
                        out,
                        "{}\t{}\t{}\t{}\t{} views",
                        article.id, article.title, article.author, article.updated_at, article.views
                    )?;
                }
            }
            Command::ViewArticle { book, id } => {
                let article = self
                    .kb
                    .record_view(&RecordId::new(book.as_str()), &RecordId::new(id.as_str()))?;
                writeln!(out, "{}\n{}", article.title, article.content)?;
            }
            Command::AddArticle {
                shelf,
                book,
                title,
                content,
                author,
            } => {
                let mut draft = ArticleDraft::new(title.as_str(), content.as_str());
                if let Some(author) = author {
                    draft = draft.with_author(author.as_str());
                }
                let created = self.kb.create_article(
                    &RecordId::new(shelf.as_str()),
                    &RecordId::new(book.as_str()),
                    draft,
                )?;
                writeln!(out, "{}", created.record.id)?;
                report_cascade(&created.cascade, out)?;
            }
            Command::EditArticle {
                book,
                id,
                title,
                content,
            } => {
                if title.is_none() && content.is_none() {
                    bail!("nothing to change: pass --title and/or --content");
                }
                let patch = ArticlePatch {
                    title: title.clone(),
                    content: content.clone(),
                };
                let article =
                    self.kb
                        .update_article(&RecordId::new(book.as_str()), &RecordId::new(id.as_str()), &patch)?;
                writeln!(out, "{}\t{}", article.id, article.updated_at)?;
            }
            Command::DeleteArticle { shelf, book, id } => {
                let deleted = self.kb.delete_article(
                    &RecordId::new(shelf.as_str()),
                    &RecordId::new(book.as_str()),
                    &RecordId::new(id.as_str()),
                )?;
                writeln!(out, "deleted {}", deleted.record.id)?;
                report_cascade(&deleted.cascade, out)?;
            }
            Command::Reconcile { shelf } => {
                let report = self.kb.reconcile_shelf(&RecordId::new(shelf.as_str()))?;
                for c in &report.corrections {
                    writeln!(out, "{}\t{} -> {}", c.book_id, c.stored, c.actual)?;
                }
                writeln!(
                    out,
                    "{} books checked, {} corrected",
                    report.books_checked,
                    report.corrections.len()
                )?;
            }
            Command::Reports => {
                for report in self.desk.reports()? {
                    writeln!(
                        out,
                        "{}\t{}\t{}\t{} rows",
                        report.id,
                        report.name,
                        report.month_label,
                        report.rows.len()
                    )?;
                }
            }
            Command::Report { id, json } => {
                let view = self.desk.report_view(&RecordId::new(id.as_str()))?;
                if *json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
                } else {
                    writeln!(out, "{} ({})", view.name, view.month_label)?;
                    for row in &view.rows {
                        writeln!(out, "{}\t{}\t{}\t{}", row.kpi, row.desc, row.measure, row.sla)?;
                    }
                }
            }
            Command::DeleteReport { id } => {
                let removed = self.desk.delete_report(&RecordId::new(id.as_str()))?;
                writeln!(out, "deleted {}", removed.id)?;
            }
            Command::Quality { employee, json } => self.quality(employee.as_deref(), *json, out)?,
            Command::Import { key, file } => {
                let raw = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
                serde_json::from_str::<serde_json::Value>(&raw)
                    .with_context(|| format!("{} is not JSON", file.display()))?;
                self.store.set(key, &raw)?;
                tracing::info!("Imported {} into {}", file.display(), key);
                writeln!(out, "imported {key}")?;
            }
        }
        Ok(())
    }

    fn quality(&self, employee: Option<&str>, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
        let employees = match employee {
            Some(name) => vec![self.desk.employee_quality(name)?],
            None => self.desk.quality_overview()?.employees,
        };

        if json {
            writeln!(out, "{}", serde_json::to_string_pretty(&employees)?)?;
            return Ok(());
        }
        for e in &employees {
            let delta = e.trend_delta.map_or_else(|| "-".to_string(), |d| format!("{d:+.2}"));
            writeln!(
                out,
                "{}\t{} records\tmean {:.2}\ttrend {}\tweakest {}",
                e.employee_name,
                e.records,
                e.mean_score,
                delta,
                e.weakest_area.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

fn report_cascade(outcome: &CascadeOutcome, out: &mut impl Write) -> anyhow::Result<()> {
    match outcome {
        CascadeOutcome::Applied { article_count } => writeln!(out, "book now has {article_count} articles")?,
        CascadeOutcome::Deferred { reason } => {
            writeln!(out, "book counter not updated ({reason}); run `opsdash reconcile`")?;
        }
    }
    Ok(())
}
