use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli_style;

use cli_style::{
    get_styles, print_error, print_key_value, print_section_footer, print_section_header,
    print_success, print_warning, TableBuilder,
};
use community_sync_server::cms::{ContentStore, HttpContentStore};
use community_sync_server::config::{AppConfig, CliConfig, FileConfig};
use community_sync_server::relational_store::{
    NewProfile, ProfileRole, RelationalStore, SqliteRelationalStore,
};
use community_sync_server::sync::{
    sync_all, ArticleSync, BatchItemStatus, BatchReport, EventSync, ReverseSync,
    ReverseSyncError, SyncTarget,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles(), name = "cli-sync")]
struct CliArgs {
    /// Path to the server's TOML configuration file.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding community.db. Overridden by the config file.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DocumentKind {
    Blog,
    Event,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates a profile in the relational store.
    CreateProfile {
        email: String,
        #[clap(long)]
        name: Option<String>,
        /// user, moderator or admin
        #[clap(long, default_value = "user")]
        role: String,
    },

    /// Records which CMS user document represents a profile.
    LinkAuthor {
        profile_id: String,
        cms_user_id: String,
    },

    /// Re-applies every published CMS document of a type.
    SyncAll {
        #[clap(long = "type", value_enum)]
        kind: DocumentKind,
    },

    /// Publishes a relational article to the CMS.
    ReverseSync { article_id: String },

    /// Points an already published article at its CMS document again.
    Reconcile { article_id: String },
}

fn content_store(config: &AppConfig) -> Result<Arc<dyn ContentStore>> {
    let cms = match &config.cms {
        Some(cms) => cms,
        None => bail!("This command needs a [cms] section in the configuration file"),
    };
    Ok(Arc::new(HttpContentStore::new(
        cms.base_url.clone(),
        cms.dataset.clone(),
        cms.api_version.clone(),
        cms.token.clone(),
        cms.timeout_sec,
    )?))
}

fn print_report(entity: &str, report: &BatchReport) {
    print_section_header(&format!("{} sync", entity));
    let mut table = TableBuilder::new(vec!["ID", "TITLE", "STATUS", "MESSAGE"]);
    for item in &report.results {
        table.add_row(vec![
            &item.id,
            item.title.as_deref().unwrap_or("-"),
            item.status.as_str(),
            item.message.as_deref().unwrap_or(""),
        ]);
    }
    table.print();
    print_section_footer();

    if report.success {
        print_success(&report.message);
    } else {
        let failed = report
            .results
            .iter()
            .filter(|item| item.status == BatchItemStatus::Error)
            .count();
        print_warning(&format!("{} ({} failed)", report.message, failed));
    }
}

async fn execute(command: Command, config: &AppConfig) -> Result<()> {
    let store: Arc<dyn RelationalStore> =
        Arc::new(SqliteRelationalStore::new(config.community_db_path())?);

    match command {
        Command::CreateProfile { email, name, role } => {
            let role = ProfileRole::parse(&role)
                .with_context(|| format!("Unknown role {:?}", role))?;
            let profile = store.create_profile(&NewProfile {
                email,
                full_name: name,
                role,
            })?;
            print_section_header("Profile created");
            print_key_value("id", &profile.id);
            print_key_value("email", &profile.email);
            print_key_value("role", profile.role.as_str());
            print_section_footer();
        }
        Command::LinkAuthor {
            profile_id,
            cms_user_id,
        } => {
            if store.get_profile(&profile_id)?.is_none() {
                bail!("Profile {} not found", profile_id);
            }
            store.link_author(&profile_id, &cms_user_id)?;
            print_success(&format!("Linked {} to {}", profile_id, cms_user_id));
        }
        Command::SyncAll { kind } => {
            let cms = content_store(config)?;
            let target: Box<dyn SyncTarget> = match kind {
                DocumentKind::Blog => Box::new(ArticleSync::new(
                    config.sync.fallback_author_id.clone(),
                )),
                DocumentKind::Event => Box::new(EventSync),
            };
            let report = sync_all(target.as_ref(), &*cms, &*store).await?;
            print_report(target.entity(), &report);
        }
        Command::ReverseSync { article_id } => {
            let reverse = ReverseSync::new(content_store(config)?, store);
            match reverse.publish_article(&article_id).await {
                Ok(document_id) => {
                    print_success(&format!("Published {} as {}", article_id, document_id))
                }
                Err(ReverseSyncError::BackReference {
                    document_id,
                    source,
                }) => {
                    print_warning(&format!(
                        "{} was written but the article was not updated: {}",
                        document_id, source
                    ));
                    bail!("Run `cli-sync reconcile {}` to retry", article_id);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Reconcile { article_id } => {
            let reverse = ReverseSync::new(content_store(config)?, store);
            let document_id = reverse.reconcile(&article_id).await?;
            print_success(&format!("Article {} now points at {}", article_id, document_id));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir.clone(),
        ..Default::default()
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    if let Err(e) = execute(cli_args.command, &config).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
