use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use sekolah_core::auth::verify_login;
use sekolah_core::ip::IpifyClient;
use sekolah_core::models::ItemKind;
use sekolah_core::stats::VisitorTracker;
use sekolah_core::store::SupabaseStore;
use sekolah_core::tracing_setup::init_tracing;
use sekolah_core::{CoreConfig, EngagementStore};

#[derive(Parser)]
#[command(name = "sekolah-cli")]
#[command(about = "Engagement and visitor-stat operations for the school site")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Agenda,
    Informasi,
}

impl From<KindArg> for ItemKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Agenda => ItemKind::Agenda,
            KindArg::Informasi => ItemKind::Informasi,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and print the home sections (agendas and informasi)
    Home,

    /// Toggle the current visitor's like on an item
    Like {
        kind: KindArg,
        /// Item ID
        id: i64,
    },

    /// Add a comment to an item
    Comment {
        kind: KindArg,
        /// Item ID
        id: i64,
        /// Commenter display name
        #[arg(long, short = 'n')]
        name: String,
        /// Comment text
        #[arg(long, short = 't')]
        text: String,
    },

    /// Replace the text of an existing comment
    EditComment {
        kind: KindArg,
        /// Comment ID
        comment_id: i64,
        /// New comment text
        #[arg(long, short = 't')]
        text: String,
    },

    /// Delete a comment
    DeleteComment {
        kind: KindArg,
        /// Comment ID
        comment_id: i64,
    },

    /// Print the visitor summary (today, average duration, active, weekly)
    Stats,

    /// Record a page visit for the current visitor
    RecordVisit {
        /// Page path, e.g. `/` or `/agenda`
        page: String,
    },

    /// Close the newest open visit for an IP
    RecordExit {
        /// Visitor IP address
        ip: String,
    },

    /// Check admin credentials against the petugas table
    Login {
        username: String,
        password: String,
    },
}

fn print_json(pretty: bool, value: &serde_json::Value) -> anyhow::Result<()> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = CoreConfig::from_env()?;
    let store = Arc::new(SupabaseStore::new(&config));
    let ip = Arc::new(IpifyClient::new(config.ip_endpoint.clone()));

    let engagement = EngagementStore::new(store.clone(), ip.clone());
    let tracker = VisitorTracker::new(store.clone(), ip);

    match cli.command {
        Commands::Home => {
            engagement.refresh_home().await?;
            print_json(
                cli.pretty,
                &json!({
                    "agendas": engagement.agendas(),
                    "informasi": engagement.informasi(),
                }),
            )?;
        }
        Commands::Like { kind, id } => {
            let outcome = engagement.toggle_like(kind.into(), id).await?;
            print_json(cli.pretty, &serde_json::to_value(outcome)?)?;
        }
        Commands::Comment { kind, id, name, text } => {
            let comment = engagement.add_comment(kind.into(), id, &name, &text).await?;
            print_json(cli.pretty, &serde_json::to_value(comment)?)?;
        }
        Commands::EditComment { kind, comment_id, text } => {
            let comment = engagement.edit_comment(kind.into(), comment_id, &text).await?;
            print_json(cli.pretty, &serde_json::to_value(comment)?)?;
        }
        Commands::DeleteComment { kind, comment_id } => {
            engagement.delete_comment(kind.into(), comment_id).await?;
            print_json(cli.pretty, &json!({"deleted": comment_id}))?;
        }
        Commands::Stats => {
            let summary = tracker.summary().await?;
            print_json(cli.pretty, &serde_json::to_value(summary)?)?;
        }
        Commands::RecordVisit { page } => {
            let row = tracker.record_visit(&page).await?;
            print_json(cli.pretty, &serde_json::to_value(row)?)?;
        }
        Commands::RecordExit { ip } => {
            let row = tracker.record_exit(&ip).await?;
            print_json(cli.pretty, &serde_json::to_value(row)?)?;
        }
        Commands::Login { username, password } => {
            let ok = verify_login(&store, &username, &password).await?;
            print_json(cli.pretty, &json!({"authenticated": ok}))?;
            if !ok {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
