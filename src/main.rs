use std::sync::Arc;

use clap::Parser;

use flashlearn::app::App;
use flashlearn::store::memory::MemoryStore;
use flashlearn::store::sqlite::SqliteStore;

use args::Args;

mod args;

mod cli {
    pub mod commands;
    pub mod import;
    pub mod session;
    pub mod study;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let app = if args.memory {
        let store = Arc::new(MemoryStore::new());
        App::new(store.clone(), store)
    } else {
        let store = Arc::new(SqliteStore::open_default().await?);
        App::new(store.clone(), store)
    };

    if !args.memory {
        if let Some(session) = cli::session::load()? {
            app.auth.restore_session(session.into());
        }
    }

    cli::commands::run(&app, args.command, !args.memory).await
}
