use std::io::{self, Write};

use flashlearn::app::App;
use flashlearn::domain::set::FlashcardSet;
use flashlearn::store::auth::{AuthError, AuthUser};
use flashlearn::utils::time_utils::format_ago;

use crate::args::Commands;

use super::{import, session, study};

pub async fn run(app: &App, command: Commands, persist_session: bool) -> anyhow::Result<()> {
    match command {
        Commands::Register { name, email } => {
            let password = prompt_password()?;
            app.auth_controller().register(&name, &email, &password).await?;
            if let Some(user) = app.auth.current_user() {
                if persist_session {
                    session::save(&user)?;
                }
                println!("registered and signed in as {}", user.email);
            }
        }
        Commands::Login { email } => {
            let password = prompt_password()?;
            app.auth_controller().login(&email, &password).await?;
            if let Some(user) = app.auth.current_user() {
                if persist_session {
                    session::save(&user)?;
                }
                println!("signed in as {}", user.email);
            }
        }
        Commands::Logout => {
            app.auth.logout();
            if persist_session {
                session::clear()?;
            }
            println!("signed out");
        }
        Commands::Profile => {
            require_user(app)?;
            let controller = app.profile_controller();
            controller.load_user_profile().await;
            let state = controller.snapshot();
            if let Some(err) = state.error {
                anyhow::bail!(err);
            }
            match state.user {
                Some(user) => {
                    println!("\x1b[1m{}\x1b[0m <{}>", user.name, user.email);
                    if !user.recent_sets.is_empty() {
                        println!("recent sets: {}", user.recent_sets.join(", "));
                    }
                }
                None => println!("no profile document"),
            }
        }
        Commands::Sets => {
            require_user(app)?;
            let controller = app.album_controller();
            controller.load_all_sets().await;
            let state = controller.snapshot();
            if let Some(err) = state.error {
                anyhow::bail!(err);
            }
            print_sets(&state.sets);
        }
        Commands::Recent => {
            require_user(app)?;
            let controller = app.home_controller();
            controller.load_recent_sets().await;
            let state = controller.snapshot();
            if let Some(err) = state.error {
                anyhow::bail!(err);
            }
            print_sets(&state.recent_sets);
        }
        Commands::Search { query } => {
            require_user(app)?;
            let controller = app.home_controller();
            controller.search_sets(&query).await;
            let state = controller.snapshot();
            if let Some(err) = state.error {
                anyhow::bail!(err);
            }
            print_sets(&state.search_results);
        }
        Commands::CreateSet { title, description } => {
            require_user(app)?;
            let controller = app.set_controller();
            controller.create_set(&title, &description).await;
            let state = controller.snapshot();
            if let Some(err) = state.error {
                anyhow::bail!(err);
            }
            match state.created_set_id {
                Some(id) => println!("created set {id}"),
                None => println!("set was not created"),
            }
        }
        Commands::DeleteSet { set_id } => {
            require_user(app)?;
            let controller = app.set_controller();
            controller.delete_set(&set_id).await;
            if let Some(err) = controller.snapshot().error {
                anyhow::bail!(err);
            }
            println!("deleted set {set_id}");
        }
        Commands::Cards { set_id } => {
            require_user(app)?;
            let controller = app.set_controller();
            controller.load_flashcards(&set_id).await;
            let state = controller.snapshot();
            if let Some(err) = state.error {
                anyhow::bail!(err);
            }
            if state.flashcards.is_empty() {
                println!("no cards in this set");
            }
            for card in &state.flashcards {
                println!("{}  Q: {}", card.id, card.question);
                println!("{:width$}  A: {}", "", card.answer, width = card.id.len());
            }
        }
        Commands::AddCard {
            set_id,
            question,
            answer,
        } => {
            require_user(app)?;
            let controller = app.set_controller();
            controller.create_flashcard(&set_id, &question, &answer).await;
            let state = controller.snapshot();
            if let Some(err) = state.error {
                anyhow::bail!(err);
            }
            if state.flashcard_created {
                let count = state
                    .current_set
                    .map(|set| set.card_count)
                    .unwrap_or_default();
                println!("card added ({count} in set)");
            } else {
                println!("card was not created (blank fields?)");
            }
        }
        Commands::EditCard {
            card_id,
            question,
            answer,
        } => {
            require_user(app)?;
            let card = app.flashcards.get_flashcard_by_id(&card_id).await?;
            let controller = app.set_controller();
            controller.update_flashcard(&card, &question, &answer).await;
            if let Some(err) = controller.snapshot().error {
                anyhow::bail!(err);
            }
            println!("updated card {card_id}");
        }
        Commands::RemoveCard { card_id } => {
            require_user(app)?;
            let card = app.flashcards.get_flashcard_by_id(&card_id).await?;
            let controller = app.set_controller();
            controller.delete_flashcard(&card).await;
            if let Some(err) = controller.snapshot().error {
                anyhow::bail!(err);
            }
            println!("removed card {card_id}");
        }
        Commands::Import { path } => {
            let user = require_user(app)?;
            let (set_id, cards) = import::import_set(app, &user.id, &path).await?;
            println!("imported {cards} cards into set {set_id}");
        }
        Commands::Study { set_id } => {
            require_user(app)?;
            study::study(app, &set_id).await?;
        }
        Commands::Quiz { set_id } => {
            require_user(app)?;
            study::quiz(app, &set_id).await?;
        }
        Commands::Recount { set_id } => {
            require_user(app)?;
            app.flashcards.recount_card_count(&set_id).await?;
            let count = app.flashcards.get_flashcard_count(&set_id).await?;
            println!("set {set_id} now counts {count} cards");
        }
    }
    Ok(())
}

fn require_user(app: &App) -> anyhow::Result<AuthUser> {
    Ok(app.auth.current_user().ok_or(AuthError::NotSignedIn)?)
}

fn prompt_password() -> anyhow::Result<String> {
    print!("password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end().to_string())
}

fn print_sets(sets: &[FlashcardSet]) {
    if sets.is_empty() {
        println!("no sets");
        return;
    }
    for set in sets {
        println!(
            "{}  \x1b[1m{}\x1b[0m ({} cards, studied {})",
            set.id,
            set.title,
            set.card_count,
            format_ago(set.last_accessed)
        );
        if !set.description.is_empty() {
            println!("    {}", set.description);
        }
    }
}
