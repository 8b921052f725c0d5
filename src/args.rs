use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "flashlearn", about = "Flashcard sets, study and quizzes from the terminal")]
pub struct Args {
    /// Use a throwaway in-memory store instead of the local database
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create an account and sign in")]
    Register { name: String, email: String },
    #[command(about = "Sign in")]
    Login { email: String },
    #[command(about = "Sign out")]
    Logout,
    #[command(about = "Show the signed-in profile")]
    Profile,
    #[command(about = "List all of your sets")]
    Sets,
    #[command(about = "Show your recently studied sets")]
    Recent,
    #[command(about = "Search your sets by title or description")]
    Search { query: String },
    #[command(about = "Create a set")]
    CreateSet {
        title: String,
        #[arg(default_value = "")]
        description: String,
    },
    #[command(about = "Delete a set and its cards")]
    DeleteSet { set_id: String },
    #[command(about = "List the cards in a set")]
    Cards { set_id: String },
    #[command(about = "Add a card to a set")]
    AddCard {
        set_id: String,
        question: String,
        answer: String,
    },
    #[command(about = "Rewrite a card's question and answer")]
    EditCard {
        card_id: String,
        question: String,
        answer: String,
    },
    #[command(about = "Remove a card")]
    RemoveCard { card_id: String },
    #[command(about = "Import a set from a TOML file")]
    Import { path: String },
    #[command(about = "Study a set with flip cards")]
    Study { set_id: String },
    #[command(about = "Take a multiple-choice quiz on a set")]
    Quiz { set_id: String },
    #[command(about = "Repair a set's stored card count")]
    Recount { set_id: String },
}
