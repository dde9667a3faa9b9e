use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use oc_types::ActorKind;

#[derive(Parser)]
#[command(
    name = "oc",
    about = "OpenClimate -- climate actors, pledges and users",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data log path; overrides the configuration file
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a new actor
    Add(AddArgs),
    /// Show one actor
    Get(GetArgs),
    /// List every actor of a kind
    List(ListArgs),
    /// Find actors by exact name
    Search(SearchArgs),
    /// Record or list an actor's pledges
    Pledge(PledgeArgs),
    /// Set an actor's MRV methodology
    Mrv(MrvArgs),
    /// Manage users
    User(UserArgs),
    /// Manage connect requests
    Request(RequestArgs),
}

#[derive(Args)]
pub struct AddArgs {
    pub kind: ActorKind,
    pub name: String,
    /// Name of the parent entity (country, region or state)
    #[arg(short, long)]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    pub kind: ActorKind,
    pub id: u64,
}

#[derive(Args)]
pub struct ListArgs {
    pub kind: ActorKind,
}

#[derive(Args)]
pub struct SearchArgs {
    pub kind: ActorKind,
    pub name: String,
    #[arg(short, long)]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct PledgeArgs {
    #[command(subcommand)]
    pub action: PledgeAction,
}

#[derive(Subcommand)]
pub enum PledgeAction {
    /// Attach a new pledge to an actor
    Add {
        kind: ActorKind,
        id: u64,
        pledge_type: String,
        #[arg(long, default_value = "0")]
        base_year: i32,
        #[arg(long, default_value = "0")]
        target_year: i32,
        #[arg(long, default_value = "0")]
        goal: f64,
        #[arg(long)]
        regulatory: bool,
    },
    /// List an actor's pledges
    List { kind: ActorKind, id: u64 },
}

#[derive(Args)]
pub struct MrvArgs {
    pub kind: ActorKind,
    pub id: u64,
    pub mrv: String,
}

#[derive(Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a user linked to an existing actor
    Add {
        username: String,
        pwhash: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long)]
        entity_type: String,
        #[arg(long)]
        entity_name: String,
        #[arg(long)]
        entity_parent: Option<String>,
    },
    /// Show a user and the actor they represent
    Show { username: String },
    /// Check a username and password hash
    Validate { username: String, pwhash: String },
    /// Change a user's email, password hash or username
    Update(UserUpdateArgs),
    /// Delete a user by id
    Delete { id: u64 },
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("change")
        .required(true)
        .args(["email", "new_pwhash", "new_username"])
))]
pub struct UserUpdateArgs {
    pub username: String,
    /// Current password hash
    pub pwhash: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub new_pwhash: Option<String>,
    #[arg(long)]
    pub new_username: Option<String>,
}

#[derive(Args)]
pub struct RequestArgs {
    #[command(subcommand)]
    pub action: RequestAction,
}

#[derive(Subcommand)]
pub enum RequestAction {
    /// Ask to connect a user to an actor
    New {
        username: String,
        kind: ActorKind,
        id: u64,
    },
    /// Approve a pending request
    Approve { id: u64 },
    /// List pending requests
    Pending,
}
