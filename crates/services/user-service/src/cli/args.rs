//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

/// User management service
#[derive(Parser, Debug)]
#[command(name = "user-service")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run database migrations
    Migrate(MigrateArgs),

    /// Manage user accounts
    Users(UsersArgs),
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

/// Arguments for the users command
#[derive(Parser, Debug)]
pub struct UsersArgs {
    /// Recorded as created_by / updated_by on mutations
    #[arg(long, global = true, env = "USER_SERVICE_ACTOR")]
    pub actor: Option<String>,

    #[command(subcommand)]
    pub action: UsersAction,
}

/// User account actions
#[derive(Subcommand, Debug)]
pub enum UsersAction {
    /// Create a user
    Create(CreateArgs),
    /// Show a user by id
    Get { id: Uuid },
    /// Look a user up by username or email
    Find(FindArgs),
    /// List users
    List(ListArgs),
    /// Partially update a user
    Update(UpdateArgs),
    /// Soft delete a user
    Deactivate(VersionedArgs),
    /// Restore a soft-deleted user
    Reactivate(VersionedArgs),
    /// Permanently delete a user
    Delete {
        id: Uuid,
        /// Required; permanent deletion cannot be undone
        #[arg(long)]
        yes: bool,
    },
    /// Check whether a username is taken
    CheckUsername {
        username: String,
        /// Ignore this user when checking
        #[arg(long)]
        exclude: Option<Uuid>,
    },
    /// Check whether an email is registered
    CheckEmail {
        email: String,
        /// Ignore this user when checking
        #[arg(long)]
        exclude: Option<Uuid>,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub full_name: String,
    #[arg(long, env = "USER_SERVICE_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub phone_number: Option<String>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct FindArgs {
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = common::pagination::DEFAULT_PAGE_NUMBER)]
    pub page: u64,
    /// Items per page (max 100)
    #[arg(long, default_value_t = common::pagination::DEFAULT_PAGE_SIZE)]
    pub per_page: u64,
    /// Username contains
    #[arg(long)]
    pub username: Option<String>,
    /// Email contains
    #[arg(long)]
    pub email: Option<String>,
    /// Only active (true) or inactive (false) users
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: Uuid,
    /// Version the change was based on
    #[arg(long = "expected-version")]
    pub version: i32,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub full_name: Option<String>,
    #[arg(long)]
    pub phone_number: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Args, Debug)]
pub struct VersionedArgs {
    pub id: Uuid,
    /// Version the change was based on
    #[arg(long = "expected-version")]
    pub version: i32,
}
