//! Out-of-band account administration. Role changes apply to tokens issued
//! after the change; existing tokens keep their role until they expire.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use emberfall_db::Database;
use emberfall_server::init_logging;
use emberfall_types::models::Role;

#[derive(Parser, Debug)]
#[command(name = "emberfall-admin", about = "Emberfall account administration")]
struct Cli {
    /// SQLite path or sqlite:// URL of the server database
    #[arg(long, env = "EMBERFALL_DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grant the admin role
    Promote { username: String },
    /// Revoke the admin role
    Demote { username: String },
    /// Print an account's details
    Show { username: String },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_logging("emberfall_db=warn");

    let cli = Cli::parse();

    let db = Database::connect(&cli.database_url, 1)?;

    let result = run(&db, cli.command);
    db.close()?;
    result
}

fn run(db: &Database, command: Command) -> Result<()> {
    match command {
        Command::Promote { username } => set_role(db, &username, Role::Admin),
        Command::Demote { username } => set_role(db, &username, Role::User),
        Command::Show { username } => {
            let username = username.trim().to_lowercase();
            let Some(account) = db.get_account_by_username(&username)? else {
                bail!("no account named '{username}'");
            };
            println!("id:         {}", account.id);
            println!("username:   {}", account.username);
            println!("email:      {}", account.email.as_deref().unwrap_or("-"));
            println!("role:       {}", account.role);
            println!("created:    {}", account.created_at);
            println!("last login: {}", account.last_login.as_deref().unwrap_or("never"));
            Ok(())
        }
    }
}

fn set_role(db: &Database, username: &str, role: Role) -> Result<()> {
    let username = username.trim().to_lowercase();
    if !db.set_role(&username, role.as_str())? {
        bail!("no account named '{username}'");
    }
    println!("{username} is now {role}");
    Ok(())
}
