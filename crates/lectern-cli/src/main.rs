use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use lectern_cli::admin::{self, AdminError};
use lectern_models::Role;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "lectern-cli")]
#[command(about = "Lectern CLI - Administrative tools for Lectern", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// First name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Last name
        #[arg(short = 's', long)]
        surname: Option<String>,

        /// Login name
        #[arg(short = 'u', long)]
        username: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Grant a role (ADMIN, TEACHER, USER) to a user
    GrantRole { username: String, role: Role },
    /// Revoke a role from a user
    RevokeRole { username: String, role: Role },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match lectern_db::init_db_pool().await {
        Ok(pool) => pool,
        Err(e) => fail("connecting to database", e),
    };

    match cli.command {
        Commands::CreateAdmin {
            name,
            surname,
            username,
            password,
        } => handle_create_admin(&pool, name, surname, username, password).await,
        Commands::GrantRole { username, role } => handle_grant_role(&pool, &username, role).await,
        Commands::RevokeRole { username, role } => {
            handle_revoke_role(&pool, &username, role).await
        }
    }
}

fn fail(action: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("\n❌ Error {}: {}", action, err);
    std::process::exit(1);
}

fn prompt(label: &str) -> String {
    Input::new()
        .with_prompt(label)
        .interact_text()
        .unwrap_or_else(|e| fail("reading input", e))
}

async fn handle_create_admin(
    pool: &PgPool,
    name: Option<String>,
    surname: Option<String>,
    username: Option<String>,
    password: Option<String>,
) {
    let name = name.unwrap_or_else(|| prompt("First name"));
    let surname = surname.unwrap_or_else(|| prompt("Last name"));
    let username = username.unwrap_or_else(|| prompt("Username"));
    let password = password.unwrap_or_else(|| {
        Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .unwrap_or_else(|e| fail("reading password", e))
    });

    match admin::create_admin(pool, &name, &surname, &username, &password).await {
        Ok(id) => {
            println!("\n✅ Admin created successfully!");
            println!("   Id: {}", id);
            println!("   Username: {}", username);
            println!("   Name: {} {}", name, surname);
        }
        Err(e) => fail("creating admin", e),
    }
}

async fn handle_grant_role(pool: &PgPool, username: &str, role: Role) {
    match admin::grant_role(pool, username, role).await {
        Ok(true) => println!("✅ Granted {} to {}", role, username),
        Ok(false) => println!("ℹ️  {} already has {}", username, role),
        Err(e) => report(e, "granting role"),
    }
}

async fn handle_revoke_role(pool: &PgPool, username: &str, role: Role) {
    match admin::revoke_role(pool, username, role).await {
        Ok(true) => println!("✅ Revoked {} from {}", role, username),
        Ok(false) => println!("ℹ️  {} does not have {}", username, role),
        Err(e) => report(e, "revoking role"),
    }
}

fn report(err: AdminError, action: &str) -> ! {
    if let AdminError::UserNotFound(_) = err {
        eprintln!("\n❌ {}. Create the account first.", err);
        std::process::exit(1);
    }
    fail(action, err)
}
