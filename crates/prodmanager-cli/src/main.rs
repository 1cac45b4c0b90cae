use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use prodmanager_core::models::{NewUser, Role};
use prodmanager_core::password::hash_password_blocking;
use prodmanager_core::sanitize::sanitize_map;
use prodmanager_core::seed::seed_demo_products;
use prodmanager_core::validation::{self, RequestInput, normalize_email};
use prodmanager_db::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "prodmanager", version, about = "ProdManager administration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Insert the demo catalog if the products table is empty
    Seed,

    /// Create an administrator account
    CreateAdmin {
        /// Display name (letters and spaces)
        #[arg(long, env = "ADMIN_NAME")]
        name: String,

        /// Login email
        #[arg(long, env = "ADMIN_EMAIL")]
        email: String,

        /// Initial password
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Block an account from logging in or using its tokens
    Deactivate {
        #[arg(long, env = "ACCOUNT_EMAIL")]
        email: String,
    },

    /// Re-enable a deactivated account
    Activate {
        #[arg(long, env = "ACCOUNT_EMAIL")]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("prodmanager=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = connect_db().await?;

    match cli.command {
        Commands::Migrate => {
            db.migrate().await.context("Failed to apply migrations")?;
            println!("Migrations applied");
        }
        Commands::Seed => cmd_seed(&db).await?,
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => cmd_create_admin(&db, name, email, password).await?,
        Commands::Deactivate { email } => cmd_set_active(&db, &email, false).await?,
        Commands::Activate { email } => cmd_set_active(&db, &email, true).await?,
    }

    Ok(())
}

/// Connect to PostgreSQL using DATABASE_URL.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env().context("DATABASE_URL not set")?;
    Database::connect(&config)
        .await
        .context("Failed to connect to database")
}

async fn cmd_seed(db: &Database) -> Result<()> {
    db.migrate().await.context("Failed to apply migrations")?;

    let inserted = seed_demo_products(&db.product_repo()).await?;
    if inserted == 0 {
        println!("Catalog already has products, nothing seeded");
    } else {
        println!("Seeded {inserted} demo products");
    }
    Ok(())
}

async fn cmd_create_admin(
    db: &Database,
    name: String,
    email: String,
    password: String,
) -> Result<()> {
    // Same trimming, escaping and rules as the register endpoint, so the
    // account can log in through the API with the password given here.
    let mut body = Map::new();
    body.insert("name".into(), Value::String(name));
    body.insert("email".into(), Value::String(email));
    body.insert("password".into(), Value::String(password));
    sanitize_map(&mut body);

    let input = RequestInput {
        body,
        ..Default::default()
    };
    if let Err(errors) = validation::validate(validation::REGISTER, &input) {
        for error in &errors {
            eprintln!("  {}: {}", error.field, error.message);
        }
        bail!("Invalid admin account details");
    }

    let field = |key: &str| {
        input
            .body
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let email = normalize_email(&field("email"));

    let users = db.user_repo();
    if users.find_by_email(&email).await?.is_some() {
        println!("Account {email} already exists, skipping");
        return Ok(());
    }

    let password_hash = hash_password_blocking(field("password")).await?;
    let user = users
        .create(&NewUser {
            name: field("name"),
            email,
            password_hash,
            role: Role::Admin,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Admin account created");
    println!("Created admin {} ({})", user.email, user.id);
    Ok(())
}

async fn cmd_set_active(db: &Database, email: &str, active: bool) -> Result<()> {
    let email = normalize_email(email);
    let Some(user) = db.user_repo().set_active(&email, active).await? else {
        bail!("No account with email {email}");
    };

    let state = if user.is_active { "active" } else { "deactivated" };
    println!("{} is now {state}", user.email);
    Ok(())
}
