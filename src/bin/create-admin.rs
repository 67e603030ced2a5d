/// Create an admin account directly in the database.
/// Needed once per deployment so someone can reach /api/user.
///
/// Usage: create-admin --email EMAIL --password PASSWORD

use clap::Parser;
use storefront_auth::{
    db::{self, PgUserStore, StoreError, UserStore},
    models::user::{NewUser, UserRole},
};

#[derive(Parser)]
#[command(name = "create-admin", about = "Create an admin user in the storefront database")]
struct Args {
    /// Email of the new admin
    #[arg(long)]
    email: String,

    /// Plain-text password; stored as a bcrypt hash
    #[arg(long)]
    password: String,

    /// bcrypt cost factor
    #[arg(long, default_value_t = 10)]
    cost: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;

    let pool = db::create_pool(&database_url).await?;
    db::run_migrations(&pool).await?;
    let store = PgUserStore::new(pool);

    let user = match store
        .insert(NewUser {
            email: args.email.trim().to_string(),
            password_hash: bcrypt::hash(&args.password, args.cost)?,
            role: UserRole::Admin,
        })
        .await
    {
        Ok(user) => user,
        Err(StoreError::Conflict) => anyhow::bail!("A user with email {} already exists", args.email),
        Err(e) => return Err(e.into()),
    };

    tracing::info!("Created admin user_id={} email={}", user.id, user.email);
    Ok(())
}
