use crate::entities::{audio_files, user_audio, users};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm::{ConnectionTrait, Schema};
use std::env;
use std::time::Duration;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    // Order matters for foreign keys: Users -> AudioFiles -> UserAudio
    let stmts = vec![
        (
            "users",
            schema
                .create_table_from_entity(users::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "audio_files",
            schema
                .create_table_from_entity(audio_files::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "user_audio",
            schema
                .create_table_from_entity(user_audio::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        let stmt = builder.build(&stmt);
        match db.execute(stmt).await {
            Ok(_) => info!("   - Table '{}' checked/created", name),
            Err(e) => tracing::warn!("   - Failed to create table '{}': {}", name, e),
        }
    }

    info!("🔄 Checking for schema indexes...");

    // Unique columns are declared on the entities; the composite OAuth
    // identity constraint and lookup indexes need raw statements.
    let index_updates = vec![
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_oauth_identity ON users(oauth_provider, oauth_id)",
        "CREATE INDEX IF NOT EXISTS idx_audio_files_owner_id ON audio_files(owner_id)",
        "CREATE INDEX IF NOT EXISTS idx_user_audio_user_id ON user_audio(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_user_audio_audio_file_id ON user_audio(audio_file_id)",
    ];

    for query in index_updates {
        match db
            .execute(sea_orm::Statement::from_string(builder, query.to_owned()))
            .await
        {
            Ok(_) => info!("   - Executed index statement: {}", query),
            Err(e) => {
                let err_msg = e.to_string().to_lowercase();
                if err_msg.contains("already exists") {
                    info!("   - Index already present (skipped): {}", query);
                } else {
                    tracing::warn!("   - Index statement warning: {} -> {}", query, e);
                }
            }
        }
    }

    Ok(())
}
