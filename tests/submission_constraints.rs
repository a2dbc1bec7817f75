use sqlx::error::DatabaseError as _;
use uuid::Uuid;

fn database_url() -> Option<String> {
    // Load .env so POSTGRES_* from .env are available (integration tests don't use app config)
    dotenvy::dotenv().ok();

    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return Some(url);
        }
    }

    // Build from POSTGRES_* (same as app config); skip when nothing is configured
    let server = std::env::var("POSTGRES_SERVER").ok()?;
    let port = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".into());
    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "classquiz".into());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();
    let db = std::env::var("POSTGRES_DB").unwrap_or_else(|_| "classquiz_db".into());

    Some(format!("postgresql://{user}:{password}@{server}:{port}/{db}"))
}

async fn migrated_pool() -> anyhow::Result<Option<sqlx::PgPool>> {
    let Some(database_url) = database_url() else {
        eprintln!("skipping: DATABASE_URL and POSTGRES_SERVER are not set");
        return Ok(None);
    };

    let pool =
        sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(&database_url).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new("migrations")).await?;
    migrator.run(&pool).await?;

    Ok(Some(pool))
}

struct Seed {
    user_id: String,
    classroom_id: String,
    student_id: String,
    launch_id: String,
}

async fn seed(pool: &sqlx::PgPool) -> anyhow::Result<Seed> {
    let user_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO users (id, username, hashed_password, full_name, is_active, created_at, updated_at)
         VALUES ($1, $2, 'x', 'Fixture Teacher', TRUE, now() at time zone 'utc', now() at time zone 'utc')",
    )
    .bind(&user_id)
    .bind(format!("teacher-{}", Uuid::new_v4().simple()))
    .execute(pool)
    .await?;

    let classroom_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO classrooms (id, name, owner_id, created_at, updated_at)
         VALUES ($1, '5A', $2, now() at time zone 'utc', now() at time zone 'utc')",
    )
    .bind(&classroom_id)
    .bind(&user_id)
    .execute(pool)
    .await?;

    let student_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO students (id, classroom_id, name, student_code, created_at, updated_at)
         VALUES ($1, $2, 'Fixture Student', $3, now() at time zone 'utc', now() at time zone 'utc')",
    )
    .bind(&student_id)
    .bind(&classroom_id)
    .bind(&Uuid::new_v4().simple().to_string()[..12])
    .execute(pool)
    .await?;

    let test_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO tests (id, title, created_by, created_at, updated_at)
         VALUES ($1, 'Fixture Test', $2, now() at time zone 'utc', now() at time zone 'utc')",
    )
    .bind(&test_id)
    .bind(&user_id)
    .execute(pool)
    .await?;

    let launch_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO test_launches (id, test_id, title, session_id, is_active, created_at, updated_at)
         VALUES ($1, $2, 'Fixture Launch', $3, TRUE, now() at time zone 'utc', now() at time zone 'utc')",
    )
    .bind(&launch_id)
    .bind(&test_id)
    .bind(Uuid::new_v4().to_string())
    .execute(pool)
    .await?;

    Ok(Seed { user_id, classroom_id, student_id, launch_id })
}

async fn insert_result(
    pool: &sqlx::PgPool,
    student_id: &str,
    launch_id: &str,
    score: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO student_test_results (id, student_id, test_launch_id, score, completed_at)
         VALUES ($1, $2, $3, $4, now() at time zone 'utc')",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(student_id)
    .bind(launch_id)
    .bind(score)
    .execute(pool)
    .await?;
    Ok(())
}

#[tokio::test]
async fn at_most_one_result_per_student_and_launch() -> anyhow::Result<()> {
    let Some(pool) = migrated_pool().await? else {
        return Ok(());
    };
    let seed = seed(&pool).await?;

    insert_result(&pool, &seed.student_id, &seed.launch_id, 100.0).await?;

    let err = insert_result(&pool, &seed.student_id, &seed.launch_id, 50.0)
        .await
        .expect_err("second result row must violate the unique constraint");
    let db_err = err.as_database_error().expect("database error");
    assert!(db_err.is_unique_violation());

    Ok(())
}

#[tokio::test]
async fn student_codes_are_unique() -> anyhow::Result<()> {
    let Some(pool) = migrated_pool().await? else {
        return Ok(());
    };
    let seed = seed(&pool).await?;

    let code = Uuid::new_v4().simple().to_string();
    let code = &code[..12];
    for attempt in 0..2 {
        let result = sqlx::query(
            "INSERT INTO students (id, classroom_id, name, student_code, created_at, updated_at)
             VALUES ($1, $2, 'Twin', $3, now() at time zone 'utc', now() at time zone 'utc')",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&seed.classroom_id)
        .bind(code)
        .execute(&pool)
        .await;

        if attempt == 0 {
            result?;
        } else {
            let err = result.expect_err("duplicate student_code must violate the unique constraint");
            let db_err = err.as_database_error().expect("database error");
            assert!(db_err.is_unique_violation());
        }
    }

    // Sanity: the fixture teacher still owns exactly the seeded classroom
    let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM classrooms WHERE owner_id = $1")
        .bind(&seed.user_id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(owned, 1);

    Ok(())
}
