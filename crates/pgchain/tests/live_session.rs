use pgchain::prelude::*;
use pgchain::{Outcome, RowId};
use serde_json::json;

fn database_config(test: &str) -> Option<SessionConfig> {
    dotenvy::dotenv().ok();
    match SessionConfig::from_env() {
        Ok(config) => Some(config),
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            None
        }
    }
}

#[tokio::test]
async fn crud_against_live_database() -> ChainResult<()> {
    let Some(config) = database_config("crud_against_live_database") else {
        return Ok(());
    };
    let mut session = Session::new(config);

    // temp tables live as long as the session connection
    session
        .cursor()
        .await?
        .client()
        .batch_execute(
            "CREATE TEMP TABLE pgchain_people (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                age INT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .await
        .map_err(ChainError::from_db_error)?;

    let ada = session
        .execute(
            Statement::new("pgchain_people")
                .insert(Fields::new().set("name", "Ada").set("age", 36i32))
                .returns(),
            ExecOptions::new().commit(),
        )
        .await?;
    let Some(RowId::Int(ada_id)) = ada.id().cloned() else {
        panic!("expected an integer id, got {ada:?}");
    };

    let rows = BulkRows::from_fields([
        Fields::new().set("name", "Grace").set("age", 45i32),
        Fields::new().set("name", "Linus").set("age", 28i32),
    ])?;
    let bulk = session
        .execute(
            Statement::new("pgchain_people").insert_bulk(rows),
            ExecOptions::new().commit(),
        )
        .await?;
    assert!(bulk.is_committed());

    let adults = session
        .execute(
            Statement::new("pgchain_people")
                .select_columns(["name", "age"])
                .where_("age", ">=", 30i32)?
                .order_by("age", "DESC")?
                .limit(10),
            ExecOptions::new(),
        )
        .await?
        .into_rows();
    let names: Vec<_> = adults
        .iter()
        .map(|r| r.value("name"))
        .collect::<ChainResult<_>>()?;
    assert_eq!(names, [json!("Grace"), json!("Ada")]);

    let found = session
        .execute(Statement::new("pgchain_people").get(ada_id), ExecOptions::new())
        .await?
        .into_row()
        .expect("row by id");
    assert_eq!(found.value("age")?, json!(36));
    assert_eq!(found.id()?, RowId::Int(ada_id));

    let missing = session
        .execute(Statement::new("pgchain_people").get(-1i64), ExecOptions::new())
        .await?;
    assert!(matches!(missing, Outcome::Row(None)));

    let frame = session
        .execute(
            Statement::new("pgchain_people").select().as_frame(),
            ExecOptions::new(),
        )
        .await?
        .into_frame()
        .expect("non-empty frame");
    assert_eq!(frame.len(), 3);
    assert_eq!(frame.columns(), ["id", "name", "age", "created_at"]);

    let updated = session
        .execute(
            Statement::new("pgchain_people")
                .update(Fields::new().set("age", 37i32))
                .where_("id", "=", ada_id)?
                .returns(),
            ExecOptions::new().commit(),
        )
        .await?;
    assert_eq!(updated.id(), Some(&RowId::Int(ada_id)));

    // duplicate name: rolled back, reported, connection still usable
    let err = session
        .execute(
            Statement::new("pgchain_people").insert(Fields::new().set("name", "Ada")),
            ExecOptions::new().commit(),
        )
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "{err}");

    let deleted = session
        .execute(
            Statement::new("pgchain_people").delete().where_("age", "<", 30i32)?,
            ExecOptions::new().commit(),
        )
        .await?;
    assert!(deleted.is_committed());

    let remaining = session
        .execute(Statement::new("pgchain_people").select(), ExecOptions::new())
        .await?
        .into_rows();
    assert_eq!(remaining.len(), 2);

    session.close().await?;
    assert!(!session.is_connected());
    Ok(())
}

#[tokio::test]
async fn swallow_policy_against_live_database() -> ChainResult<()> {
    let Some(config) = database_config("swallow_policy_against_live_database") else {
        return Ok(());
    };
    let mut session = Session::new(config).with_policy(ErrorPolicy::Swallow);

    let outcome = session
        .execute(
            Statement::new("pgchain_table_that_does_not_exist").select(),
            ExecOptions::new(),
        )
        .await?;
    assert!(outcome.is_nothing());

    let cursor = session.cursor().await?;
    assert!(!cursor.in_transaction());

    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn frame_decodes_numeric_array_and_binary_columns() -> ChainResult<()> {
    let Some(config) = database_config("frame_decodes_numeric_array_and_binary_columns") else {
        return Ok(());
    };
    let mut session = Session::new(config);

    session
        .cursor()
        .await?
        .client()
        .batch_execute(
            "CREATE TEMP TABLE pgchain_items (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                price NUMERIC(10,2),
                tags TEXT[],
                opens_at TIME,
                payload BYTEA,
                span INTERVAL
            );
            INSERT INTO pgchain_items (name, price, tags, opens_at, payload, span)
            VALUES ('lamp', 19.90, ARRAY['home', NULL, 'light'], '09:30', '\\x0aff', '1 day')",
        )
        .await
        .map_err(ChainError::from_db_error)?;

    let frame = session
        .execute(
            Statement::new("pgchain_items").select().as_frame(),
            ExecOptions::new(),
        )
        .await?
        .into_frame()
        .expect("one row");

    let row = &frame.to_records()[0];
    assert_eq!(row["price"], json!("19.90"));
    assert_eq!(row["tags"], json!(["home", null, "light"]));
    assert_eq!(row["opens_at"], json!("09:30:00"));
    assert_eq!(row["payload"], json!("\\x0aff"));
    // no JSON mapping for interval
    assert_eq!(row["span"], json!(null));

    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn mismatched_bind_type_is_a_validation_error() -> ChainResult<()> {
    let Some(config) = database_config("mismatched_bind_type_is_a_validation_error") else {
        return Ok(());
    };
    let mut session = Session::new(config);

    session
        .cursor()
        .await?
        .client()
        .batch_execute("CREATE TEMP TABLE pgchain_ids (id BIGSERIAL PRIMARY KEY)")
        .await
        .map_err(ChainError::from_db_error)?;

    let err = session
        .execute(Statement::new("pgchain_ids").get(7i32), ExecOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_validation(), "{err}");
    assert!(err.to_string().contains("int8"), "{err}");

    let missing = session
        .execute(Statement::new("pgchain_ids").get(7i64), ExecOptions::new())
        .await?;
    assert!(matches!(missing, Outcome::Row(None)));

    session.close().await?;
    Ok(())
}
