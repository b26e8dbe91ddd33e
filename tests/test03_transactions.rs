#![cfg(feature = "test-utils")]

use sql_fixture::fixture::{queries, schema};
use sql_fixture::prelude::*;
use sql_fixture::test_utils::{setup_postgres_embedded, stop_postgres_embedded};

fn text(s: &str) -> RowValues {
    RowValues::Text(s.to_string())
}

async fn user_count(pool: &DbPool, email: &str) -> Result<usize, SqlFixtureError> {
    Ok(pool.run(queries::SELECT_USER_BY_EMAIL, &[text(email)]).await?.len())
}

async fn product_count(pool: &DbPool, name: &str) -> Result<usize, SqlFixtureError> {
    Ok(pool.run(queries::SELECT_PRODUCT_BY_NAME, &[text(name)]).await?.len())
}

async fn idle_in_transaction(pool: &DbPool) -> Result<i64, SqlFixtureError> {
    let rs = pool
        .run(
            "SELECT COUNT(*) AS n FROM pg_stat_activity \
             WHERE datname = current_database() AND state = 'idle in transaction'",
            &[],
        )
        .await?;
    Ok(rs.results[0].get("n").and_then(RowValues::as_int).copied().unwrap_or(-1))
}

#[test]
fn test03_transactions() -> Result<(), Box<dyn std::error::Error>> {
    let pg = setup_postgres_embedded("tx_db")?;
    let cfg = pg.config.clone().with_max_size(4);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let mut pool = DbPool::open(&cfg)?;
        schema::reset(&mut pool).await?;

        // rows written to both tables are independently visible
        pool.run(
            queries::INSERT_USER,
            &[text("Product Tester"), text("tester@example.com")],
        )
        .await?;
        pool.run(
            queries::INSERT_PRODUCT,
            &[text("Tester Product"), RowValues::Int(100), RowValues::Int(5)],
        )
        .await?;
        let user = pool
            .run(queries::SELECT_USER_BY_EMAIL, &[text("tester@example.com")])
            .await?;
        let product = pool
            .run(queries::SELECT_PRODUCT_BY_NAME, &[text("Tester Product")])
            .await?;
        assert_eq!(
            user.results[0].get("name").and_then(RowValues::as_text),
            Some("Product Tester")
        );
        assert_eq!(
            product.results[0].get("price").and_then(RowValues::as_text),
            Some("100.00")
        );
        pool.run(queries::DELETE_USER_BY_EMAIL, &[text("tester@example.com")])
            .await?;
        pool.run(queries::DELETE_PRODUCT_BY_NAME, &[text("Tester Product")])
            .await?;

        // caller-issued BEGIN ... ROLLBACK on one pinned connection
        let outcome = pool
            .with_connection(|session| {
                Box::pin(async move {
                    session.run("BEGIN", &[]).await?;
                    assert_eq!(session.state(), TxState::InTransaction);
                    session
                        .run(
                            queries::INSERT_USER,
                            &[text("Transaction User"), text("rollback@example.com")],
                        )
                        .await?;
                    session
                        .run(
                            queries::INSERT_PRODUCT,
                            &[
                                text("Transaction Product"),
                                RowValues::Float(50.0),
                                RowValues::Int(5),
                            ],
                        )
                        .await?;
                    // simulated failure in caller code
                    session.run("ROLLBACK", &[]).await?;
                    assert_eq!(session.state(), TxState::Idle);
                    Ok(())
                })
            })
            .await;
        assert!(outcome.is_ok());
        assert_eq!(user_count(&pool, "rollback@example.com").await?, 0);
        assert_eq!(product_count(&pool, "Transaction Product").await?, 0);

        // with_transaction commits on Ok
        let inserted = pool
            .with_transaction(|session| {
                Box::pin(async move {
                    let rs = session
                        .run(queries::INSERT_USER, &[text("Committed"), text("commit@example.com")])
                        .await?;
                    Ok(rs.rows_affected)
                })
            })
            .await?;
        assert_eq!(inserted, 1);
        assert_eq!(user_count(&pool, "commit@example.com").await?, 1);
        pool.run(queries::DELETE_USER_BY_EMAIL, &[text("commit@example.com")])
            .await?;

        // with_transaction rolls back on Err and hands the error back
        let err = pool
            .with_transaction(|session| {
                Box::pin(async move {
                    session
                        .run(queries::INSERT_USER, &[text("Doomed"), text("doomed@example.com")])
                        .await?;
                    Err::<(), _>(SqlFixtureError::ExecutionError("simulated failure".into()))
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SqlFixtureError::ExecutionError(ref m) if m == "simulated failure"));
        assert_eq!(user_count(&pool, "doomed@example.com").await?, 0);

        // run_in_transaction: all or nothing
        let results = pool
            .run_in_transaction(&[
                QueryAndParams::new(
                    queries::INSERT_USER,
                    vec![text("Batch One"), text("batch1@example.com")],
                ),
                QueryAndParams::new(
                    queries::INSERT_PRODUCT,
                    vec![text("Batch Product"), RowValues::Float(12.5), RowValues::Int(1)],
                ),
            ])
            .await?;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|rs| rs.rows_affected == 1));
        assert_eq!(user_count(&pool, "batch1@example.com").await?, 1);
        assert_eq!(product_count(&pool, "Batch Product").await?, 1);

        let err = pool
            .run_in_transaction(&[
                QueryAndParams::new(
                    queries::INSERT_USER,
                    vec![text("Batch Two"), text("batch2@example.com")],
                ),
                // collides with the seed row
                QueryAndParams::new(
                    queries::INSERT_USER,
                    vec![text("Impostor"), text("john@blog.com")],
                ),
            ])
            .await
            .unwrap_err();
        assert_eq!(err.query_kind(), Some(QueryErrorKind::UniqueViolation));
        assert_eq!(user_count(&pool, "batch2@example.com").await?, 0);

        // state machine misuse sends nothing and leaves the session usable
        let mut session = pool.acquire().await?;
        let err = session.commit().await.unwrap_err();
        assert!(matches!(err, SqlFixtureError::TransactionState(_)));
        session.begin().await?;
        let err = session.run("BEGIN", &[]).await.unwrap_err();
        assert!(matches!(err, SqlFixtureError::TransactionState(_)));
        assert!(session.in_transaction());

        // a failed statement aborts the transaction until rollback
        let err = session
            .run(queries::INSERT_USER, &[text("Dup"), text("jane@blog.com")])
            .await
            .unwrap_err();
        assert_eq!(err.query_kind(), Some(QueryErrorKind::UniqueViolation));
        let err = session.run(queries::SELECT_ALL_USERS, &[]).await.unwrap_err();
        assert_eq!(err.as_query_error().and_then(QueryError::code), Some("25P02"));
        session.rollback().await?;
        assert_eq!(session.run(queries::SELECT_ALL_USERS, &[]).await?.len(), 4);
        session.release().await;

        // savepoints are ordinary statements inside a session transaction
        let mut session = pool.acquire().await?;
        session.begin().await?;
        session.run("SAVEPOINT before_insert", &[]).await?;
        session
            .run(queries::INSERT_USER, &[text("Saved"), text("saved@example.com")])
            .await?;
        session.run("ROLLBACK TO SAVEPOINT before_insert", &[]).await?;
        assert!(session.in_transaction());
        session.commit().await?;
        session.release().await;
        assert_eq!(user_count(&pool, "saved@example.com").await?, 0);

        // control text on the pool reaches the server and ends with the borrow
        pool.run("BEGIN", &[]).await?;
        pool.run(queries::INSERT_USER, &[text("Autocommit"), text("auto@example.com")])
            .await?;
        assert_eq!(idle_in_transaction(&pool).await?, 0);
        assert_eq!(user_count(&pool, "auto@example.com").await?, 1);
        pool.run("COMMIT", &[]).await?;
        pool.run("ROLLBACK", &[]).await?;
        assert_eq!(user_count(&pool, "auto@example.com").await?, 1);

        // fixture entry points run inside a session transaction too
        pool.with_transaction(|session| {
            Box::pin(async move {
                schema::teardown(session).await?;
                schema::setup(session).await
            })
        })
        .await?;
        assert_eq!(user_count(&pool, "auto@example.com").await?, 0);
        assert_eq!(user_count(&pool, "john@blog.com").await?, 1);

        schema::teardown(&mut pool).await?;
        pool.close_all();
        Ok::<(), SqlFixtureError>(())
    })?;

    stop_postgres_embedded(pg);
    Ok(())
}
