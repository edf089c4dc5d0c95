use crate::test_utils::{expect_error, expect_json, unique_name, Gateway};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Database, container, document and stored procedure against a live account.
/// The database is always dropped afterwards.
pub async fn validate_documents(gateway: &Gateway) -> Result<()> {
    let database = unique_name("e2e-db");
    let container = "items";

    let response = gateway
        .cosmos_post("createDatabase", &[("databaseName", database.as_str())], None)
        .await?;
    let _: Value = expect_json(response, StatusCode::OK).await?;

    let result = async {
        let response = gateway
            .cosmos_post(
                "createContainer",
                &[
                    ("databaseName", database.as_str()),
                    ("containerName", container),
                    ("partitionKeyPath", "/category"),
                ],
                None,
            )
            .await?;
        let _: Value = expect_json(response, StatusCode::OK).await?;

        let item = json!({ "id": "item-1", "category": "books", "title": "Dune" });
        let response = gateway
            .cosmos_post(
                "createDocument",
                &[
                    ("databaseName", database.as_str()),
                    ("container", container),
                    ("partitionKey", "books"),
                ],
                Some(&item),
            )
            .await?;
        let created: Value = expect_json(response, StatusCode::OK).await?;
        if created["id"] != "item-1" {
            anyhow::bail!("Created document has the wrong id: {}", created);
        }

        let response = gateway
            .cosmos_get(
                "readItem",
                &[
                    ("databaseName", database.as_str()),
                    ("container", container),
                    ("id", "item-1"),
                    ("partitionKey", "books"),
                ],
            )
            .await?;
        let read: Value = expect_json(response, StatusCode::OK).await?;
        if read["title"] != "Dune" {
            anyhow::bail!("Read document does not match: {}", read);
        }

        let response = gateway
            .cosmos_get(
                "readItem",
                &[
                    ("databaseName", database.as_str()),
                    ("container", container),
                    ("id", "missing"),
                    ("partitionKey", "books"),
                ],
            )
            .await?;
        let missing: Value = expect_json(response, StatusCode::OK).await?;
        if !missing.is_null() {
            anyhow::bail!("Missing item should read as null, got {}", missing);
        }

        let response = gateway
            .cosmos_post(
                "createStoredProcedure",
                &[
                    ("databaseName", database.as_str()),
                    ("containerName", container),
                    ("procedureName", "insertItems"),
                ],
                None,
            )
            .await?;
        let _: Value = expect_json(response, StatusCode::OK).await?;

        let request = json!({
            "databaseName": database,
            "containerName": container,
            "procedureName": "insertItems",
            "partitionName": "music",
            "items": [
                { "id": "item-2", "category": "music" },
                { "id": "item-3", "category": "music" }
            ]
        });
        let response = gateway
            .cosmos_post("executeStoredProcedure", &[], Some(&request))
            .await?;
        let executed: Value = expect_json(response, StatusCode::OK).await?;
        println!("Stored procedure answered: {}", executed);

        let response = gateway
            .cosmos_post("executeStoredProcedure", &[], Some(&json!({ "items": [] })))
            .await?;
        expect_error(response, StatusCode::BAD_REQUEST).await?;

        Ok::<(), anyhow::Error>(())
    }
    .await;

    // Always drop the database, even on error
    let cleanup = gateway
        .cosmos_delete("deleteDatabase", &[("databaseName", database.as_str())])
        .await
        .and_then(|response| {
            if response.status() == StatusCode::OK {
                Ok(())
            } else {
                anyhow::bail!("Delete database answered {}", response.status())
            }
        })
        .with_context(|| format!("Failed to drop database {}", database));

    result?;
    cleanup
}

pub async fn validate_rejections(gateway: &Gateway) -> Result<()> {
    let response = gateway
        .cosmos_post("createDatabase", &[("databaseName", " ")], None)
        .await?;
    let message = expect_error(response, StatusCode::BAD_REQUEST).await?;
    if message != "The databaseName field is required." {
        anyhow::bail!("Unexpected message: {}", message);
    }
    Ok(())
}
