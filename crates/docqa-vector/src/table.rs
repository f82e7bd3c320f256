//! LanceDB connection and table helpers.
//!
//! One table per collection. Writes go through `merge_insert` keyed on `id`,
//! creating the table on first write.

use anyhow::{anyhow, Result};
use arrow_array::{RecordBatch, RecordBatchIterator, RecordBatchReader};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

fn reader(batch: RecordBatch) -> Box<dyn RecordBatchReader + Send> {
    let schema = batch.schema();
    Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema))
}

/// Inserts or replaces rows by `id`.
pub async fn upsert_batch(conn: &Connection, name: &str, batch: RecordBatch) -> Result<()> {
    if batch.num_rows() == 0 {
        return Ok(());
    }
    if !table_exists(conn, name).await? {
        conn.create_table(name, reader(batch)).execute().await?;
        return Ok(());
    }
    let table = conn.open_table(name).execute().await?;
    let mut merge = table.merge_insert(&["id"]);
    merge.when_matched_update_all(None).when_not_matched_insert_all();
    merge.execute(reader(batch)).await?;
    Ok(())
}

/// Row count; an absent table counts as empty.
pub async fn count_rows(conn: &Connection, name: &str) -> Result<usize> {
    if !table_exists(conn, name).await? {
        return Ok(0);
    }
    let table = conn.open_table(name).execute().await?;
    Ok(table.count_rows(None).await?)
}

pub async fn table_schema(conn: &Connection, name: &str) -> Result<arrow_schema::SchemaRef> {
    let table = conn.open_table(name).execute().await?;
    Ok(table.schema().await?)
}

/// The `k` rows nearest to `vector`, closest first, with a `_distance` column.
pub async fn nearest(conn: &Connection, name: &str, vector: Vec<f32>, k: usize) -> Result<Vec<RecordBatch>> {
    let table = conn.open_table(name).execute().await?;
    let stream = table
        .vector_search(vector)
        .map_err(|e| anyhow!("vector search on {name} failed: {e}"))?
        .limit(k)
        .execute()
        .await?;
    Ok(stream.try_collect().await?)
}
