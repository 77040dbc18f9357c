//! Schema bootstrap for the PostgreSQL document table.

use sea_query::{ColumnDef, Expr, Index, PostgresQueryBuilder, Table};

use crate::executor::{DbError, DbExecutor};

/// Table holding every collection's documents.
pub const DOCUMENTS_TABLE: &str = "catalog_documents";

const DOCUMENTS_KEY_INDEX: &str = "idx_catalog_documents_collection_id";

/// Create the documents table and its `(collection, id)` unique index.
///
/// Idempotent; safe to run on every start.
pub fn ensure_schema(executor: &dyn DbExecutor) -> Result<(), DbError> {
    for statement in schema_statements() {
        executor.execute(&statement, &[])?;
    }
    log::info!("Document table {DOCUMENTS_TABLE} is ready");
    Ok(())
}

fn schema_statements() -> Vec<String> {
    let table = Table::create()
        .table(DOCUMENTS_TABLE)
        .if_not_exists()
        .col(ColumnDef::new("seq").big_integer().not_null().auto_increment())
        .col(ColumnDef::new("collection").text().not_null())
        .col(ColumnDef::new("id").text().not_null())
        .col(ColumnDef::new("body").json_binary().not_null())
        .to_owned();

    let index = Index::create()
        .name(DOCUMENTS_KEY_INDEX)
        .table(DOCUMENTS_TABLE)
        .col(Expr::col("collection"))
        .col(Expr::col("id"))
        .unique()
        .if_not_exists()
        .to_owned();

    vec![
        table.build(PostgresQueryBuilder),
        index.build(PostgresQueryBuilder),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_target_documents_table() {
        let statements = schema_statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS"));
        assert!(statements[0].contains(DOCUMENTS_TABLE));
        assert!(statements[0].contains("jsonb"));
        assert!(statements[1].contains("UNIQUE"));
        assert!(statements[1].contains(DOCUMENTS_KEY_INDEX));
    }
}
