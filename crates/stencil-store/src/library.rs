//! CRUD operations for [`LibraryItem`] records.

use rusqlite::params;
use stencil_shared::{LibraryItem, LibraryItemId, Target};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::row::{enum_at, ts, ts_at, uuid_at};

impl Database {
    pub fn insert_library_item(&self, item: &LibraryItem) -> Result<()> {
        self.conn().execute(
            "INSERT INTO library_items (id, name, target, zip_file, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.id.to_string(),
                item.name,
                item.target.as_str(),
                item.artifact,
                ts(item.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_library_item(&self, id: LibraryItemId) -> Result<LibraryItem> {
        self.conn()
            .query_row(
                "SELECT id, name, target, zip_file, created_at
                 FROM library_items
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_item,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all library items, most recent first.
    pub fn list_library(&self) -> Result<Vec<LibraryItem>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, target, zip_file, created_at
             FROM library_items
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map([], row_to_item)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    pub fn delete_library_item(&self, id: LibraryItemId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM library_items WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<LibraryItem> {
    Ok(LibraryItem {
        id: LibraryItemId(uuid_at(row, 0)?),
        name: row.get(1)?,
        target: enum_at(row, 2, Target::parse)?,
        artifact: row.get(3)?,
        created_at: ts_at(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stencil_shared::Target;

    fn item(name: &str) -> LibraryItem {
        let id = LibraryItemId::new();
        LibraryItem {
            id,
            name: name.to_string(),
            target: Target::Django,
            artifact: format!("/media/library/{id}.zip"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_list_delete() {
        let db = Database::open_in_memory().unwrap();
        let a = item("Homepage Template");
        let b = item("Pricing");
        db.insert_library_item(&a).unwrap();
        db.insert_library_item(&b).unwrap();

        let listed = db.list_library().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, b.id);

        let got = db.get_library_item(a.id).unwrap();
        assert_eq!(got, LibraryItem { created_at: got.created_at, ..a.clone() });

        assert!(db.delete_library_item(a.id).unwrap());
        assert!(!db.delete_library_item(a.id).unwrap());
        assert!(matches!(db.get_library_item(a.id), Err(StoreError::NotFound)));
    }
}
