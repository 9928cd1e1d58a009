//! Student directory backed by SQLite.

use std::path::Path;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use crate::err::Error;
use crate::models::{Student, StudentForm};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS students (
    id BLOB PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    roll_number TEXT NOT NULL,
    photo TEXT,
    created_at TEXT NOT NULL
)";

const COLUMNS: &str = "id, name, email, roll_number, photo, created_at";

#[derive(Debug, Clone)]
pub struct Directory {
    pool: SqlitePool,
}

impl Directory {
    /// Opens the database file at `path`, creating it when missing.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::with_pool(pool).await
    }

    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new().connect(url).await?;
        Self::with_pool(pool).await
    }

    /// A private database that lives as long as the directory. The pool is
    /// pinned to one connection since every in-memory connection is its own database.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// All students in insertion order.
    pub async fn list(&self) -> Result<Vec<Student>, Error> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students ORDER BY rowid",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(students)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Student>, Error> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE id = ? LIMIT 1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }

    pub async fn create(&self, form: &StudentForm) -> Result<Student, Error> {
        let student = Student {
            id: Uuid::new_v4(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            roll_number: form.roll_number.trim().to_string(),
            photo: form.photo(),
            created_at: Utc::now(),
        };

        let res = sqlx::query("INSERT INTO students VALUES (?, ?, ?, ?, ?, ?)")
            .bind(student.id)
            .bind(&student.name)
            .bind(&student.email)
            .bind(&student.roll_number)
            .bind(&student.photo)
            .bind(student.created_at)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() < 1 {
            return Err(Error::InternalError {
                kind: "DatabaseError",
                message: "Could not save student to database!".to_string(),
            });
        }
        Ok(student)
    }

    /// Replaces every field but the id. `None` when no such student exists.
    pub async fn update(&self, id: Uuid, form: &StudentForm) -> Result<Option<Student>, Error> {
        let res = sqlx::query(
            "UPDATE students SET name = ?, email = ?, roll_number = ?, photo = ? WHERE id = ?",
        )
        .bind(form.name.trim())
        .bind(form.email.trim())
        .bind(form.roll_number.trim())
        .bind(form.photo())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() < 1 {
            return Ok(None);
        }
        self.get(id).await
    }

    /// Returns whether a student was removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, Error> {
        let res = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() >= 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, roll: &str) -> StudentForm {
        StudentForm {
            name: name.to_string(),
            email: format!("{}@school.edu", name.to_lowercase()),
            roll_number: roll.to_string(),
            photo: None,
        }
    }

    #[tokio::test]
    async fn lists_in_insertion_order() {
        let directory = Directory::in_memory().await.unwrap();
        let zed = directory.create(&form("Zed", "3")).await.unwrap();
        let amy = directory.create(&form("Amy", "1")).await.unwrap();

        let ids: Vec<_> = directory.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![zed.id, amy.id]);
    }

    #[tokio::test]
    async fn update_replaces_fields_but_keeps_id() {
        let directory = Directory::in_memory().await.unwrap();
        let created = directory.create(&form("Alice", "7")).await.unwrap();

        let mut edit = form("Alicia", "8");
        edit.photo = Some("https://cdn.example.com/a.png".to_string());
        let updated = directory.update(created.id, &edit).await.unwrap().unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Alicia");
        assert_eq!(updated.roll_number, "8");
        assert_eq!(updated.photo.as_deref(), Some("https://cdn.example.com/a.png"));
        assert_eq!(directory.get(created.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let directory = Directory::in_memory().await.unwrap();
        let id = Uuid::new_v4();
        assert_eq!(directory.get(id).await.unwrap(), None);
        assert_eq!(directory.update(id, &form("Ghost", "0")).await.unwrap(), None);
        assert!(!directory.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_from_listing() {
        let directory = Directory::in_memory().await.unwrap();
        let alice = directory.create(&form("Alice", "1")).await.unwrap();
        let bob = directory.create(&form("Bob", "2")).await.unwrap();

        assert!(directory.delete(alice.id).await.unwrap());
        let students = directory.list().await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].id, bob.id);
    }

    #[tokio::test]
    async fn duplicate_emails_are_allowed() {
        let directory = Directory::in_memory().await.unwrap();
        directory.create(&form("Alice", "1")).await.unwrap();
        directory.create(&form("Alice", "2")).await.unwrap();
        assert_eq!(directory.list().await.unwrap().len(), 2);
    }
}
