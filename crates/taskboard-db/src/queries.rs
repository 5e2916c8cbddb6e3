use crate::Database;
use crate::models::{MessageRow, ProjectRow, TaskRow, UserRow};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row};
use tracing::debug;

const USER_COLUMNS: &str = "id, name, email, username, password";
const PROJECT_COLUMNS: &str = "id, user_id, title, creation_date, last_updated";
const TASK_COLUMNS: &str = "id, project_id, title, creation_date, completed";
const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, timestamp";

/// Outcome of a cascading project delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectDeletion {
    pub project_deleted: bool,
    pub tasks_deleted: usize,
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, username, password) VALUES (?1, ?2, ?3, ?4)",
                (name, email, username, password),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    [id],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// All users sharing a username, oldest first. Usernames are not unique.
    pub fn get_users_by_username(&self, username: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([username], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_user(
        &self,
        id: i64,
        name: &str,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET name = ?1, email = ?2, username = ?3, password = ?4 WHERE id = ?5",
                rusqlite::params![name, email, username, password, id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Projects --

    pub fn list_projects(&self, owner_id: i64) -> Result<Vec<ProjectRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([owner_id], project_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// `now` becomes both `creation_date` and `last_updated`.
    pub fn insert_project(&self, owner_id: i64, title: &str, now: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO projects (user_id, title, creation_date, last_updated) VALUES (?1, ?2, ?3, ?3)",
                rusqlite::params![owner_id, title, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_project(&self, owner_id: i64, project_id: i64) -> Result<Option<ProjectRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1 AND user_id = ?2"),
                    [project_id, owner_id],
                    project_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Refreshes `last_updated`; `creation_date` is never touched.
    pub fn update_project(
        &self,
        owner_id: i64,
        project_id: i64,
        title: &str,
        now: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE projects SET title = ?1, last_updated = ?2 WHERE id = ?3 AND user_id = ?4",
                rusqlite::params![title, now, project_id, owner_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes the project's tasks and then the project itself in a single
    /// transaction. Nothing is removed unless the project belongs to `owner_id`.
    pub fn delete_project(&self, owner_id: i64, project_id: i64) -> Result<ProjectDeletion> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let tasks_deleted = tx.execute(
                "DELETE FROM tasks WHERE project_id IN
                    (SELECT id FROM projects WHERE id = ?1 AND user_id = ?2)",
                [project_id, owner_id],
            )?;
            let projects_deleted = tx.execute(
                "DELETE FROM projects WHERE id = ?1 AND user_id = ?2",
                [project_id, owner_id],
            )?;

            tx.commit()?;

            debug!(project_id, tasks_deleted, "Cascade delete committed");
            Ok(ProjectDeletion {
                project_deleted: projects_deleted > 0,
                tasks_deleted,
            })
        })
    }

    // -- Tasks --

    /// Unscoped by owner: callers resolve the project under the caller first.
    pub fn list_tasks(&self, project_id: i64) -> Result<Vec<TaskRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([project_id], task_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn insert_task(
        &self,
        project_id: i64,
        title: &str,
        now: &str,
        completed: i64,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO tasks (project_id, title, creation_date, completed) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![project_id, title, now, completed],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Looks a task up by (task id, project id); a task living under another
    /// project is not found.
    pub fn get_task(&self, project_id: i64, task_id: i64) -> Result<Option<TaskRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND project_id = ?2"),
                    [task_id, project_id],
                    task_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_task(
        &self,
        project_id: i64,
        task_id: i64,
        title: &str,
        completed: i64,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET title = ?1, completed = ?2 WHERE id = ?3 AND project_id = ?4",
                rusqlite::params![title, completed, task_id, project_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_task(&self, project_id: i64, task_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM tasks WHERE id = ?1 AND project_id = ?2",
                [task_id, project_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Task lookup with the ownership check folded into one join:
    /// the task's project must belong to `owner_id`.
    pub fn get_owned_task(&self, owner_id: i64, task_id: i64) -> Result<Option<TaskRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT t.id, t.project_id, t.title, t.creation_date, t.completed
                     FROM tasks t
                     JOIN projects p ON t.project_id = p.id
                     WHERE t.id = ?1 AND p.user_id = ?2",
                    [task_id, owner_id],
                    task_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Writes `completed` and returns the value read back from the row,
    /// or `None` if the task vanished in between.
    pub fn set_task_completed(&self, task_id: i64, completed: i64) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE tasks SET completed = ?1 WHERE id = ?2",
                [completed, task_id],
            )?;
            let stored = conn
                .query_row(
                    "SELECT completed FROM tasks WHERE id = ?1",
                    [task_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(stored)
        })
    }

    // -- Messages --

    /// Inbox only: messages where `receiver_id` is the user. Sent messages are
    /// not listed.
    pub fn list_inbox(&self, receiver_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE receiver_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([receiver_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns `None` without inserting when the receiver does not exist.
    pub fn insert_message(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content: &str,
        now: &str,
    ) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            let receiver_exists: Option<i64> = conn
                .query_row("SELECT id FROM users WHERE id = ?1", [receiver_id], |row| {
                    row.get(0)
                })
                .optional()?;
            if receiver_exists.is_none() {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO messages (sender_id, receiver_id, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![sender_id, receiver_id, content, now],
            )?;
            Ok(Some(conn.last_insert_rowid()))
        })
    }

    /// Visible to its sender and its receiver.
    pub fn get_visible_message(&self, user_id: i64, message_id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {MESSAGE_COLUMNS} FROM messages
                         WHERE id = ?1 AND (sender_id = ?2 OR receiver_id = ?2)"
                    ),
                    [message_id, user_id],
                    message_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_message(&self, message_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM messages WHERE id = ?1", [message_id])?;
            Ok(changed > 0)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        username: row.get(3)?,
        password: row.get(4)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectRow> {
    Ok(ProjectRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        creation_date: row.get(3)?,
        last_updated: row.get(4)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        creation_date: row.get(3)?,
        completed: row.get(4)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        content: row.get(3)?,
        timestamp: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2024-06-28T12:00:00+00:00";

    fn test_db() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let homer = db
            .create_user("Homer Simpson", "homer@springfield.com", "homer", "1234")
            .unwrap();
        let bart = db
            .create_user("Bart Simpson", "bart@springfield.com", "bart", "1234")
            .unwrap();
        (db, homer, bart)
    }

    #[test]
    fn project_lookup_is_scoped_to_owner() {
        let (db, homer, bart) = test_db();
        let pid = db.insert_project(homer, "Doughnuts", NOW).unwrap();

        let own = db.get_project(homer, pid).unwrap().unwrap();
        assert_eq!(own.title, "Doughnuts");
        assert_eq!(own.creation_date, own.last_updated);

        assert!(db.get_project(bart, pid).unwrap().is_none());
        assert!(db.list_projects(bart).unwrap().is_empty());
        assert!(!db.update_project(bart, pid, "Stolen", NOW).unwrap());
        assert_eq!(db.get_project(homer, pid).unwrap().unwrap().title, "Doughnuts");
    }

    #[test]
    fn update_project_keeps_creation_date() {
        let (db, homer, _) = test_db();
        let pid = db.insert_project(homer, "Doughnuts", NOW).unwrap();

        let later = "2024-06-29T08:30:00+00:00";
        assert!(db.update_project(homer, pid, "More doughnuts", later).unwrap());

        let row = db.get_project(homer, pid).unwrap().unwrap();
        assert_eq!(row.title, "More doughnuts");
        assert_eq!(row.creation_date, NOW);
        assert_eq!(row.last_updated, later);
    }

    #[test]
    fn delete_project_cascades_to_tasks() {
        let (db, homer, _) = test_db();
        let pid = db.insert_project(homer, "Doughnuts", NOW).unwrap();
        let keep = db.insert_project(homer, "Beer", NOW).unwrap();
        let t1 = db.insert_task(pid, "Search", NOW, 0).unwrap();
        db.insert_task(pid, "Eat", NOW, 1).unwrap();
        let other = db.insert_task(keep, "Open fridge", NOW, 0).unwrap();

        let deletion = db.delete_project(homer, pid).unwrap();
        assert_eq!(
            deletion,
            ProjectDeletion {
                project_deleted: true,
                tasks_deleted: 2,
            }
        );

        assert!(db.get_project(homer, pid).unwrap().is_none());
        assert!(db.get_task(pid, t1).unwrap().is_none());
        assert!(db.list_tasks(pid).unwrap().is_empty());
        assert!(db.get_task(keep, other).unwrap().is_some());
    }

    #[test]
    fn delete_project_of_other_owner_removes_nothing() {
        let (db, homer, bart) = test_db();
        let pid = db.insert_project(homer, "Doughnuts", NOW).unwrap();
        let tid = db.insert_task(pid, "Search", NOW, 0).unwrap();

        let deletion = db.delete_project(bart, pid).unwrap();
        assert!(!deletion.project_deleted);
        assert_eq!(deletion.tasks_deleted, 0);
        assert!(db.get_task(pid, tid).unwrap().is_some());
    }

    #[test]
    fn task_lookup_requires_matching_project() {
        let (db, homer, _) = test_db();
        let p1 = db.insert_project(homer, "One", NOW).unwrap();
        let p2 = db.insert_project(homer, "Two", NOW).unwrap();
        let tid = db.insert_task(p1, "Only in one", NOW, 0).unwrap();

        assert!(db.get_task(p1, tid).unwrap().is_some());
        assert!(db.get_task(p2, tid).unwrap().is_none());
        assert!(!db.update_task(p2, tid, "Moved?", 1).unwrap());
        assert!(!db.delete_task(p2, tid).unwrap());
    }

    #[test]
    fn owned_task_join_checks_project_owner() {
        let (db, homer, bart) = test_db();
        let pid = db.insert_project(homer, "Doughnuts", NOW).unwrap();
        let tid = db.insert_task(pid, "Search", NOW, 0).unwrap();

        assert!(db.get_owned_task(homer, tid).unwrap().is_some());
        assert!(db.get_owned_task(bart, tid).unwrap().is_none());
        assert!(db.get_owned_task(homer, tid + 100).unwrap().is_none());
    }

    #[test]
    fn set_task_completed_returns_stored_value() {
        let (db, homer, _) = test_db();
        let pid = db.insert_project(homer, "Doughnuts", NOW).unwrap();
        let tid = db.insert_task(pid, "Search", NOW, 0).unwrap();

        assert_eq!(db.set_task_completed(tid, 1).unwrap(), Some(1));
        assert_eq!(db.get_task(pid, tid).unwrap().unwrap().completed, 1);
        assert_eq!(db.set_task_completed(tid, 0).unwrap(), Some(0));
        assert_eq!(db.set_task_completed(tid + 100, 1).unwrap(), None);
    }

    #[test]
    fn inbox_lists_received_messages_only() {
        let (db, homer, bart) = test_db();
        let mid = db
            .insert_message(bart, homer, "Eat my shorts", NOW)
            .unwrap()
            .unwrap();

        let inbox = db.list_inbox(homer).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].id, mid);
        assert!(db.list_inbox(bart).unwrap().is_empty());

        // Both ends of the conversation can still open it.
        assert!(db.get_visible_message(homer, mid).unwrap().is_some());
        assert!(db.get_visible_message(bart, mid).unwrap().is_some());
    }

    #[test]
    fn message_hidden_from_third_party() {
        let (db, homer, bart) = test_db();
        let lisa = db
            .create_user("Lisa Simpson", "lisa@springfield.com", "lisa", "sax")
            .unwrap();
        let mid = db.insert_message(bart, homer, "Psst", NOW).unwrap().unwrap();

        assert!(db.get_visible_message(lisa, mid).unwrap().is_none());
    }

    #[test]
    fn message_to_unknown_receiver_is_rejected() {
        let (db, homer, _) = test_db();
        assert_eq!(db.insert_message(homer, 999, "Hello?", NOW).unwrap(), None);
        assert!(db.list_inbox(999).unwrap().is_empty());
    }

    #[test]
    fn duplicate_usernames_are_allowed() {
        let (db, _, _) = test_db();
        db.create_user("Other Homer", "other@springfield.com", "homer", "5678")
            .unwrap();

        let users = db.get_users_by_username("homer").unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].password, "1234");
    }

    #[test]
    fn recreate_empties_tables_and_restarts_ids() {
        let (db, homer, _) = test_db();
        db.insert_project(homer, "Doughnuts", NOW).unwrap();

        db.recreate().unwrap();

        assert!(db.get_users_by_username("homer").unwrap().is_empty());
        let id = db.create_user("Ned Flanders", "ned@springfield.com", "ned", "okily").unwrap();
        assert_eq!(id, 1);
        assert!(db.list_projects(id).unwrap().is_empty());
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let (db, homer, _) = test_db();
        let first = db.insert_project(homer, "First", NOW).unwrap();
        db.delete_project(homer, first).unwrap();
        let second = db.insert_project(homer, "Second", NOW).unwrap();

        assert_ne!(first, second);
        assert!(db.get_project(homer, first).unwrap().is_none());
    }
}
