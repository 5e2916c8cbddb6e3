use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// `username` is intentionally not UNIQUE: registration performs no
/// uniqueness check and the gate resolves the first matching credential.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL,
            username    TEXT NOT NULL,
            password    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_users_username
            ON users(username);

        CREATE TABLE IF NOT EXISTS projects (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            title           TEXT NOT NULL,
            creation_date   TEXT NOT NULL,
            last_updated    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_projects_user
            ON projects(user_id);

        CREATE TABLE IF NOT EXISTS tasks (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id      INTEGER NOT NULL REFERENCES projects(id),
            title           TEXT NOT NULL,
            creation_date   TEXT NOT NULL,
            completed       INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_project
            ON tasks(project_id);

        CREATE TABLE IF NOT EXISTS messages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id       INTEGER NOT NULL REFERENCES users(id),
            receiver_id     INTEGER NOT NULL REFERENCES users(id),
            content         TEXT NOT NULL,
            timestamp       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_receiver
            ON messages(receiver_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

/// Children before parents so foreign keys never dangle mid-drop.
/// Dropping an AUTOINCREMENT table also clears its `sqlite_sequence` entry,
/// so ids restart at 1.
pub fn drop_all(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS messages;
        DROP TABLE IF EXISTS tasks;
        DROP TABLE IF EXISTS projects;
        DROP TABLE IF EXISTS users;
        ",
    )?;
    Ok(())
}
