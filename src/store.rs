use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::Result;

/// SQLite-backed persistence for accounts, contacts and call sessions.
///
/// Lookups treat a missing row as `None` or an empty list rather than an
/// error; only real database failures propagate.
pub struct Store {
    conn: Connection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Registration date only, time of day dropped.
    pub created_on: String,
    pub sessions: i64,
    pub about: Option<String>,
    pub role: String,
    pub institution: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Friend {
    pub username: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboxMessage {
    pub username: String,
    pub email: String,
    pub body: String,
}

/// Reasons a friend request or message is rejected without touching the
/// database.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FriendIssue {
    AlreadyExists,
    SameUser,
    NoSuchUser,
}

fn now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.create_tables()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(32),
                email VARCHAR(64) UNIQUE,
                password BLOB,
                created_at DATETIME,
                sessions INTEGER DEFAULT 0,
                about TEXT,
                role_id INTEGER,
                institution_id INTEGER );

            CREATE TABLE IF NOT EXISTS role (
                id INTEGER NOT NULL PRIMARY KEY,
                name VARCHAR(16) UNIQUE);

            CREATE TABLE IF NOT EXISTS institutions (
                id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE);

            CREATE TABLE IF NOT EXISTS call (
                id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                start DATETIME);

            CREATE TABLE IF NOT EXISTS sessions (
                call_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL );

            CREATE TABLE IF NOT EXISTS events (
                call_id INTEGER NOT NULL,
                event TEXT NOT NULL );

            CREATE TABLE IF NOT EXISTS friends (
                user_id INTEGER NOT NULL,
                friend_id INTEGER NOT NULL,
                PRIMARY KEY(user_id, friend_id) );

            CREATE TABLE IF NOT EXISTS messages (
                from_id INTEGER NOT NULL,
                to_id INTEGER NOT NULL,
                message TEXT );",
        )?;
        Ok(())
    }

    /// Insert-or-reuse a row in a (id, name UNIQUE) lookup table.
    fn lookup_id(&self, table: &str, name: &str) -> Result<i64> {
        self.conn.execute(
            &format!("INSERT OR IGNORE INTO {table} (name) VALUES (?1)"),
            params![name],
        )?;
        let id = self.conn.query_row(
            &format!("SELECT id FROM {table} WHERE name=?1"),
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn user_id(&self, email: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row("SELECT id FROM users WHERE email=?1", params![email], |row| {
                row.get(0)
            })
            .optional()?)
    }

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        role: &str,
        institution: &str,
        password: &[u8],
    ) -> Result<()> {
        let role_id = self.lookup_id("role", role)?;
        let institution_id = self.lookup_id("institutions", institution)?;
        self.conn.execute(
            "INSERT INTO users (username, email, password, created_at, role_id, institution_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![username, email, password, now(), role_id, institution_id],
        )?;
        Ok(())
    }

    /// Stored credentials for a login check, `None` for an unknown email.
    pub fn verify_user(&self, email: &str) -> Result<Option<Credentials>> {
        Ok(self
            .conn
            .query_row(
                "SELECT email, password FROM users WHERE email=?1",
                params![email],
                |row| {
                    Ok(Credentials {
                        email: row.get(0)?,
                        password: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn profile_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .conn
            .query_row(
                "SELECT users.id, users.username, users.email, DATE(users.created_at),
                        users.sessions, users.about, role.name, institutions.name
                 FROM users
                 JOIN role ON users.role_id=role.id
                 JOIN institutions ON users.institution_id=institutions.id
                 WHERE email=?1",
                params![email],
                |row| {
                    Ok(UserProfile {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        created_on: row.get(3)?,
                        sessions: row.get(4)?,
                        about: row.get(5)?,
                        role: row.get(6)?,
                        institution: row.get(7)?,
                    })
                },
            )
            .optional()?)
    }

    /// Rewrite the editable profile fields, keyed by email. New role or
    /// institution names are inserted on the fly.
    pub fn update_profile(
        &self,
        email: &str,
        username: &str,
        institution: &str,
        role: &str,
        about: &str,
    ) -> Result<()> {
        let role_id = self.lookup_id("role", role)?;
        let institution_id = self.lookup_id("institutions", institution)?;
        self.conn.execute(
            "UPDATE users SET username=?1, about=?2, role_id=?3, institution_id=?4 WHERE email=?5",
            params![username, about, role_id, institution_id, email],
        )?;
        Ok(())
    }

    /// Friend list of the given account; empty for an unknown email.
    pub fn friends_of(&self, email: &str) -> Result<Vec<Friend>> {
        let Some(user_id) = self.user_id(email)? else {
            log::error!("friend lookup for unknown account {email}");
            return Ok(Vec::new());
        };
        let mut stmt = self.conn.prepare(
            "SELECT users.username, users.email
             FROM friends JOIN users ON friends.friend_id=users.id
             WHERE friends.user_id=?1",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Friend {
                username: row.get(0)?,
                email: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Link `friend_email` into `email`'s friend list. The returned issues
    /// are empty on success; any issue leaves the table untouched.
    pub fn add_friend(&self, email: &str, friend_email: &str) -> Result<Vec<FriendIssue>> {
        let Some(user_id) = self.user_id(email)? else {
            return Ok(vec![FriendIssue::NoSuchUser]);
        };
        let Some(friend_id) = self.user_id(friend_email)? else {
            return Ok(vec![FriendIssue::NoSuchUser]);
        };

        let mut issues = Vec::new();
        let already: Option<i64> = self
            .conn
            .query_row(
                "SELECT friend_id FROM friends WHERE user_id=?1 AND friend_id=?2",
                params![user_id, friend_id],
                |row| row.get(0),
            )
            .optional()?;
        if already.is_some() {
            issues.push(FriendIssue::AlreadyExists);
        }
        if friend_id == user_id {
            issues.push(FriendIssue::SameUser);
        }
        if issues.is_empty() {
            self.conn.execute(
                "INSERT INTO friends (user_id, friend_id) VALUES (?1, ?2)",
                params![user_id, friend_id],
            )?;
        }
        Ok(issues)
    }

    pub fn send_message(
        &self,
        email: &str,
        friend_email: &str,
        body: &str,
    ) -> Result<Vec<FriendIssue>> {
        let Some(user_id) = self.user_id(email)? else {
            return Ok(vec![FriendIssue::NoSuchUser]);
        };
        let Some(friend_id) = self.user_id(friend_email)? else {
            return Ok(vec![FriendIssue::NoSuchUser]);
        };

        if friend_id == user_id {
            return Ok(vec![FriendIssue::SameUser]);
        }
        self.conn.execute(
            "INSERT INTO messages (from_id, to_id, message) VALUES (?1, ?2, ?3)",
            params![user_id, friend_id, body],
        )?;
        Ok(Vec::new())
    }

    /// Messages addressed to the given account, each tagged with the
    /// sender's name and email.
    pub fn inbox(&self, email: &str) -> Result<Vec<InboxMessage>> {
        let Some(user_id) = self.user_id(email)? else {
            log::error!("inbox lookup for unknown account {email}");
            return Ok(Vec::new());
        };
        let mut stmt = self.conn.prepare(
            "SELECT users.username, users.email, messages.message
             FROM messages JOIN users ON messages.from_id=users.id
             WHERE messages.to_id=?1",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(InboxMessage {
                username: row.get(0)?,
                email: row.get(1)?,
                body: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Open a new call, link the user to it and bump their session counter.
    /// Returns the call id.
    pub fn log_session_start(&self, email: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO call (start) VALUES (?1)", params![now()])?;
        let call_id = self.conn.last_insert_rowid();

        let user_id: i64 = self.conn.query_row(
            "SELECT id FROM users WHERE email=?1",
            params![email],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO sessions (call_id, user_id) VALUES (?1, ?2)",
            params![call_id, user_id],
        )?;
        self.conn.execute(
            "UPDATE users SET sessions = sessions + 1 WHERE email=?1",
            params![email],
        )?;
        Ok(call_id)
    }

    /// Append a free-form event to a call's timeline.
    pub fn log_event(&self, call_id: i64, event: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO events (call_id, event) VALUES (?1, ?2)",
            params![call_id, event],
        )?;
        Ok(())
    }
}
