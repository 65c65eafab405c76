//! Database schema and migrations for mmiv.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: accounts
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password    TEXT NOT NULL,           -- Argon2 PHC string
    rank        INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: shared id sequence for posts and comments
    r#"
CREATE TABLE global_ids (
    id  INTEGER PRIMARY KEY AUTOINCREMENT
);
"#,
    // v3: posts and comments
    r#"
CREATE TABLE posts (
    id            INTEGER PRIMARY KEY,   -- drawn from global_ids
    username      TEXT NOT NULL,
    content       TEXT NOT NULL,
    image_path    TEXT,
    created_at    TEXT NOT NULL DEFAULT (datetime('now')),
    pinned        INTEGER NOT NULL DEFAULT 0,
    locked        INTEGER NOT NULL DEFAULT 0,
    is_anonymous  INTEGER NOT NULL DEFAULT 0,
    raw_markup    INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX idx_posts_listing ON posts(pinned DESC, id DESC);

CREATE TABLE comments (
    id              INTEGER PRIMARY KEY, -- drawn from global_ids
    parent_post_id  INTEGER NOT NULL,
    username        TEXT NOT NULL,
    content         TEXT NOT NULL,
    image_path      TEXT,
    created_at      TEXT NOT NULL DEFAULT (datetime('now')),
    is_anonymous    INTEGER NOT NULL DEFAULT 0,
    raw_markup      INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX idx_comments_parent ON comments(parent_post_id, id);
"#,
    // v4: emoticons and the announcement slot
    r#"
CREATE TABLE emoticons (
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE announcements (
    id          INTEGER PRIMARY KEY CHECK (id = 1),
    content     TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
];
