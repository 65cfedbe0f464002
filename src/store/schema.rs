pub const SCHEMA: &str = r#"
-- Back-office accounts; never hard-deleted, only deactivated
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    nickname TEXT,
    role TEXT NOT NULL CHECK (role IN ('admin', 'manager')),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Bearer tokens; only the argon2 hash of the secret is stored
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,
    token_lookup TEXT NOT NULL UNIQUE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,
    last_used_at TEXT
);

CREATE TABLE IF NOT EXISTS people (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    last_name TEXT NOT NULL,
    first_name TEXT NOT NULL,
    middle_name TEXT,
    email TEXT NOT NULL,
    phone TEXT,
    marketing_expenses REAL,
    advance_expenses REAL,
    is_approved INTEGER NOT NULL DEFAULT 0,
    created_by_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS artists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    isni TEXT,
    marketing_expenses REAL,
    advance_expenses REAL,
    is_approved INTEGER NOT NULL DEFAULT 0,
    created_by_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS artist_members (
    artist_id INTEGER NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
    person_id INTEGER NOT NULL REFERENCES people(id) ON DELETE CASCADE,
    PRIMARY KEY (artist_id, person_id)
);

CREATE TABLE IF NOT EXISTS albums (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    album_type TEXT NOT NULL,
    release_date TEXT,
    upc TEXT,
    isrc TEXT,
    marketing_budget REAL,
    advance REAL,
    aggregator TEXT,
    version TEXT,
    subgenre TEXT,
    yoga TEXT,
    zaycev TEXT,
    additional_sites TEXT,
    zaycev_star TEXT,
    synclab_star TEXT,
    is_approved INTEGER NOT NULL DEFAULT 0,
    created_by_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS album_artists (
    album_id INTEGER NOT NULL REFERENCES albums(id) ON DELETE CASCADE,
    artist_id INTEGER NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
    PRIMARY KEY (album_id, artist_id)
);

-- Albums owning tracks cannot be deleted (no cascade on album_id)
CREATE TABLE IF NOT EXISTS tracks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    album_id INTEGER NOT NULL REFERENCES albums(id),
    title TEXT NOT NULL,
    isrc TEXT,
    genre TEXT,
    music_authors TEXT,
    lyrics_authors TEXT,
    copyright TEXT,
    related_rights TEXT,
    label_share_percentage REAL NOT NULL DEFAULT 20.0,
    scope_of_copyright REAL,
    scope_of_related_rights REAL,
    neighboring_rights_share REAL,
    label_rights_share REAL,
    label_monetization_share REAL,
    marketing_expenses REAL,
    advance_expenses REAL,
    is_ringtone_added INTEGER NOT NULL DEFAULT 0,
    has_video_clip INTEGER NOT NULL DEFAULT 0,
    is_lyrics_added INTEGER NOT NULL DEFAULT 0,
    is_karaoke_sync_added INTEGER NOT NULL DEFAULT 0,
    is_approved INTEGER NOT NULL DEFAULT 0,
    created_by_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS track_artists (
    track_id INTEGER NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
    artist_id INTEGER NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
    PRIMARY KEY (track_id, artist_id)
);

-- At most one share row per (track, person)
CREATE TABLE IF NOT EXISTS track_shares (
    track_id INTEGER NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
    person_id INTEGER NOT NULL REFERENCES people(id) ON DELETE CASCADE,
    share_of_monetization_of_copyrights REAL NOT NULL DEFAULT 0
        CHECK (share_of_monetization_of_copyrights BETWEEN 0 AND 100),
    copyrights REAL NOT NULL DEFAULT 0
        CHECK (copyrights BETWEEN 0 AND 100),
    share_of_monetization_of_related_rights REAL NOT NULL DEFAULT 0
        CHECK (share_of_monetization_of_related_rights BETWEEN 0 AND 100),
    related_rights REAL NOT NULL DEFAULT 0
        CHECK (related_rights BETWEEN 0 AND 100),
    PRIMARY KEY (track_id, person_id)
);

CREATE TABLE IF NOT EXISTS excel_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    original_name TEXT NOT NULL,
    upload_date TEXT DEFAULT (datetime('now')),
    upload_status TEXT NOT NULL,
    description TEXT,
    uploaded_by_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS raw_usage_rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id INTEGER NOT NULL REFERENCES excel_reports(id) ON DELETE CASCADE,
    row_index INTEGER NOT NULL,
    period TEXT,
    platform TEXT,
    right_type TEXT,
    territory TEXT,
    content_type TEXT,
    usage_type TEXT,
    performer_name TEXT,
    track_title TEXT,
    album_title TEXT,
    author_words_name TEXT,
    author_music_name TEXT,
    licensor_share_author_percent TEXT NOT NULL DEFAULT '0',
    licensor_share_neighboring_percent TEXT NOT NULL DEFAULT '0',
    isrc TEXT,
    upc TEXT,
    copyright TEXT,
    quantity INTEGER NOT NULL DEFAULT 0,
    total_royalty_author TEXT NOT NULL DEFAULT '0',
    total_royalty_neighboring TEXT NOT NULL DEFAULT '0',
    licensor_share_author_licensor_percent TEXT NOT NULL DEFAULT '0',
    licensor_share_neighboring_licensor_percent TEXT NOT NULL DEFAULT '0',
    calculated_royalty_author TEXT NOT NULL DEFAULT '0',
    calculated_royalty_neighboring TEXT NOT NULL DEFAULT '0',
    calculated_total_royalty TEXT NOT NULL DEFAULT '0',
    processed_status TEXT NOT NULL DEFAULT 'pending'
);

-- Natural keys are unique among approved rows only; drafts may collide
CREATE UNIQUE INDEX IF NOT EXISTS idx_people_email_approved
    ON people(email) WHERE is_approved = 1;
CREATE UNIQUE INDEX IF NOT EXISTS idx_artists_isni_approved
    ON artists(isni) WHERE is_approved = 1;
CREATE UNIQUE INDEX IF NOT EXISTS idx_albums_upc_approved
    ON albums(upc) WHERE is_approved = 1;
CREATE UNIQUE INDEX IF NOT EXISTS idx_albums_isrc_approved
    ON albums(isrc) WHERE is_approved = 1;
CREATE UNIQUE INDEX IF NOT EXISTS idx_tracks_isrc_approved
    ON tracks(isrc) WHERE is_approved = 1;

CREATE INDEX IF NOT EXISTS idx_tokens_user ON tokens(user_id);
CREATE INDEX IF NOT EXISTS idx_people_approved ON people(is_approved);
CREATE INDEX IF NOT EXISTS idx_artists_approved ON artists(is_approved);
CREATE INDEX IF NOT EXISTS idx_albums_approved ON albums(is_approved);
CREATE INDEX IF NOT EXISTS idx_tracks_approved ON tracks(is_approved);
CREATE INDEX IF NOT EXISTS idx_tracks_album ON tracks(album_id);
CREATE INDEX IF NOT EXISTS idx_artist_members_person ON artist_members(person_id);
CREATE INDEX IF NOT EXISTS idx_album_artists_artist ON album_artists(artist_id);
CREATE INDEX IF NOT EXISTS idx_track_artists_artist ON track_artists(artist_id);
CREATE INDEX IF NOT EXISTS idx_track_shares_person ON track_shares(person_id);
CREATE INDEX IF NOT EXISTS idx_raw_usage_rows_report ON raw_usage_rows(report_id, id);
"#;
