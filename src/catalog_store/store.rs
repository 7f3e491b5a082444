//! SQLite-backed catalog store implementation.
//!
//! Entities are kept as JSON documents with denormalized columns for the
//! fields that reads filter or sort on. A single write connection behind a
//! mutex is plenty for this workload; the interesting concurrency story is
//! the `INSERT OR IGNORE` upsert path, not connection parallelism.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use tracing::info;

use super::models::*;
use super::schema::CATALOG_SCHEMA;
use super::trait_def::CatalogStore;
use super::StoreError;

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

/// Build a LIKE pattern matching `needle` as a substring, with LIKE
/// metacharacters escaped. Pair with `ESCAPE '\'` in the query.
fn like_contains(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn order_clause(sort: SortKey) -> &'static str {
    // SQLite places NULLs last in a DESC order, so unscored entities sort
    // after every scored one.
    match sort {
        SortKey::Popularity => "popularity DESC, name COLLATE NOCASE ASC",
        SortKey::Name => "name COLLATE NOCASE ASC",
    }
}

impl SqliteCatalogStore {
    /// Open (creating if needed) a catalog database at the given path.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path.as_ref())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Open an in-memory catalog database. Used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CATALOG_SCHEMA)?;

        let tracks: i64 = conn.query_row("SELECT COUNT(*) FROM tracks", [], |r| r.get(0))?;
        let albums: i64 = conn.query_row("SELECT COUNT(*) FROM albums", [], |r| r.get(0))?;
        let artists: i64 = conn.query_row("SELECT COUNT(*) FROM artists", [], |r| r.get(0))?;
        info!(
            "Opened catalog store: {} tracks, {} albums, {} artists",
            tracks, albums, artists
        );

        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    fn query_docs<T: DeserializeOwned, P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<T>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
        let mut entities = Vec::new();
        for doc in rows {
            entities.push(serde_json::from_str(&doc?)?);
        }
        Ok(entities)
    }

    fn query_doc<T: DeserializeOwned, P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Option<T>, StoreError> {
        let conn = self.conn()?;
        let doc: Option<String> = conn
            .query_row(sql, params, |row| row.get(0))
            .optional()?;
        match doc {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    fn ref_ids_present(
        &self,
        table: &str,
        ref_ids: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        if ref_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let placeholders = vec!["?"; ref_ids.len()].join(",");
        let sql = format!("SELECT ref_id FROM {table} WHERE ref_id IN ({placeholders})");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ref_ids), |row| row.get::<_, String>(0))?;
        let mut present = HashSet::new();
        for ref_id in rows {
            present.insert(ref_id?);
        }
        Ok(present)
    }

    fn delete_row(&self, table: &str, id: &str) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {table} WHERE id = ?1");
        let conn = self.conn()?;
        let deleted = conn.execute(&sql, params![id])?;
        Ok(deleted > 0)
    }
}

impl CatalogStore for SqliteCatalogStore {
    // =========================================================================
    // Tracks
    // =========================================================================

    fn find_tracks(
        &self,
        filter: &TrackFilter,
        sort: SortKey,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<Track>, StoreError> {
        let order = order_clause(sort);
        match filter {
            TrackFilter::NameContains(needle) => {
                let sql = format!(
                    "SELECT doc FROM tracks WHERE name LIKE ?1 ESCAPE '\\' \
                     ORDER BY {order} LIMIT ?2 OFFSET ?3"
                );
                self.query_docs(&sql, params![like_contains(needle), limit as i64, skip as i64])
            }
            TrackFilter::AlbumRefId(ref_id) => {
                let sql = format!(
                    "SELECT doc FROM tracks WHERE album_ref_id = ?1 \
                     ORDER BY {order} LIMIT ?2 OFFSET ?3"
                );
                self.query_docs(&sql, params![ref_id, limit as i64, skip as i64])
            }
        }
    }

    fn find_track(&self, id: &str) -> Result<Option<Track>, StoreError> {
        self.query_doc("SELECT doc FROM tracks WHERE id = ?1", params![id])
    }

    fn insert_track(&self, track: &Track) -> Result<(), StoreError> {
        let doc = serde_json::to_string(track)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO tracks (id, ref_id, name, album_ref_id, popularity, doc) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                track.id,
                track.ref_id,
                track.name,
                track.album_ref_id,
                track.popularity,
                doc
            ],
        )?;
        Ok(())
    }

    fn upsert_tracks(&self, tracks: &[Track]) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO tracks (id, ref_id, name, album_ref_id, popularity, doc) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for track in tracks {
                let doc = serde_json::to_string(track)?;
                inserted += stmt.execute(params![
                    track.id,
                    track.ref_id,
                    track.name,
                    track.album_ref_id,
                    track.popularity,
                    doc
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn tracks_with_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, StoreError> {
        self.ref_ids_present("tracks", ref_ids)
    }

    fn update_track(&self, id: &str, patch: &TrackPatch) -> Result<bool, StoreError> {
        let Some(mut track) = self.find_track(id)? else {
            return Ok(false);
        };
        if let Some(name) = &patch.name {
            track.name = name.clone();
        }
        if let Some(artists) = &patch.artists {
            track.artists = artists.clone();
        }
        if let Some(release_date) = &patch.release_date {
            track.release_date = release_date.clone();
        }
        if let Some(disc_number) = patch.disc_number {
            track.disc_number = disc_number;
        }
        if let Some(track_number) = patch.track_number {
            track.track_number = track_number;
        }
        if let Some(genres) = &patch.genres {
            track.genres = genres.clone();
        }
        let doc = serde_json::to_string(&track)?;
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE tracks SET name = ?2, doc = ?3 WHERE id = ?1",
            params![id, track.name, doc],
        )?;
        Ok(updated > 0)
    }

    fn delete_track(&self, id: &str) -> Result<bool, StoreError> {
        self.delete_row("tracks", id)
    }

    // =========================================================================
    // Albums
    // =========================================================================

    fn find_albums(
        &self,
        filter: &AlbumFilter,
        sort: SortKey,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<Album>, StoreError> {
        let order = order_clause(sort);
        match filter {
            AlbumFilter::NameContains(needle) => {
                let sql = format!(
                    "SELECT doc FROM albums WHERE name LIKE ?1 ESCAPE '\\' \
                     ORDER BY {order} LIMIT ?2 OFFSET ?3"
                );
                self.query_docs(&sql, params![like_contains(needle), limit as i64, skip as i64])
            }
            AlbumFilter::ByArtistRefId(ref_id) => {
                let sql = format!(
                    "SELECT doc FROM albums WHERE EXISTS (\
                       SELECT 1 FROM json_each(albums.doc, '$.artists') \
                       WHERE json_extract(json_each.value, '$.ref_id') = ?1\
                     ) ORDER BY {order} LIMIT ?2 OFFSET ?3"
                );
                self.query_docs(&sql, params![ref_id, limit as i64, skip as i64])
            }
        }
    }

    fn find_album(&self, id: &str) -> Result<Option<Album>, StoreError> {
        self.query_doc("SELECT doc FROM albums WHERE id = ?1", params![id])
    }

    fn find_album_by_ref_id(&self, ref_id: &str) -> Result<Option<Album>, StoreError> {
        self.query_doc("SELECT doc FROM albums WHERE ref_id = ?1", params![ref_id])
    }

    fn insert_album(&self, album: &Album) -> Result<(), StoreError> {
        let doc = serde_json::to_string(album)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO albums (id, ref_id, name, popularity, doc) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![album.id, album.ref_id, album.name, album.popularity, doc],
        )?;
        Ok(())
    }

    fn upsert_albums(&self, albums: &[Album]) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO albums (id, ref_id, name, popularity, doc) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for album in albums {
                let doc = serde_json::to_string(album)?;
                inserted += stmt.execute(params![
                    album.id,
                    album.ref_id,
                    album.name,
                    album.popularity,
                    doc
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn albums_with_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, StoreError> {
        self.ref_ids_present("albums", ref_ids)
    }

    fn update_album(&self, id: &str, patch: &AlbumPatch) -> Result<bool, StoreError> {
        let Some(mut album) = self.find_album(id)? else {
            return Ok(false);
        };
        if let Some(name) = &patch.name {
            album.name = name.clone();
        }
        if let Some(artists) = &patch.artists {
            album.artists = artists.clone();
        }
        if let Some(release_date) = &patch.release_date {
            album.release_date = release_date.clone();
        }
        if let Some(total_tracks) = patch.total_tracks {
            album.total_tracks = total_tracks;
        }
        let doc = serde_json::to_string(&album)?;
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE albums SET name = ?2, doc = ?3 WHERE id = ?1",
            params![id, album.name, doc],
        )?;
        Ok(updated > 0)
    }

    fn delete_album(&self, id: &str) -> Result<bool, StoreError> {
        self.delete_row("albums", id)
    }

    // =========================================================================
    // Artists
    // =========================================================================

    fn find_artists(
        &self,
        filter: &ArtistFilter,
        sort: SortKey,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<Artist>, StoreError> {
        let order = order_clause(sort);
        match filter {
            ArtistFilter::NameContains(needle) => {
                let sql = format!(
                    "SELECT doc FROM artists WHERE name LIKE ?1 ESCAPE '\\' \
                     ORDER BY {order} LIMIT ?2 OFFSET ?3"
                );
                self.query_docs(&sql, params![like_contains(needle), limit as i64, skip as i64])
            }
        }
    }

    fn find_artist(&self, id: &str) -> Result<Option<Artist>, StoreError> {
        self.query_doc("SELECT doc FROM artists WHERE id = ?1", params![id])
    }

    fn insert_artist(&self, artist: &Artist) -> Result<(), StoreError> {
        let doc = serde_json::to_string(artist)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO artists (id, ref_id, name, popularity, doc) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![artist.id, artist.ref_id, artist.name, artist.popularity, doc],
        )?;
        Ok(())
    }

    fn upsert_artists(&self, artists: &[Artist]) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO artists (id, ref_id, name, popularity, doc) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for artist in artists {
                let doc = serde_json::to_string(artist)?;
                inserted += stmt.execute(params![
                    artist.id,
                    artist.ref_id,
                    artist.name,
                    artist.popularity,
                    doc
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn artists_with_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, StoreError> {
        self.ref_ids_present("artists", ref_ids)
    }

    fn update_artist(&self, id: &str, patch: &ArtistPatch) -> Result<bool, StoreError> {
        let Some(mut artist) = self.find_artist(id)? else {
            return Ok(false);
        };
        if let Some(name) = &patch.name {
            artist.name = name.clone();
        }
        if let Some(genres) = &patch.genres {
            artist.genres = genres.clone();
        }
        if let Some(popularity) = patch.popularity {
            artist.popularity = Some(popularity);
        }
        let doc = serde_json::to_string(&artist)?;
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE artists SET name = ?2, popularity = ?3, doc = ?4 WHERE id = ?1",
            params![id, artist.name, artist.popularity, doc],
        )?;
        Ok(updated > 0)
    }

    fn delete_artist(&self, id: &str) -> Result<bool, StoreError> {
        self.delete_row("artists", id)
    }
}
