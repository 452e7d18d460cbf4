use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::AppSettings;
use crate::db;
use crate::model::Identity;
use crate::store::Store;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub store: Store,
    pub session: Option<Identity>,
    pub settings: AppSettings,
}

impl AppState {
    pub fn new(store: Store, settings: AppSettings) -> Self {
        Self {
            workspace: None,
            db: None,
            store,
            session: None,
            settings,
        }
    }

    /// Opens (or creates) the workspace database. A live session is written into
    /// it; otherwise the session saved there, if any, is restored.
    pub fn open_workspace(&mut self, path: &Path) -> anyhow::Result<()> {
        let conn = db::open_db(path)?;
        match &self.session {
            Some(live) => db::session_save(&conn, live)?,
            None => self.session = db::session_load(&conn)?,
        }
        self.workspace = Some(path.to_path_buf());
        self.db = Some(conn);
        Ok(())
    }
}
