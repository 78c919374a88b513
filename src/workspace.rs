use crate::classinfo;
use crate::records::RecordStore;
use crate::roster;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// A class directory: the record store plus the roster and class label read
/// from their files. Every mutation goes through disk and re-reads, so the
/// in-memory view always matches what was persisted.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    default_class_name: String,
    pub store: RecordStore,
    roster: Vec<String>,
    class_name: String,
}

impl Workspace {
    pub fn open(root: &Path, default_class_name: &str) -> anyhow::Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("failed to create workspace {}", root.to_string_lossy()))?;
        let ws = Self {
            root: root.to_path_buf(),
            default_class_name: default_class_name.to_string(),
            store: RecordStore::open(root),
            roster: roster::load_roster(root),
            class_name: classinfo::load_class_name(root, default_class_name),
        };
        tracing::info!(
            workspace = %root.display(),
            entries = ws.store.entries().len(),
            students = ws.roster.len(),
            "opened workspace"
        );
        Ok(ws)
    }

    /// Re-read every file, e.g. after a bundle restore.
    pub fn reload(&mut self) {
        self.store.reload();
        self.roster = roster::load_roster(&self.root);
        self.class_name = classinfo::load_class_name(&self.root, &self.default_class_name);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn set_roster(&mut self, names: &[String]) -> anyhow::Result<&[String]> {
        roster::save_roster(&self.root, names)?;
        self.roster = roster::load_roster(&self.root);
        Ok(&self.roster)
    }

    pub fn set_class_name(&mut self, name: &str) -> anyhow::Result<&str> {
        classinfo::save_class_name(&self.root, name)?;
        self.class_name = classinfo::load_class_name(&self.root, &self.default_class_name);
        Ok(&self.class_name)
    }
}
