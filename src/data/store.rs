use crate::data::config::{CommunityConfig, ConfigFile, GlobalConfig};
use crate::error::ModerationError;
use serenity::model::id::GuildId;
use serenity::prelude::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

pub type SharedStore = Arc<RwLock<ConfigStore>>;

/// In-memory configuration, flushed to `path` after every mutation.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    communities: BTreeMap<GuildId, CommunityConfig>,
    global: GlobalConfig,
}

impl ConfigStore {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            communities: BTreeMap::new(),
            global: GlobalConfig::default(),
        }
    }

    /// Loads the store file. A missing or unreadable file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.exists() {
            info!("No config at {}, starting empty", path.display());
            return Self::empty(path);
        }

        let file = match fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<ConfigFile>(&raw).map_err(|e| e.to_string()))
        {
            Ok(file) => file,
            Err(why) => {
                error!("Failed to parse {}: {}", path.display(), why);
                return Self::empty(path);
            }
        };

        let mut communities = BTreeMap::new();
        for (key, cfg) in file.communities {
            match key.parse::<u64>() {
                Ok(id) => {
                    communities.insert(GuildId(id), cfg);
                }
                Err(_) => warn!("Skipping config entry with non-numeric key '{}'", key),
            }
        }

        info!(
            "Loaded config for {} communities, {} blacklisted",
            communities.len(),
            file.global.blacklisted_communities.len()
        );

        Self {
            path,
            communities,
            global: file.global,
        }
    }

    /// Writes a sibling temp file and renames it over the store file.
    pub fn save(&self) -> Result<(), ModerationError> {
        let file = ConfigFile {
            global: self.global.clone(),
            communities: self
                .communities
                .iter()
                .map(|(id, cfg)| (id.0.to_string(), cfg.clone()))
                .collect(),
        };
        let raw = serde_json::to_string_pretty(&file)
            .map_err(|e| ModerationError::ConfigWriteFailure(e.to_string()))?;

        let tmp = tmp_path(&self.path);
        fs::write(&tmp, raw)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|e| ModerationError::ConfigWriteFailure(e.to_string()))
    }

    /// Saves and logs a failure instead of returning it; the mutation stays in memory.
    pub fn flush(&self) {
        if let Err(why) = self.save() {
            error!("{} ({})", why, self.path.display());
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn community(&self, id: GuildId) -> Option<&CommunityConfig> {
        self.communities.get(&id)
    }

    /// Creates the community record on first use.
    pub fn community_mut(&mut self, id: GuildId) -> &mut CommunityConfig {
        self.communities.entry(id).or_default()
    }

    pub fn communities(&self) -> impl Iterator<Item = (&GuildId, &CommunityConfig)> {
        self.communities.iter()
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut GlobalConfig {
        &mut self.global
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
