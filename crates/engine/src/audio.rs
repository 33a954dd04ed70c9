//! Named sound requests with a silent stub fallback for assets that are not on disk.
//!
//! The bank resolves every configured sound once at startup. Gameplay code only ever talks
//! in [`SoundId`]s; whether a request reaches a real asset or a stub is invisible to it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundId {
    Background,
    Cork,
    Drink,
    Sparkler,
    FireworkLaunch,
    FireworkBoom,
    Wind,
    Footstep,
}

impl SoundId {
    pub const fn name(self) -> &'static str {
        match self {
            SoundId::Background => "background",
            SoundId::Cork => "cork",
            SoundId::Drink => "drink",
            SoundId::Sparkler => "sparkler",
            SoundId::FireworkLaunch => "firework_launch",
            SoundId::FireworkBoom => "firework_boom",
            SoundId::Wind => "wind",
            SoundId::Footstep => "footstep",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundEntry {
    /// Relative to the assets directory.
    pub path: PathBuf,
    pub volume: f32,
    #[serde(default)]
    pub looping: bool,
}

impl SoundEntry {
    fn new(path: &str, volume: f32, looping: bool) -> Self {
        Self {
            path: PathBuf::from(path),
            volume,
            looping,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub stubs_enabled: bool,
    pub log_missing: bool,
    pub master_volume: f32,
    pub sounds: BTreeMap<SoundId, SoundEntry>,
}

impl Default for SoundConfig {
    fn default() -> Self {
        let sounds = BTreeMap::from([
            (
                SoundId::Background,
                SoundEntry::new("sounds/music/background.mp3", 0.7, true),
            ),
            (
                SoundId::Cork,
                SoundEntry::new("sounds/effects/cork-pop.mp3", 1.0, false),
            ),
            (
                SoundId::Drink,
                SoundEntry::new("sounds/effects/drinking.mp3", 0.8, false),
            ),
            (
                SoundId::Sparkler,
                SoundEntry::new("sounds/effects/sparkler-loop.mp3", 0.5, true),
            ),
            (
                SoundId::FireworkLaunch,
                SoundEntry::new("sounds/effects/firework-launch.mp3", 0.9, false),
            ),
            (
                SoundId::FireworkBoom,
                SoundEntry::new("sounds/effects/firework-boom.mp3", 1.0, false),
            ),
            (
                SoundId::Wind,
                SoundEntry::new("sounds/effects/wind-loop.mp3", 0.6, true),
            ),
            (
                SoundId::Footstep,
                SoundEntry::new("sounds/effects/footstep.mp3", 0.3, true),
            ),
        ]);
        Self {
            stubs_enabled: true,
            log_missing: true,
            master_volume: 1.0,
            sounds,
        }
    }
}

/// Background music follows the listener in first-person and plays flat in the overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicMode {
    Global,
    Positional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SoundSource {
    Asset { path: PathBuf },
    Stub,
}

#[derive(Debug, Clone)]
struct BankEntry {
    entry: SoundEntry,
    source: SoundSource,
}

#[derive(Debug)]
pub struct SoundBank {
    entries: BTreeMap<SoundId, BankEntry>,
    log_missing: bool,
    master_volume: f32,
    active_loops: BTreeSet<SoundId>,
    play_counts: BTreeMap<SoundId, u32>,
    music_mode: MusicMode,
    music_playing: bool,
}

impl SoundBank {
    pub fn load(assets_dir: &Path, config: &SoundConfig) -> Self {
        let mut entries = BTreeMap::new();
        let mut stub_count = 0usize;

        for (id, entry) in &config.sounds {
            let path = assets_dir.join(&entry.path);
            let source = if is_readable_asset(&path) {
                SoundSource::Asset { path }
            } else if config.stubs_enabled {
                if config.log_missing {
                    warn!(
                        sound = id.name(),
                        path = %path.display(),
                        "sound_asset_missing_using_stub"
                    );
                }
                stub_count += 1;
                SoundSource::Stub
            } else {
                warn!(sound = id.name(), path = %path.display(), "sound_asset_missing");
                continue;
            };
            entries.insert(
                *id,
                BankEntry {
                    entry: entry.clone(),
                    source,
                },
            );
        }

        info!(
            sound_count = entries.len(),
            stub_count,
            assets_dir = %assets_dir.display(),
            "sound_bank_loaded"
        );

        Self {
            entries,
            log_missing: config.log_missing,
            master_volume: config.master_volume.clamp(0.0, 1.0),
            active_loops: BTreeSet::new(),
            play_counts: BTreeMap::new(),
            music_mode: MusicMode::Global,
            music_playing: false,
        }
    }

    pub fn play(&mut self, id: SoundId) {
        let Some(bank_entry) = self.entries.get(&id) else {
            warn!(sound = id.name(), "sound_unknown");
            return;
        };
        let volume = bank_entry.entry.volume * self.master_volume;
        match &bank_entry.source {
            SoundSource::Asset { path } => {
                debug!(sound = id.name(), path = %path.display(), volume, "sound_play");
            }
            SoundSource::Stub => {
                if self.log_missing {
                    debug!(sound = id.name(), "sound_play_stub");
                }
            }
        }
        *self.play_counts.entry(id).or_insert(0) += 1;
    }

    /// Starting a loop that is already running is a no-op.
    pub fn play_loop(&mut self, id: SoundId) {
        if self.active_loops.contains(&id) {
            return;
        }
        let Some(bank_entry) = self.entries.get(&id) else {
            warn!(sound = id.name(), "sound_unknown");
            return;
        };
        let stub = bank_entry.source == SoundSource::Stub;
        debug!(sound = id.name(), stub, "sound_loop_start");
        self.active_loops.insert(id);
    }

    pub fn stop(&mut self, id: SoundId) {
        if self.active_loops.remove(&id) {
            debug!(sound = id.name(), "sound_loop_stop");
        }
    }

    pub fn start_music(&mut self) {
        if self.music_playing {
            return;
        }
        if !self.entries.contains_key(&SoundId::Background) {
            warn!(sound = SoundId::Background.name(), "sound_unknown");
            return;
        }
        self.music_playing = true;
        info!(mode = ?self.music_mode, "music_started");
    }

    pub fn set_music_mode(&mut self, mode: MusicMode) {
        if self.music_mode == mode {
            return;
        }
        self.music_mode = mode;
        debug!(mode = ?mode, "music_mode_changed");
    }

    pub fn music_mode(&self) -> MusicMode {
        self.music_mode
    }

    pub fn is_music_playing(&self) -> bool {
        self.music_playing
    }

    pub fn is_looping(&self, id: SoundId) -> bool {
        self.active_loops.contains(&id)
    }

    pub fn is_stub(&self, id: SoundId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|bank_entry| bank_entry.source == SoundSource::Stub)
    }

    pub fn is_known(&self, id: SoundId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn play_count(&self, id: SoundId) -> u32 {
        self.play_counts.get(&id).copied().unwrap_or(0)
    }

    pub fn stop_all(&mut self) {
        self.active_loops.clear();
        self.music_playing = false;
    }
}

fn is_readable_asset(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|metadata| metadata.is_file() && metadata.len() > 0)
}
