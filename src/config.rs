/// External tuning loader.
///
/// Reads `tuning.toml` from the executable's directory (or CWD).
/// Falls back to the stock timings if the file is missing or incomplete.
use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct TuningConfig {
    pub timing: TimingConfig,
    pub rules: RulesConfig,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    /// Frames per framerule, the coarse clock enemies and scenes run on.
    pub framerule_frames: u8,
    /// Frames between game-time ticks.
    pub game_time_tick: u8,
    /// Frames a bumped block stays in its bounce arc.
    pub bump_cooldown: u8,
    /// Framerules a multi-coin brick keeps paying after the first hit.
    pub multi_coin_window: u8,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub hard_mode: bool,
    /// Level time budget in game-time units.
    pub game_time: u16,
    pub shell_revival: u8,
    pub shell_revival_hard: u8,
    /// How far behind the camera an entity may trail before despawning.
    pub despawn_margin: f32,
    /// Tighter margin for plants, hammerers and springs.
    pub despawn_margin_special: f32,
}

impl RulesConfig {
    pub fn shell_revival_framerules(&self) -> u8 {
        if self.hard_mode {
            self.shell_revival_hard
        } else {
            self.shell_revival
        }
    }

    /// Patrol speed for walkers and swimmers.
    pub fn walker_speed(&self) -> f32 {
        if self.hard_mode {
            0.75
        } else {
            0.5
        }
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        TuningConfig {
            timing: TimingConfig {
                framerule_frames: default_framerule_frames(),
                game_time_tick: default_game_time_tick(),
                bump_cooldown: default_bump_cooldown(),
                multi_coin_window: default_multi_coin_window(),
            },
            rules: RulesConfig {
                hard_mode: default_hard_mode(),
                game_time: default_game_time(),
                shell_revival: default_shell_revival(),
                shell_revival_hard: default_shell_revival_hard(),
                despawn_margin: default_despawn_margin(),
                despawn_margin_special: default_despawn_margin_special(),
            },
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_framerule_frames")]
    framerule_frames: u8,
    #[serde(default = "default_game_time_tick")]
    game_time_tick: u8,
    #[serde(default = "default_bump_cooldown")]
    bump_cooldown: u8,
    #[serde(default = "default_multi_coin_window")]
    multi_coin_window: u8,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_hard_mode")]
    hard_mode: bool,
    #[serde(default = "default_game_time")]
    game_time: u16,
    #[serde(default = "default_shell_revival")]
    shell_revival: u8,
    #[serde(default = "default_shell_revival_hard")]
    shell_revival_hard: u8,
    #[serde(default = "default_despawn_margin")]
    despawn_margin: f32,
    #[serde(default = "default_despawn_margin_special")]
    despawn_margin_special: f32,
}

// ── Defaults ──

fn default_framerule_frames() -> u8 { 21 }
fn default_game_time_tick() -> u8 { 24 }
fn default_bump_cooldown() -> u8 { 16 }
fn default_multi_coin_window() -> u8 { 11 }

fn default_hard_mode() -> bool { false }
fn default_game_time() -> u16 { 400 }
fn default_shell_revival() -> u8 { 16 }
fn default_shell_revival_hard() -> u8 { 11 }
fn default_despawn_margin() -> f32 { 72.0 }
fn default_despawn_margin_special() -> f32 { 16.0 }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            framerule_frames: default_framerule_frames(),
            game_time_tick: default_game_time_tick(),
            bump_cooldown: default_bump_cooldown(),
            multi_coin_window: default_multi_coin_window(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            hard_mode: default_hard_mode(),
            game_time: default_game_time(),
            shell_revival: default_shell_revival(),
            shell_revival_hard: default_shell_revival_hard(),
            despawn_margin: default_despawn_margin(),
            despawn_margin_special: default_despawn_margin_special(),
        }
    }
}

// ── Loading ──

impl TuningConfig {
    /// Load config from `tuning.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());

        TuningConfig {
            timing: TimingConfig {
                framerule_frames: toml_cfg.timing.framerule_frames,
                game_time_tick: toml_cfg.timing.game_time_tick,
                bump_cooldown: toml_cfg.timing.bump_cooldown,
                multi_coin_window: toml_cfg.timing.multi_coin_window,
            },
            rules: RulesConfig {
                hard_mode: toml_cfg.rules.hard_mode,
                game_time: toml_cfg.rules.game_time,
                shell_revival: toml_cfg.rules.shell_revival,
                shell_revival_hard: toml_cfg.rules.shell_revival_hard,
                despawn_margin: toml_cfg.rules.despawn_margin,
                despawn_margin_special: toml_cfg.rules.despawn_margin_special,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a packaged binary still finds data
        // relative to its real location.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/overworld)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/overworld");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/overworld)
    let sys = PathBuf::from("/usr/share/overworld");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for tuning.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("tuning.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: tuning.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_timings() {
        let cfg = TuningConfig::default();
        assert_eq!(cfg.timing.framerule_frames, 21);
        assert_eq!(cfg.timing.game_time_tick, 24);
        assert_eq!(cfg.rules.shell_revival_framerules(), 16);
        assert_eq!(cfg.rules.walker_speed(), 0.5);
    }

    #[test]
    fn partial_toml_keeps_the_rest_default() {
        let parsed: TomlConfig = toml::from_str(
            "[rules]\nhard_mode = true\ngame_time = 300\n",
        )
        .unwrap();

        assert!(parsed.rules.hard_mode);
        assert_eq!(parsed.rules.game_time, 300);
        assert_eq!(parsed.rules.shell_revival, 16);
        assert_eq!(parsed.timing.framerule_frames, 21);
    }
}
