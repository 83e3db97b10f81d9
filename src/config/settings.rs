use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::{CipherScheme, KdfParams};
use crate::errors::{LockboxError, Result};
use crate::unlock::{UnlockPolicy, WipePolicy};

/// Which KDF new vaults are created with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KdfChoice {
    #[default]
    Pbkdf2Sha256,
    Argon2id,
}

/// Project-level configuration, loaded from `.lockbox.toml`.
///
/// Every field has a sensible default so Lockbox works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Database file (relative to the project root).
    #[serde(default = "default_database")]
    pub database: String,

    /// Minimum master password length (default: 8).
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,

    /// Wrong guesses allowed before protected records are wiped (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// What a lockout wipe erases.
    #[serde(default)]
    pub wipe_policy: WipePolicy,

    /// KDF used when the master password is first set.
    #[serde(default)]
    pub kdf: KdfChoice,

    /// PBKDF2 iteration count (default: 100 000).
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Cipher for newly written values.
    #[serde(default)]
    pub cipher: CipherScheme,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_database() -> String {
    "lockbox.db".to_string()
}

fn default_min_password_len() -> usize {
    8
}

fn default_max_attempts() -> u32 {
    5
}

fn default_pbkdf2_iterations() -> u32 {
    crate::crypto::kdf::DEFAULT_PBKDF2_ITERATIONS
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: default_database(),
            min_password_len: default_min_password_len(),
            max_attempts: default_max_attempts(),
            wipe_policy: WipePolicy::default(),
            kdf: KdfChoice::default(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            cipher: CipherScheme::default(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".lockbox.toml";

    /// Load settings from `<project_dir>/.lockbox.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            LockboxError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.max_attempts == 0 {
            return Err(LockboxError::ConfigError(
                "max_attempts must be at least 1".into(),
            ));
        }

        Ok(settings)
    }

    /// Full path to the database file.
    pub fn database_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.database)
    }

    /// KDF parameters for a newly created master password.
    pub fn kdf_params(&self) -> KdfParams {
        match self.kdf {
            KdfChoice::Pbkdf2Sha256 => KdfParams::Pbkdf2Sha256 {
                iterations: self.pbkdf2_iterations,
            },
            KdfChoice::Argon2id => KdfParams::Argon2id {
                memory_kib: self.argon2_memory_kib,
                iterations: self.argon2_iterations,
                parallelism: self.argon2_parallelism,
            },
        }
    }

    /// The unlock policy constants.
    pub fn unlock_policy(&self) -> UnlockPolicy {
        UnlockPolicy {
            min_password_len: self.min_password_len,
            max_attempts: self.max_attempts,
            wipe: self.wipe_policy,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.database, "lockbox.db");
        assert_eq!(s.min_password_len, 8);
        assert_eq!(s.max_attempts, 5);
        assert_eq!(s.wipe_policy, WipePolicy::RecordsOnly);
        assert_eq!(s.cipher, CipherScheme::AesCbc);
        assert_eq!(
            s.kdf_params(),
            KdfParams::Pbkdf2Sha256 {
                iterations: 100_000
            }
        );
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.max_attempts, 5);
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
database = "data/vault.db"
min_password_len = 12
max_attempts = 3
wipe_policy = "records-and-master-secret"
kdf = "argon2id"
argon2_memory_kib = 131072
argon2_iterations = 5
argon2_parallelism = 8
cipher = "aes-gcm"
"#;
        fs::write(tmp.path().join(".lockbox.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.database, "data/vault.db");
        assert_eq!(settings.min_password_len, 12);
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.wipe_policy, WipePolicy::RecordsAndMasterSecret);
        assert_eq!(settings.cipher, CipherScheme::AesGcm);
        assert_eq!(
            settings.kdf_params(),
            KdfParams::Argon2id {
                memory_kib: 131_072,
                iterations: 5,
                parallelism: 8,
            }
        );
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".lockbox.toml"), "pbkdf2_iterations = 20000\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(
            settings.kdf_params(),
            KdfParams::Pbkdf2Sha256 { iterations: 20_000 }
        );
        assert_eq!(settings.database, "lockbox.db");
        assert_eq!(settings.max_attempts, 5);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".lockbox.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_zero_attempts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".lockbox.toml"), "max_attempts = 0\n").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn database_path_is_relative_to_project() {
        let s = Settings::default();
        assert_eq!(
            s.database_path(Path::new("/home/user/project")),
            PathBuf::from("/home/user/project/lockbox.db")
        );
    }
}
