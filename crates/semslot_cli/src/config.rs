//! Settings resolution from flags, environment and a JSON source file.

use crate::error::{CliError, CliResult};
use clap::Args;
use semslot_codec::Version;
use semslot_engine::{SecretKey, SlotConfig};
use semslot_git::{CommitAuthor, GitConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Slot location flags shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct SlotArgs {
    /// Repository URI holding the version file
    #[arg(global = true, long, env = "SEMSLOT_URI")]
    pub uri: Option<String>,

    /// Branch holding the version file [default: master]
    #[arg(global = true, long, env = "SEMSLOT_BRANCH")]
    pub branch: Option<String>,

    /// Path of the version file inside the repository
    #[arg(global = true, long, env = "SEMSLOT_FILE")]
    pub file: Option<String>,

    /// Version reported while the file does not exist [default: 0.0.0]
    #[arg(global = true, long, env = "SEMSLOT_INITIAL_VERSION")]
    pub initial_version: Option<String>,

    /// File containing an unencrypted SSH private key
    #[arg(global = true, long, env = "SEMSLOT_PRIVATE_KEY_FILE")]
    pub private_key_file: Option<PathBuf>,

    /// Directory for the local replica and provisioned key [default: system temp dir]
    #[arg(global = true, long, env = "SEMSLOT_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// JSON file with `uri`, `branch`, `file`, `initial_version`, `private_key`
    #[arg(global = true, long, env = "SEMSLOT_SOURCE")]
    pub source: Option<PathBuf>,

    /// Commit author name
    #[arg(global = true, long, env = "SEMSLOT_AUTHOR_NAME", requires = "author_email")]
    pub author_name: Option<String>,

    /// Commit author email
    #[arg(global = true, long, env = "SEMSLOT_AUTHOR_EMAIL", requires = "author_name")]
    pub author_email: Option<String>,
}

/// Settings read from a `--source` JSON file.
///
/// Unknown keys are ignored so a whole CI resource block can be passed.
#[derive(Debug, Default, Deserialize)]
pub struct SourceFile {
    /// Repository URI.
    pub uri: Option<String>,
    /// Branch.
    pub branch: Option<String>,
    /// Version file path.
    pub file: Option<String>,
    /// Initial version.
    pub initial_version: Option<String>,
    /// Inline key material.
    pub private_key: Option<String>,
}

impl SourceFile {
    /// Loads a source file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = read(path)?;
        serde_json::from_str(&text).map_err(|source| CliError::Source {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved settings.
#[derive(Debug)]
pub struct Settings {
    /// Repository URI.
    pub uri: String,
    /// Branch.
    pub branch: String,
    /// Version file path.
    pub file: String,
    /// Version reported while the file does not exist.
    pub initial_version: Version,
    /// Key material, if any.
    pub private_key: Option<SecretKey>,
    /// Base directory for the replica and key.
    pub work_dir: PathBuf,
    /// Commit author, if any.
    pub author: Option<CommitAuthor>,
}

impl Settings {
    /// Resolves settings, loading `--source` and `--private-key-file` if given.
    pub fn resolve(args: &SlotArgs) -> CliResult<Self> {
        let source = match &args.source {
            Some(path) => SourceFile::load(path)?,
            None => SourceFile::default(),
        };
        let key_file = match &args.private_key_file {
            Some(path) => Some(read(path)?),
            None => None,
        };
        Self::merge(args, source, key_file)
    }

    /// Merges flags over the source file. Flags win.
    pub fn merge(
        args: &SlotArgs,
        source: SourceFile,
        key_file: Option<String>,
    ) -> CliResult<Self> {
        let uri = args
            .uri
            .clone()
            .or(source.uri)
            .ok_or(CliError::Missing("uri"))?;
        let file = args
            .file
            .clone()
            .or(source.file)
            .ok_or(CliError::Missing("file"))?;
        let branch = args
            .branch
            .clone()
            .or(source.branch)
            .unwrap_or_else(|| "master".to_string());
        let initial_version = match args
            .initial_version
            .as_deref()
            .or(source.initial_version.as_deref())
        {
            Some(raw) => Version::parse(raw)?,
            None => Version::default(),
        };
        let private_key = key_file.or(source.private_key).map(SecretKey::new);
        let work_dir = args.work_dir.clone().unwrap_or_else(std::env::temp_dir);
        let author = match (&args.author_name, &args.author_email) {
            (Some(name), Some(email)) => Some(CommitAuthor::new(name, email)),
            _ => None,
        };

        Ok(Self {
            uri,
            branch,
            file,
            initial_version,
            private_key,
            work_dir,
            author,
        })
    }

    /// Where the provisioned key is written.
    pub fn key_path(&self) -> PathBuf {
        GitConfig::default_key_path(&self.work_dir)
    }

    /// Controller configuration.
    pub fn slot_config(&self) -> SlotConfig {
        let mut config =
            SlotConfig::new(self.file.as_str()).with_initial_version(self.initial_version.clone());
        if let Some(key) = &self.private_key {
            config = config.with_private_key(key.clone());
        }
        config
    }

    /// Git store configuration.
    pub fn git_config(&self) -> GitConfig {
        let mut config =
            GitConfig::in_dir(self.uri.as_str(), &self.work_dir).with_branch(self.branch.as_str());
        if self.private_key.is_some() {
            config = config.with_key_path(self.key_path());
        }
        if let Some(author) = &self.author {
            config = config.with_author(author.clone());
        }
        config
    }
}

fn read(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args() -> SlotArgs {
        SlotArgs {
            work_dir: Some(PathBuf::from("/tmp/semslot-test")),
            ..SlotArgs::default()
        }
    }

    #[test]
    fn source_file_supplies_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"uri":"git@example.com:org/v.git","file":"version","branch":"version",
                "initial_version":"1.0.0","private_key":"KEY","tag_filter":"ignored"}}"#
        )
        .unwrap();

        let settings = Settings::resolve(&SlotArgs {
            source: Some(file.path().to_path_buf()),
            ..args()
        })
        .unwrap();

        assert_eq!(settings.uri, "git@example.com:org/v.git");
        assert_eq!(settings.branch, "version");
        assert_eq!(settings.initial_version, Version::new(1, 0, 0));
        assert_eq!(settings.private_key.as_ref().unwrap().expose(), "KEY");

        let git = settings.git_config();
        assert_eq!(git.work_dir, PathBuf::from("/tmp/semslot-test/semslot-git-repo"));
        assert_eq!(git.key_path, Some(PathBuf::from("/tmp/semslot-test/private-key")));
    }

    #[test]
    fn flags_override_source() {
        let source = SourceFile {
            uri: Some("from-source".into()),
            file: Some("version".into()),
            branch: Some("source-branch".into()),
            ..SourceFile::default()
        };
        let settings = Settings::merge(
            &SlotArgs {
                uri: Some("from-flag".into()),
                ..args()
            },
            source,
            Some("FILE KEY".into()),
        )
        .unwrap();

        assert_eq!(settings.uri, "from-flag");
        assert_eq!(settings.branch, "source-branch");
        assert_eq!(settings.private_key.unwrap().expose(), "FILE KEY");
    }

    #[test]
    fn missing_and_invalid_settings() {
        let err = Settings::merge(&args(), SourceFile::default(), None).unwrap_err();
        assert!(matches!(err, CliError::Missing("uri")));

        let err = Settings::merge(
            &SlotArgs {
                uri: Some("repo".into()),
                file: Some("version".into()),
                initial_version: Some("one".into()),
                ..args()
            },
            SourceFile::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Codec(_)));
    }

    #[test]
    fn defaults_without_key() {
        let settings = Settings::merge(
            &SlotArgs {
                uri: Some("repo".into()),
                file: Some("version".into()),
                ..args()
            },
            SourceFile::default(),
            None,
        )
        .unwrap();

        assert_eq!(settings.branch, "master");
        assert_eq!(settings.initial_version, Version::default());
        assert!(settings.git_config().key_path.is_none());
        assert!(settings.slot_config().private_key.is_none());
    }

    #[test]
    fn malformed_source_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = SourceFile::load(file.path()).unwrap_err();
        assert!(matches!(err, CliError::Source { .. }));
    }
}
