//! The `sift config` command.
//!
//! Every subcommand works on the file selected by `--config` (or
//! `SIFT_CONFIG`), falling back to the platform default.

use std::path::Path;

use clap::{Args, Subcommand};
use sift_core::llm::resolve_env_var;
use sift_core::{Config, ProviderKind};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show {
        /// Print JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Print the config file location
    Path,

    /// Write the default configuration to the config file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// List providers with their model, key status and role
    Providers,
}

pub async fn execute(args: ConfigArgs, config: &Config, path: &Path) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { json } => {
            let rendered = if json {
                serde_json::to_string_pretty(config)?
            } else {
                config.to_toml()?
            };
            println!("{rendered}");
        }
        ConfigCommand::Path => {
            let state = if path.exists() { "" } else { " (not created)" };
            println!("{}{state}", path.display());
        }
        ConfigCommand::Init { force } => {
            write_default(path, force)?;
            tracing::info!(path = %path.display(), "Wrote default config");
            println!("Wrote {}", path.display());
            println!("Run `sift config providers` to see which API keys resolve.");
        }
        ConfigCommand::Providers => {
            for status in ProviderKind::ALL.map(|kind| ProviderStatus::of(config, kind)) {
                println!("{status}");
            }
        }
    }
    Ok(())
}

/// Write `Config::default()` to `path`, creating parent directories.
fn write_default(path: &Path, force: bool) -> anyhow::Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "{} already exists (pass --force to replace it)",
        path.display()
    );
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    Ok(())
}

/// One row of `sift config providers`.
#[derive(Debug, PartialEq, Eq)]
struct ProviderStatus {
    kind: ProviderKind,
    model: String,
    key_resolves: bool,
    served: bool,
    enriches: bool,
}

impl ProviderStatus {
    fn of(config: &Config, kind: ProviderKind) -> Self {
        let llm = &config.llm;
        let (api_key, model) = match kind {
            ProviderKind::Gemini => {
                let cfg = llm.gemini.clone().unwrap_or_default();
                (cfg.api_key, cfg.model)
            }
            ProviderKind::Groq => {
                let cfg = llm.groq.clone().unwrap_or_default();
                (cfg.api_key, cfg.model)
            }
            ProviderKind::Openai => {
                let cfg = llm.openai.clone().unwrap_or_default();
                (cfg.api_key, cfg.model)
            }
        };
        let named = |name: &str| ProviderKind::parse(name).is_ok_and(|k| k == kind);

        Self {
            kind,
            model,
            key_resolves: resolve_env_var(&api_key).is_some(),
            served: config.server.providers.iter().any(|p| named(p)),
            enriches: named(&config.batch.provider),
        }
    }
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.key_resolves {
            "key set".to_string()
        } else {
            format!("{} unset", self.kind.key_var())
        };
        let mut roles = Vec::new();
        if self.served {
            roles.push("serve");
        }
        if self.enriches {
            roles.push("enrich");
        }
        let roles = if roles.is_empty() { "-".to_string() } else { roles.join(",") };
        write!(f, "{:<8} {:<32} {:<24} {roles}", self.kind.as_str(), self.model, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::config::{GroqConfig, OpenAiConfig};

    #[test]
    fn test_write_default_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default(&path, false).unwrap();
        let written = Config::load_from(&path).unwrap();
        assert_eq!(written.batch.chunk_size, Config::default().batch.chunk_size);

        std::fs::write(&path, "[batch]\nchunk_size = 7\n").unwrap();
        assert!(write_default(&path, false).is_err());
        assert_eq!(Config::load_from(&path).unwrap().batch.chunk_size, 7);

        write_default(&path, true).unwrap();
        assert_eq!(
            Config::load_from(&path).unwrap().batch.chunk_size,
            Config::default().batch.chunk_size
        );
    }

    #[test]
    fn test_provider_status_reports_key_and_roles() {
        let mut config = Config::default();
        config.server.providers = vec!["Groq".to_string(), "openai".to_string()];
        config.batch.provider = "groq".to_string();
        config.llm.groq = Some(GroqConfig {
            api_key: "literal-key".to_string(),
            model: "llama-test".to_string(),
            ..Default::default()
        });
        config.llm.openai = Some(OpenAiConfig {
            api_key: String::new(),
            ..Default::default()
        });

        let groq = ProviderStatus::of(&config, ProviderKind::Groq);
        assert!(groq.key_resolves && groq.served && groq.enriches);
        assert_eq!(groq.model, "llama-test");
        assert!(groq.to_string().ends_with("serve,enrich"));

        let openai = ProviderStatus::of(&config, ProviderKind::Openai);
        assert!(!openai.key_resolves);
        assert!(openai.served && !openai.enriches);
        assert!(openai.to_string().contains("OPENAI_API_KEY unset"));

        let gemini = ProviderStatus::of(&config, ProviderKind::Gemini);
        assert!(!gemini.served && !gemini.enriches);
        assert!(gemini.to_string().ends_with(" -"));
    }
}
