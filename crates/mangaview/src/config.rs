//! Layer `GlobalOpts` overrides on top of the active profile.
//!
//! Core never sees CLI types; it receives a finished `ReaderConfig`.

use std::time::Duration;

use secrecy::SecretString;

use mangaview_config::{Config, Profile, config_path, load_config_or_default, profile_to_reader_config};
use mangaview_core::{ReaderConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the `ReaderConfig` for `manga_id`.
///
/// Precedence: flag > env > profile > defaults. Without a matching profile
/// `--server` is mandatory.
pub fn resolve_reader_config(global: &GlobalOpts, manga_id: i64) -> Result<ReaderConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match (cfg.profiles.get(&profile_name), &global.server) {
        (Some(profile), _) => profile.clone(),
        (None, Some(_)) => Profile::default(),
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };
    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }

    let mut config = profile_to_reader_config(&profile, &profile_name, &cfg.defaults, manga_id)?;
    apply_overrides(&mut config, global);
    Ok(config)
}

fn apply_overrides(config: &mut ReaderConfig, global: &GlobalOpts) {
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = global.stream_timeout {
        config.stream_timeout = Duration::from_secs(secs);
    }
    if let Some(ref cookie) = global.session_cookie {
        config.session_cookie = Some(SecretString::from(cookie.clone()));
    }
}

/// Comma-separated profile names for diagnostics.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}
