//! Config subcommand handlers.

use dialoguer::{Input, Select};

use mangaview_config::{self as cfgfile, Config, Profile};
use mangaview_core::Site;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{active_profile_name, available_profiles};
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_flag<T: std::str::FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),
        ConfigCommand::Show => {
            let cfg = cfgfile::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| format!("{c:#?}"),
                |_| "config".into(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
        ConfigCommand::Set { key, value } => set(global, &key, value),
        ConfigCommand::Profiles => {
            let cfg = cfgfile::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: mangaview config init");
                return Ok(());
            }
            let mut names: Vec<_> = cfg.profiles.keys().collect();
            names.sort();
            for name in names {
                let marker = if name == default { " *" } else { "" };
                println!("{name}{marker}");
            }
            Ok(())
        }
        ConfigCommand::Use { name } => {
            let mut cfg = cfgfile::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: available_profiles(&cfg),
                });
            }
            cfg.default_profile = Some(name.clone());
            cfgfile::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
        ConfigCommand::SetCookie { profile } => {
            let cfg = cfgfile::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: available_profiles(&cfg),
                });
            }

            let cookie = rpassword::prompt_password("Session cookie: ").map_err(prompt_err)?;
            if cookie.is_empty() {
                return Err(CliError::Validation {
                    field: "session_cookie".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            cfgfile::store_session_cookie(&profile_name, &cookie)?;
            eprintln!("✓ Session cookie stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = cfgfile::config_path();
    eprintln!("mangaview configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let server: String = Input::new()
        .with_prompt("Backend URL")
        .default("http://localhost:5000/".into())
        .interact_text()
        .map_err(prompt_err)?;

    let site_choices = ["manhuaren", "copymanga", "mangabat"];
    let site_selection = Select::new()
        .with_prompt("Default search site")
        .items(&site_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let site: Site = site_choices
        .get(site_selection)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();

    let mut profile = Profile {
        server,
        site,
        ..Profile::default()
    };
    cfgfile::server_url(&profile)?;

    let cookie = rpassword::prompt_password("Session cookie (empty for none): ").map_err(prompt_err)?;
    if !cookie.is_empty() {
        let store_choices = [
            "Store in system keyring (recommended)",
            "Save to config file (plaintext)",
        ];
        let store_selection = Select::new()
            .with_prompt("Where to store the session cookie?")
            .items(&store_choices)
            .default(0)
            .interact()
            .map_err(prompt_err)?;
        if store_selection == 0 {
            cfgfile::store_session_cookie(&profile_name, &cookie)?;
            eprintln!("   ✓ Session cookie stored in system keyring");
        } else {
            profile.session_cookie = Some(cookie);
        }
    }

    let mut cfg: Config = cfgfile::load_config_or_default();
    if cfg.profiles.is_empty() {
        cfg.default_profile = Some(profile_name.clone());
    }
    cfg.profiles.insert(profile_name.clone(), profile);
    let path = cfgfile::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Profile: {profile_name}");
    eprintln!("\n  Test it: mangaview history list");
    Ok(())
}

// ── Set <key> <value> ───────────────────────────────────────────────

fn set(global: &GlobalOpts, key: &str, value: String) -> Result<(), CliError> {
    let mut cfg = cfgfile::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let profile = cfg.profiles.entry(profile_name.clone()).or_default();

    apply_key(profile, key, value)?;
    if !profile.server.is_empty() {
        cfgfile::server_url(profile)?;
    }

    cfgfile::save_config(&cfg)?;
    eprintln!("✓ Set {key} on profile '{profile_name}'");
    Ok(())
}

fn apply_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "server" => profile.server = value,
        "site" => profile.site = parse_flag("site", &value, "manhuaren, copymanga or mangabat")?,
        "public_prefix" | "public-prefix" => profile.public_prefix = Some(value),
        "storage_prefix" | "storage-prefix" => profile.storage_prefix = Some(value),
        "session_cookie" | "session-cookie" => profile.session_cookie = Some(value),
        "session_cookie_env" | "session-cookie-env" => profile.session_cookie_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_flag("insecure", &value, "'true' or 'false'")?),
        "record_history" | "record-history" => {
            profile.record_history =
                Some(parse_flag("record_history", &value, "'true' or 'false'")?);
        }
        "timeout" => profile.timeout = Some(parse_flag("timeout", &value, "a number (seconds)")?),
        "stream_timeout" | "stream-timeout" => {
            profile.stream_timeout =
                Some(parse_flag("stream_timeout", &value, "a number (seconds)")?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: server, site, public_prefix, \
                     storage_prefix, session_cookie, session_cookie_env, ca_cert, insecure, \
                     record_history, timeout, stream_timeout"
                ),
            });
        }
    }
    Ok(())
}
