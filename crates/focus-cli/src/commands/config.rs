use std::env;

use focus_core::config::SyncSettings;

use crate::cli::ConfigCommands;
use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

/// Values supplied for `config init`, from flags or from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileInput {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub auto_sync_delay_ms: Option<u64>,
    pub history_limit: Option<usize>,
}

impl ProfileInput {
    pub fn from_env() -> Self {
        Self {
            supabase_url: normalize_text_option(env::var("SUPABASE_URL").ok()),
            supabase_anon_key: normalize_text_option(env::var("SUPABASE_ANON_KEY").ok()),
            auto_sync_delay_ms: None,
            history_limit: None,
        }
    }
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            auto_sync_delay_ms,
            history_limit,
            no_activate,
        } => {
            let explicit = ProfileInput {
                supabase_url: normalize_text_option(supabase_url),
                supabase_anon_key: normalize_text_option(supabase_anon_key),
                auto_sync_delay_ms,
                history_limit,
            };
            run_config_init(global_profile, &explicit, no_activate)
        }
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    explicit: &ProfileInput,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = merge_profile(&existing_profile, explicit, &ProfileInput::from_env())?;
    *config.profile_mut_or_default(&profile_name) = merged.clone();

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let mut missing_fields = Vec::new();
    if merged.supabase_url().is_none() {
        missing_fields.push("supabase_url");
    }
    if merged.supabase_anon_key().is_none() {
        missing_fields.push("supabase_anon_key");
    }
    if missing_fields.is_empty() {
        println!(
            "Sync profile '{profile_name}' is ready. Run `focus auth login --email <email> --password <password>`."
        );
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

/// Explicit flags win over the environment, which wins over saved values.
pub fn merge_profile(
    existing: &CliProfile,
    explicit: &ProfileInput,
    environment: &ProfileInput,
) -> Result<CliProfile, CliError> {
    let mut sync = existing.sync.unwrap_or_default();
    if let Some(delay) = explicit.auto_sync_delay_ms {
        sync.auto_sync_delay_ms = delay;
    }
    if let Some(limit) = explicit.history_limit {
        sync.history_limit = limit;
    }
    let sync = if sync == SyncSettings::default() && existing.sync.is_none() {
        None
    } else {
        Some(sync)
    };

    let profile = CliProfile {
        supabase_url: explicit
            .supabase_url
            .clone()
            .or_else(|| environment.supabase_url.clone())
            .or_else(|| existing.supabase_url()),
        supabase_anon_key: explicit
            .supabase_anon_key
            .clone()
            .or_else(|| environment.supabase_anon_key.clone())
            .or_else(|| existing.supabase_anon_key()),
        sync,
    };

    profile.sync_settings().map_err(CliError::Config)?;
    if let Some(url) = profile.supabase_url() {
        if !focus_core::util::is_http_url(&url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(profile)
}
