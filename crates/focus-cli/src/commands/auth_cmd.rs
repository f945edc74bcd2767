use crate::auth::{clear_stored_session, load_stored_session, SupabaseAuthService};
use crate::cli::AuthCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);

    match command {
        AuthCommands::Login { email, password } => {
            let profile_config = config.profiles.get(&profile_name).ok_or_else(|| {
                CliError::Config(format!(
                    "Profile '{profile_name}' is not configured. Run `focus config init --profile {profile_name}` first."
                ))
            })?;
            let auth_service = SupabaseAuthService::new_for_profile(&profile_name, profile_config)
                .map_err(|error| CliError::Auth(error.to_string()))?
                .ok_or_else(|| {
                    CliError::Config(format!(
                        "Profile '{profile_name}' missing Supabase auth config. Set SUPABASE_URL and SUPABASE_ANON_KEY via `focus config init`."
                    ))
                })?;
            let session = auth_service
                .sign_in(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in profile '{profile_name}' as {email_label}");
            Ok(())
        }
        AuthCommands::Status => {
            let Some(profile) = config.profiles.get(&profile_name) else {
                println!("Profile '{profile_name}' is not configured.");
                return Ok(());
            };

            let maybe_auth_service = SupabaseAuthService::new_for_profile(&profile_name, profile)
                .map_err(|error| CliError::Auth(error.to_string()))?;
            let session = if let Some(service) = maybe_auth_service {
                service
                    .restore_session()
                    .await
                    .map_err(|error| CliError::Auth(error.to_string()))?
            } else {
                load_stored_session(&profile_name)
                    .map_err(|error| CliError::Auth(error.to_string()))?
            };

            if let Some(session) = session {
                let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                println!(
                    "Profile '{}' is signed in as {} (expires_at={})",
                    profile_name, email_label, session.expires_at
                );
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout => {
            let stored_session = load_stored_session(&profile_name)
                .map_err(|error| CliError::Auth(error.to_string()))?;
            let maybe_auth_service = match config.profiles.get(&profile_name) {
                Some(profile) => SupabaseAuthService::new_for_profile(&profile_name, profile)
                    .map_err(|error| CliError::Auth(error.to_string()))?,
                None => None,
            };

            if let (Some(service), Some(session)) = (maybe_auth_service, stored_session) {
                service
                    .sign_out(&session.access_token)
                    .await
                    .map_err(|error| CliError::Auth(error.to_string()))?;
            } else {
                clear_stored_session(&profile_name)
                    .map_err(|error| CliError::Auth(error.to_string()))?;
            }

            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}
