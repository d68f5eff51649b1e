// menusync-core/src/refresh.rs
//! Optional hook telling the menu-presenting shell to reload.
use menusync_common::config::Config;
use tracing::{debug, warn};

/// Runs the configured refresh command. Failures are only logged.
pub fn refresh_menus(config: &Config) {
    let Some((program, args)) = config
        .refresh_command
        .as_deref()
        .and_then(|argv| argv.split_first())
    else {
        return;
    };
    debug!("Refreshing menus with {} {:?}", program, args);
    match menusync_aio::run_command(program, args) {
        Ok(output) if output.status.success() => {}
        Ok(output) => warn!(
            "Menu refresh command exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(e) => warn!("Menu refresh command failed to run: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_configured_command() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("refreshed");
        let mut config = Config::with_root(dir.path());
        config.refresh_command = Some(vec![
            "touch".to_string(),
            marker.to_string_lossy().into_owned(),
        ]);
        refresh_menus(&config);
        assert!(marker.exists());
    }

    #[test]
    fn missing_command_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_root(dir.path());
        config.refresh_command = Some(vec!["/nonexistent/menusync-refresh".to_string()]);
        refresh_menus(&config);
    }
}
