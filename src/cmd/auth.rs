//! Login/logout — `lanes login`, `lanes logout`.

use anyhow::Result;
use dialoguer::Password;

use lanes::config::ClientConfig;
use lanes::remote::http::HttpRemote;
use lanes::ui::Notice;

use super::load_settings;

pub async fn cmd_login(config: &ClientConfig, username: &str) -> Result<()> {
    let password = Password::new().with_prompt("Password").interact()?;

    let remote = HttpRemote::new(config, None)?;
    let auth = remote.login(username, &password).await?;

    let (mut settings, path) = load_settings()?;
    settings.token = Some(auth.access_token);
    settings.save(&path)?;

    Notice::success(format!("Logged in as {}", auth.user.username)).emit();
    Ok(())
}

pub fn cmd_logout() -> Result<()> {
    let (mut settings, path) = load_settings()?;
    if settings.token.take().is_none() {
        Notice::info("Already logged out.").emit();
        return Ok(());
    }
    settings.save(&path)?;
    Notice::success("Logged out.").emit();
    Ok(())
}
