//! CLI command implementations.
//!
//! | Module   | Commands handled                      |
//! |----------|---------------------------------------|
//! | `auth`   | `Login`, `Logout`                     |
//! | `board`  | `Projects`, `Board`                   |
//! | `card`   | `Add`, `Move`, `Done`, `Delete`       |
//! | `column` | `Columns` (list/add/delete/rename)    |
//! | `watch`  | `Watch`                               |

pub mod auth;
pub mod board;
pub mod card;
pub mod column;
pub mod watch;

pub use auth::{cmd_login, cmd_logout};
pub use board::{cmd_board, cmd_projects};
pub use card::{cmd_add, cmd_delete, cmd_done, cmd_move};
pub use column::cmd_columns;
pub use watch::cmd_watch;

use anyhow::{Context, Result, bail};

use lanes::config::ClientConfig;
use lanes::engine::BoardClient;
use lanes::remote::http::HttpRemote;
use lanes::settings::Settings;

/// Load the persisted settings (token, theme, font size).
pub(crate) fn load_settings() -> Result<(Settings, std::path::PathBuf)> {
    let path = Settings::default_path().context("No user config directory available")?;
    let settings = Settings::load(&path)?;
    Ok((settings, path))
}

/// An authenticated board client, or a hint to run `lanes login`.
pub(crate) fn authenticated_client(config: &ClientConfig) -> Result<BoardClient<HttpRemote>> {
    let (settings, _) = load_settings()?;
    let Some(token) = settings.token else {
        bail!("Not logged in. Run `lanes login <username>` first.");
    };
    let remote = HttpRemote::new(config, Some(token))?;
    Ok(BoardClient::new(remote))
}
