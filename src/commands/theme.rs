//! Show or switch the persisted theme

use anyhow::Result;

use crate::preference::ThemeMode;
use crate::Articulate;

/// Run a theme action: `show` or `toggle`
pub fn run(site: &Articulate, action: &str) -> Result<ThemeMode> {
    let theme = site.theme_preference();

    let mode = match action {
        "show" => theme.current(),
        "toggle" => theme.toggle(),
        _ => anyhow::bail!("Unknown theme action: {}. Available: show, toggle", action),
    };

    println!("{}", mode);
    Ok(mode)
}
