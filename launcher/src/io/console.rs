//! UTF-8 console setup.
//!
//! Windows consoles default to a legacy code page, so program output with
//! non-ASCII text comes out garbled unless the code page is switched to
//! 65001. Other platforms already use UTF-8 terminals and need nothing.

use anyhow::Result;

/// Windows code page identifier for UTF-8.
pub const UTF8_CODE_PAGE: u32 = 65001;

/// Switch the attached console to UTF-8 output. No-op outside Windows.
#[cfg(windows)]
pub fn configure_utf8_console() -> Result<()> {
    use anyhow::{Context, anyhow};
    use std::process::{Command, Stdio};
    use tracing::debug;

    let status = Command::new("cmd")
        .args(["/C", "chcp", &UTF8_CODE_PAGE.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("spawn chcp")?;
    if !status.success() {
        return Err(anyhow!("chcp {UTF8_CODE_PAGE} failed with status {:?}", status.code()));
    }
    debug!(code_page = UTF8_CODE_PAGE, "console code page set");
    Ok(())
}

#[cfg(not(windows))]
pub fn configure_utf8_console() -> Result<()> {
    Ok(())
}
