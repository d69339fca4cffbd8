use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::Result;

/// Displays a finished image. Only invoked when the caller asks to view the result.
pub trait Viewer {
    fn show(&self, path: &Path) -> Result<()>;
}

/// Opens images with the platform's default application.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemViewer;

impl Viewer for SystemViewer {
    fn show(&self, path: &Path) -> Result<()> {
        info!("Opening {:?} in the system viewer", path);
        let mut cmd = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", ""]);
            c
        } else {
            Command::new("xdg-open")
        };
        cmd.arg(path).spawn()?;
        Ok(())
    }
}
