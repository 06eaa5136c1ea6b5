// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use arboard::Clipboard;
use std::time::Duration;
use tracing::debug;

/// Clipboard sink for the table. The system clipboard is opened on first
/// use so a headless session can still browse and edit.
pub struct ClipboardRuntime {
    clipboard: Option<Clipboard>,
    confirmation: Duration,
}

impl ClipboardRuntime {
    pub fn new(confirmation: Duration) -> Self {
        Self {
            clipboard: None,
            confirmation,
        }
    }

    fn clipboard(&mut self) -> Result<&mut Clipboard> {
        if self.clipboard.is_none() {
            let clipboard = Clipboard::new().context("open system clipboard")?;
            debug!("system clipboard opened");
            self.clipboard = Some(clipboard);
        }
        self.clipboard
            .as_mut()
            .context("system clipboard unavailable")
    }
}

impl nutritab_tui::AppRuntime for ClipboardRuntime {
    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        self.clipboard()?
            .set_text(text)
            .context("write rows to clipboard")
    }

    fn confirmation_window(&self) -> Duration {
        self.confirmation
    }
}
