// src/backends/helper.rs
//! Image and file reads through an external clipboard helper
//!
//! The helper is asked which MIME types the clipboard offers, then for the
//! bytes of the one we want. Each invocation is bounded by a timeout; a
//! helper that hangs is killed and the read counts as failed.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use image::DynamicImage;
use tokio::process::Command;
use tracing::{debug, trace};

use super::native::NativeClipboard;
use super::ClipboardSource;
use crate::error::ClipboardError;

const URI_LIST: &str = "text/uri-list";
const GNOME_COPIED_FILES: &str = "x-special/gnome-copied-files";

/// Supported helper programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HelperProgram {
    /// `xclip`, for X11 sessions
    Xclip,
    /// `wl-paste` from wl-clipboard, for Wayland sessions
    WlPaste,
}

impl HelperProgram {
    /// Pick the helper matching the running display server
    pub fn detect() -> Self {
        if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            HelperProgram::WlPaste
        } else {
            HelperProgram::Xclip
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            HelperProgram::Xclip => "xclip",
            HelperProgram::WlPaste => "wl-paste",
        }
    }

    fn list_types_args(&self) -> Vec<String> {
        match self {
            HelperProgram::Xclip => ["-selection", "clipboard", "-t", "TARGETS", "-o"]
                .map(String::from)
                .to_vec(),
            HelperProgram::WlPaste => vec!["--list-types".to_string()],
        }
    }

    fn read_args(&self, mime: &str) -> Vec<String> {
        match self {
            HelperProgram::Xclip => vec![
                "-selection".into(),
                "clipboard".into(),
                "-t".into(),
                mime.into(),
                "-o".into(),
            ],
            HelperProgram::WlPaste => vec!["--no-newline".into(), "--type".into(), mime.into()],
        }
    }

    /// Whether a failed invocation just means the clipboard is empty
    fn is_empty_clipboard(&self, stderr: &str) -> bool {
        let stderr = stderr.to_ascii_lowercase();
        match self {
            HelperProgram::Xclip => stderr.contains("not available"),
            HelperProgram::WlPaste => {
                stderr.contains("nothing is copied") || stderr.contains("no selection")
            }
        }
    }
}

/// Text through the OS bindings; images and files through a helper program
#[derive(Debug)]
pub struct HelperClipboard {
    text: NativeClipboard,
    helper: HelperProgram,
    timeout: Duration,
    image_types: Vec<String>,
}

impl HelperClipboard {
    pub fn new(helper: HelperProgram, timeout: Duration, image_types: Vec<String>) -> Self {
        Self {
            text: NativeClipboard::new(),
            helper,
            timeout,
            image_types,
        }
    }

    /// Run the helper and collect stdout. `Ok(None)` when the helper reports
    /// an empty clipboard.
    async fn run(&self, args: &[String]) -> Result<Option<Vec<u8>>, ClipboardError> {
        let program = self.helper.program();
        trace!("Running {} {:?}", program, args);

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ClipboardError::HelperTimeout {
                program: program.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|source| ClipboardError::HelperSpawn {
                program: program.to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(Some(output.stdout));
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if self.helper.is_empty_clipboard(&stderr) {
            return Ok(None);
        }
        Err(ClipboardError::HelperFailed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr,
        })
    }

    async fn offered_types(&self) -> Result<Vec<String>, ClipboardError> {
        let Some(stdout) = self.run(&self.helper.list_types_args()).await? else {
            return Ok(Vec::new());
        };
        let types = parse_type_list(&String::from_utf8_lossy(&stdout));
        debug!("Clipboard offers {:?}", types);
        Ok(types)
    }

    async fn read_mime(&self, mime: &str) -> Result<Option<Vec<u8>>, ClipboardError> {
        self.run(&self.helper.read_args(mime)).await
    }
}

impl ClipboardSource for HelperClipboard {
    fn name(&self) -> String {
        format!("helper ({})", self.helper.program())
    }

    async fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
        self.text.get_text()
    }

    async fn read_image(&mut self) -> Result<Option<DynamicImage>, ClipboardError> {
        let offered = self.offered_types().await?;
        let Some(mime) = pick_image_type(&self.image_types, &offered) else {
            return Ok(None);
        };

        match self.read_mime(&mime).await? {
            Some(bytes) if !bytes.is_empty() => Ok(Some(image::load_from_memory(&bytes)?)),
            _ => Ok(None),
        }
    }

    async fn read_file_list(&mut self) -> Result<Option<Vec<PathBuf>>, ClipboardError> {
        let offered = self.offered_types().await?;

        let (mime, skip_action_line) = if offered.iter().any(|t| t == URI_LIST) {
            (URI_LIST, false)
        } else if offered.iter().any(|t| t == GNOME_COPIED_FILES) {
            (GNOME_COPIED_FILES, true)
        } else {
            return Ok(None);
        };

        let Some(bytes) = self.read_mime(mime).await? else {
            return Ok(None);
        };
        let text = String::from_utf8_lossy(&bytes);
        let body = if skip_action_line {
            // first line is "copy" or "cut"
            text.split_once('\n').map(|(_, rest)| rest).unwrap_or("")
        } else {
            &*text
        };

        let paths = parse_uri_list(body);
        Ok((!paths.is_empty()).then_some(paths))
    }
}

/// One MIME type per line, as printed by `xclip -t TARGETS` and
/// `wl-paste --list-types`
pub fn parse_type_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// First configured image type the clipboard offers, in configured order
pub fn pick_image_type(supported: &[String], offered: &[String]) -> Option<String> {
    supported
        .iter()
        .find(|mime| offered.iter().any(|t| t.eq_ignore_ascii_case(mime)))
        .cloned()
}

/// Local paths from a `text/uri-list` body. Comments and non-`file` URIs
/// are skipped; percent-escapes are decoded.
pub fn parse_uri_list(body: &str) -> Vec<PathBuf> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(file_uri_to_path)
        .collect()
}

fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    let rest = uri.strip_prefix("file://")?;
    // file://host/path -> /path
    let path = match rest.find('/') {
        Some(0) => rest,
        Some(idx) => &rest[idx..],
        None => return None,
    };
    let decoded = urlencoding::decode(path).ok()?;
    Some(PathBuf::from(decoded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_type_list() {
        let output = "TARGETS\nimage/png\n\n  text/uri-list \n";
        assert_eq!(parse_type_list(output), vec!["TARGETS", "image/png", "text/uri-list"]);
    }

    #[test]
    fn test_pick_image_type_follows_configured_order() {
        let supported = vec!["image/png".to_string(), "image/bmp".to_string()];
        let offered = vec!["image/bmp".to_string(), "image/png".to_string()];
        assert_eq!(pick_image_type(&supported, &offered).as_deref(), Some("image/png"));

        let only_jpeg = vec!["image/jpeg".to_string()];
        assert_eq!(pick_image_type(&supported, &only_jpeg), None);
    }

    #[test]
    fn test_parse_uri_list() {
        let body = "# copied by a file manager\r\n\
                    file:///home/me/My%20Photos/cat.png\r\n\
                    https://example.com/x\r\n\
                    file://localhost/tmp/a%23b.txt\n";
        assert_eq!(
            parse_uri_list(body),
            vec![
                PathBuf::from("/home/me/My Photos/cat.png"),
                PathBuf::from("/tmp/a#b.txt"),
            ]
        );
    }

    #[test]
    fn test_empty_clipboard_messages() {
        assert!(HelperProgram::WlPaste.is_empty_clipboard("Nothing is copied"));
        assert!(HelperProgram::Xclip
            .is_empty_clipboard("Error: target TARGETS not available"));
        assert!(!HelperProgram::Xclip.is_empty_clipboard("Error: Can't open display"));
    }

    #[test]
    fn test_helper_args() {
        assert_eq!(
            HelperProgram::WlPaste.read_args("image/png"),
            vec!["--no-newline", "--type", "image/png"]
        );
        assert_eq!(HelperProgram::Xclip.list_types_args()[3], "TARGETS");
    }

    #[tokio::test]
    async fn test_missing_helper_is_a_read_error() {
        let helper = HelperClipboard {
            text: NativeClipboard::new(),
            helper: HelperProgram::Xclip,
            timeout: Duration::from_secs(1),
            image_types: vec!["image/png".into()],
        };
        // Only meaningful where xclip is absent; either way it must not panic
        match helper.run(&["-version".to_string()]).await {
            Ok(_) => {}
            Err(err) => assert!(matches!(
                err,
                ClipboardError::HelperSpawn { .. }
                    | ClipboardError::HelperFailed { .. }
                    | ClipboardError::HelperTimeout { .. }
            )),
        }
    }
}
