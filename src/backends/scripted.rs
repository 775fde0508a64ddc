// src/backends/scripted.rs
//! In-memory clipboard that replays a script, one step per tick

use std::collections::VecDeque;
use std::path::PathBuf;

use image::DynamicImage;

use super::ClipboardSource;
use crate::error::ClipboardError;

/// What one channel returns on a given tick
#[derive(Debug, Clone)]
pub enum Step<T> {
    Value(T),
    Empty,
    Fail(&'static str),
}

impl<T> Step<T> {
    fn into_result(self) -> Result<Option<T>, ClipboardError> {
        match self {
            Step::Value(value) => Ok(Some(value)),
            Step::Empty => Ok(None),
            Step::Fail(message) => Err(ClipboardError::Backend(message.to_string())),
        }
    }
}

/// Each channel pops one step per read; an exhausted channel reads empty.
#[derive(Debug, Default)]
pub struct ScriptedClipboard {
    pub text: VecDeque<Step<String>>,
    pub image: VecDeque<Step<DynamicImage>>,
    pub files: VecDeque<Step<Vec<PathBuf>>>,
    pub rich: bool,
    pub image_reads: usize,
    pub file_reads: usize,
}

impl ScriptedClipboard {
    pub fn new() -> Self {
        Self {
            rich: true,
            ..Self::default()
        }
    }

    pub fn texts(steps: impl IntoIterator<Item = Step<&'static str>>) -> Self {
        let mut clipboard = Self::new();
        clipboard.text = steps
            .into_iter()
            .map(|step| match step {
                Step::Value(text) => Step::Value(text.to_string()),
                Step::Empty => Step::Empty,
                Step::Fail(message) => Step::Fail(message),
            })
            .collect();
        clipboard
    }
}

impl ClipboardSource for ScriptedClipboard {
    fn name(&self) -> String {
        "scripted".to_string()
    }

    fn supports_rich_content(&self) -> bool {
        self.rich
    }

    async fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
        self.text.pop_front().unwrap_or(Step::Empty).into_result()
    }

    async fn read_image(&mut self) -> Result<Option<DynamicImage>, ClipboardError> {
        self.image_reads += 1;
        self.image.pop_front().unwrap_or(Step::Empty).into_result()
    }

    async fn read_file_list(&mut self) -> Result<Option<Vec<PathBuf>>, ClipboardError> {
        self.file_reads += 1;
        self.files.pop_front().unwrap_or(Step::Empty).into_result()
    }
}
