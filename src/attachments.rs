//! Text file attachments.
//!
//! Self-contained module for turning raw files into text payloads that are
//! embedded in the submitted content. No coupling to the runtime or the
//! transport: the runtime only sees the final content string.

use std::fmt;
use std::path::Path;

use crate::error::ValidationError;

/// Accepted extensions, lowercase, with their kind
const ATTACHMENT_EXTENSIONS: &[(&str, AttachmentKind)] = &[
    (".csv", AttachmentKind::Csv),
    (".tsv", AttachmentKind::Tsv),
    (".txt", AttachmentKind::Text),
    (".json", AttachmentKind::Json),
    (".md", AttachmentKind::Markdown),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Csv,
    Tsv,
    Text,
    Json,
    Markdown,
}

impl AttachmentKind {
    /// Infer the kind from a file name
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        ATTACHMENT_EXTENSIONS
            .iter()
            .find(|(ext, _)| lower.ends_with(ext))
            .map(|(_, kind)| *kind)
    }

    /// Fence language used when embedding
    pub fn fence_language(&self) -> &'static str {
        match self {
            AttachmentKind::Csv => "csv",
            AttachmentKind::Tsv => "tsv",
            AttachmentKind::Text => "text",
            AttachmentKind::Json => "json",
            AttachmentKind::Markdown => "markdown",
        }
    }

    fn is_tabular(&self) -> bool {
        matches!(self, AttachmentKind::Csv | AttachmentKind::Tsv)
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fence_language())
    }
}

/// A validated attachment ready to embed.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub kind: AttachmentKind,
    /// UTF-8 text with `\n` line endings
    pub payload: String,
    /// Data rows (header excluded) for tabular files
    pub rows: Option<usize>,
    pub byte_size: usize,
}

/// Validate raw bytes and build an attachment.
pub fn prepare_attachment(
    name: &str,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<Attachment, ValidationError> {
    let kind = AttachmentKind::from_name(name).ok_or_else(|| {
        ValidationError::UnsupportedAttachment {
            name: name.to_string(),
        }
    })?;

    if bytes.len() > max_bytes {
        return Err(ValidationError::AttachmentTooLarge {
            name: name.to_string(),
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    let text = std::str::from_utf8(bytes).map_err(|e| ValidationError::UnreadableAttachment {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    let payload = normalize_line_endings(text.strip_prefix('\u{feff}').unwrap_or(text));

    if kind == AttachmentKind::Json {
        serde_json::from_str::<serde_json::Value>(&payload).map_err(|e| {
            ValidationError::UnreadableAttachment {
                name: name.to_string(),
                message: e.to_string(),
            }
        })?;
    }

    let rows = kind.is_tabular().then(|| {
        payload
            .lines()
            .filter(|line| !line.trim().is_empty())
            .count()
            .saturating_sub(1)
    });

    Ok(Attachment {
        name: name.to_string(),
        kind,
        payload,
        rows,
        byte_size: bytes.len(),
    })
}

/// Read a file from disk and build an attachment from it.
pub fn read_attachment_file(path: &Path, max_bytes: usize) -> Result<Attachment, ValidationError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    // Check the type and size before reading the whole file
    if AttachmentKind::from_name(&name).is_none() {
        return Err(ValidationError::UnsupportedAttachment { name });
    }
    let unreadable = |e: std::io::Error| ValidationError::UnreadableAttachment {
        name: name.clone(),
        message: e.to_string(),
    };
    let size = std::fs::metadata(path).map_err(unreadable)?.len() as usize;
    if size > max_bytes {
        return Err(ValidationError::AttachmentTooLarge {
            name: name.clone(),
            size,
            limit: max_bytes,
        });
    }

    let bytes = std::fs::read(path).map_err(unreadable)?;
    prepare_attachment(&name, &bytes, max_bytes)
}

/// Check if pasted text looks like a single attachable file path.
pub fn is_attachment_path(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !trimmed.contains('\n') && AttachmentKind::from_name(trimmed).is_some()
}

/// Append attachments to the user's content as fenced blocks.
pub fn embed_attachments(content: &str, attachments: &[Attachment]) -> String {
    let mut out = content.trim().to_string();
    for attachment in attachments {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&format!(
            "Attached file: {}\n```{}\n{}\n```",
            attachment.name,
            attachment.kind.fence_language(),
            attachment.payload.trim_end_matches('\n')
        ));
    }
    out
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
