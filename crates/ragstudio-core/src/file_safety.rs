//! Upload safety checks: extension allow list, executable detection, and
//! filename sanitization.
//!
//! Multi-layer protection for the upload path:
//! 1. Extension allow list (before any byte is read)
//! 2. Magic byte detection for executables (on the first chunk)
//! 3. Filename sanitization (no path components, no hidden names)

use std::path::Path;

/// Magic byte signatures for executable files
pub const MAGIC_SIGNATURES: &[(&str, &[u8])] = &[
    ("Windows PE/MZ", &[0x4D, 0x5A]),           // MZ header
    ("ELF", &[0x7F, 0x45, 0x4C, 0x46]),         // Linux ELF
    ("Mach-O 32", &[0xFE, 0xED, 0xFA, 0xCE]),   // macOS 32-bit
    ("Mach-O 64", &[0xFE, 0xED, 0xFA, 0xCF]),   // macOS 64-bit
    ("Mach-O Fat", &[0xCA, 0xFE, 0xBA, 0xBE]),  // Universal binary (also Java)
    ("WebAssembly", &[0x00, 0x61, 0x73, 0x6D]), // WASM
];

/// Lowercased extension including the leading dot (`".pdf"`), or empty.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Check the filename's extension against an allow list of dotted,
/// lowercase extensions.
pub fn is_allowed_extension<S: AsRef<str>>(filename: &str, allowed: &[S]) -> bool {
    let ext = extension_of(filename);
    !ext.is_empty() && allowed.iter().any(|a| a.as_ref().eq_ignore_ascii_case(&ext))
}

/// Return the executable format name if `head` starts with a known
/// executable signature.
pub fn detect_executable(head: &[u8]) -> Option<&'static str> {
    MAGIC_SIGNATURES
        .iter()
        .find(|(_, magic)| head.len() >= magic.len() && &head[..magic.len()] == *magic)
        .map(|(name, _)| *name)
}

/// Content type derived from the filename suffix alone.
pub fn content_type_for_extension(filename: &str) -> &'static str {
    match extension_of(filename).as_str() {
        ".pdf" => "application/pdf",
        ".doc" | ".docx" => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".txt" | ".md" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Detect the content type of an upload.
///
/// Prefers magic bytes (via `infer`), then the client's declared type, then
/// the extension mapping.
pub fn detect_content_type(filename: &str, head: &[u8], declared: Option<&str>) -> String {
    if let Some(kind) = infer::get(head) {
        return kind.mime_type().to_string();
    }
    match declared {
        Some(d) if !d.trim().is_empty() => d.to_string(),
        _ => content_type_for_extension(filename).to_string(),
    }
}

/// Sanitize filename for safe storage
pub fn sanitize_filename(filename: &str) -> String {
    // Remove path components
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    // Replace dangerous characters
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // No hidden names, no "." or ".."
    let sanitized = sanitized.trim().trim_start_matches('.');
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    // Truncate if too long (preserve extension)
    if sanitized.len() > 255 {
        if let Some(dot_pos) = sanitized.rfind('.') {
            let ext = &sanitized[dot_pos..];
            if ext.len() < 255 {
                let name = truncate_on_char_boundary(&sanitized[..dot_pos], 255 - ext.len());
                return format!("{}{}", name, ext);
            }
        }
        return truncate_on_char_boundary(sanitized, 255).to_string();
    }

    sanitized.to_string()
}

fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// A document id is safe when it is already a sanitized filename.
pub fn is_safe_document_id(id: &str) -> bool {
    !id.is_empty() && sanitize_filename(id) == id
}
