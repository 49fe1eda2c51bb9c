// src/naming.rs
//
// Output file naming and human-readable size formatting.

use crate::options::OutputFormat;

/// Generate the output file name for one queued image.
///
/// With a non-empty prefix the name is `{prefix}{1-based index}.{ext}`.
/// Without a prefix the original extension is stripped and the new one appended.
/// The extension comes from [`OutputFormat::extension`] (`jpeg` -> `jpg`).
pub fn generate_file_name(
    original_name: &str,
    index: usize,
    format: OutputFormat,
    prefix: &str,
) -> String {
    let extension = format.extension();
    if prefix.is_empty() {
        format!("{}.{extension}", strip_extension(original_name))
    } else {
        format!("{prefix}{}.{extension}", index + 1)
    }
}

/// Strip the final `.suffix` from a file name, if present. The suffix must be
/// non-empty, so a trailing dot is kept; a dotfile like `.bashrc` strips to
/// the empty string.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => &name[..pos],
        _ => name,
    }
}

/// Format a byte count as a short human-readable string.
pub fn format_file_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

/// Compression savings as a percentage of the original size, one decimal place.
/// Returns None when the converted file is larger or the original size is zero.
pub fn calculate_savings(original: u64, converted: u64) -> Option<f64> {
    if original == 0 || converted > original {
        return None;
    }
    let savings = (original - converted) as f64 / original as f64 * 100.0;
    Some((savings * 10.0).round() / 10.0)
}

/// Coarse quality label matching the settings UI bands.
pub fn quality_label(value: u8) -> &'static str {
    if value < 25 {
        "Low"
    } else if value < 50 {
        "Medium"
    } else if value < 75 {
        "Good"
    } else {
        "Best"
    }
}

/// Coarse resize label matching the settings UI bands.
pub fn resize_label(value: u8) -> String {
    if value == 100 {
        "Original".to_string()
    } else if value < 50 {
        format!("{value}% (Small)")
    } else if value < 80 {
        format!("{value}% (Medium)")
    } else {
        format!("{value}% (Large)")
    }
}
