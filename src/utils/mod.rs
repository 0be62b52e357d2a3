use crate::file_transfer::DirectoryEntry;

/// Format a byte count in human-readable form
pub fn format_size(size: u64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < units.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, units[unit_index])
    } else {
        format!("{:.2} {}", size, units[unit_index])
    }
}

/// One line of `ls` output: directories get a trailing slash, files their size
pub fn format_entry(entry: &DirectoryEntry) -> String {
    if entry.is_directory() {
        return format!("{:>12}  {}/", "-", entry.name);
    }
    let size = entry.size.map(format_size).unwrap_or_else(|| "-".to_string());
    format!("{:>12}  {}", size, entry.name)
}
