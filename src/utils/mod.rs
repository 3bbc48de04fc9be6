const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Format a byte count as megabytes with one decimal, e.g. `15.5MB`
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1}MB", bytes as f64 / BYTES_PER_MEGABYTE)
}

/// Split a command line on whitespace. Quoting is not supported.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}
