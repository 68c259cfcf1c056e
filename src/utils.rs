use regex::Regex;

/// Name of the report written into the hashed directory.
pub const REPORT_FILE_NAME: &str = "SHA256.md";

/// True when `name` refers to the report file, ignoring ASCII case.
pub fn is_report_file(name: &str) -> bool {
    name.eq_ignore_ascii_case(REPORT_FILE_NAME)
}

/// Include/exclude check against a file's base name.
/// No include pattern means everything is included.
pub fn passes_filters(name: &str, include: Option<&Regex>, exclude: Option<&Regex>) -> bool {
    include.map(|r| r.is_match(name)).unwrap_or(true)
        && !exclude.map(|r| r.is_match(name)).unwrap_or(false)
}
