/// Polling station numbers carry a letter suffix when a poll is split by
/// location (`"10001A"`); only the digits identify the poll.
pub fn normalize_poll(id: &str) -> String {
    id.chars().filter(char::is_ascii_digit).collect()
}

/// `"<first name> <family name>"`.
pub fn candidate_name(first: &str, family: &str) -> String {
    format!("{} {}", first, family)
}
