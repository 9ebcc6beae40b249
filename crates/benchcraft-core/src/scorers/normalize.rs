/// Sentence-ending punctuation stripped from the end of fill-in answers,
/// full-width and half-width.
pub const TRAILING_PUNCTUATION: [char; 8] = ['。', '.', '，', ',', '！', '!', '？', '?'];

/// Trim, lowercase, then drop every single and double quote.
pub fn normalize(text: &str) -> String {
	text.trim().to_lowercase().replace(['"', '\''], "")
}

/// [`normalize`], then drop one trailing sentence-ending punctuation mark.
pub fn normalize_fill_in(text: &str) -> String {
	let mut normalized = normalize(text);
	if normalized.ends_with(TRAILING_PUNCTUATION) {
		normalized.pop();
	}
	normalized
}
