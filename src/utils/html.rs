/// Sanitizes user-supplied blog or comment content before it is stored.
///
/// Whitelist based (ammonia defaults): formatting tags such as `<b>` or `<p>`
/// survive, `<script>` is dropped along with its body, and event-handler
/// attributes are stripped.
///
/// Text without any tag opener is returned as is (trimmed). A `<` that is not
/// followed by a letter, `/`, `!` or `?` never starts markup, so `Tom & Jerry:
/// 1 < 2` is stored verbatim instead of entity-escaped.
pub fn sanitize_content(input: &str) -> String {
    let input = input.trim();
    if !has_markup(input) {
        return input.to_string();
    }
    ammonia::clean(input).trim().to_string()
}

fn has_markup(input: &str) -> bool {
    input
        .as_bytes()
        .windows(2)
        .any(|w| w[0] == b'<' && (w[1].is_ascii_alphabetic() || matches!(w[1], b'/' | b'!' | b'?')))
}
