//! Tokenizer and keyword scorer used for the keyword half of hybrid search.
//!
//! The score is a smoothed term-frequency heuristic: for each query token,
//! count document tokens that contain it or are contained by it, add
//! `ln(1 + count)`, and average over the query tokens. There is no
//! corpus-wide document-frequency term.

/// Tokens of this many characters or fewer are dropped.
const MAX_NOISE_TOKEN_LEN: usize = 2;

/// Lower-case, split on non-word characters, drop short tokens.
///
/// Word characters are alphanumerics and `_`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() > MAX_NOISE_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// Keyword relevance of `text` for `query`. Returns 0 for a query without tokens.
pub fn keyword_score(query: &str, text: &str) -> f32 {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return 0.0;
    }

    let doc_tokens = tokenize(text);
    score_tokens(&query_tokens, &doc_tokens)
}

/// Score pre-tokenized input; lets hybrid search tokenize the query once.
pub(crate) fn score_tokens(query_tokens: &[String], doc_tokens: &[String]) -> f32 {
    if query_tokens.is_empty() {
        return 0.0;
    }

    let total: f32 = query_tokens
        .iter()
        .map(|query_token| {
            let matches = doc_tokens
                .iter()
                .filter(|doc_token| {
                    doc_token.contains(query_token.as_str())
                        || query_token.contains(doc_token.as_str())
                })
                .count();
            if matches > 0 {
                (1.0 + matches as f32).ln()
            } else {
                0.0
            }
        })
        .sum();

    total / query_tokens.len() as f32
}
