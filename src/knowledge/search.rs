//! Keyword-overlap ranking over knowledge files.

use tracing::debug;

use super::types::KnowledgeFile;

/// Score awarded when the whole query appears in a file.
const PHRASE_SCORE: u32 = 10;

/// Query tokens of this length or shorter are ignored.
const MIN_TOKEN_LEN: usize = 2;

/// Files returned at most.
const MAX_RESULTS: usize = 3;

/// Matching sentences quoted per file at most.
const MAX_SENTENCES: usize = 3;

/// A ranked file with the excerpt quoted from it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub file_name: String,
    pub score: u32,
    pub excerpt: String,
}

/// Rank `files` against `query` and return the top excerpts.
pub fn search(query: &str, files: &[KnowledgeFile]) -> Vec<String> {
    search_hits(query, files)
        .into_iter()
        .map(|hit| hit.excerpt)
        .collect()
}

/// Like [`search`] but keeps the score and file name of every hit.
///
/// A file scores +10 when it contains the full query and +1 for each
/// whitespace-separated token longer than two characters it contains. Ties
/// keep the order of `files`.
pub fn search_hits(query: &str, files: &[KnowledgeFile]) -> Vec<SearchHit> {
    let phrase = query.trim().to_lowercase();
    if phrase.is_empty() || files.is_empty() {
        return Vec::new();
    }

    let tokens: Vec<&str> = phrase
        .split_whitespace()
        .filter(|t| t.chars().count() > MIN_TOKEN_LEN)
        .collect();

    let mut hits: Vec<SearchHit> = files
        .iter()
        .filter_map(|file| score_file(file, &phrase, &tokens))
        .collect();

    // sort_by is stable, so equal scores keep file order
    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits.truncate(MAX_RESULTS);

    debug!(query = %phrase, hits = hits.len(), "Knowledge search complete");
    hits
}

fn score_file(file: &KnowledgeFile, phrase: &str, tokens: &[&str]) -> Option<SearchHit> {
    let content = file.content.to_lowercase();

    let mut score = 0;
    if content.contains(phrase) {
        score += PHRASE_SCORE;
    }
    score += tokens.iter().filter(|t| content.contains(**t)).count() as u32;
    if score == 0 {
        return None;
    }

    let sentences: Vec<&str> = file
        .content
        .split(|c| matches!(c, '.' | '!' | '?'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let lower = s.to_lowercase();
            lower.contains(phrase) || tokens.iter().any(|t| lower.contains(*t))
        })
        .take(MAX_SENTENCES)
        .collect();

    // the phrase can straddle a sentence boundary; nothing to quote then
    if sentences.is_empty() {
        return None;
    }

    Some(SearchHit {
        file_name: file.name.clone(),
        score,
        excerpt: format!("From {}:\n{}.", file.name, sentences.join(". ")),
    })
}
