/// TF-IDF vectorization over a small in-memory corpus
///
/// Term weights are raw term counts scaled by smoothed inverse document
/// frequency (`ln((1 + n) / (1 + df)) + 1`), L2-normalized per document so
/// cosine similarity reduces to a sparse dot product. Terms are unigrams and
/// bigrams of lowercase alphanumeric tokens, with English stop words and
/// single-character tokens removed. The vocabulary is capped by corpus
/// frequency to bound memory on noisy descriptions.
use std::collections::{HashMap, HashSet};

/// English stop words excluded from the vocabulary
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during",
    "each", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her",
    "here", "hers", "herself", "him", "himself", "his", "how", "if", "in", "into", "is", "it",
    "its", "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now",
    "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "you", "your", "yours", "yourself", "yourselves",
];

/// A sparse, L2-normalized document vector
#[derive(Debug, Clone, Default)]
pub struct SparseVector {
    /// (vocabulary index, weight) pairs sorted by index
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    fn normalized(mut entries: Vec<(usize, f32)>) -> Self {
        let norm = entries
            .iter()
            .map(|(_, weight)| weight * weight)
            .sum::<f32>()
            .sqrt();
        if norm > 0.0 {
            for entry in &mut entries {
                entry.1 /= norm;
            }
        }
        Self { entries }
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cosine similarity; both vectors are unit length so this is a merge-walk
    /// dot product.
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        let mut dot = 0.0;
        let (mut i, mut j) = (0, 0);

        while i < self.entries.len() && j < other.entries.len() {
            let (left_index, left_weight) = self.entries[i];
            let (right_index, right_weight) = other.entries[j];
            match left_index.cmp(&right_index) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += left_weight * right_weight;
                    i += 1;
                    j += 1;
                }
            }
        }

        dot
    }
}

/// TF-IDF vectorizer fitted on a fixed corpus
#[derive(Debug)]
pub struct TfidfVectorizer {
    max_features: usize,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    /// Learns the vocabulary and document frequencies from a corpus
    ///
    /// When the corpus yields more distinct terms than `max_features`, the
    /// most frequent terms across the corpus are kept, with a lexicographic
    /// tie-break for determinism.
    pub fn fit(&mut self, documents: &[&str]) {
        let mut corpus_counts: HashMap<String, u64> = HashMap::new();
        let mut doc_freq: HashMap<String, u32> = HashMap::new();

        for document in documents {
            let mut seen = HashSet::new();
            for term in terms(document) {
                *corpus_counts.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.clone()) {
                    *doc_freq.entry(term).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(String, u64)> = corpus_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        let n_docs = documents.len() as f32;
        self.vocabulary = HashMap::with_capacity(ranked.len());
        self.idf = Vec::with_capacity(ranked.len());

        for (index, (term, _)) in ranked.into_iter().enumerate() {
            let df = doc_freq.get(&term).copied().unwrap_or(0) as f32;
            self.idf.push(((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
            self.vocabulary.insert(term, index);
        }
    }

    /// Vectorizes a document against the fitted vocabulary
    ///
    /// Terms outside the vocabulary are ignored; a document with no known
    /// terms maps to the zero vector.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in terms(document) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();
        entries.sort_by_key(|(index, _)| *index);

        SparseVector::normalized(entries)
    }

    #[cfg(test)]
    fn has_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    #[cfg(test)]
    fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Unigrams plus bigrams of the filtered tokens
fn terms(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let mut terms = tokens.clone();
    for pair in tokens.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 1 && !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(documents: &[&str]) -> TfidfVectorizer {
        let mut vectorizer = TfidfVectorizer::new(1500);
        vectorizer.fit(documents);
        vectorizer
    }

    #[test]
    fn test_identical_documents_have_unit_similarity() {
        let text = "a wizard school hidden in the mountains";
        let vectorizer = fitted(&[text, "unrelated spaceship manual"]);

        let a = vectorizer.transform(text);
        let b = vectorizer.transform(text);
        assert!((a.cosine(&b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_disjoint_documents_have_zero_similarity() {
        let left = "dragons castles knights";
        let right = "spaceship orbit engine";
        let vectorizer = fitted(&[left, right]);

        assert_eq!(vectorizer.transform(left).cosine(&vectorizer.transform(right)), 0.0);
    }

    #[test]
    fn test_overlap_scores_between_zero_and_one() {
        let vectorizer = fitted(&["dragons castles knights", "dragons spaceship orbit"]);

        let similarity = vectorizer
            .transform("dragons castles knights")
            .cosine(&vectorizer.transform("dragons spaceship orbit"));
        assert!(similarity > 0.0 && similarity < 1.0);
    }

    #[test]
    fn test_stop_words_and_short_tokens_excluded() {
        let vectorizer = fitted(&["the dragon and a knight", "dragon knight"]);

        assert!(vectorizer.has_term("dragon"));
        assert!(!vectorizer.has_term("the"));
        assert!(!vectorizer.has_term("and"));
        assert!(!vectorizer.has_term("a"));
    }

    #[test]
    fn test_bigrams_included() {
        let vectorizer = fitted(&["dark tower", "dark tower"]);
        assert!(vectorizer.has_term("dark tower"));
    }

    #[test]
    fn test_vocabulary_capped_by_corpus_frequency() {
        let mut vectorizer = TfidfVectorizer::new(2);
        vectorizer.fit(&["common common common rare", "common other"]);

        assert_eq!(vectorizer.vocabulary_len(), 2);
        assert!(vectorizer.has_term("common"));
    }

    #[test]
    fn test_rare_terms_weigh_more_than_common_ones() {
        // "castle" appears in every document, "dragon" in one
        let vectorizer = fitted(&["dragon castle", "castle moat", "castle keep"]);

        let vector = vectorizer.transform("dragon castle");
        let weight_of = |term: &str| {
            let index = *vectorizer.vocabulary.get(term).unwrap();
            vector
                .entries
                .iter()
                .find(|(i, _)| *i == index)
                .map(|(_, w)| *w)
                .unwrap()
        };

        assert!(weight_of("dragon") > weight_of("castle"));
    }

    #[test]
    fn test_unknown_terms_map_to_zero_vector() {
        let vectorizer = fitted(&["dragons castles"]);
        assert!(vectorizer.transform("quantum chromodynamics").is_zero());
    }
}
