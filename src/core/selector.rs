use crate::utils::error::SelectorError;

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    pub label: String,
    pub payload: T,
    folded: String,
}

impl<T> Candidate<T> {
    pub fn new(label: impl Into<String>, payload: T) -> Self {
        let label = label.into();
        let folded = label.to_lowercase();
        Self {
            label,
            payload,
            folded,
        }
    }
}

/// Emitted when a candidate becomes the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEvent<T> {
    pub index: usize,
    pub label: String,
    pub payload: T,
}

/// Lazy view over the candidates whose label contains the query,
/// case-insensitively, in original order. Cloning restarts it.
#[derive(Debug)]
pub struct Filtered<'a, T> {
    candidates: &'a [Candidate<T>],
    needle: String,
    position: usize,
}

impl<T> Clone for Filtered<'_, T> {
    fn clone(&self) -> Self {
        Self {
            candidates: self.candidates,
            needle: self.needle.clone(),
            position: 0,
        }
    }
}

impl<'a, T> Filtered<'a, T> {
    fn next_match(&mut self) -> Option<(usize, &'a Candidate<T>)> {
        while self.position < self.candidates.len() {
            let index = self.position;
            self.position += 1;
            let candidate = &self.candidates[index];
            if candidate.folded.contains(&self.needle) {
                return Some((index, candidate));
            }
        }
        None
    }
}

impl<'a, T> Iterator for Filtered<'a, T> {
    type Item = &'a Candidate<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_match().map(|(_, candidate)| candidate)
    }
}

/// Picks one entry out of a large candidate list by typed text.
///
/// Behaves the same whether driven by keystrokes (`set_query` then
/// `commit`) or programmatically (`select`).
#[derive(Debug, Clone)]
pub struct IncrementalSelector<T> {
    candidates: Vec<Candidate<T>>,
    query: String,
    current: Option<usize>,
}

impl<T> Default for IncrementalSelector<T> {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            query: String::new(),
            current: None,
        }
    }
}

impl<T: Clone + PartialEq> IncrementalSelector<T> {
    pub fn new(candidates: impl IntoIterator<Item = Candidate<T>>) -> Self {
        let mut selector = Self::default();
        selector.set_candidates(candidates);
        selector
    }

    /// Replaces every candidate and resets the active query and selection.
    pub fn set_candidates(&mut self, candidates: impl IntoIterator<Item = Candidate<T>>) {
        self.candidates = candidates.into_iter().collect();
        self.query.clear();
        self.current = None;
    }

    pub fn candidates(&self) -> &[Candidate<T>] {
        &self.candidates
    }

    pub fn filter(&self, query: &str) -> Filtered<'_, T> {
        Filtered {
            candidates: &self.candidates,
            needle: query.trim().to_lowercase(),
            position: 0,
        }
    }

    /// Records the text currently typed into the picker.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Candidates matching the active query.
    pub fn matches(&self) -> Filtered<'_, T> {
        self.filter(&self.query)
    }

    /// Resolves `query` to the best match: an exact (case-insensitive) label
    /// match wins, otherwise the first filtered candidate.
    pub fn commit(&mut self, query: &str) -> Result<SelectionEvent<T>, SelectorError> {
        let exact = query.trim().to_lowercase();
        let mut first = None;
        let mut chosen = None;

        let mut matches = self.filter(query);
        while let Some((index, candidate)) = matches.next_match() {
            if candidate.folded == exact {
                chosen = Some(index);
                break;
            }
            if first.is_none() {
                first = Some(index);
            }
        }

        let index = chosen.or(first).ok_or_else(|| SelectorError::NoMatch {
            query: query.to_string(),
        })?;
        self.query.clear();
        Ok(self.activate(index))
    }

    /// Selects the candidate carrying `payload`, bypassing text filtering.
    pub fn select(&mut self, payload: &T) -> Result<SelectionEvent<T>, SelectorError> {
        let index = self
            .candidates
            .iter()
            .position(|c| &c.payload == payload)
            .ok_or(SelectorError::NotFound)?;
        Ok(self.activate(index))
    }

    pub fn current(&self) -> Option<&Candidate<T>> {
        self.current.map(|i| &self.candidates[i])
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub(crate) fn restore(&mut self, index: Option<usize>) {
        self.current = index.filter(|&i| i < self.candidates.len());
    }

    fn activate(&mut self, index: usize) -> SelectionEvent<T> {
        self.current = Some(index);
        let candidate = &self.candidates[index];
        SelectionEvent {
            index,
            label: candidate.label.clone(),
            payload: candidate.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crs_picker() -> IncrementalSelector<u32> {
        IncrementalSelector::new(vec![
            Candidate::new("EPSG:4326 WGS 84", 4326),
            Candidate::new("EPSG:3857 Pseudo-Mercator", 3857),
            Candidate::new("EPSG:32631 WGS 84 / UTM zone 31N", 32631),
        ])
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let picker = IncrementalSelector::new(vec![
            Candidate::new("EPSG:4326 WGS 84", 4326),
            Candidate::new("EPSG:3857 Pseudo-Mercator", 3857),
        ]);
        for query in ["wgs", "WGS", "Wgs", "wGS"] {
            let hits: Vec<u32> = picker.filter(query).map(|c| c.payload).collect();
            assert_eq!(hits, vec![4326], "query {}", query);
        }
    }

    #[test]
    fn test_filter_keeps_order_and_is_restartable() {
        let picker = crs_picker();
        let filtered = picker.filter("wgs 84");
        let first: Vec<u32> = filtered.clone().map(|c| c.payload).collect();
        let again: Vec<u32> = filtered.map(|c| c.payload).collect();
        assert_eq!(first, vec![4326, 32631]);
        assert_eq!(first, again);
        assert_eq!(picker.candidates().len(), 3);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let picker = crs_picker();
        assert_eq!(picker.filter("").count(), 3);
        assert_eq!(picker.filter("   ").count(), 3);
    }

    #[test]
    fn test_commit_prefers_exact_label() {
        let mut picker = IncrementalSelector::new(vec![
            Candidate::new("WGS 84 / UTM zone 31N", 1),
            Candidate::new("WGS 84", 2),
        ]);
        let event = picker.commit("wgs 84").unwrap();
        assert_eq!(event.payload, 2);
        assert_eq!(event.index, 1);
        assert_eq!(picker.current().unwrap().payload, 2);
    }

    #[test]
    fn test_commit_falls_back_to_first_match() {
        let mut picker = crs_picker();
        let event = picker.commit("mercator").unwrap();
        assert_eq!(event.payload, 3857);
        assert_eq!(event.label, "EPSG:3857 Pseudo-Mercator");
    }

    #[test]
    fn test_commit_without_match_keeps_selection() {
        let mut picker = crs_picker();
        picker.select(&4326).unwrap();
        let err = picker.commit("lambert").unwrap_err();
        assert_eq!(
            err,
            SelectorError::NoMatch {
                query: "lambert".to_string()
            }
        );
        assert_eq!(picker.current().unwrap().payload, 4326);
    }

    #[test]
    fn test_select_by_payload() {
        let mut picker = crs_picker();
        assert_eq!(picker.select(&32631).unwrap().index, 2);
        assert_eq!(picker.select(&9999), Err(SelectorError::NotFound));
        assert_eq!(picker.current_index(), Some(2));
    }

    #[test]
    fn test_set_candidates_resets_query_and_selection() {
        let mut picker = crs_picker();
        picker.set_query("utm");
        assert_eq!(picker.matches().count(), 1);
        picker.select(&4326).unwrap();

        picker.set_candidates(vec![Candidate::new("EPSG:5703 NAVD88 height", 5703)]);
        assert_eq!(picker.query(), "");
        assert!(picker.current().is_none());
        assert_eq!(picker.matches().count(), 1);
    }
}
