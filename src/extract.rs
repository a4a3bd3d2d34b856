//! Envelope-to-object extraction.
//!
//! Splits decoded twarc envelopes into per-kind raw object batches. Which
//! objects an envelope carries depends on the twarc task that produced the
//! file; each supported task gets its own extraction function.

use crate::model::{Envelope, ObjectBatches};

/// The twarc task that produced a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TaskType {
    /// Full-archive or recent search responses.
    #[default]
    Search,
}

impl TaskType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distribute a chunk of envelopes into per-kind object batches using the
/// task's extraction rules.
pub fn extract_objects(task: TaskType, envelopes: Vec<Envelope>, objects: &mut ObjectBatches) {
    match task {
        TaskType::Search => objects_for_search(envelopes, objects),
    }
}

/// Extraction rules for search responses: tweets come from `data` plus the
/// referenced tweets under `includes`; users, media, places, and polls come
/// from `includes`; partial errors ride along under `errors`.
pub fn objects_for_search(envelopes: Vec<Envelope>, objects: &mut ObjectBatches) {
    for envelope in envelopes {
        objects.tweets.extend(envelope.data);
        objects.tweets.extend(envelope.includes.tweets);
        objects.users.extend(envelope.includes.users);
        objects.media.extend(envelope.includes.media);
        objects.places.extend(envelope.includes.places);
        objects.polls.extend(envelope.includes.polls);
        objects.errors.extend(envelope.errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_extraction_distributes_objects() {
        let envelope: Envelope = serde_json::from_str(
            r#"{
                "data": [{"id": "1"}, {"id": "2"}],
                "includes": {
                    "users": [{"id": "100"}],
                    "tweets": [{"id": "3"}],
                    "media": [{"media_key": "m1"}]
                },
                "errors": [{"title": "Not Found Error"}],
                "meta": {"result_count": 2}
            }"#,
        )
        .unwrap();

        let mut objects = ObjectBatches::default();
        extract_objects(TaskType::Search, vec![envelope], &mut objects);

        // data and includes.tweets both land in the tweet batch
        assert_eq!(objects.tweets.len(), 3);
        assert_eq!(objects.users.len(), 1);
        assert_eq!(objects.media.len(), 1);
        assert_eq!(objects.errors.len(), 1);
        assert!(objects.places.is_empty());
        assert!(objects.polls.is_empty());
    }

    #[test]
    fn extraction_accumulates_across_envelopes() {
        let line = r#"{"data": [{"id": "1"}], "includes": {"users": [{"id": "9"}]}}"#;
        let envelopes: Vec<Envelope> = (0..3)
            .map(|_| serde_json::from_str(line).unwrap())
            .collect();

        let mut objects = ObjectBatches::default();
        extract_objects(TaskType::Search, envelopes, &mut objects);

        assert_eq!(objects.tweets.len(), 3);
        assert_eq!(objects.users.len(), 3);
    }
}
