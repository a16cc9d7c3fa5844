use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use spider_core::model::knowledge::{KnowledgeBase, KnowledgeError};
use thiserror::Error;

/// Knowledge base bundled with the binary.
pub const SEED_KNOWLEDGE: &str = include_str!("../data/knowledge.json");

#[derive(Debug, Error)]
pub enum KnowledgeLoadError {
    #[error("failed to open knowledge base {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("knowledge base {path:?} is invalid: {source}")]
    Invalid {
        #[source]
        source: KnowledgeError,
        path: PathBuf,
    },
    #[error("embedded knowledge base is invalid: {0}")]
    Seed(#[source] KnowledgeError),
}

/// Loads `path` when given, otherwise the embedded seed.
pub fn load_knowledge(path: Option<&Path>) -> Result<KnowledgeBase, KnowledgeLoadError> {
    let Some(path) = path else {
        return KnowledgeBase::from_json(SEED_KNOWLEDGE).map_err(KnowledgeLoadError::Seed);
    };

    let file = File::open(path).map_err(|source| KnowledgeLoadError::Read {
        source,
        path: path.to_path_buf(),
    })?;
    KnowledgeBase::from_reader(BufReader::new(file)).map_err(|source| {
        KnowledgeLoadError::Invalid {
            source,
            path: path.to_path_buf(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spider_core::model::answer::Answer;
    use std::io::Write;

    #[test]
    fn seed_knowledge_is_valid_and_answers_reference_known_questions() {
        let kb = load_knowledge(None).expect("seed parses");
        assert!(kb.characters.len() >= 8);
        assert!(kb.questions.len() >= 10);
        for character in &kb.characters {
            for question_id in character.answers.keys() {
                assert!(
                    kb.question(question_id).is_some(),
                    "{} answers unknown question {}",
                    character.id,
                    question_id
                );
            }
        }
    }

    #[test]
    fn seed_characters_are_pairwise_distinguishable() {
        let kb = load_knowledge(None).expect("seed parses");
        for (i, left) in kb.characters.iter().enumerate() {
            for right in &kb.characters[i + 1..] {
                let differs = kb.questions.iter().any(|q| {
                    let (a, b) = (left.expected(&q.id), right.expected(&q.id));
                    a != b && a != Answer::Unknown && b != Answer::Unknown
                });
                assert!(differs, "{} and {} cannot be told apart", left.id, right.id);
            }
        }
    }

    #[test]
    fn loads_file_with_numeric_ids() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"questions":[{{"id":1,"text":"Is it a bird?"}}],
               "characters":[{{"id":7,"name":"Huginn","answers":{{"1":"yes"}}}}]}}"#
        )
        .expect("write knowledge");

        let kb = load_knowledge(Some(file.path())).expect("file parses");
        assert_eq!(kb.characters[0].id.as_str(), "7");
        assert_eq!(kb.characters[0].expected(&"1".into()), Answer::Yes);
    }

    #[test]
    fn reports_the_offending_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"questions":[],"characters":[]}}"#).expect("write knowledge");

        let err = load_knowledge(Some(file.path())).expect_err("empty knowledge");
        assert!(matches!(
            err,
            KnowledgeLoadError::Invalid {
                source: KnowledgeError::EmptyKnowledgeBase,
                ..
            }
        ));

        let missing = load_knowledge(Some(Path::new("does/not/exist.json")));
        assert!(matches!(missing, Err(KnowledgeLoadError::Read { .. })));
    }
}
