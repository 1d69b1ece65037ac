//! The question script — the fixed, ordered intake questionnaire.

/// One scripted question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Unique key, also the state name while this question is outstanding.
    pub key: String,
    /// Prompt text sent to the user.
    pub prompt: String,
}

/// An ordered, immutable sequence of questions.
///
/// The first key is the entry state and the last the terminal state. A flow
/// starts at the first question *after* the entry and ends when the terminal
/// key is reached; the entry and terminal prompts are never answered.
#[derive(Debug, Clone)]
pub struct QuestionScript {
    questions: Vec<Question>,
}

impl QuestionScript {
    /// Build a script from ordered (key, prompt) pairs.
    ///
    /// Needs at least an entry, one question, and a terminal entry.
    pub fn new<K, P>(entries: impl IntoIterator<Item = (K, P)>) -> Self
    where
        K: Into<String>,
        P: Into<String>,
    {
        let questions: Vec<Question> = entries
            .into_iter()
            .map(|(key, prompt)| Question {
                key: key.into(),
                prompt: prompt.into(),
            })
            .collect();
        assert!(
            questions.len() >= 3,
            "a script needs an entry, a question, and a terminal entry"
        );
        Self { questions }
    }

    /// The entry key (first in order).
    pub fn entry_key(&self) -> &str {
        &self.questions[0].key
    }

    /// The terminal key (last in order).
    pub fn terminal_key(&self) -> &str {
        &self.questions[self.questions.len() - 1].key
    }

    /// The first answerable question — the one right after the entry.
    pub fn first_question(&self) -> &Question {
        &self.questions[1]
    }

    /// Whether `key` names the terminal entry.
    pub fn is_terminal(&self, key: &str) -> bool {
        key == self.terminal_key()
    }

    /// Whether the script contains `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.questions.iter().any(|q| q.key == key)
    }

    /// Prompt text for `key`, if present.
    pub fn prompt(&self, key: &str) -> Option<&str> {
        self.questions
            .iter()
            .find(|q| q.key == key)
            .map(|q| q.prompt.as_str())
    }

    /// The key following `key` in script order, if any.
    pub fn next_key(&self, key: &str) -> Option<&str> {
        let idx = self.questions.iter().position(|q| q.key == key)?;
        self.questions.get(idx + 1).map(|q| q.key.as_str())
    }

    /// All keys in script order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|q| q.key.as_str())
    }

    /// Number of entries, including entry and terminal.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// The medical-history intake script.
pub fn medical_intake_script() -> QuestionScript {
    QuestionScript::new([
        (
            "start",
            "¡Bienvenido! Vamos a empezar con tu historial médico. \
             ¿Cuál es tu nombre completo?",
        ),
        ("dni", "¿Cuál es tu DNI?"),
        ("edad", "¿Cuál es tu edad?"),
        (
            "operaciones",
            "¿Te han operado alguna vez? Si es así, ¿qué tipo de operación \
             fue y cuándo la realizaste?",
        ),
        (
            "alergias",
            "¿Tienes alguna alergia? Si es así, ¿a qué eres alérgico?",
        ),
        (
            "enfermedades_cronicas",
            "¿Padeces alguna enfermedad crónica? Si es así, ¿cuál o cuáles?",
        ),
        (
            "medicamentos_actuales",
            "¿Estás tomando algún medicamento actualmente? Si es así, ¿cuáles?",
        ),
        (
            "finish",
            "Thank you for your responses! Your review is complete.",
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medical_script_shape() {
        let script = medical_intake_script();
        assert_eq!(script.len(), 8);
        assert_eq!(script.entry_key(), "start");
        assert_eq!(script.terminal_key(), "finish");
        assert_eq!(script.first_question().key, "dni");
    }

    #[test]
    fn next_key_walks_in_order() {
        let script = medical_intake_script();
        let expected = [
            "start",
            "dni",
            "edad",
            "operaciones",
            "alergias",
            "enfermedades_cronicas",
            "medicamentos_actuales",
            "finish",
        ];
        let keys: Vec<&str> = script.keys().collect();
        assert_eq!(keys, expected);

        let mut current = script.entry_key();
        for expected_next in &expected[1..] {
            let next = script.next_key(current).unwrap();
            assert_eq!(&next, expected_next);
            current = next;
        }
        assert!(script.next_key(current).is_none());
    }

    #[test]
    fn terminal_detection() {
        let script = medical_intake_script();
        assert!(script.is_terminal("finish"));
        assert!(!script.is_terminal("dni"));
        assert_eq!(script.next_key("medicamentos_actuales"), Some("finish"));
    }

    #[test]
    fn unknown_key_lookups() {
        let script = medical_intake_script();
        assert!(!script.contains("peso"));
        assert!(script.prompt("peso").is_none());
        assert!(script.next_key("peso").is_none());
    }

    #[test]
    fn prompt_lookup() {
        let script = medical_intake_script();
        assert_eq!(script.prompt("dni"), Some("¿Cuál es tu DNI?"));
    }
}
