//! Field-map snapshots of a user's answers.

use crate::engine::script::QuestionScript;

/// Sentinel rendered for any script key the user never answered.
pub const NOT_PROVIDED: &str = "Not provided";

/// Snapshot the recorded answers over the *full* script, in script order.
///
/// Every key appears exactly once; missing answers become the sentinel.
pub fn field_map(
    script: &QuestionScript,
    answers: &[(String, String)],
) -> Vec<(String, String)> {
    script
        .keys()
        .map(|key| {
            let value = answers
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| NOT_PROVIDED.to_string());
            (key.to_string(), value)
        })
        .collect()
}

/// Deterministic `key: value` serialization of a field map, one line per
/// field. Used as the assistant's seeded report context.
pub fn context_block(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{key}: {value}\n"))
        .collect()
}

/// Look up one field, falling back to the sentinel.
pub fn field<'a>(fields: &'a [(String, String)], key: &str) -> &'a str {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or(NOT_PROVIDED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::script::medical_intake_script;

    #[test]
    fn field_map_covers_all_keys_in_order() {
        let script = medical_intake_script();
        let answers = vec![
            ("dni".to_string(), "12345678".to_string()),
            ("edad".to_string(), "34".to_string()),
        ];
        let fields = field_map(&script, &answers);

        assert_eq!(fields.len(), 8);
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            [
                "start",
                "dni",
                "edad",
                "operaciones",
                "alergias",
                "enfermedades_cronicas",
                "medicamentos_actuales",
                "finish"
            ]
        );
        assert_eq!(field(&fields, "dni"), "12345678");
        assert_eq!(field(&fields, "start"), NOT_PROVIDED);
        assert_eq!(field(&fields, "finish"), NOT_PROVIDED);
    }

    #[test]
    fn field_map_ignores_unknown_answer_keys() {
        let script = medical_intake_script();
        let answers = vec![("peso".to_string(), "80kg".to_string())];
        let fields = field_map(&script, &answers);
        assert!(fields.iter().all(|(k, _)| k != "peso"));
    }

    #[test]
    fn context_block_is_deterministic() {
        let script = medical_intake_script();
        let answers = vec![("edad".to_string(), "34".to_string())];
        let block = context_block(&field_map(&script, &answers));

        assert!(block.contains("edad: 34\n"));
        assert!(block.contains("dni: Not provided\n"));
        assert_eq!(block.lines().count(), 8);
        // Script order, not answer order.
        let dni_pos = block.find("dni:").unwrap();
        let edad_pos = block.find("edad:").unwrap();
        assert!(dni_pos < edad_pos);
    }
}
