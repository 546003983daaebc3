/// Lowercase `input` and strip French diacritics so that `Tâche` and `tache`
/// compare equal. Typographic apostrophes become `'`.
pub fn fold(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_lowercase)
        .map(|ch| match ch {
            'à' | 'â' | 'ä' | 'á' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' | 'í' => 'i',
            'ô' | 'ö' | 'ó' => 'o',
            'ù' | 'û' | 'ü' | 'ú' => 'u',
            'ç' => 'c',
            'ÿ' => 'y',
            '’' | '‘' => '\'',
            other => other,
        })
        .collect()
}

/// Fold and split on whitespace
pub fn folded_tokens(input: &str) -> Vec<String> {
    input.split_whitespace().map(fold).collect()
}
