use super::env::Env;
use super::parser::ast::{Quote, Word};

/// Run variable expansion over a command's argv.
///
/// `$NAME` is replaced from the environment (empty when unset) and `$?`
/// expands to the last exit status. Single-quoted words are passed through
/// verbatim. Words that expand away entirely are dropped; words that were
/// empty to begin with (quoted empties) are kept. An argv that expands to
/// nothing signals "nothing to run" to the caller.
pub fn expand_argv(argv: &[Word], last_status: i32, env: &Env) -> Vec<String> {
    argv.iter()
        .filter_map(|word| {
            if word.quote == Quote::Single {
                return Some(word.text.clone());
            }
            let expanded = expand_word(&word.text, last_status, env);
            if expanded.is_empty() && !word.text.is_empty() {
                None
            } else {
                Some(expanded)
            }
        })
        .collect()
}

fn expand_word(input: &str, last_status: i32, env: &Env) -> String {
    let mut result = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('?') => {
                chars.next();
                result.push_str(&last_status.to_string());
            }
            Some(&next) if next.is_alphanumeric() || next == '_' => {
                let mut var_name = String::new();
                while let Some(&next_char) = chars.peek() {
                    if next_char.is_alphanumeric() || next_char == '_' {
                        var_name.push(next_char);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if let Some(value) = env.get(&var_name) {
                    result.push_str(value);
                }
            }
            // a lone `$` stays literal
            _ => result.push('$'),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<Word> {
        words.iter().map(|w| Word::bare(*w)).collect()
    }

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_plain_words_untouched() {
        let env = Env::new();
        assert_eq!(
            expand_argv(&argv(&["echo", "hi"]), 0, &env),
            strings(&["echo", "hi"])
        );
    }

    #[test]
    fn test_variable_substitution() {
        let mut env = Env::new();
        env.set("USER", "taya");
        assert_eq!(
            expand_argv(&argv(&["echo", "hello-$USER!"]), 0, &env),
            strings(&["echo", "hello-taya!"])
        );
    }

    #[test]
    fn test_last_status() {
        let env = Env::new();
        assert_eq!(
            expand_argv(&argv(&["echo", "$?"]), 42, &env),
            strings(&["echo", "42"])
        );
    }

    #[test]
    fn test_unset_variable_drops_word() {
        let env = Env::new();
        assert_eq!(
            expand_argv(&argv(&["$NOPE", "hi"]), 0, &env),
            strings(&["hi"])
        );
    }

    #[test]
    fn test_single_quoted_word_is_literal() {
        let mut env = Env::new();
        env.set("USER", "taya");
        let words = vec![
            Word::bare("echo"),
            Word::new("$USER", Quote::Single),
            Word::new("$USER", Quote::Double),
        ];
        assert_eq!(
            expand_argv(&words, 0, &env),
            strings(&["echo", "$USER", "taya"])
        );
    }

    #[test]
    fn test_single_quoted_last_status_is_literal() {
        let env = Env::new();
        let words = vec![Word::bare("echo"), Word::new("$?", Quote::Single)];
        assert_eq!(expand_argv(&words, 7, &env), strings(&["echo", "$?"]));
    }

    #[test]
    fn test_quoted_empty_word_kept() {
        let env = Env::new();
        let words = vec![Word::bare("echo"), Word::new("", Quote::Single)];
        assert_eq!(expand_argv(&words, 0, &env), strings(&["echo", ""]));
    }

    #[test]
    fn test_lone_dollar_is_literal() {
        let env = Env::new();
        assert_eq!(
            expand_argv(&argv(&["echo", "$"]), 0, &env),
            strings(&["echo", "$"])
        );
    }

    #[test]
    fn test_everything_expands_away() {
        let env = Env::new();
        assert!(expand_argv(&argv(&["$GONE"]), 0, &env).is_empty());
    }
}
