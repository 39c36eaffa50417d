//! Rendering helpers for scheduler directives and shell command lines

use serde::Serialize;

/// A single scheduler option such as `-q gpu` or `-N`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    flag: &'static str,
    value: Option<String>,
}

impl Directive {
    /// Option that takes a value
    pub fn with_value(flag: &'static str, value: impl Into<String>) -> Self {
        Self {
            flag,
            value: Some(value.into()),
        }
    }

    /// Option without a value
    pub fn flag(flag: &'static str) -> Self {
        Self { flag, value: None }
    }

    pub fn flag_name(&self) -> &'static str {
        self.flag
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Argument vector form, for spawning without a shell
    pub fn into_args(self) -> Vec<String> {
        let mut args = vec![self.flag.to_string()];
        args.extend(self.value);
        args
    }

    /// Text following `#BSUB ` in a batch script
    pub fn to_script_line(&self) -> String {
        match &self.value {
            Some(value) => format!("{} {}", self.flag, shell_quote(value)),
            None => self.flag.to_string(),
        }
    }
}

/// Quotes a word for a POSIX shell, leaving plain words untouched
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./%:=@+,".contains(c));

    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Joins words into a single shell command line
pub fn shell_join(words: &[String]) -> String {
    words
        .iter()
        .map(|w| shell_quote(w))
        .collect::<Vec<_>>()
        .join(" ")
}
