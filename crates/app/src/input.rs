use std::fmt;

use services::QuestionView;

/// One line of participant input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// `<n> <letter|text>`; `position` is 1-based.
    Select { position: usize, choice: String },
    Submit,
    Confirm,
    Cancel,
    Retry,
    Restart,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    Empty,
    Unknown(String),
    MissingChoice { position: usize },
}

impl fmt::Display for IntentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentError::Empty => write!(f, "empty input"),
            IntentError::Unknown(raw) => write!(f, "unknown command: {raw} (type `help`)"),
            IntentError::MissingChoice { position } => {
                write!(f, "question {position} needs an option, e.g. `{position} a`")
            }
        }
    }
}

pub fn parse(line: &str) -> Result<Intent, IntentError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(IntentError::Empty);
    }

    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(head, rest)| (head, rest.trim()));

    if let Ok(position) = head.parse::<usize>() {
        if rest.is_empty() {
            return Err(IntentError::MissingChoice { position });
        }
        return Ok(Intent::Select {
            position,
            choice: rest.to_owned(),
        });
    }

    match head.to_ascii_lowercase().as_str() {
        "submit" | "s" => Ok(Intent::Submit),
        "yes" | "y" => Ok(Intent::Confirm),
        "no" | "n" => Ok(Intent::Cancel),
        "retry" => Ok(Intent::Retry),
        "restart" => Ok(Intent::Restart),
        "help" | "?" => Ok(Intent::Help),
        "quit" | "q" | "exit" => Ok(Intent::Quit),
        _ => Err(IntentError::Unknown(line.to_owned())),
    }
}

/// Map typed input onto one of the question's choices.
///
/// Exact choice text wins; otherwise a single letter picks by position
/// (`a` is the first choice).
pub fn resolve_choice(view: &QuestionView, raw: &str) -> Option<String> {
    if let Some(exact) = view.choices.iter().find(|c| c.as_str() == raw) {
        return Some(exact.clone());
    }

    let mut chars = raw.chars();
    let (Some(letter), None) = (chars.next(), chars.next()) else {
        return None;
    };
    if !letter.is_ascii_alphabetic() {
        return None;
    }
    let index = usize::from(letter.to_ascii_lowercase() as u8 - b'a');
    view.choices.get(index).cloned()
}

pub fn print_help() {
    println!("Commands:");
    println!("  <n> <letter|text>  answer question n, e.g. `3 b`");
    println!("  submit             hand in the exam");
    println!("  yes / no           confirm or cancel a submit with unanswered questions");
    println!("  retry              reload after a failed load");
    println!("  restart            start the exam over");
    println!("  quit");
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::QuestionId;

    fn view(choices: &[&str]) -> QuestionView {
        QuestionView {
            id: QuestionId::number(1),
            prompt: "Capital of France?".into(),
            choices: choices.iter().map(|c| (*c).to_owned()).collect(),
            answerable: !choices.is_empty(),
            chosen: None,
        }
    }

    #[test]
    fn parses_selection_and_commands() {
        assert_eq!(
            parse(" 3   b "),
            Ok(Intent::Select {
                position: 3,
                choice: "b".into()
            })
        );
        assert_eq!(
            parse("2 New York"),
            Ok(Intent::Select {
                position: 2,
                choice: "New York".into()
            })
        );
        assert_eq!(parse("SUBMIT"), Ok(Intent::Submit));
        assert_eq!(parse("y"), Ok(Intent::Confirm));
        assert_eq!(parse("no"), Ok(Intent::Cancel));
        assert_eq!(parse("retry"), Ok(Intent::Retry));
        assert_eq!(parse("q"), Ok(Intent::Quit));
    }

    #[test]
    fn rejects_incomplete_input() {
        assert_eq!(parse("   "), Err(IntentError::Empty));
        assert_eq!(parse("4"), Err(IntentError::MissingChoice { position: 4 }));
        assert!(matches!(parse("dance"), Err(IntentError::Unknown(_))));
    }

    #[test]
    fn resolves_letters_and_text() {
        let v = view(&["Paris", "Lyon", "a"]);
        assert_eq!(resolve_choice(&v, "B").as_deref(), Some("Lyon"));
        assert_eq!(resolve_choice(&v, "Paris").as_deref(), Some("Paris"));
        // Exact text beats the letter reading.
        assert_eq!(resolve_choice(&v, "a").as_deref(), Some("a"));
        assert_eq!(resolve_choice(&v, "z"), None);
        assert_eq!(resolve_choice(&v, "7"), None);
        assert_eq!(resolve_choice(&view(&[]), "a"), None);
    }
}
