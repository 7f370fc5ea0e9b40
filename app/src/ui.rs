//! Presentation layer: lines in, rendered list out.
//!
//! Stands in for the original's form-and-list markup. This layer only
//! translates: an input line becomes an action (or nothing), and the
//! current state becomes text. It owns id generation for new items, fed
//! by an injected generator rather than a global counter.

use crate::actions::TodoAction;
use crate::types::{TodoId, TodoItem, TodoState};
use todoflow_core::environment::{Clock, IdGenerator};

/// Placeholder shown when the session starts
pub const PLACEHOLDER: &str = "what needs to be done?";

/// Usage text for the interactive session
pub const HELP: &str = "\
commands:
  add <text>    add an item
  toggle <id>   check / uncheck an item
  rm <id>       remove an item
  ls            show the list
  help          show this help
  quit          exit";

/// A parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Add an item with this text (may be empty; submission rejects that)
    Add(String),
    /// Toggle the item with this id
    Toggle(u64),
    /// Remove the item with this id
    Remove(u64),
    /// Render the list
    List,
    /// Show usage
    Help,
    /// End the session
    Quit,
}

impl Command {
    /// Parses one input line, `None` if it isn't a known command
    ///
    /// `add` takes the rest of the line verbatim (minus the single
    /// separating space); ids must be plain integers.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (word, rest) = match line.split_once(' ') {
            Some((word, rest)) => (word, rest),
            None => (line, ""),
        };

        match word {
            "add" => Some(Self::Add(rest.to_string())),
            "toggle" => rest.trim().parse().ok().map(Self::Toggle),
            "rm" => rest.trim().parse().ok().map(Self::Remove),
            "ls" => Some(Self::List),
            "help" => Some(Self::Help),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Derives the id-generator seed from the startup time
///
/// Milliseconds since the epoch, like the original widget's counter seed,
/// so ids from successive runs do not collide.
#[must_use]
pub fn id_seed(clock: &dyn Clock) -> u64 {
    u64::try_from(clock.now().timestamp_millis()).unwrap_or(0)
}

/// Turns submitted text into an add action, or nothing for empty text
///
/// The empty-submission rule lives here, at the point of entry: no action
/// is produced and no id is consumed.
#[must_use]
pub fn submit(text: &str, ids: &dyn IdGenerator) -> Option<TodoAction> {
    if text.is_empty() {
        return None;
    }

    let item = TodoItem::new(TodoId::new(ids.next_id()), text.to_string());
    Some(TodoAction::add(item))
}

/// Renders the current list as text
///
/// One row per item in insertion order: checkbox column, id, text.
#[must_use]
pub fn render(state: &TodoState) -> String {
    let mut out = String::from("todos\n");
    if state.todos.is_empty() {
        out.push_str("  (nothing to do)\n");
        return out;
    }

    for todo in &state.todos {
        let checkbox = if todo.complete { "[x]" } else { "[ ]" };
        out.push_str(&format!("  {checkbox} {}  {}\n", todo.id, todo.text));
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)] // Test code can panic
mod tests {
    use super::*;
    use todoflow_testing::{test_clock, CountingIdGenerator};

    #[test]
    fn parse_recognizes_every_command() {
        assert_eq!(
            Command::parse("add buy milk"),
            Some(Command::Add("buy milk".to_string()))
        );
        assert_eq!(Command::parse("toggle 3"), Some(Command::Toggle(3)));
        assert_eq!(Command::parse("rm 3"), Some(Command::Remove(3)));
        assert_eq!(Command::parse("ls"), Some(Command::List));
        assert_eq!(Command::parse("help"), Some(Command::Help));
        assert_eq!(Command::parse("quit"), Some(Command::Quit));
        assert_eq!(Command::parse("frobnicate"), None);
    }

    #[test]
    fn parse_keeps_add_text_verbatim() {
        assert_eq!(
            Command::parse("add  spaced  out "),
            Some(Command::Add(" spaced  out ".to_string()))
        );
    }

    #[test]
    fn parse_bare_add_yields_empty_text() {
        assert_eq!(Command::parse("add"), Some(Command::Add(String::new())));
    }

    #[test]
    fn parse_rejects_non_numeric_ids() {
        assert_eq!(Command::parse("toggle abc"), None);
        assert_eq!(Command::parse("rm"), None);
    }

    #[test]
    fn submit_rejects_empty_text_without_consuming_an_id() {
        let ids = CountingIdGenerator::new();

        assert_eq!(submit("", &ids), None);

        // The rejected submission did not burn an id
        let action = submit("buy milk", &ids).unwrap();
        match action {
            TodoAction::Add(item) => {
                assert_eq!(item.id, TodoId::new(1));
                assert_eq!(item.text, "buy milk");
                assert!(!item.complete);
            }
            other => panic!("expected Add, got {other:?}"),
        }
    }

    #[test]
    fn submit_allocates_increasing_ids() {
        let ids = CountingIdGenerator::new();

        let first = submit("a", &ids).unwrap();
        let second = submit("b", &ids).unwrap();

        match (first, second) {
            (TodoAction::Add(a), TodoAction::Add(b)) => assert!(a.id < b.id),
            other => panic!("expected two Adds, got {other:?}"),
        }
    }

    #[test]
    fn id_seed_uses_epoch_milliseconds() {
        let clock = test_clock();
        let expected = u64::try_from(clock.now().timestamp_millis()).unwrap();
        assert_eq!(id_seed(&clock), expected);
    }

    #[test]
    fn render_shows_checkbox_id_and_text() {
        let mut state = TodoState::new();
        state
            .todos
            .push(TodoItem::new(TodoId::new(1), "buy milk".to_string()));
        let mut done = TodoItem::new(TodoId::new(2), "write docs".to_string());
        done.toggle();
        state.todos.push(done);

        let out = render(&state);
        assert!(out.starts_with("todos\n"));
        assert!(out.contains("[ ] 1  buy milk"));
        assert!(out.contains("[x] 2  write docs"));
    }

    #[test]
    fn render_empty_list_has_a_hint() {
        let out = render(&TodoState::new());
        assert!(out.contains("nothing to do"));
    }
}
