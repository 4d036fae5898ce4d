//! Slash-command parsing for the chat REPL.

/// One line of REPL input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank line; ignored.
    Empty,
    /// Text for the tutor.
    Chat(String),
    Command(Command),
    /// A slash command that could not be understood. Holds the message to show.
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    About,
    Scenarios,
    Reflect,
    Lessons,
    /// Select a mini-lesson by (partial) name.
    Lesson(String),
    LessonOff,
    Explain(bool),
    /// Turn count for this session and the on-disk log.
    History,
    Reset,
    Quit,
}

pub const HELP: &str = "\
Commands:
  /help              show this list
  /about             persona, disallowed topics and model
  /scenarios         starter scenarios to explore
  /reflect           a short reflection rubric
  /lessons           list mini-lessons
  /lesson <name>     show a mini-lesson and tag the log with it
  /lesson off        clear the selected lesson
  /explain on|off    toggle Explain steps
  /history           turns so far and rows in the session log
  /reset             clear the conversation
  /quit              leave
Anything else is sent to the tutor.";

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Input::Chat(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match (name.to_lowercase().as_str(), arg) {
        ("help" | "?", _) => Command::Help,
        ("about", _) => Command::About,
        ("scenarios", _) => Command::Scenarios,
        ("reflect", _) => Command::Reflect,
        ("lessons", _) => Command::Lessons,
        ("lesson", "") => return Input::Invalid("usage: /lesson <name> | /lesson off".into()),
        ("lesson", arg) if arg.eq_ignore_ascii_case("off") => Command::LessonOff,
        ("lesson", arg) => Command::Lesson(arg.to_string()),
        ("explain", arg) => match arg.to_lowercase().as_str() {
            "on" => Command::Explain(true),
            "off" => Command::Explain(false),
            _ => return Input::Invalid("usage: /explain on|off".into()),
        },
        ("history", _) => Command::History,
        ("reset", _) => Command::Reset,
        ("quit" | "exit", _) => Command::Quit,
        _ => return Input::Invalid(format!("unknown command /{name}; try /help")),
    };
    Input::Command(command)
}
