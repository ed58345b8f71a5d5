/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Draft(String),
    Typing(bool),
    Connect(Option<String>),
    Disconnect,
    History,
    Clear,
    Forget,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Some(Command::Send(line.to_owned()));
        };

        let (name, arg) = match rest.split_once(' ') {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let cmd = match name {
            "quit" | "q" => Command::Quit,
            "clear" => Command::Clear,
            "history" => Command::History,
            "disconnect" => Command::Disconnect,
            "forget" => Command::Forget,
            "help" => Command::Help,
            "draft" => Command::Draft(arg.to_owned()),
            "typing" => Command::Typing(!matches!(arg, "off" | "false" | "0")),
            "connect" if arg.is_empty() => Command::Connect(None),
            "connect" => Command::Connect(Some(arg.to_owned())),
            // a leading double slash sends the text literally
            "" if arg.is_empty() => Command::Unknown(line.to_owned()),
            _ if rest.starts_with('/') => Command::Send(rest.to_owned()),
            _ => Command::Unknown(name.to_owned()),
        };

        Some(cmd)
    }
}

pub const HELP: &str = "\
commands:
  <text>             send a message
  /draft <text>      set the draft
  /typing [on|off]   set your typing flag
  /connect [bot]     open the realtime channel (optionally to another bot)
  /disconnect        close the realtime channel
  /history           reload history
  /clear             clear the conversation
  /forget            forget the anonymous id
  /quit";
