//! Parser for the subset of [UCI] commands the engine understands.
//!
//! [UCI]: https://www.chessprogramming.org/UCI

#[derive(Debug, PartialEq, Eq)]
pub(super) enum Command {
    Uci,
    IsReady,
    NewGame,
    /// `fen` is `None` for `position startpos`.
    SetPosition {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go {
        depth: Option<u8>,
        movetime: Option<u64>,
        infinite: bool,
    },
    Stop,
    Quit,
    Unknown(String),
}

fn parse_go(parts: &[&str]) -> Command {
    let mut depth = None;
    let mut movetime = None;
    let mut infinite = false;

    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "depth" if i + 1 < parts.len() => depth = parts[i + 1].parse().ok(),
            "movetime" if i + 1 < parts.len() => movetime = parts[i + 1].parse().ok(),
            "infinite" => infinite = true,
            // Time controls and other limits are not supported: skip the
            // argument together with its value.
            _ => {},
        }
        if parts[i] == "infinite" {
            i += 1;
        } else {
            i += 2;
        }
    }

    Command::Go {
        depth,
        movetime,
        infinite,
    }
}

fn parse_setposition(parts: &[&str]) -> Command {
    let moves_index = parts.iter().position(|&x| x == "moves");
    let fen = match parts.get(1) {
        Some(&"startpos") => None,
        Some(&"fen") => Some(parts[2..moves_index.unwrap_or(parts.len())].join(" ")),
        _ => return Command::Unknown(parts.join(" ")),
    };
    let moves = moves_index.map_or_else(Vec::new, |moves_index| {
        parts[moves_index + 1..]
            .iter()
            .map(ToString::to_string)
            .collect()
    });
    Command::SetPosition { fen, moves }
}

impl Command {
    pub(super) fn parse(input: &str) -> Self {
        let parts: Vec<&str> = input.split_whitespace().collect();

        let Some(command) = parts.first() else {
            return Self::Unknown(input.to_string());
        };

        match *command {
            "uci" => Self::Uci,
            "isready" => Self::IsReady,
            "position" => parse_setposition(&parts),
            "ucinewgame" => Self::NewGame,
            "go" => parse_go(&parts),
            "stop" => Self::Stop,
            "quit" => Self::Quit,
            _ => Self::Unknown(input.trim().to_string()),
        }
    }
}
