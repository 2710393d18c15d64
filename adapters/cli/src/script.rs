//! Line-oriented operator script understood by the command-line adapter.

use thiserror::Error;
use voxel_rover_core::{Command, Maneuver};

/// Marker that starts a comment running to the end of the line.
const COMMENT_MARKER: char = '#';

/// Single step of an operator script.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Instruction {
    /// Forward a command to the world.
    Send(Command),
    /// Let the given number of time units elapse.
    Wait(u32),
}

/// Errors raised while parsing an operator script line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ScriptError {
    /// The keyword does not name any instruction.
    #[error("unknown instruction '{0}'")]
    UnknownInstruction(String),
    /// `wait` was given without a duration.
    #[error("wait requires a number of time units")]
    MissingDuration,
    /// The duration of a `wait` could not be parsed.
    #[error("could not parse duration '{0}'")]
    InvalidDuration(String),
    /// An instruction received more arguments than it accepts.
    #[error("unexpected argument '{argument}' after '{keyword}'")]
    UnexpectedArgument {
        /// Instruction keyword.
        keyword: String,
        /// First surplus argument.
        argument: String,
    },
}

/// Parses one script line; blank lines and comments yield `None`.
pub(crate) fn parse_line(line: &str) -> Result<Option<Instruction>, ScriptError> {
    let content = line
        .split_once(COMMENT_MARKER)
        .map_or(line, |(content, _)| content)
        .trim();
    let mut words = content.split_whitespace();
    let Some(keyword) = words.next() else {
        return Ok(None);
    };
    let keyword = keyword.to_ascii_lowercase();

    let instruction = match keyword.as_str() {
        "wait" => {
            let units = words.next().ok_or(ScriptError::MissingDuration)?;
            let units = units
                .parse::<u32>()
                .map_err(|_| ScriptError::InvalidDuration(units.to_owned()))?;
            Instruction::Wait(units)
        }
        other => Instruction::Send(parse_command(other)?),
    };

    if let Some(argument) = words.next() {
        return Err(ScriptError::UnexpectedArgument {
            keyword,
            argument: argument.to_owned(),
        });
    }

    Ok(Some(instruction))
}

fn parse_command(keyword: &str) -> Result<Command, ScriptError> {
    let drive = |maneuver| Command::Drive { maneuver };
    let command = match keyword {
        "forward" => drive(Maneuver::Forward),
        "back" | "backward" => drive(Maneuver::Backward),
        "left" => drive(Maneuver::StrafeLeft),
        "right" => drive(Maneuver::StrafeRight),
        "turn-left" => drive(Maneuver::TurnLeft),
        "turn-right" => drive(Maneuver::TurnRight),
        "mode" => Command::ToggleMode,
        "heal" => Command::Heal,
        "fault" => Command::TriggerFault,
        "fix" => Command::ClearFault,
        "restart" => Command::Restart,
        "status" => Command::RequestStatus,
        other => return Err(ScriptError::UnknownInstruction(other.to_owned())),
    };
    Ok(command)
}
