/// How an extracted command is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// `<interpreter> <script> [args...]`: the script is resolved against the skill root
    Interpreter {
        interpreter: String,
        script: String,
        /// Verbatim remainder after the script token
        args: String,
    },
    /// Anything else, handed to the shell untouched
    Shell { raw: String },
}

impl Invocation {
    /// Classify `command` by its first two whitespace-delimited tokens.
    ///
    /// Interpreter mode requires the first token to be one of `interpreters` and a second
    /// token that is not an option (so `python -m http.server` stays a shell command).
    pub fn classify(command: &str, interpreters: &[String]) -> Self {
        let trimmed = command.trim();
        let (program, rest) = split_token(trimmed);

        if interpreters.iter().any(|i| i == program) {
            let (script, args) = split_token(rest);
            if !script.is_empty() && !script.starts_with('-') {
                return Invocation::Interpreter {
                    interpreter: program.to_string(),
                    script: script.to_string(),
                    args: args.to_string(),
                };
            }
        }

        Invocation::Shell { raw: trimmed.to_string() }
    }

    pub fn is_interpreter(&self) -> bool {
        matches!(self, Invocation::Interpreter { .. })
    }

    /// Arguments of an interpreter invocation, split on whitespace.
    pub fn args(&self) -> Vec<&str> {
        match self {
            Invocation::Interpreter { args, .. } => args.split_whitespace().collect(),
            Invocation::Shell { .. } => Vec::new(),
        }
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Invocation::Interpreter { interpreter, script, args } if args.is_empty() => {
                write!(f, "{interpreter} {script}")
            }
            Invocation::Interpreter { interpreter, script, args } => write!(f, "{interpreter} {script} {args}"),
            Invocation::Shell { raw } => write!(f, "{raw}"),
        }
    }
}

/// First whitespace-delimited token and the trimmed remainder.
fn split_token(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}
