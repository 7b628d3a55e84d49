//! Console walkthrough: stdin/stdout REPL that drives one wizard for local
//! testing.

use std::fmt::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::WizardError;
use crate::onboarding::{Advance, StepWizard, WizardDeps, WizardKind, WizardView};
use crate::otp::OtpEntry;
use crate::validation::FieldInput;

const HELP: &str = "\
commands:
  set <field> <value>          store a text value
  check <field> | uncheck <field>
  file <field> <name> <bytes>  attach a file reference
  clear <field>
  otp <digits>                 type the code into the keypad
  next | back | resend | submit | status | help | quit";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { field: String, input: FieldInput },
    Otp(String),
    Next,
    Back,
    Resend,
    Submit,
    Status,
    Help,
    Quit,
}

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let field = || {
            rest.split_whitespace()
                .next()
                .map(str::to_string)
                .ok_or_else(|| format!("usage: {verb} <field> ..."))
        };

        match verb {
            "set" => {
                let (name, value) = rest
                    .split_once(' ')
                    .ok_or_else(|| "usage: set <field> <value>".to_string())?;
                Ok(Self::Set {
                    field: name.to_string(),
                    input: FieldInput::Text(value.trim().to_string()),
                })
            }
            "check" | "uncheck" => Ok(Self::Set {
                field: field()?,
                input: FieldInput::Flag(verb == "check"),
            }),
            "clear" => Ok(Self::Set {
                field: field()?,
                input: FieldInput::Clear,
            }),
            "file" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                let [name, file, size] = parts[..] else {
                    return Err("usage: file <field> <name> <bytes>".to_string());
                };
                let size_bytes = size
                    .parse()
                    .map_err(|_| format!("'{size}' is not a byte count"))?;
                Ok(Self::Set {
                    field: name.to_string(),
                    input: FieldInput::File {
                        name: file.to_string(),
                        size_bytes,
                    },
                })
            }
            "otp" => Ok(Self::Otp(rest.to_string())),
            "next" => Ok(Self::Next),
            "back" => Ok(Self::Back),
            "resend" => Ok(Self::Resend),
            "submit" => Ok(Self::Submit),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "/quit" => Ok(Self::Quit),
            other => Err(format!("unknown command '{other}' (try 'help')")),
        }
    }
}

/// A wizard plus the six-box keypad used for the code.
pub struct Console {
    wizard: StepWizard,
    keypad: OtpEntry,
}

impl Console {
    pub fn new(kind: WizardKind, deps: &WizardDeps) -> Self {
        Self {
            wizard: StepWizard::new(kind, deps),
            keypad: OtpEntry::default(),
        }
    }

    pub fn wizard(&self) -> &StepWizard {
        &self.wizard
    }

    /// Run one command and return what to print. `None` means quit.
    pub async fn handle(&mut self, command: Command) -> Option<String> {
        let out = match command {
            Command::Quit => {
                self.wizard.teardown();
                return None;
            }
            Command::Help => HELP.to_string(),
            Command::Status => render(&self.wizard.view()),
            Command::Set { field, input } => match self.wizard.set_field(&field, input) {
                Ok(()) => format!("{field} updated"),
                Err(e) => describe(&e),
            },
            Command::Otp(digits) => {
                let digits: String = digits.split_whitespace().collect();
                self.keypad.clear();
                if self.keypad.paste(0, &digits).is_none() {
                    return Some("code must be digits only".to_string());
                }
                let code = self.keypad.value();
                match self.wizard.set_field("otp", FieldInput::Text(code.clone())) {
                    Ok(()) if self.keypad.is_complete() => format!("code {code} entered"),
                    Ok(()) => format!("code incomplete: {code}"),
                    Err(e) => describe(&e),
                }
            }
            Command::Next => match self.wizard.advance().await {
                Ok(Advance::CodeSent { step }) => {
                    format!("step {step}: a verification code was sent")
                }
                Ok(Advance::CodeNotSent { step, reason }) => {
                    format!("step {step}: code not sent ({reason}); use 'resend'")
                }
                Ok(Advance::Moved { step }) => format!("step {step}"),
                Ok(Advance::AtFinalStep { step }) => {
                    format!("step {step} is the last one; use 'submit'")
                }
                Err(e) => describe(&e),
            },
            Command::Back => format!("step {}", self.wizard.retreat()),
            Command::Resend => match self.wizard.resend_code().await {
                Ok(()) => "code resent".to_string(),
                Err(e) => describe(&e),
            },
            Command::Submit => match self.wizard.submit_final().await {
                Ok(done) => format!(
                    "complete (reference {}), next page: {:?}",
                    done.reference, done.next_page
                ),
                Err(e) => describe(&e),
            },
        };
        Some(out)
    }
}

fn describe(err: &WizardError) -> String {
    match err {
        WizardError::StepInvalid { .. } => format!("{err} (see 'status')"),
        _ => err.to_string(),
    }
}

/// Plain-text rendering of a wizard view.
pub fn render(view: &WizardView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} [{}] step {}/{}: {} ({:.0}%)",
        view.title,
        view.status,
        view.current_step,
        view.total_steps,
        view.step_title,
        view.progress_percent
    );
    for field in &view.fields {
        let marker = if field.required { "*" } else { " " };
        let _ = write!(out, " {marker} {:<16} {}", field.name, field.value);
        if let Some(message) = view.errors.get(field.name) {
            let _ = write!(out, "  <- {message}");
        }
        out.push('\n');
    }
    if let Some(strength) = &view.password_strength {
        let _ = writeln!(
            out,
            "   password strength: {:?} ({}/4)",
            strength.level(),
            strength.criteria_met()
        );
    }
    if let Some(otp) = &view.otp {
        let _ = writeln!(
            out,
            "   code: {} (resend in {}s)",
            otp.phase, otp.cooldown_remaining
        );
    }
    out
}

/// Read commands from stdin until `quit` or EOF.
pub async fn run(kind: WizardKind, deps: &WizardDeps) -> std::io::Result<()> {
    let mut console = Console::new(kind, deps);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("{}", render(&console.wizard().view()));
    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            eprint!("> ");
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => match console.handle(command).await {
                Some(out) => println!("{out}"),
                None => break,
            },
            Err(e) => eprintln!("{e}"),
        }
        eprint!("> ");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::WizardConfig;
    use crate::onboarding::WizardStatus;

    fn console(kind: WizardKind) -> Console {
        let config = WizardConfig {
            simulated_delay: Duration::ZERO,
            ..WizardConfig::default()
        };
        Console::new(kind, &WizardDeps::simulated(&config))
    }

    async fn run_lines(console: &mut Console, lines: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        for line in lines {
            let command: Command = line.parse().unwrap();
            out.push(console.handle(command).await.unwrap_or_default());
        }
        out
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            "set fullName Abebe Kebede".parse::<Command>().unwrap(),
            Command::Set {
                field: "fullName".to_string(),
                input: FieldInput::Text("Abebe Kebede".to_string()),
            }
        );
        assert_eq!(
            "file idFile id.png 2048".parse::<Command>().unwrap(),
            Command::Set {
                field: "idFile".to_string(),
                input: FieldInput::File {
                    name: "id.png".to_string(),
                    size_bytes: 2048,
                },
            }
        );
        assert_eq!(
            "uncheck terms".parse::<Command>().unwrap(),
            Command::Set {
                field: "terms".to_string(),
                input: FieldInput::Flag(false),
            }
        );
        assert_eq!("next".parse::<Command>().unwrap(), Command::Next);
        assert!("file idFile id.png".parse::<Command>().is_err());
        assert!("set fullName".parse::<Command>().is_err());
        assert!("jump 3".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn walks_sign_up_to_completion() {
        let mut console = console(WizardKind::SignUp);
        let out = run_lines(
            &mut console,
            &[
                "set fullName Abebe Kebede",
                "set email abebe@example.com",
                "set password Secure#123",
                "set confirmPassword Secure#123",
                "check terms",
                "next",
                "set phoneNumber 0911-234-567",
                "next",
                "otp 12 34 56",
                "submit",
            ],
        )
        .await;

        assert_eq!(out[5], "step 2");
        assert_eq!(out[7], "step 3: a verification code was sent");
        assert_eq!(out[8], "code 123456 entered");
        assert!(out[9].starts_with("complete"));
        assert_eq!(console.wizard().status(), WizardStatus::Complete);
    }

    #[tokio::test]
    async fn status_shows_inline_errors() {
        let mut console = console(WizardKind::SignUp);
        let out = run_lines(&mut console, &["next", "status"]).await;
        assert!(out[0].contains("invalid field"));
        assert!(out[1].contains("Full name is required"));
        assert!(out[1].contains("step 1/3"));
    }

    #[tokio::test]
    async fn quit_ends_session() {
        let mut console = console(WizardKind::Kyc);
        assert!(console.handle(Command::Quit).await.is_none());
    }
}
