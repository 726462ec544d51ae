use super::commands::{Command, COMMAND_BOX};
use crate::models::{Result, Role, Turn};
use crate::renderer::MarkdownRenderer;
use crate::session::{ChatSession, ChatView};
use colored::*;
use rustyline::{config::Configurer, error::ReadlineError, DefaultEditor};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use terminal_size::{terminal_size, Width};
use tracing::{debug, info};

const WELCOME_MESSAGE: &str = "I am a chat assistant running on your own machine through \
Ollama. Ask me anything:\n\n\
* Questions on a wide range of topics\n\
* Lists, which I will answer in JSON\n\n\
Only your latest message is sent with each request. Press Ctrl-C while I am \
thinking to cancel.";

const PENDING_MESSAGE: &str = "Thinking... (Ctrl-C to cancel)";
const HISTORY_FILE: &str = ".ollama_chat_history";

pub fn terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), _)) => (w as usize).saturating_sub(2),
        None => 80,
    }
}

/// Draws turns as they arrive and the pending indicator in place of the
/// cancel button.
pub struct TerminalView {
    renderer: MarkdownRenderer,
}

impl TerminalView {
    pub fn new(width: usize) -> Self {
        Self {
            renderer: MarkdownRenderer::new(width),
        }
    }

    pub fn renderer(&self) -> &MarkdownRenderer {
        &self.renderer
    }

    fn clear_line(&self) {
        print!("\r{}\r", " ".repeat(self.renderer.width()));
    }
}

impl ChatView for TerminalView {
    fn append_turn(&self, turn: &Turn) {
        match turn.role {
            Role::User => {
                print!("{}", "> ".blue().bold());
                println!("{}", turn.text.blue());
                println!();
            }
            _ => {
                println!("{}", self.renderer.render(&turn.text).cyan());
                println!();
            }
        }
        let _ = io::stdout().flush();
    }

    fn set_pending(&self, pending: bool) {
        if pending {
            print!("{}", PENDING_MESSAGE.yellow());
        } else {
            self.clear_line();
        }
        let _ = io::stdout().flush();
    }
}

pub struct TerminalUI {
    session: ChatSession,
    view: Arc<TerminalView>,
    editor: DefaultEditor,
    history_file: PathBuf,
}

impl TerminalUI {
    pub fn new(session: ChatSession, view: Arc<TerminalView>) -> Result<Self> {
        let mut editor = DefaultEditor::new()?;
        editor.set_max_history_size(100)?;

        let history_file = dirs::home_dir()
            .map(|mut path| {
                path.push(HISTORY_FILE);
                path
            })
            .unwrap_or_else(|| HISTORY_FILE.into());

        if history_file.exists() {
            let _ = editor.load_history(&history_file);
        }

        Ok(Self {
            session,
            view,
            editor,
            history_file,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.show_welcome_message()?;

        loop {
            let prompt = format!("{}", "> ".blue().bold());
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let command = line
                        .parse::<Command>()
                        .unwrap_or_else(|_| Command::Message(line));
                    match command {
                        Command::Exit => break,
                        Command::Clear => {
                            clearscreen::clear()?;
                            self.show_command_box();
                        }
                        Command::New => {
                            self.session.clear();
                            clearscreen::clear()?;
                            self.show_command_box();
                            println!("{}", "Starting a fresh conversation...".green());
                            println!();
                        }
                        Command::Message(input) => {
                            if !input.is_empty() {
                                self.editor.add_history_entry(&input)?;
                                self.submit(&input).await?;
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Use 'exit' to quit");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    println!("Error: {}", err);
                    break;
                }
            }
        }

        if let Err(err) = self.editor.save_history(&self.history_file) {
            debug!(error = %err, "could not save history");
        }
        info!(turns = self.session.transcript().len(), "chat ended");
        Ok(())
    }

    /// Waits for the reply while Ctrl-C cancels it.
    async fn submit(&self, input: &str) -> Result<()> {
        // Replace the echoed prompt line with the user's bubble.
        print!("\x1B[1A\x1B[2K\r");

        let reply = self.session.on_submit(input);
        tokio::pin!(reply);

        // The first ctrl_c() call replaces the default SIGINT action for the
        // rest of the process. At the prompt rustyline reads Ctrl-C itself
        // (raw mode) and `exit` or Ctrl-D quits; a Ctrl-C outside both is
        // ignored rather than killing the chat.

        loop {
            tokio::select! {
                _ = &mut reply => break,
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    self.session.on_cancel();
                }
            }
        }

        Ok(())
    }

    fn show_welcome_message(&self) -> Result<()> {
        clearscreen::clear()?;
        print!("{}", self.view.renderer().render(WELCOME_MESSAGE).cyan());
        println!("\n");
        self.show_command_box();
        io::stdout().flush()?;
        Ok(())
    }

    fn show_command_box(&self) {
        println!("{}", COMMAND_BOX.green());
        println!();
    }
}
