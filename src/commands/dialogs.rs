use crate::error::AppResult;
use crate::screens::{ConfirmDialog, Dialogs};
use async_trait::async_trait;
use rust_i18n::t;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::Mutex;
use tracing::warn;

/// Line reader shared by the prompt and the dialogs
pub type SharedInput<R> = Arc<Mutex<Lines<BufReader<R>>>>;

pub fn shared_input<R: AsyncRead + Unpin>(reader: R) -> SharedInput<R> {
    Arc::new(Mutex::new(BufReader::new(reader).lines()))
}

/// Next line of input, `None` at end of input
pub async fn read_line<R: AsyncRead + Unpin>(input: &SharedInput<R>) -> AppResult<Option<String>> {
    Ok(input.lock().await.next_line().await?)
}

pub(crate) fn prompt(text: &str) {
    print!("{}", text);
    if let Err(e) = std::io::stdout().flush() {
        warn!("Failed to flush stdout: {}", e);
    }
}

/// Dialogs answered on the terminal
pub struct TerminalDialogs<R> {
    input: SharedInput<R>,
}

impl<R> TerminalDialogs<R> {
    pub fn new(input: SharedInput<R>) -> Self {
        Self { input }
    }
}

/// Whether an answer picks the confirming choice. Anything else cancels.
pub fn is_confirmation(answer: &str, dialog: &ConfirmDialog) -> bool {
    let answer = answer.trim().to_lowercase();
    answer == "2"
        || answer == dialog.confirm_label.to_lowercase()
        || matches!(answer.as_str(), "s" | "si" | "sí" | "y" | "yes")
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send + 'static> Dialogs for TerminalDialogs<R> {
    async fn confirm(&self, dialog: &ConfirmDialog) -> bool {
        println!("\n== {} ==\n{}", dialog.title, dialog.message);
        println!("  [1] {}  [2] {}", dialog.cancel_label, dialog.confirm_label);
        prompt("> ");

        match read_line(&self.input).await {
            Ok(Some(answer)) => is_confirmation(&answer, dialog),
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to read dialog answer: {}", e);
                false
            }
        }
    }

    async fn alert(&self, title: &str, message: &str) {
        println!("\n== {} ==\n{}", title, message);
        prompt(&format!("[{}] ", t!("ok_button")));

        if let Err(e) = read_line(&self.input).await {
            warn!("Failed to read dialog answer: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialog() -> ConfirmDialog {
        ConfirmDialog {
            title: "Eliminar Evento".to_string(),
            message: "¿Seguro?".to_string(),
            cancel_label: "Cancelar".to_string(),
            confirm_label: "Eliminar".to_string(),
        }
    }

    #[test]
    fn confirming_answers() {
        assert!(is_confirmation("2", &dialog()));
        assert!(is_confirmation(" eliminar ", &dialog()));
        assert!(is_confirmation("sí", &dialog()));
    }

    #[test]
    fn anything_else_cancels() {
        assert!(!is_confirmation("1", &dialog()));
        assert!(!is_confirmation("", &dialog()));
        assert!(!is_confirmation("cancelar", &dialog()));
    }

    #[tokio::test]
    async fn end_of_input_cancels() {
        let dialogs = TerminalDialogs::new(shared_input(tokio::io::empty()));
        assert!(!dialogs.confirm(&dialog()).await);
    }

    #[tokio::test]
    async fn reads_the_answer_line() {
        let dialogs = TerminalDialogs::new(shared_input(&b"2\n"[..]));
        assert!(dialogs.confirm(&dialog()).await);
    }
}
